//! Table: one hashed key/value store inside an engine instance.
//!
//! Nodes live in insertion order in a dense `Vec`; a `hashbrown`
//! `HashTable` maps each key's hash to its node position. Traversal walks
//! the node vector, so the order is stable until the table compacts.
//!
//! Dead-key contract
//! - `remove` clears a node's value but keeps its key and its index
//!   entry. A removed key therefore still resolves as a continuation
//!   token for `next`, which is what makes "remove the current key, then
//!   step" safe during a walk.
//! - Only inserting a *new* key may compact (drop dead nodes and rebuild
//!   the index). Lookups, overwrites and removals never move nodes.
//! - Reviving a dead key by setting it again reuses its node in place.

use crate::engine::Budget;
use crate::error::MapError;
use crate::scalar::{KeyRef, Scalar};
use core::hash::BuildHasher;
use core::mem::size_of;
use hashbrown::HashTable;
use std::collections::hash_map::RandomState;

const MIN_NODES: usize = 4;
// One index slot is a position plus hashbrown's control byte.
const INDEX_SLOT_BYTES: usize = size_of::<usize>() + 1;

#[derive(Debug)]
struct Node {
    key: Scalar,
    value: Option<Scalar>, // None marks a dead key
    hash: u64,
}

/// `next` was asked to continue from a key this table does not know.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct UnknownKey;

pub(crate) struct Table {
    hasher: RandomState,
    index: HashTable<usize>,
    nodes: Vec<Node>,
    live: usize,
    accounted: usize, // bytes granted by the allocation policy
}

impl Table {
    pub(crate) fn new(hasher: RandomState) -> Self {
        Self {
            hasher,
            index: HashTable::new(),
            nodes: Vec::new(),
            live: 0,
            accounted: 0,
        }
    }

    pub(crate) fn with_capacity(
        hasher: RandomState,
        capacity: usize,
        budget: &mut Budget,
    ) -> Result<Self, MapError> {
        let mut t = Self::new(hasher);
        if capacity > 0 {
            t.reserve(capacity, budget)?;
        }
        Ok(t)
    }

    fn bytes_for(nodes: usize) -> Result<usize, MapError> {
        nodes
            .checked_mul(size_of::<Node>() + INDEX_SLOT_BYTES)
            .ok_or(MapError::CapacityOverflow)
    }

    fn make_hash(&self, key: &KeyRef<'_>) -> u64 {
        self.hasher.hash_one(key)
    }

    fn position(&self, key: &KeyRef<'_>) -> Option<usize> {
        let hash = self.make_hash(key);
        self.index
            .find(hash, |&i| key.matches(&self.nodes[i].key))
            .copied()
    }

    /// Make room for `additional` more nodes, asking the policy first.
    fn reserve(&mut self, additional: usize, budget: &mut Budget) -> Result<(), MapError> {
        let wanted = self
            .nodes
            .len()
            .checked_add(additional)
            .ok_or(MapError::CapacityOverflow)?;
        if wanted <= self.nodes.capacity() && wanted <= self.index.capacity() {
            return Ok(());
        }
        let new_cap = wanted
            .max(self.nodes.capacity().saturating_mul(2))
            .max(MIN_NODES);
        let new_bytes = Self::bytes_for(new_cap)?;
        budget.request(self.accounted, new_bytes)?;

        self.nodes.try_reserve_exact(new_cap - self.nodes.len())?;
        let nodes = &self.nodes;
        self.index
            .try_reserve(new_cap - self.index.len(), |&i| nodes[i].hash)?;

        budget.commit(self.accounted, new_bytes);
        self.accounted = new_bytes;
        Ok(())
    }

    /// Drop dead nodes and rebuild the index. Keeps capacity.
    fn compact(&mut self) {
        self.nodes.retain(|n| n.value.is_some());
        self.index.clear();
        let nodes = &self.nodes;
        for (i, n) in nodes.iter().enumerate() {
            self.index.insert_unique(n.hash, i, |&j| nodes[j].hash);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.live
    }

    pub(crate) fn accounted_bytes(&self) -> usize {
        self.accounted
    }

    pub(crate) fn get(&self, key: &KeyRef<'_>) -> Option<&Scalar> {
        let pos = self.position(key)?;
        self.nodes[pos].value.as_ref()
    }

    pub(crate) fn contains_key(&self, key: &KeyRef<'_>) -> bool {
        self.get(key).is_some()
    }

    /// Store `value` under `key`, overwriting or reviving in place when the
    /// key is already known.
    pub(crate) fn set(
        &mut self,
        key: KeyRef<'_>,
        value: Scalar,
        budget: &mut Budget,
    ) -> Result<(), MapError> {
        if let Some(pos) = self.position(&key) {
            let node = &mut self.nodes[pos];
            if node.value.is_none() {
                self.live += 1;
            }
            node.value = Some(value);
            return Ok(());
        }

        let dead = self.nodes.len() - self.live;
        if dead > 0 && dead >= self.live {
            self.compact();
        }
        self.reserve(1, budget)?;

        let hash = self.make_hash(&key);
        let pos = self.nodes.len();
        self.nodes.push(Node {
            key: key.to_scalar(),
            value: Some(value),
            hash,
        });
        let nodes = &self.nodes;
        self.index.insert_unique(hash, pos, |&i| nodes[i].hash);
        self.live += 1;
        Ok(())
    }

    /// Kill the entry for `key`. Returns whether a live entry was removed.
    pub(crate) fn remove(&mut self, key: &KeyRef<'_>) -> bool {
        let Some(pos) = self.position(key) else {
            return false;
        };
        if self.nodes[pos].value.take().is_some() {
            self.live -= 1;
            true
        } else {
            false
        }
    }

    /// The first live entry after `after` in traversal order, or the
    /// first live entry overall when `after` is `None`.
    pub(crate) fn next(
        &self,
        after: Option<&KeyRef<'_>>,
    ) -> Result<Option<(Scalar, Scalar)>, UnknownKey> {
        let start = match after {
            None => 0,
            Some(k) => self.position(k).ok_or(UnknownKey)? + 1,
        };
        Ok(self.nodes[start..]
            .iter()
            .find_map(|n| n.value.as_ref().map(|v| (n.key.clone(), v.clone()))))
    }
}
