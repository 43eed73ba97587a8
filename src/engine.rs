//! Engine instance: the table store every map and share runs on.
//!
//! An engine owns a registry of tables keyed by generational [`TableId`]
//! tokens, and a registry of logical maps keyed by [`MapId`], each holding
//! the four table tokens of its namespaces (see `namespace`). Tokens are
//! never reused within an engine, so a stale token cannot alias a table
//! created later.
//!
//! The engine only exposes the primitives the map layer needs: create,
//! drop and reset a table; get, set, remove and `next` on a table. All
//! storage growth is checked against the engine's [`AllocPolicy`].

use crate::config::AllocPolicy;
use crate::error::MapError;
use crate::namespace::Namespaces;
use crate::scalar::{KeyRef, Scalar};
use crate::table::{Table, UnknownKey};
use core::sync::atomic::{AtomicU64, Ordering};
use slotmap::{new_key_type, SlotMap};
use std::collections::hash_map::RandomState;
use std::rc::Rc;
use tracing::debug;

new_key_type! {
    /// Token naming one table inside an engine.
    pub struct TableId;
    /// Token naming one logical map (owner or share) inside an engine.
    pub struct MapId;
}

/// Process-unique engine identity. Distinguishes cursors from different
/// engines whose `MapId`s might otherwise coincide.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct EngineId(u64);

static NEXT_ENGINE_ID: AtomicU64 = AtomicU64::new(1);

impl EngineId {
    fn fresh() -> Self {
        EngineId(NEXT_ENGINE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Byte accounting against the allocation policy.
pub(crate) struct Budget {
    policy: Rc<dyn AllocPolicy>,
    in_use: usize,
}

impl Budget {
    pub(crate) fn new(policy: Rc<dyn AllocPolicy>) -> Self {
        Self { policy, in_use: 0 }
    }

    /// Ask whether storage may change from `old` to `new` bytes.
    pub(crate) fn request(&self, old: usize, new: usize) -> Result<(), MapError> {
        if self.policy.resize(old, new) {
            Ok(())
        } else {
            tracing::warn!(old, new, "allocation policy refused growth");
            Err(MapError::AllocationRefused { requested: new })
        }
    }

    /// Record a granted change once the storage actually moved.
    pub(crate) fn commit(&mut self, old: usize, new: usize) {
        self.in_use = self.in_use - old + new;
    }

    pub(crate) fn release(&mut self, bytes: usize) {
        if bytes > 0 {
            let _ = self.policy.resize(bytes, 0);
            self.in_use -= bytes;
        }
    }

    pub(crate) fn in_use(&self) -> usize {
        self.in_use
    }
}

pub(crate) struct Engine {
    id: EngineId,
    hasher: RandomState,
    tables: SlotMap<TableId, Table>,
    pub(crate) maps: SlotMap<MapId, Namespaces>,
    budget: Budget,
}

impl Engine {
    pub(crate) fn open(policy: Rc<dyn AllocPolicy>) -> Self {
        let id = EngineId::fresh();
        debug!(engine = id.0, "engine opened");
        Self {
            id,
            hasher: RandomState::new(),
            tables: SlotMap::with_key(),
            maps: SlotMap::with_key(),
            budget: Budget::new(policy),
        }
    }

    pub(crate) fn id(&self) -> EngineId {
        self.id
    }

    pub(crate) fn memory_in_use(&self) -> usize {
        self.budget.in_use()
    }

    pub(crate) fn create_table(&mut self, capacity: usize) -> Result<TableId, MapError> {
        let table = Table::with_capacity(self.hasher.clone(), capacity, &mut self.budget)?;
        Ok(self.tables.insert(table))
    }

    pub(crate) fn insert_empty_table(&mut self) -> TableId {
        let table = Table::new(self.hasher.clone());
        self.tables.insert(table)
    }

    pub(crate) fn drop_table(&mut self, id: TableId) {
        if let Some(table) = self.tables.remove(id) {
            self.budget.release(table.accounted_bytes());
        }
    }

    /// Replace the table behind `id` with a fresh empty one, releasing
    /// all of its storage. The token stays valid.
    pub(crate) fn reset_table(&mut self, id: TableId) {
        let fresh = Table::new(self.hasher.clone());
        if let Some(slot) = self.tables.get_mut(id) {
            let old = core::mem::replace(slot, fresh);
            self.budget.release(old.accounted_bytes());
        }
    }

    pub(crate) fn len(&self, id: TableId) -> usize {
        self.tables.get(id).map(Table::len).unwrap_or(0)
    }

    pub(crate) fn get(&self, id: TableId, key: &KeyRef<'_>) -> Option<&Scalar> {
        self.tables.get(id)?.get(key)
    }

    pub(crate) fn contains_key(&self, id: TableId, key: &KeyRef<'_>) -> bool {
        self.tables
            .get(id)
            .map(|t| t.contains_key(key))
            .unwrap_or(false)
    }

    pub(crate) fn set(
        &mut self,
        id: TableId,
        key: KeyRef<'_>,
        value: Scalar,
    ) -> Result<(), MapError> {
        match self.tables.get_mut(id) {
            Some(table) => table.set(key, value, &mut self.budget),
            None => Err(MapError::EngineClosed),
        }
    }

    pub(crate) fn remove(&mut self, id: TableId, key: &KeyRef<'_>) -> bool {
        self.tables
            .get_mut(id)
            .map(|t| t.remove(key))
            .unwrap_or(false)
    }

    pub(crate) fn next(
        &self,
        id: TableId,
        after: Option<&KeyRef<'_>>,
    ) -> Result<Option<(Scalar, Scalar)>, UnknownKey> {
        match self.tables.get(id) {
            Some(t) => t.next(after),
            None => Err(UnknownKey),
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        for (_, table) in self.tables.drain() {
            self.budget.release(table.accounted_bytes());
        }
        debug!(engine = self.id.0, "engine closed");
    }
}
