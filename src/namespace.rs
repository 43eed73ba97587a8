//! Namespaces: the four per-key-kind tables of one logical map, and the
//! engine-side registry that hands them out.
//!
//! Every logical map, owner or share, registers once with its engine and
//! receives four freshly created tables. Because table tokens are unique
//! within an engine, two registrations never observe each other's entries
//! even though they share all storage machinery.

use crate::config::SizeHints;
use crate::engine::{Engine, MapId, TableId};
use crate::error::MapError;
use crate::scalar::KeyKind;

/// Table tokens of one logical map, indexed by [`KeyKind`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct Namespaces([TableId; 4]);

impl Namespaces {
    #[inline]
    pub(crate) fn table(&self, kind: KeyKind) -> TableId {
        self.0[kind.index()]
    }

    pub(crate) fn tables(&self) -> impl Iterator<Item = (KeyKind, TableId)> + '_ {
        KeyKind::ALL.into_iter().map(move |k| (k, self.table(k)))
    }
}

impl Engine {
    /// Register a logical map with presized namespaces.
    pub(crate) fn register_map(&mut self, hints: &SizeHints) -> Result<(MapId, Namespaces), MapError> {
        let mut created: Vec<TableId> = Vec::with_capacity(4);
        for kind in KeyKind::ALL {
            match self.create_table(hints.get(kind)) {
                Ok(id) => created.push(id),
                Err(e) => {
                    for id in created {
                        self.drop_table(id);
                    }
                    return Err(e);
                }
            }
        }
        let ns = Namespaces([created[0], created[1], created[2], created[3]]);
        Ok((self.maps.insert(ns), ns))
    }

    /// Register a logical map whose namespaces start without storage.
    /// Never consults the allocation policy.
    pub(crate) fn register_empty_map(&mut self) -> (MapId, Namespaces) {
        let mut ids = [TableId::default(); 4];
        for kind in KeyKind::ALL {
            ids[kind.index()] = self.insert_empty_table();
        }
        let ns = Namespaces(ids);
        (self.maps.insert(ns), ns)
    }

    /// Drop the four tables of `map` and forget it. Idempotent.
    pub(crate) fn unregister_map(&mut self, map: MapId) {
        if let Some(ns) = self.maps.remove(map) {
            for (_, table) in ns.tables() {
                self.drop_table(table);
            }
        }
    }

    /// Number of logical maps currently registered.
    pub(crate) fn map_count(&self) -> usize {
        self.maps.len()
    }
}
