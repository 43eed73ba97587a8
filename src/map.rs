//! TypedMap: the public map over four key namespaces.

use crate::config::{AllocPolicy, MapConfig, SizeHints, Unlimited};
use crate::convert::{FromScalar, IntoKey, IntoValue};
use crate::engine::{Engine, EngineId, MapId};
use crate::error::MapError;
use crate::namespace::Namespaces;
use crate::scalar::{KeyKind, KeyRef, Scalar};
use crate::share::EngineRef;
use core::fmt;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{trace, warn};

/// A map from typed scalar keys to typed scalar values.
///
/// Keys are routed by their kind into one of four namespaces, so Text,
/// Pointer, Number and Integer keys never collide with each other. Reads
/// of missing keys return the zero value of the requested type; use
/// [`TypedMap::contains_key`] when a stored zero must be told apart from
/// a missing entry.
///
/// A map either owns its engine instance or is a share of another map's
/// engine (see [`TypedMap::share`]). Dropping the map frees its
/// namespaces; dropping an owner also closes the engine.
pub struct TypedMap {
    pub(crate) engine: EngineRef,
    pub(crate) id: MapId,
    pub(crate) namespaces: Namespaces,
    pub(crate) engine_id: EngineId,
}

impl TypedMap {
    pub fn new() -> Self {
        let mut engine = Engine::open(Rc::new(Unlimited));
        let (id, namespaces) = engine.register_empty_map();
        Self::owning(engine, id, namespaces)
    }

    /// Open a fresh engine configured by `config`. Fails only when the
    /// requested size hints cannot be allocated.
    pub fn with_config(mut config: MapConfig) -> Result<Self, MapError> {
        let mut engine = Engine::open(config.take_policy());
        let (id, namespaces) = engine.register_map(&config.hints)?;
        Ok(Self::owning(engine, id, namespaces))
    }

    pub fn with_size_hints(hints: SizeHints) -> Result<Self, MapError> {
        Self::with_config(MapConfig::new().size_hints(hints))
    }

    pub fn with_policy<P: AllocPolicy + 'static>(policy: P) -> Result<Self, MapError> {
        Self::with_config(MapConfig::new().policy(policy))
    }

    fn owning(engine: Engine, id: MapId, namespaces: Namespaces) -> Self {
        let engine_id = engine.id();
        Self {
            engine: EngineRef::Owner(Rc::new(RefCell::new(engine))),
            id,
            namespaces,
            engine_id,
        }
    }

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// An absent key (`None::<&str>`, NaN) is ignored. An absent Text value
    /// deletes the entry; a null Pointer or a zero number is stored as is.
    pub fn try_set<K: IntoKey, V: IntoValue>(&mut self, key: K, value: V) -> Result<(), MapError> {
        let Some(k) = key.as_key() else {
            return Ok(());
        };
        self.set_ref(k, value.into_value())
    }

    /// Like [`TypedMap::try_set`], logging instead of returning failures.
    pub fn set<K: IntoKey, V: IntoValue>(&mut self, key: K, value: V) {
        if let Err(err) = self.try_set(key, value) {
            warn!(%err, map = ?self.id, "set dropped");
        }
    }

    pub(crate) fn set_ref(&mut self, key: KeyRef<'_>, value: Option<Scalar>) -> Result<(), MapError> {
        let table = self.namespaces.table(key.kind());
        let res = self.engine.write(|e| match value {
            Some(v) => e.set(table, key, v),
            None => {
                e.remove(table, &key);
                Ok(())
            }
        });
        res.unwrap_or(Err(MapError::EngineClosed))
    }

    /// The value under `key` converted to `V`, or `V`'s zero value.
    pub fn get<V: FromScalar, K: IntoKey>(&self, key: K) -> V {
        match key.as_key() {
            Some(k) => self.get_ref(&k),
            None => V::from_scalar(None),
        }
    }

    pub(crate) fn get_ref<V: FromScalar>(&self, key: &KeyRef<'_>) -> V {
        let table = self.namespaces.table(key.kind());
        self.engine
            .read(|e| V::from_scalar(e.get(table, key)))
            .unwrap_or_else(|| V::from_scalar(None))
    }

    pub fn contains_key<K: IntoKey>(&self, key: K) -> bool {
        key.as_key().map(|k| self.contains_ref(&k)).unwrap_or(false)
    }

    pub(crate) fn contains_ref(&self, key: &KeyRef<'_>) -> bool {
        let table = self.namespaces.table(key.kind());
        self.engine
            .read(|e| e.contains_key(table, key))
            .unwrap_or(false)
    }

    /// Delete the entry for `key`. Returns whether an entry was removed.
    pub fn remove<K: IntoKey>(&mut self, key: K) -> bool {
        key.as_key().map(|k| self.remove_ref(&k)).unwrap_or(false)
    }

    pub(crate) fn remove_ref(&mut self, key: &KeyRef<'_>) -> bool {
        let table = self.namespaces.table(key.kind());
        self.engine
            .write(|e| e.remove(table, key))
            .unwrap_or(false)
    }

    /// Read the raw stored cell for a key chosen at run time.
    pub fn get_scalar(&self, key: &Scalar) -> Option<Scalar> {
        let k = key.as_key();
        if !k.is_valid_key() {
            return None;
        }
        self.get_ref(&k)
    }

    /// Store a raw cell under a key chosen at run time. `None` deletes.
    pub fn set_scalar(&mut self, key: &Scalar, value: Option<Scalar>) -> Result<(), MapError> {
        let k = key.as_key();
        if !k.is_valid_key() {
            return Ok(());
        }
        self.set_ref(k, value)
    }

    /// Number of live entries across all four namespaces.
    pub fn count(&self) -> usize {
        KeyKind::ALL.into_iter().map(|k| self.count_in(k)).sum()
    }

    pub fn count_in(&self, kind: KeyKind) -> usize {
        let table = self.namespaces.table(kind);
        self.engine.read(|e| e.len(table)).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn is_empty_in(&self, kind: KeyKind) -> bool {
        self.count_in(kind) == 0
    }

    /// Empty every namespace, keeping allocated storage.
    pub fn clear(&mut self) {
        for kind in KeyKind::ALL {
            self.clear_in(kind);
        }
    }

    /// Empty one namespace by walking it and removing each visited key.
    /// Storage is kept for reuse.
    pub fn clear_in(&mut self, kind: KeyKind) {
        let mut cursor = self.begin(kind);
        let mut removed = 0usize;
        while !cursor.is_end() {
            if self.remove_at(&cursor) {
                removed += 1;
            }
            self.advance(&mut cursor);
        }
        trace!(map = ?self.id, ?kind, removed, "namespace cleared");
    }

    /// Empty every namespace and release its storage.
    pub fn purge(&mut self) {
        for kind in KeyKind::ALL {
            self.purge_in(kind);
        }
    }

    /// Replace one namespace with a fresh empty table under the same
    /// token. Cursors on it fall to the end on their next step.
    pub fn purge_in(&mut self, kind: KeyKind) {
        let table = self.namespaces.table(kind);
        if self.engine.write(|e| e.reset_table(table)).is_some() {
            tracing::debug!(map = ?self.id, ?kind, "namespace purged");
        }
    }

    /// Bytes of table storage the engine currently accounts for, summed
    /// over every map sharing it.
    pub fn memory_in_use(&self) -> usize {
        self.engine.read(Engine::memory_in_use).unwrap_or(0)
    }
}

impl Default for TypedMap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypedMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedMap")
            .field("engine", &self.engine_id)
            .field("map", &self.id)
            .field("share", &self.is_share())
            .field("count", &self.count())
            .finish()
    }
}
