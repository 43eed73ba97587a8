//! Cursors: external iteration over one namespace of a map.
//!
//! A [`Cursor`] is a small value naming a map, a namespace and a position.
//! It owns no storage and never borrows the map, so the map can be
//! mutated through cursor-positioned calls in the middle of a walk.
//!
//! Stepping re-derives "the key after the current one" from the table, so
//! the only continuation state is the current key itself. Rules for
//! mutating during a walk:
//! - Removing the entry at the cursor's current key is safe; the walk
//!   continues with the following key.
//! - Overwriting any existing key is safe.
//! - Inserting new keys may or may not visit them, and may end the walk
//!   early if the table compacts.
//! - Removing any other key, or purging the namespace, leaves the cursor
//!   stale; a stale cursor falls to the end on its next step.

use crate::convert::{FromScalar, IntoKey, IntoValue};
use crate::engine::{EngineId, MapId, TableId};
use crate::error::MapError;
use crate::map::TypedMap;
use crate::scalar::{KeyKind, Scalar};
use crate::table::UnknownKey;

/// Where a cursor points.
#[derive(Clone, Debug, PartialEq)]
pub enum Position {
    /// On a key that was live when the cursor reached it.
    At(Scalar),
    /// Past the last entry.
    End,
    /// Produced by a lookup of a key that has no entry.
    NotFound,
}

/// Position within one namespace of one map.
///
/// Two cursors are equal when they belong to the same map and namespace
/// and are both at the end, both not-found, or on equal keys.
#[derive(Clone, Debug, PartialEq)]
pub struct Cursor {
    engine: EngineId,
    map: MapId,
    kind: KeyKind,
    position: Position,
}

impl Cursor {
    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn is_end(&self) -> bool {
        self.position == Position::End
    }

    pub fn is_not_found(&self) -> bool {
        self.position == Position::NotFound
    }

    /// The current key, if the cursor is on one.
    pub fn key(&self) -> Option<&Scalar> {
        match &self.position {
            Position::At(k) => Some(k),
            Position::End | Position::NotFound => None,
        }
    }

    /// The current key converted to `K`, or `K`'s zero value.
    pub fn key_as<K: FromScalar>(&self) -> K {
        K::from_scalar(self.key())
    }
}

impl TypedMap {
    fn cursor(&self, kind: KeyKind, position: Position) -> Cursor {
        Cursor {
            engine: self.engine_id,
            map: self.id,
            kind,
            position,
        }
    }

    /// The table a cursor walks, if the cursor belongs to this map.
    fn cursor_table(&self, cursor: &Cursor) -> Option<TableId> {
        (cursor.engine == self.engine_id && cursor.map == self.id)
            .then(|| self.namespaces.table(cursor.kind))
    }

    /// Cursor on the first entry of `kind`, or at the end if it is empty.
    pub fn begin(&self, kind: KeyKind) -> Cursor {
        let table = self.namespaces.table(kind);
        let first = self.engine.read(|e| e.next(table, None)).and_then(|r| r.ok().flatten());
        match first {
            Some((k, _)) => self.cursor(kind, Position::At(k)),
            None => self.end(kind),
        }
    }

    pub fn end(&self, kind: KeyKind) -> Cursor {
        self.cursor(kind, Position::End)
    }

    /// Cursor on `key` if it has an entry, otherwise a not-found cursor.
    pub fn find<K: IntoKey>(&self, key: K) -> Cursor {
        match key.as_key() {
            Some(k) if self.contains_ref(&k) => self.cursor(K::KIND, Position::At(k.to_scalar())),
            _ => self.cursor(K::KIND, Position::NotFound),
        }
    }

    /// Step to the next entry. Returns `true` if the cursor is now on an
    /// entry, `false` if it reached (or already was at) the end.
    ///
    /// A not-found cursor stays not-found. A cursor whose key the table no
    /// longer knows, or that belongs to another map, moves to the end.
    pub fn advance(&self, cursor: &mut Cursor) -> bool {
        let Position::At(current) = &cursor.position else {
            return false;
        };
        let step = match self.cursor_table(cursor) {
            Some(table) => self
                .engine
                .read(|e| e.next(table, Some(&current.as_key())))
                .unwrap_or(Err(UnknownKey)),
            None => Err(UnknownKey),
        };
        match step {
            Ok(Some((k, _))) => {
                cursor.position = Position::At(k);
                true
            }
            Ok(None) | Err(UnknownKey) => {
                cursor.position = Position::End;
                false
            }
        }
    }

    /// Value at the cursor converted to `V`, or `V`'s zero value when the
    /// cursor is not on a live entry of this map.
    pub fn value_at<V: FromScalar>(&self, cursor: &Cursor) -> V {
        match (self.cursor_table(cursor), cursor.key()) {
            (Some(_), Some(k)) => self.get_ref(&k.as_key()),
            _ => V::from_scalar(None),
        }
    }

    pub fn key_at<K: FromScalar>(&self, cursor: &Cursor) -> K {
        match self.cursor_table(cursor) {
            Some(_) => cursor.key_as(),
            None => K::from_scalar(None),
        }
    }

    pub fn contains_at(&self, cursor: &Cursor) -> bool {
        match (self.cursor_table(cursor), cursor.key()) {
            (Some(_), Some(k)) => self.contains_ref(&k.as_key()),
            _ => false,
        }
    }

    /// Store `value` at the cursor's key. A cursor at the end, not-found,
    /// or from another map is a no-op.
    pub fn try_set_at<V: IntoValue>(&mut self, cursor: &Cursor, value: V) -> Result<(), MapError> {
        match (self.cursor_table(cursor), cursor.key()) {
            (Some(_), Some(k)) => self.set_ref(k.as_key(), value.into_value()),
            _ => Ok(()),
        }
    }

    pub fn set_at<V: IntoValue>(&mut self, cursor: &Cursor, value: V) {
        if let Err(err) = self.try_set_at(cursor, value) {
            tracing::warn!(%err, map = ?self.id, "set at cursor dropped");
        }
    }

    /// Remove the entry at the cursor. The cursor stays valid and the
    /// next [`TypedMap::advance`] continues the walk.
    pub fn remove_at(&mut self, cursor: &Cursor) -> bool {
        match (self.cursor_table(cursor), cursor.key()) {
            (Some(_), Some(k)) => self.remove_ref(&k.as_key()),
            _ => false,
        }
    }

    /// Borrowing iterator over the `(key, value)` pairs of one namespace.
    pub fn iter(&self, kind: KeyKind) -> Iter<'_> {
        Iter {
            map: self,
            cursor: self.begin(kind),
        }
    }
}

/// Iterator over one namespace, driven by a [`Cursor`].
pub struct Iter<'a> {
    map: &'a TypedMap,
    cursor: Cursor,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (Scalar, Scalar);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let key = self.cursor.key()?.clone();
            let value: Option<Scalar> = self.map.value_at(&self.cursor);
            self.map.advance(&mut self.cursor);
            if let Some(value) = value {
                return Some((key, value));
            }
        }
    }
}
