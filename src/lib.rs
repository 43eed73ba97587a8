//! scalar-hashmap: a single-threaded map keyed and valued by typed
//! scalars (Text, Pointer, Number, Integer), with cursors that survive
//! removal of the current entry and shares that multiplex several
//! isolated maps onto one table engine.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one map type that takes any of four scalar key kinds and any of
//!   four scalar value kinds, without the kinds interfering.
//! - Layers:
//!   - Table: hashed key/value storage with in-place deletion ("dead
//!     keys") so a walk can continue from a removed key.
//!   - Engine: registry of tables under generational tokens plus a
//!     registry of logical maps; checks growth against an allocation
//!     policy.
//!   - TypedMap: public API. Routes each key to the namespace table of its
//!     kind and converts stored cells to the requested Rust type.
//!   - Cursor: value-type position in one namespace; stepping re-derives
//!     the following key from the table.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` (engine shared through `Rc`).
//! - Namespaces are disjoint: `Number(1.0)`, `Integer(1)` and `Text("1")`
//!   are three different keys.
//! - Missing keys read as zero values; there is no error for a miss.
//! - Absent Text stored as a value deletes the entry. A null Pointer or a
//!   zero number is an ordinary value.
//!
//! Shares
//! - [`TypedMap::share`] registers four new tables on the same engine and
//!   returns a map that holds only a weak reference to it. Shares are
//!   invisible to each other and to the owner.
//! - Dropping the owner closes the engine. Shares should be dropped first;
//!   one that outlives its owner reads as empty and refuses writes.
//!
//! Mutation during iteration
//! - Removing the cursor's current entry, or overwriting any entry, is
//!   safe mid-walk. Removing other keys or purging makes cursors stale;
//!   a stale cursor ends its walk on the next step.
//!
//! Reentrancy
//! - The engine sits in a `RefCell`. An allocation policy that calls back
//!   into a map on the same engine panics with a borrow error.

mod config;
mod convert;
mod cursor;
mod engine;
mod error;
mod map;
mod namespace;
mod scalar;
mod share;
mod table;
#[cfg(test)]
mod table_proptest;

// Public surface
pub use config::{AllocPolicy, MapConfig, SizeHints, Unlimited};
pub use convert::{FromScalar, IntoKey, IntoValue};
pub use cursor::{Cursor, Iter, Position};
pub use error::MapError;
pub use map::TypedMap;
pub use scalar::{KeyKind, KeyRef, Pointer, Scalar};
