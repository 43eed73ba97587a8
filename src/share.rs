//! Shares: extra logical maps multiplexed onto one engine instance.
//!
//! The owner holds the only strong reference to its engine; shares hold
//! a `Weak`. A share registers four fresh namespaces with the engine, so
//! it never sees the owner's or a sibling's entries. Dropping a share
//! unregisters just those namespaces. Dropping the owner closes the
//! engine; a share that outlives it behaves as a closed map: writes fail
//! with `EngineClosed`, reads return zero values.

use crate::config::SizeHints;
use crate::engine::Engine;
use crate::error::MapError;
use crate::map::TypedMap;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{debug, warn};

pub(crate) enum EngineRef {
    Owner(Rc<RefCell<Engine>>),
    Share(Weak<RefCell<Engine>>),
}

impl EngineRef {
    pub(crate) fn upgrade(&self) -> Option<Rc<RefCell<Engine>>> {
        match self {
            EngineRef::Owner(rc) => Some(rc.clone()),
            EngineRef::Share(weak) => weak.upgrade(),
        }
    }

    /// Run `f` against the engine, or return `None` if it is closed.
    pub(crate) fn read<R>(&self, f: impl FnOnce(&Engine) -> R) -> Option<R> {
        match self {
            EngineRef::Owner(rc) => Some(f(&rc.borrow())),
            EngineRef::Share(weak) => {
                let rc = weak.upgrade()?;
                let engine = rc.borrow();
                Some(f(&engine))
            }
        }
    }

    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut Engine) -> R) -> Option<R> {
        match self {
            EngineRef::Owner(rc) => Some(f(&mut rc.borrow_mut())),
            EngineRef::Share(weak) => {
                let rc = weak.upgrade()?;
                let mut engine = rc.borrow_mut();
                Some(f(&mut engine))
            }
        }
    }
}

impl TypedMap {
    /// Create a new, empty map on this map's engine instance.
    ///
    /// The share is invisible to this map and to every other share. It
    /// must not outlive the engine's owner to be useful; once the owner is
    /// dropped the share reads as empty and refuses writes.
    pub fn share(&self) -> Result<TypedMap, MapError> {
        self.share_with_hints(SizeHints::new())
    }

    /// Like [`TypedMap::share`], presizing the share's namespaces.
    pub fn share_with_hints(&self, hints: SizeHints) -> Result<TypedMap, MapError> {
        let rc = self.engine.upgrade().ok_or(MapError::EngineClosed)?;
        let (id, namespaces) = rc.borrow_mut().register_map(&hints)?;
        debug!(engine = ?self.engine_id, share = ?id, "share created");
        Ok(TypedMap {
            engine: EngineRef::Share(Rc::downgrade(&rc)),
            id,
            namespaces,
            engine_id: self.engine_id,
        })
    }

    pub fn is_share(&self) -> bool {
        matches!(self.engine, EngineRef::Share(_))
    }

    /// Whether the engine behind this map has been closed by its owner.
    pub fn is_closed(&self) -> bool {
        self.engine.upgrade().is_none()
    }

    /// Number of logical maps (owner included) living on this engine.
    pub fn maps_on_engine(&self) -> usize {
        self.engine.read(Engine::map_count).unwrap_or(0)
    }
}

impl Drop for TypedMap {
    fn drop(&mut self) {
        match &self.engine {
            EngineRef::Owner(rc) => {
                let Ok(mut engine) = rc.try_borrow_mut() else {
                    return;
                };
                engine.unregister_map(self.id);
                let orphaned = engine.map_count();
                if orphaned > 0 {
                    warn!(engine = ?self.engine_id, orphaned, "closing engine with live shares");
                }
            }
            EngineRef::Share(weak) => {
                if let Some(rc) = weak.upgrade() {
                    if let Ok(mut engine) = rc.try_borrow_mut() {
                        engine.unregister_map(self.id);
                        debug!(engine = ?self.engine_id, share = ?self.id, "share freed");
                    }
                }
            }
        }
    }
}
