//! Construction-time configuration: size hints and the allocation policy.

use crate::scalar::KeyKind;
use core::fmt;
use std::rc::Rc;

/// Hook consulted whenever table storage changes size.
///
/// `resize(old, new)` is called before storage grows from `old` to `new`
/// bytes; returning `false` refuses the growth. Releases are reported
/// with `new == 0` and their return value is ignored. Any state the hook
/// needs travels inside the implementing value.
pub trait AllocPolicy {
    fn resize(&self, old_bytes: usize, new_bytes: usize) -> bool;
}

impl<F> AllocPolicy for F
where
    F: Fn(usize, usize) -> bool,
{
    fn resize(&self, old_bytes: usize, new_bytes: usize) -> bool {
        self(old_bytes, new_bytes)
    }
}

/// Policy that grants every request.
#[derive(Copy, Clone, Debug, Default)]
pub struct Unlimited;

impl AllocPolicy for Unlimited {
    fn resize(&self, _old_bytes: usize, _new_bytes: usize) -> bool {
        true
    }
}

/// Initial capacity for each key namespace.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SizeHints {
    per_kind: [usize; 4],
}

impl SizeHints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size one namespace. Sequence-like (array) and keyed (hash)
    /// element counts share one table, so both are summed.
    pub fn with(mut self, kind: KeyKind, array_elements: usize, hash_elements: usize) -> Self {
        self.per_kind[kind.index()] = array_elements.saturating_add(hash_elements);
        self
    }

    pub fn get(&self, kind: KeyKind) -> usize {
        self.per_kind[kind.index()]
    }
}

/// Configuration for a fresh engine instance and its primary map.
#[derive(Clone, Default)]
pub struct MapConfig {
    pub(crate) hints: SizeHints,
    pub(crate) policy: Option<Rc<dyn AllocPolicy>>,
}

impl MapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size_hints(mut self, hints: SizeHints) -> Self {
        self.hints = hints;
        self
    }

    pub fn size_hint(mut self, kind: KeyKind, array_elements: usize, hash_elements: usize) -> Self {
        self.hints = self.hints.with(kind, array_elements, hash_elements);
        self
    }

    pub fn policy<P: AllocPolicy + 'static>(mut self, policy: P) -> Self {
        self.policy = Some(Rc::new(policy));
        self
    }

    pub(crate) fn take_policy(&mut self) -> Rc<dyn AllocPolicy> {
        self.policy.take().unwrap_or_else(|| Rc::new(Unlimited))
    }
}

impl fmt::Debug for MapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapConfig")
            .field("hints", &self.hints)
            .field("custom_policy", &self.policy.is_some())
            .finish()
    }
}
