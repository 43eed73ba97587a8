//! Scalar cells stored as keys and values.

use core::fmt;
use core::hash::{Hash, Hasher};
use std::rc::Rc;

/// The four key namespaces of a map. Every key lives in exactly one of
/// them; a `Number(1.0)` key and an `Integer(1)` key never meet.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum KeyKind {
    Text,
    Pointer,
    Number,
    Integer,
}

impl KeyKind {
    pub const ALL: [KeyKind; 4] = [
        KeyKind::Text,
        KeyKind::Pointer,
        KeyKind::Number,
        KeyKind::Integer,
    ];

    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            KeyKind::Text => 0,
            KeyKind::Pointer => 1,
            KeyKind::Number => 2,
            KeyKind::Integer => 3,
        }
    }
}

/// Opaque address stored by identity. The map never dereferences it.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Pointer(*const ());

impl Pointer {
    pub const fn null() -> Self {
        Pointer(core::ptr::null())
    }

    pub fn new<T>(p: *const T) -> Self {
        Pointer(p.cast())
    }

    pub fn from_ref<T>(r: &T) -> Self {
        Pointer::new(r as *const T)
    }

    pub fn as_ptr<T>(self) -> *const T {
        self.0.cast()
    }

    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

impl Default for Pointer {
    fn default() -> Self {
        Pointer::null()
    }
}

impl fmt::Debug for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pointer({:p})", self.0)
    }
}

/// Tagged scalar used for both keys and values.
///
/// Equality is type-homogeneous: values of different variants are never
/// equal, even when they denote the same magnitude. Text compares by
/// content, Pointer by address, Number and Integer by value.
#[derive(Clone, Debug)]
pub enum Scalar {
    Text(Rc<str>),
    Pointer(Pointer),
    Number(f64),
    Integer(isize),
}

impl Scalar {
    pub fn kind(&self) -> KeyKind {
        match self {
            Scalar::Text(_) => KeyKind::Text,
            Scalar::Pointer(_) => KeyKind::Pointer,
            Scalar::Number(_) => KeyKind::Number,
            Scalar::Integer(_) => KeyKind::Integer,
        }
    }

    pub fn text(s: &str) -> Self {
        Scalar::Text(Rc::from(s))
    }

    /// Whether this scalar may be used as a key. NaN is the only
    /// scalar that cannot: it would never compare equal to itself.
    pub fn is_valid_key(&self) -> bool {
        self.as_key().is_valid_key()
    }

    pub fn as_key(&self) -> KeyRef<'_> {
        match self {
            Scalar::Text(s) => KeyRef::Text(s),
            Scalar::Pointer(p) => KeyRef::Pointer(*p),
            Scalar::Number(n) => KeyRef::Number(*n),
            Scalar::Integer(i) => KeyRef::Integer(*i),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Text(a), Scalar::Text(b)) => a == b,
            (Scalar::Pointer(a), Scalar::Pointer(b)) => a == b,
            (Scalar::Number(a), Scalar::Number(b)) => a == b,
            (Scalar::Integer(a), Scalar::Integer(b)) => a == b,
            _ => false,
        }
    }
}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_key().hash(state)
    }
}

/// Borrowed view of a key, used for lookups so probing a Text key does
/// not allocate. Hashes exactly like the owned [`Scalar`] it mirrors.
#[derive(Copy, Clone, Debug)]
pub enum KeyRef<'a> {
    Text(&'a str),
    Pointer(Pointer),
    Number(f64),
    Integer(isize),
}

impl<'a> KeyRef<'a> {
    pub fn kind(&self) -> KeyKind {
        match self {
            KeyRef::Text(_) => KeyKind::Text,
            KeyRef::Pointer(_) => KeyKind::Pointer,
            KeyRef::Number(_) => KeyKind::Number,
            KeyRef::Integer(_) => KeyKind::Integer,
        }
    }

    pub fn is_valid_key(&self) -> bool {
        !matches!(self, KeyRef::Number(n) if n.is_nan())
    }

    /// Whether `stored` is the same key as `self`.
    #[inline]
    pub(crate) fn matches(&self, stored: &Scalar) -> bool {
        match (self, stored) {
            (KeyRef::Text(a), Scalar::Text(b)) => *a == &**b,
            (KeyRef::Pointer(a), Scalar::Pointer(b)) => a == b,
            (KeyRef::Number(a), Scalar::Number(b)) => a == b,
            (KeyRef::Integer(a), Scalar::Integer(b)) => a == b,
            _ => false,
        }
    }

    pub fn to_scalar(self) -> Scalar {
        match self {
            KeyRef::Text(s) => Scalar::text(s),
            KeyRef::Pointer(p) => Scalar::Pointer(p),
            KeyRef::Number(n) => Scalar::Number(n),
            KeyRef::Integer(i) => Scalar::Integer(i),
        }
    }
}

impl Hash for KeyRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        match self {
            KeyRef::Text(s) => s.hash(state),
            KeyRef::Pointer(p) => p.hash(state),
            // 0.0 and -0.0 compare equal and must hash alike.
            KeyRef::Number(n) => {
                let n = if *n == 0.0 { 0.0f64 } else { *n };
                n.to_bits().hash(state)
            }
            KeyRef::Integer(i) => i.hash(state),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::text(s)
    }
}

impl From<Pointer> for Scalar {
    fn from(p: Pointer) -> Self {
        Scalar::Pointer(p)
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Number(n)
    }
}

impl From<isize> for Scalar {
    fn from(i: isize) -> Self {
        Scalar::Integer(i)
    }
}
