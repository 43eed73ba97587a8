//! Conversions between Rust values and stored scalars.
//!
//! [`IntoKey`] and [`IntoValue`] pick the namespace and the stored cell
//! for an input; [`FromScalar`] turns a stored cell (or its absence) into
//! the requested output type. Together they replace one typed entry point
//! per (key type, value type) pair.
//!
//! Reads coerce the way the table engine's scalars do:
//! - Integer and Number convert numerically; Number to Integer truncates
//!   toward zero and saturates.
//! - Numeric Text parses to Number or Integer; other Text reads as zero.
//! - Number and Integer read as their decimal Text.
//! - Pointer is only produced by a stored Pointer.
//!
//! A missing entry always reads as the zero value: `None`, a null
//! `Pointer`, `0.0` or `0`.

use crate::scalar::{KeyKind, KeyRef, Pointer, Scalar};
use std::rc::Rc;

/// A value usable as a map key. `as_key` returning `None` means the key is
/// the absent sentinel and the operation is skipped.
pub trait IntoKey {
    const KIND: KeyKind;

    fn as_key(&self) -> Option<KeyRef<'_>>;
}

impl IntoKey for &str {
    const KIND: KeyKind = KeyKind::Text;
    fn as_key(&self) -> Option<KeyRef<'_>> {
        Some(KeyRef::Text(self))
    }
}

impl IntoKey for String {
    const KIND: KeyKind = KeyKind::Text;
    fn as_key(&self) -> Option<KeyRef<'_>> {
        Some(KeyRef::Text(self))
    }
}

impl IntoKey for &String {
    const KIND: KeyKind = KeyKind::Text;
    fn as_key(&self) -> Option<KeyRef<'_>> {
        Some(KeyRef::Text(self))
    }
}

impl IntoKey for Rc<str> {
    const KIND: KeyKind = KeyKind::Text;
    fn as_key(&self) -> Option<KeyRef<'_>> {
        Some(KeyRef::Text(self))
    }
}

impl IntoKey for Option<&str> {
    const KIND: KeyKind = KeyKind::Text;
    fn as_key(&self) -> Option<KeyRef<'_>> {
        self.map(KeyRef::Text)
    }
}

impl IntoKey for Pointer {
    const KIND: KeyKind = KeyKind::Pointer;
    fn as_key(&self) -> Option<KeyRef<'_>> {
        Some(KeyRef::Pointer(*self))
    }
}

impl IntoKey for f64 {
    const KIND: KeyKind = KeyKind::Number;
    fn as_key(&self) -> Option<KeyRef<'_>> {
        let k = KeyRef::Number(*self);
        k.is_valid_key().then_some(k)
    }
}

impl IntoKey for f32 {
    const KIND: KeyKind = KeyKind::Number;
    fn as_key(&self) -> Option<KeyRef<'_>> {
        let k = KeyRef::Number(*self as f64);
        k.is_valid_key().then_some(k)
    }
}

macro_rules! integer_key {
    ($($t:ty),*) => {$(
        impl IntoKey for $t {
            const KIND: KeyKind = KeyKind::Integer;
            fn as_key(&self) -> Option<KeyRef<'_>> {
                Some(KeyRef::Integer(*self as isize))
            }
        }
    )*};
}

integer_key!(isize, i64, i32);

/// A value that can be stored. `None` is only produced by absent Text,
/// and storing it deletes the entry.
pub trait IntoValue {
    fn into_value(self) -> Option<Scalar>;
}

impl IntoValue for &str {
    fn into_value(self) -> Option<Scalar> {
        Some(Scalar::text(self))
    }
}

impl IntoValue for String {
    fn into_value(self) -> Option<Scalar> {
        Some(Scalar::Text(Rc::from(self)))
    }
}

impl IntoValue for &String {
    fn into_value(self) -> Option<Scalar> {
        Some(Scalar::text(self))
    }
}

impl IntoValue for Rc<str> {
    fn into_value(self) -> Option<Scalar> {
        Some(Scalar::Text(self))
    }
}

impl IntoValue for Option<&str> {
    fn into_value(self) -> Option<Scalar> {
        self.map(Scalar::text)
    }
}

impl IntoValue for Option<String> {
    fn into_value(self) -> Option<Scalar> {
        self.and_then(IntoValue::into_value)
    }
}

impl IntoValue for Pointer {
    fn into_value(self) -> Option<Scalar> {
        Some(Scalar::Pointer(self))
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Option<Scalar> {
        Some(Scalar::Number(self))
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Option<Scalar> {
        Some(Scalar::Number(self as f64))
    }
}

impl IntoValue for Scalar {
    fn into_value(self) -> Option<Scalar> {
        Some(self)
    }
}

impl IntoValue for Option<Scalar> {
    fn into_value(self) -> Option<Scalar> {
        self
    }
}

macro_rules! integer_value {
    ($($t:ty),*) => {$(
        impl IntoValue for $t {
            fn into_value(self) -> Option<Scalar> {
                Some(Scalar::Integer(self as isize))
            }
        }
    )*};
}

integer_value!(isize, i64, i32);

/// Typed read of a stored cell.
pub trait FromScalar: Sized {
    fn from_scalar(stored: Option<&Scalar>) -> Self;
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}

fn number_to_integer(n: f64) -> isize {
    if n.is_nan() {
        0
    } else {
        n.trunc() as isize
    }
}

impl FromScalar for f64 {
    fn from_scalar(stored: Option<&Scalar>) -> Self {
        match stored {
            Some(Scalar::Number(n)) => *n,
            Some(Scalar::Integer(i)) => *i as f64,
            Some(Scalar::Text(s)) => parse_number(s).unwrap_or(0.0),
            Some(Scalar::Pointer(_)) | None => 0.0,
        }
    }
}

impl FromScalar for isize {
    fn from_scalar(stored: Option<&Scalar>) -> Self {
        match stored {
            Some(Scalar::Integer(i)) => *i,
            Some(Scalar::Number(n)) => number_to_integer(*n),
            Some(Scalar::Text(s)) => s
                .trim()
                .parse::<isize>()
                .ok()
                .or_else(|| parse_number(s).map(number_to_integer))
                .unwrap_or(0),
            Some(Scalar::Pointer(_)) | None => 0,
        }
    }
}

impl FromScalar for i64 {
    fn from_scalar(stored: Option<&Scalar>) -> Self {
        isize::from_scalar(stored) as i64
    }
}

impl FromScalar for Pointer {
    fn from_scalar(stored: Option<&Scalar>) -> Self {
        match stored {
            Some(Scalar::Pointer(p)) => *p,
            _ => Pointer::null(),
        }
    }
}

impl FromScalar for Option<Rc<str>> {
    fn from_scalar(stored: Option<&Scalar>) -> Self {
        match stored? {
            Scalar::Text(s) => Some(s.clone()),
            Scalar::Number(n) => Some(Rc::from(n.to_string())),
            Scalar::Integer(i) => Some(Rc::from(i.to_string())),
            Scalar::Pointer(_) => None,
        }
    }
}

impl FromScalar for Option<String> {
    fn from_scalar(stored: Option<&Scalar>) -> Self {
        match stored? {
            Scalar::Text(s) => Some(s.to_string()),
            Scalar::Number(n) => Some(n.to_string()),
            Scalar::Integer(i) => Some(i.to_string()),
            Scalar::Pointer(_) => None,
        }
    }
}

impl FromScalar for Option<Scalar> {
    fn from_scalar(stored: Option<&Scalar>) -> Self {
        stored.cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_kinds_follow_rust_types() {
        assert_eq!(<&str as IntoKey>::KIND, KeyKind::Text);
        assert_eq!(<Pointer as IntoKey>::KIND, KeyKind::Pointer);
        assert_eq!(<f64 as IntoKey>::KIND, KeyKind::Number);
        assert_eq!(<i32 as IntoKey>::KIND, KeyKind::Integer);
        assert_eq!(<i64 as IntoKey>::KIND, KeyKind::Integer);
    }

    #[test]
    fn absent_keys() {
        assert!(None::<&str>.as_key().is_none());
        assert!(f64::NAN.as_key().is_none());
        assert!(f32::NAN.as_key().is_none());
        assert!(Pointer::null().as_key().is_some());
        assert!("".as_key().is_some());
    }

    #[test]
    fn only_absent_text_is_an_absent_value() {
        assert!(None::<&str>.into_value().is_none());
        assert!(None::<String>.into_value().is_none());
        assert_eq!(Pointer::null().into_value(), Some(Scalar::Pointer(Pointer::null())));
        assert_eq!(0.0f64.into_value(), Some(Scalar::Number(0.0)));
        assert_eq!(0i32.into_value(), Some(Scalar::Integer(0)));
    }

    #[test]
    fn missing_entries_read_as_zero() {
        assert_eq!(f64::from_scalar(None), 0.0);
        assert_eq!(isize::from_scalar(None), 0);
        assert!(Pointer::from_scalar(None).is_null());
        assert_eq!(<Option<String>>::from_scalar(None), None);
    }

    #[test]
    fn numeric_coercions() {
        assert_eq!(isize::from_scalar(Some(&Scalar::Number(3.99))), 3);
        assert_eq!(isize::from_scalar(Some(&Scalar::Number(-3.99))), -3);
        assert_eq!(f64::from_scalar(Some(&Scalar::Integer(7))), 7.0);
        assert_eq!(f64::from_scalar(Some(&Scalar::text(" 4.5 "))), 4.5);
        assert_eq!(isize::from_scalar(Some(&Scalar::text("12"))), 12);
        assert_eq!(isize::from_scalar(Some(&Scalar::text("12.7"))), 12);
        assert_eq!(isize::from_scalar(Some(&Scalar::text("milk"))), 0);
        assert_eq!(
            <Option<String>>::from_scalar(Some(&Scalar::Number(3.99))).as_deref(),
            Some("3.99")
        );
        assert_eq!(
            <Option<String>>::from_scalar(Some(&Scalar::Integer(-2))).as_deref(),
            Some("-2")
        );
    }

    #[test]
    fn pointers_only_read_from_pointers() {
        let x = 1u8;
        let p = Pointer::from_ref(&x);
        assert_eq!(Pointer::from_scalar(Some(&Scalar::Pointer(p))), p);
        assert!(Pointer::from_scalar(Some(&Scalar::Integer(1))).is_null());
        assert_eq!(<Option<String>>::from_scalar(Some(&Scalar::Pointer(p))), None);
        assert_eq!(f64::from_scalar(Some(&Scalar::Pointer(p))), 0.0);
    }
}
