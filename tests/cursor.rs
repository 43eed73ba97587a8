// Cursor protocol tests.
//
// The core invariants exercised:
// - begin/advance visits every live key of one namespace exactly once
//   and ends at a cursor equal to `end`.
// - Removing the current key mid-walk keeps the walk intact.
// - find yields a cursor on present keys and a distinct not-found state
//   on missing ones.
// - Equality: same map, same namespace, and same position.
// - Cursor-positioned reads and writes on end/not-found are no-ops.
use scalar_hashmap::{KeyKind, Pointer, Position, Scalar, TypedMap};
use std::collections::BTreeSet;

fn filled(n: isize) -> TypedMap {
    let mut m = TypedMap::new();
    for i in 0..n {
        m.set(i, i * 3);
    }
    m
}

// Test: complete walk.
// Verifies: each key once; final cursor equals end; advance returns
// true exactly n-1 times.
#[test]
fn walk_from_begin_to_end() {
    let m = filled(25);
    let mut c = m.begin(KeyKind::Integer);
    let mut seen = BTreeSet::new();
    let mut steps = 0;
    loop {
        assert!(seen.insert(m.key_at::<isize>(&c)));
        if !m.advance(&mut c) {
            break;
        }
        steps += 1;
    }
    assert_eq!(steps, 24);
    assert_eq!(seen, (0..25).collect::<BTreeSet<_>>());
    assert_eq!(c, m.end(KeyKind::Integer));
}

// Test: removal of the current key during a walk.
// Assumes: the dead-key contract of the table.
// Verifies: every key is still visited once; the namespace ends empty.
#[test]
fn removing_current_key_mid_walk_is_safe() {
    let mut m = filled(40);
    let mut c = m.begin(KeyKind::Integer);
    let mut seen = BTreeSet::new();
    while !c.is_end() {
        assert!(seen.insert(m.key_at::<isize>(&c)));
        assert!(m.remove_at(&c));
        assert!(!m.contains_at(&c));
        m.advance(&mut c);
    }
    assert_eq!(seen.len(), 40);
    assert!(m.is_empty());
}

// Test: removing every other key during a walk.
// Verifies: survivors are exactly the untouched keys.
#[test]
fn selective_removal_mid_walk() {
    let mut m = filled(30);
    let mut c = m.begin(KeyKind::Integer);
    while !c.is_end() {
        let k: isize = m.key_at(&c);
        if k % 2 == 0 {
            m.remove_at(&c);
        }
        m.advance(&mut c);
    }
    let left: BTreeSet<isize> = m
        .iter(KeyKind::Integer)
        .map(|(k, _)| match k {
            Scalar::Integer(i) => i,
            other => panic!("unexpected key {other:?}"),
        })
        .collect();
    assert_eq!(left, (0..30).filter(|k| k % 2 == 1).collect::<BTreeSet<_>>());
}

// Test: walks stay inside their namespace.
#[test]
fn walk_only_sees_its_namespace() {
    let mut m = TypedMap::new();
    let anchor = 1u16;
    m.set("a", 1);
    m.set(1, 1);
    m.set(1.0, 1);
    m.set(Pointer::from_ref(&anchor), 1);
    for kind in KeyKind::ALL {
        let c = m.begin(kind);
        assert_eq!(c.kind(), kind);
        assert_eq!(c.key().map(Scalar::kind), Some(kind));
        let mut c2 = c.clone();
        assert!(!m.advance(&mut c2));
    }
}

// Test: find and the not-found state.
// Verifies: not-found is distinct from end, reads zero, and does not advance.
#[test]
fn find_states() {
    let mut m = TypedMap::new();
    m.set(7.5, "seven and a half");
    let hit = m.find(7.5);
    assert_eq!(hit.position(), &Position::At(Scalar::Number(7.5)));
    assert_eq!(
        m.value_at::<Option<String>>(&hit).as_deref(),
        Some("seven and a half")
    );

    let mut miss = m.find(8.5);
    assert!(miss.is_not_found());
    assert_ne!(miss, m.end(KeyKind::Number));
    assert!(!m.advance(&mut miss));
    assert!(miss.is_not_found());
    assert_eq!(m.value_at::<Option<String>>(&miss), None);

    // Absent keys can never be found.
    assert!(m.find(None::<&str>).is_not_found());
    assert!(m.find(f64::NAN).is_not_found());
}

// Test: equality.
// Verifies: equal keys compare equal; namespace and map identity matter.
#[test]
fn cursor_equality() {
    let mut m = TypedMap::new();
    m.set("milk", 1);
    m.set(1, 1);
    assert_eq!(m.find("milk"), m.begin(KeyKind::Text));
    assert_eq!(m.end(KeyKind::Text), m.end(KeyKind::Text));
    assert_ne!(m.end(KeyKind::Text), m.end(KeyKind::Integer));
    assert_ne!(m.find("milk"), m.find(1));

    let other = TypedMap::new();
    assert_ne!(m.end(KeyKind::Text), other.end(KeyKind::Text));

    let share = m.share().unwrap();
    assert_ne!(m.end(KeyKind::Text), share.end(KeyKind::Text));
}

// Test: end cursors ignore writes and read zero values.
#[test]
fn end_cursor_is_inert() {
    let mut m = filled(3);
    let end = m.end(KeyKind::Integer);
    m.set_at(&end, 100);
    assert!(!m.remove_at(&end));
    assert!(!m.contains_at(&end));
    assert_eq!(m.value_at::<isize>(&end), 0);
    assert_eq!(m.key_at::<isize>(&end), 0);
    assert_eq!(m.count(), 3);
}

// Test: writing through a cursor.
// Verifies: set_at overwrites the current entry; absent text deletes it.
#[test]
fn set_through_cursor() {
    let mut m = TypedMap::new();
    m.set("a", "x");
    m.set("b", "y");
    let c = m.find("a");
    m.set_at(&c, "z");
    assert_eq!(m.get::<Option<String>, _>("a").as_deref(), Some("z"));
    m.set_at(&c, None::<&str>);
    assert!(!m.contains_key("a"));
    assert_eq!(m.count(), 1);
}

// Test: a cursor outlives removal of its key by someone else only as
// far as the dead-key contract allows: the key remains a continuation.
#[test]
fn removal_by_key_of_current_entry_still_continues() {
    let mut m = filled(5);
    let mut c = m.begin(KeyKind::Integer);
    let first: isize = m.key_at(&c);
    m.remove(first);
    let mut rest = 0;
    while m.advance(&mut c) {
        rest += 1;
    }
    assert_eq!(rest, 4);
}

// Test: purging the namespace makes outstanding cursors end.
#[test]
fn purge_degenerates_cursor_to_end() {
    let mut m = filled(10);
    let mut c = m.begin(KeyKind::Integer);
    m.advance(&mut c);
    m.purge_in(KeyKind::Integer);
    assert!(!m.advance(&mut c));
    assert!(c.is_end());
    assert!(m.begin(KeyKind::Integer).is_end());
}
