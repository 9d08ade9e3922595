// OrderedStringMap and DataMap integration tests.
//
// Each test documents what behavior is being verified and which
// invariants are assumed or asserted. The core invariants exercised:
// - Order: iteration follows first insertion; overwrite keeps position,
//   remove + re-insert moves to the tail.
// - Resizing: growth and shrink never reorder entries.
// - Boundaries: empty-map removal and out-of-range indexing fail with
//   typed errors.
// - Lenient reads: typed getters fall back to the caller's default.
use linked_strmap::{DataMap, Error, OrderedStringMap, Value, DEFAULT_CAPACITY};

fn keys<V>(m: &OrderedStringMap<V>) -> Vec<&str> {
    m.keys().collect()
}

// Test: put a, b, c; remove b; put b again.
// Verifies: the re-inserted key lands at the end with its new value.
#[test]
fn remove_then_reinsert_appends() {
    let mut m = DataMap::new();
    m.put("a", 1i32);
    m.put("b", 2i32);
    m.put("c", 3i32);
    assert_eq!(keys(&m), ["a", "b", "c"]);

    m.remove("b");
    assert_eq!(keys(&m), ["a", "c"]);

    m.put("b", 4i32);
    assert_eq!(keys(&m), ["a", "c", "b"]);
    assert_eq!(m.get_int("b", 0), 4);
}

// Test: insert across several doublings, then delete most entries.
// Assumes: growth happens at len > threshold, shrink at len < threshold / 4.
// Verifies: order matches first insertion before and after resizing.
#[test]
fn order_survives_growth_and_shrink() {
    let mut m: OrderedStringMap<u32> = OrderedStringMap::new();
    let names: Vec<String> = (0..300u32).map(|i| format!("{:08x}", i.wrapping_mul(2_654_435_761))).collect();
    for (i, k) in names.iter().enumerate() {
        m.put(k.as_str(), i as u32);
    }
    assert!(m.capacity() > DEFAULT_CAPACITY);
    assert!(m.keys().eq(names.iter().map(String::as_str)));

    let before = m.capacity();
    for k in names.iter().skip(10) {
        m.remove(k);
    }
    assert!(m.capacity() < before);
    assert!(m.keys().eq(names.iter().take(10).map(String::as_str)));
}

// Test: removal at both ends.
// Verifies: empty map yields NoSuchElement; otherwise head/tail are removed.
#[test]
fn remove_first_last_boundaries() {
    let mut m: OrderedStringMap<i32> = OrderedStringMap::new();
    assert!(matches!(m.remove_first(), Err(Error::NoSuchElement)));
    assert!(matches!(m.remove_last(), Err(Error::NoSuchElement)));

    m.extend([("x", 1), ("y", 2), ("z", 3)]);
    let (k, v) = m.remove_last().expect("non-empty");
    assert_eq!((k.as_str(), v), ("z", 3));
    let (k, v) = m.remove_first().expect("non-empty");
    assert_eq!((k.as_str(), v), ("x", 1));
    assert_eq!(keys(&m), ["y"]);
}

// Test: positional access.
// Verifies: get_index follows iteration order; index == len is out of range.
#[test]
fn get_index_bounds() {
    let m: OrderedStringMap<i32> = [("p", 1), ("q", 2)].into_iter().collect();
    assert_eq!(m.get_index(1).expect("in range"), ("q", &2));
    match m.get_index(2) {
        Err(Error::IndexOutOfRange { index, len }) => assert_eq!((index, len), (2, 2)),
        other => panic!("expected IndexOutOfRange, got {:?}", other),
    }
}

// Test: typed getters on mismatched or absent slots.
// Verifies: the caller's default comes back; no conversion between widths.
#[test]
fn typed_getters_fall_back_to_default() {
    let mut m = DataMap::new();
    m.put("n", 42i32);
    m.put("s", "hi");

    assert_eq!(m.get_int("n", 0), 42);
    assert_eq!(m.get_long("n", 7), 7);
    assert_eq!(m.get_int("s", -1), -1);
    assert_eq!(m.get_int("absent", 9), 9);
    assert_eq!(m.get_str("s"), Some("hi"));
    assert_eq!(m.get_str_or("n", "fallback"), "fallback");
}

// Test: cursor-driven editing over a DataMap.
// Verifies: removing during iteration keeps the remaining order and len.
#[test]
fn cursor_prunes_nulls() {
    let mut m = DataMap::new();
    for i in 0..40i32 {
        if i % 4 == 0 {
            m.put(format!("k{i}"), Value::Null);
        } else {
            m.put(format!("k{i}"), i);
        }
    }
    {
        let mut c = m.cursor_mut();
        while let Some((_, v)) = c.next() {
            if v.is_null() {
                c.remove().expect("current entry");
            }
        }
    }
    assert_eq!(m.len(), 30);
    let ints: Vec<i32> = m.values().filter_map(Value::as_int).collect();
    let expected: Vec<i32> = (0..40).filter(|i| i % 4 != 0).collect();
    assert_eq!(ints, expected);
}

// Test: equality and cloning.
// Verifies: maps with the same entries in different orders compare equal,
// and a clone is independent of its source.
#[test]
fn equality_is_order_insensitive() {
    let mut a = DataMap::new();
    a.put("x", 1i32);
    a.put("y", vec![1u8, 2]);
    let mut b = DataMap::new();
    b.put("y", vec![1u8, 2]);
    b.put("x", 1i32);
    assert_eq!(a, b);

    let mut c = a.clone();
    c.put("x", 2i32);
    assert_ne!(a, c);
    assert_eq!(a.get_int("x", 0), 1);
}
