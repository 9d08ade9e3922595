// Codec integration tests.
//
// The core invariants exercised:
// - Round trip: decode(encode(m)) equals m, with the same key order at every
//   nesting level.
// - Transient values vanish on encode without corrupting counts.
// - Blobs need a registered decoder; unknown names fail cleanly.
// - Input is consumed exactly; trailing bytes are malformed.
use linked_strmap::{
    from_bytes, map_from_bytes, map_from_bytes_with, map_to_bytes, to_bytes, Blob, BlobRegistry,
    CodecOptions, DataMap, Decoder, Encoder, Error, Tag, Transient, Value,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
struct Settings {
    volume: u8,
    title: String,
}

fn key_order(m: &DataMap) -> Vec<String> {
    m.keys().map(str::to_owned).collect()
}

// Test: {"n": 42, "s": "hi", "child": {"x": true}}.
// Verifies: values and key order at both levels survive a round trip.
#[test]
fn nested_scenario_round_trips() {
    let mut child = DataMap::new();
    child.put("x", true);
    let mut m = DataMap::new();
    m.put("n", 42i32);
    m.put("s", "hi");
    m.put("child", child);

    let bytes = map_to_bytes(&m).expect("encode");
    let back = map_from_bytes(&bytes).expect("decode");

    assert_eq!(back, m);
    assert_eq!(key_order(&back), ["n", "s", "child"]);
    assert_eq!(back.get_int("n", 0), 42);
    assert_eq!(back.get_str("s"), Some("hi"));
    assert!(back.get_map("child").expect("child map").get_bool("x", false));
}

// Test: one entry of every encodable variant, at depth 3.
// Verifies: each payload width and every array kind decodes unchanged.
#[test]
fn every_variant_round_trips_at_depth_three() {
    let mut leaf = DataMap::new();
    leaf.put("null", Value::Null);
    leaf.put("bool", false);
    leaf.put("byte", -3i8);
    leaf.put("char", Value::Char(0x263a));
    leaf.put("short", -300i16);
    leaf.put("int", i32::MIN);
    leaf.put("long", i64::MAX);
    leaf.put("float", 1.5f32);
    leaf.put("double", -0.25f64);
    leaf.put("bools", vec![true, false, true]);
    leaf.put("bytes", vec![0u8, 255]);
    leaf.put("chars", vec![0x48u16, 0x69]);
    leaf.put("shorts", vec![i16::MIN, 0, i16::MAX]);
    leaf.put("ints", vec![1i32, -1]);
    leaf.put("longs", Vec::<i64>::new());
    leaf.put("floats", vec![f32::MAX]);
    leaf.put("doubles", vec![f64::MIN_POSITIVE]);
    leaf.put("string", "");
    leaf.put("uuid", Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef));

    let mut mid = DataMap::new();
    mid.put("leaf", leaf);
    let mut top = DataMap::new();
    top.put("mid", mid);

    let back = map_from_bytes(&map_to_bytes(&top).expect("encode")).expect("decode");
    assert_eq!(back, top);

    let leaf_back = back
        .get_map("mid")
        .and_then(|m| m.get_map("leaf"))
        .expect("leaf");
    let order: Vec<&str> = leaf_back.keys().collect();
    assert_eq!(order.first(), Some(&"null"));
    assert_eq!(order.last(), Some(&"uuid"));
    assert_eq!(order.len(), 19);
}

// Test: a list whose elements are maps.
// Verifies: list order and each element map's key order are preserved.
#[test]
fn list_of_maps_round_trips() {
    let rows: Vec<Value> = (0..5i32)
        .map(|i| {
            let mut row = DataMap::new();
            row.put("id", i);
            row.put("label", format!("row {i}"));
            Value::Map(row)
        })
        .collect();
    let value = Value::List(rows);

    let back = from_bytes(&to_bytes(&value).expect("encode")).expect("decode");
    assert_eq!(back, value);
    let second = back.as_list().and_then(|l| l[1].as_map()).expect("row 1");
    assert_eq!(second.get_str("label"), Some("row 1"));
}

// Test: serde-backed blob.
// Verifies: a registered type decodes to an equal blob; without the
// registration the stream is rejected with the type name.
#[test]
fn serde_blob_needs_registration() {
    let mut m = DataMap::new();
    m.put(
        "settings",
        Blob::serde(Settings {
            volume: 7,
            title: "main".into(),
        }),
    );
    let bytes = map_to_bytes(&m).expect("encode");

    match map_from_bytes(&bytes) {
        Err(Error::UnknownBlobType(name)) => assert!(name.ends_with("Settings")),
        other => panic!("expected UnknownBlobType, got {:?}", other),
    }

    let mut registry = BlobRegistry::new();
    registry.register_serde::<Settings>();
    let back = map_from_bytes_with(&bytes, &registry).expect("decode");
    assert_eq!(back, m);
    let settings = back
        .get("settings")
        .and_then(Value::as_blob)
        .and_then(|b| b.serde_value::<Settings>())
        .expect("settings blob");
    assert_eq!(settings.volume, 7);
}

// Test: transient entries mixed into a map.
// Verifies: they are dropped and the remaining entries decode in order.
#[test]
fn transient_entries_are_not_persisted() {
    let mut m = DataMap::new();
    m.put("a", 1i32);
    m.put("cache", Transient::new(vec![0u8; 16]));
    m.put("b", 2i32);

    let back = map_from_bytes(&map_to_bytes(&m).expect("encode")).expect("decode");
    assert_eq!(key_order(&back), ["a", "b"]);
    assert!(m.get("cache").is_some());
}

// Test: streaming through Encoder/Decoder with several values back to back.
// Verifies: each read consumes exactly one value.
#[test]
fn encoder_decoder_stream_multiple_values() {
    let mut buf = Vec::new();
    {
        let mut enc = Encoder::new(&mut buf);
        enc.write_value(&Value::Int(1)).expect("int");
        enc.write_value(&Value::from("two")).expect("string");
        let mut m = DataMap::new();
        m.put("three", 3i64);
        enc.write_map(&m).expect("map");
    }

    let mut dec = Decoder::new(buf.as_slice());
    assert_eq!(dec.read_value().expect("int"), Value::Int(1));
    assert_eq!(dec.read_value().expect("string"), Value::from("two"));
    assert_eq!(dec.read_map().expect("map").get_long("three", 0), 3);
    assert!(dec.into_inner().is_empty());
}

// Test: hostile length prefixes.
// Verifies: huge declared counts fail as truncated instead of allocating,
// and trailing bytes after a complete value are rejected.
#[test]
fn malformed_streams_are_rejected() {
    let huge_map = [0x7f, 0xff, 0xff, 0xff];
    assert!(matches!(map_from_bytes(&huge_map), Err(Error::Truncated)));

    let huge_string = [Tag::String as u8, 0x7f, 0xff, 0xff, 0xff, 0x00];
    assert!(matches!(from_bytes(&huge_string), Err(Error::Truncated)));

    let mut bytes = to_bytes(&Value::Bool(true)).expect("encode");
    bytes.push(0);
    assert!(matches!(from_bytes(&bytes), Err(Error::Malformed(_))));

    let opts = CodecOptions {
        max_prealloc: 0,
        ..CodecOptions::default()
    };
    let ok = to_bytes(&Value::IntArray(vec![5; 100])).expect("encode");
    let mut dec = Decoder::new(ok.as_slice()).with_options(opts);
    assert_eq!(dec.read_value().expect("decode"), Value::IntArray(vec![5; 100]));
}
