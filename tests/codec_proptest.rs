use linked_strmap::{from_bytes, map_from_bytes, map_to_bytes, to_bytes, DataMap, Value};
use proptest::collection::vec;
use proptest::prelude::*;
use uuid::Uuid;

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i8>().prop_map(Value::Byte),
        any::<u16>().prop_map(Value::Char),
        any::<i16>().prop_map(Value::Short),
        any::<i32>().prop_map(Value::Int),
        any::<i64>().prop_map(Value::Long),
        proptest::num::f32::NORMAL.prop_map(Value::Float),
        proptest::num::f64::NORMAL.prop_map(Value::Double),
        any::<u128>().prop_map(|n| Value::Uuid(Uuid::from_u128(n))),
    ]
}

fn arb_sequence() -> impl Strategy<Value = Value> {
    prop_oneof![
        vec(any::<bool>(), 0..8).prop_map(Value::BoolArray),
        vec(any::<u8>(), 0..16).prop_map(Value::ByteArray),
        vec(any::<u16>(), 0..8).prop_map(Value::CharArray),
        vec(any::<i16>(), 0..8).prop_map(Value::ShortArray),
        vec(any::<i32>(), 0..8).prop_map(Value::IntArray),
        vec(any::<i64>(), 0..8).prop_map(Value::LongArray),
        vec(proptest::num::f32::NORMAL, 0..8).prop_map(Value::FloatArray),
        vec(proptest::num::f64::NORMAL, 0..8).prop_map(Value::DoubleArray),
        ".{0,12}".prop_map(Value::String),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![arb_scalar(), arb_sequence()].prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            vec(inner.clone(), 0..8).prop_map(Value::List),
            vec(("[a-z]{0,4}", inner), 0..8)
                .prop_map(|entries| Value::Map(entries.into_iter().collect())),
        ]
    })
}

fn arb_map() -> impl Strategy<Value = DataMap> {
    vec(("[a-z]{0,6}", arb_value()), 0..12).prop_map(|entries| entries.into_iter().collect())
}

// Property: decode(encode(v)) == v for arbitrary value trees, and re-encoding
// the decoded tree reproduces the original bytes. Encoding walks maps in
// iteration order, so byte equality also pins key order at every level.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_value_round_trip(v in arb_value()) {
        let bytes = to_bytes(&v).expect("encode");
        let back = from_bytes(&bytes).expect("decode");
        prop_assert_eq!(&back, &v);
        prop_assert_eq!(to_bytes(&back).expect("re-encode"), bytes);
    }

    #[test]
    fn prop_map_round_trip(m in arb_map()) {
        let bytes = map_to_bytes(&m).expect("encode");
        let back = map_from_bytes(&bytes).expect("decode");
        prop_assert!(back.keys().eq(m.keys()));
        prop_assert_eq!(&back, &m);
        prop_assert_eq!(map_to_bytes(&back).expect("re-encode"), bytes);
    }

    // Arbitrary input either decodes or fails with an error; it never panics.
    #[test]
    fn prop_garbage_never_panics(bytes in vec(any::<u8>(), 0..256)) {
        let _ = from_bytes(&bytes);
        let _ = map_from_bytes(&bytes);
    }
}
