//! Lenient typed getters for maps of [`Value`]s.
//!
//! A getter returns the stored payload only when the variant matches exactly.
//! An absent key or a stored `Null` yields the default silently; any other
//! variant yields the default and logs a warning. No numeric conversions are
//! attempted.

use crate::map::OrderedStringMap;
use crate::value::{DataMap, Value};
use core::fmt;
use core::hash::BuildHasher;
use uuid::Uuid;

fn mismatch(key: &str, expected: &str, found: &Value, default: &dyn fmt::Debug) {
    log::warn!(
        "key `{key}` expected {expected} but holds {}; returning default {default:?}",
        found.type_name()
    );
}

macro_rules! scalar_getters {
    ($($name:ident => $variant:ident($t:ty), $expected:literal;)*) => {
        $(
            pub fn $name(&self, key: &str, default: $t) -> $t {
                match self.get(key) {
                    Some(Value::$variant(v)) => *v,
                    None | Some(Value::Null) => default,
                    Some(other) => {
                        mismatch(key, $expected, other, &default);
                        default
                    }
                }
            }
        )*
    };
}

macro_rules! slice_getters {
    ($($name:ident => $variant:ident($t:ty), $expected:literal;)*) => {
        $(
            pub fn $name(&self, key: &str) -> Option<&$t> {
                match self.get(key)? {
                    Value::$variant(v) => Some(&v[..]),
                    Value::Null => None,
                    other => {
                        mismatch(key, $expected, other, &None::<()>);
                        None
                    }
                }
            }
        )*
    };
}

impl<S: BuildHasher> OrderedStringMap<Value, S> {
    scalar_getters! {
        get_bool => Bool(bool), "bool";
        get_byte => Byte(i8), "byte";
        get_char => Char(u16), "char";
        get_short => Short(i16), "short";
        get_int => Int(i32), "int";
        get_long => Long(i64), "long";
        get_float => Float(f32), "float";
        get_double => Double(f64), "double";
        get_uuid_or => Uuid(Uuid), "uuid";
    }

    slice_getters! {
        get_str => String(str), "string";
        get_list => List([Value]), "list";
        get_bool_array => BoolArray([bool]), "bool[]";
        get_byte_array => ByteArray([u8]), "byte[]";
        get_char_array => CharArray([u16]), "char[]";
        get_short_array => ShortArray([i16]), "short[]";
        get_int_array => IntArray([i32]), "int[]";
        get_long_array => LongArray([i64]), "long[]";
        get_float_array => FloatArray([f32]), "float[]";
        get_double_array => DoubleArray([f64]), "double[]";
    }

    pub fn get_str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get_str(key).unwrap_or(default)
    }

    pub fn get_uuid(&self, key: &str) -> Option<Uuid> {
        match self.get(key)? {
            Value::Uuid(v) => Some(*v),
            Value::Null => None,
            other => {
                mismatch(key, "uuid", other, &None::<()>);
                None
            }
        }
    }

    pub fn get_map(&self, key: &str) -> Option<&DataMap> {
        match self.get(key)? {
            Value::Map(m) => Some(m),
            Value::Null => None,
            other => {
                mismatch(key, "map", other, &None::<()>);
                None
            }
        }
    }

    pub fn get_map_mut(&mut self, key: &str) -> Option<&mut DataMap> {
        self.get_mut(key).and_then(Value::as_map_mut)
    }
}

#[cfg(test)]
mod tests {
    use crate::value::{DataMap, Value};
    use uuid::Uuid;

    fn sample() -> DataMap {
        let mut m = DataMap::new();
        m.put("flag", true);
        m.put("count", 42i32);
        m.put("name", "widget");
        m.put("nothing", Value::Null);
        m.put("bytes", vec![1u8, 2, 3]);
        m.put("id", Uuid::from_u128(7));
        m
    }

    #[test]
    fn matching_variants_are_returned() {
        let m = sample();
        assert!(m.get_bool("flag", false));
        assert_eq!(m.get_int("count", -1), 42);
        assert_eq!(m.get_str("name"), Some("widget"));
        assert_eq!(m.get_byte_array("bytes"), Some(&[1u8, 2, 3][..]));
        assert_eq!(m.get_uuid("id"), Some(Uuid::from_u128(7)));
        assert_eq!(m.get_uuid_or("id", Uuid::nil()), Uuid::from_u128(7));
    }

    #[test]
    fn absent_and_null_give_default() {
        let m = sample();
        assert_eq!(m.get_int("missing", 5), 5);
        assert_eq!(m.get_int("nothing", 5), 5);
        assert_eq!(m.get_str_or("nothing", "dflt"), "dflt");
        assert_eq!(m.get_list("missing"), None);
    }

    /// A wrong variant never converts: no widening from int to long.
    #[test]
    fn wrong_variant_gives_default() {
        let m = sample();
        assert_eq!(m.get_long("count", -7), -7);
        assert_eq!(m.get_double("count", 0.5), 0.5);
        assert_eq!(m.get_str("count"), None);
        assert_eq!(m.get_map("name"), None);
        assert!(!m.get_bool("name", false));
        assert_eq!(m.get_int_array("bytes"), None);
    }

    #[test]
    fn nested_map_access() {
        let mut m = sample();
        m.put("child", DataMap::new());
        m.get_map_mut("child").unwrap().put("x", 1i8);
        assert_eq!(m.get_map("child").unwrap().get_byte("x", 0), 1);
    }
}
