//! The closed set of values a [`DataMap`] can hold.

use crate::blob::{Blob, Transient};
use crate::codec::Tag;
use crate::map::OrderedStringMap;
use uuid::Uuid;

/// An insertion-ordered string map of [`Value`]s; the unit the codec reads
/// and writes.
pub type DataMap = OrderedStringMap<Value>;

/// A dynamically typed value.
///
/// `Char` and `CharArray` hold UTF-16 code units. Everything except
/// `Transient` can be encoded.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    BoolArray(Vec<bool>),
    ByteArray(Vec<u8>),
    CharArray(Vec<u16>),
    ShortArray(Vec<i16>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
    FloatArray(Vec<f32>),
    DoubleArray(Vec<f64>),
    String(String),
    Uuid(Uuid),
    List(Vec<Value>),
    Map(DataMap),
    Blob(Blob),
    Transient(Transient),
}

impl Value {
    /// Short lowercase name of the variant, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Byte(_) => "byte",
            Value::Char(_) => "char",
            Value::Short(_) => "short",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::BoolArray(_) => "bool[]",
            Value::ByteArray(_) => "byte[]",
            Value::CharArray(_) => "char[]",
            Value::ShortArray(_) => "short[]",
            Value::IntArray(_) => "int[]",
            Value::LongArray(_) => "long[]",
            Value::FloatArray(_) => "float[]",
            Value::DoubleArray(_) => "double[]",
            Value::String(_) => "string",
            Value::Uuid(_) => "uuid",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Blob(_) => "blob",
            Value::Transient(_) => "transient",
        }
    }

    /// Wire tag of this value, or `None` for values that are never encoded.
    pub fn tag(&self) -> Option<Tag> {
        Some(match self {
            Value::Null => Tag::Null,
            Value::Bool(_) => Tag::Boolean,
            Value::Byte(_) => Tag::Byte,
            Value::Char(_) => Tag::Char,
            Value::Short(_) => Tag::Short,
            Value::Int(_) => Tag::Int,
            Value::Long(_) => Tag::Long,
            Value::Float(_) => Tag::Float,
            Value::Double(_) => Tag::Double,
            Value::BoolArray(_) => Tag::BooleanArray,
            Value::ByteArray(_) => Tag::ByteArray,
            Value::CharArray(_) => Tag::CharArray,
            Value::ShortArray(_) => Tag::ShortArray,
            Value::IntArray(_) => Tag::IntArray,
            Value::LongArray(_) => Tag::LongArray,
            Value::FloatArray(_) => Tag::FloatArray,
            Value::DoubleArray(_) => Tag::DoubleArray,
            Value::String(_) => Tag::String,
            Value::Uuid(_) => Tag::Uuid,
            Value::List(_) => Tag::List,
            Value::Map(_) => Tag::Map,
            Value::Blob(_) => Tag::Blob,
            Value::Transient(_) => return None,
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether the codec writes this value (rather than skipping it).
    pub fn is_persistable(&self) -> bool {
        !matches!(self, Value::Transient(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&DataMap> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut DataMap> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&Blob> {
        match self {
            Value::Blob(b) => Some(b),
            _ => None,
        }
    }
}

macro_rules! impl_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    Vec<bool> => BoolArray,
    Vec<u8> => ByteArray,
    Vec<u16> => CharArray,
    Vec<i16> => ShortArray,
    Vec<i32> => IntArray,
    Vec<i64> => LongArray,
    Vec<f32> => FloatArray,
    Vec<f64> => DoubleArray,
    String => String,
    Uuid => Uuid,
    Vec<Value> => List,
    DataMap => Map,
    Blob => Blob,
    Transient => Transient,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
