//! Tagged big-endian binary encoding of [`Value`] trees.
//!
//! Every value is a one-byte [`Tag`] followed by its payload. Strings and
//! arrays carry an `i32` length prefix where `-1` stands for null; strings
//! are counted and stored in UTF-16 code units. A map payload is an entry
//! count followed by `(key string, tagged value)` pairs in iteration order.
//! [`Encoder::write_map`] and [`Decoder::read_map`] read and write that
//! payload without a leading tag.

use crate::blob::BlobRegistry;
use crate::error::{Error, Result};
use crate::io::{ByteSink, ByteSource};
use crate::map::OrderedStringMap;
use crate::value::{DataMap, Value};
use uuid::Uuid;

/// Wire tag for each encodable [`Value`] variant. 18 is unassigned.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum Tag {
    Null = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    Boolean = 7,
    Char = 8,
    ByteArray = 9,
    ShortArray = 10,
    IntArray = 11,
    LongArray = 12,
    FloatArray = 13,
    DoubleArray = 14,
    BooleanArray = 15,
    CharArray = 16,
    String = 17,
    Uuid = 19,
    List = 20,
    Map = 21,
    Blob = 22,
}

impl TryFrom<u8> for Tag {
    type Error = Error;

    fn try_from(b: u8) -> Result<Tag> {
        Ok(match b {
            0 => Tag::Null,
            1 => Tag::Byte,
            2 => Tag::Short,
            3 => Tag::Int,
            4 => Tag::Long,
            5 => Tag::Float,
            6 => Tag::Double,
            7 => Tag::Boolean,
            8 => Tag::Char,
            9 => Tag::ByteArray,
            10 => Tag::ShortArray,
            11 => Tag::IntArray,
            12 => Tag::LongArray,
            13 => Tag::FloatArray,
            14 => Tag::DoubleArray,
            15 => Tag::BooleanArray,
            16 => Tag::CharArray,
            17 => Tag::String,
            19 => Tag::Uuid,
            20 => Tag::List,
            21 => Tag::Map,
            22 => Tag::Blob,
            other => return Err(Error::UnknownTag(other)),
        })
    }
}

/// Limits applied while encoding and decoding.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CodecOptions {
    /// Deepest allowed nesting of maps and lists; a top-level map is depth 1.
    pub max_depth: usize,
    /// Upper bound on elements reserved ahead of reading them. Declared
    /// lengths beyond it are still honoured, memory just grows as data
    /// actually arrives.
    pub max_prealloc: usize,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            max_depth: 512,
            max_prealloc: 4096,
        }
    }
}

pub struct Encoder<W> {
    sink: W,
    options: CodecOptions,
    depth: usize,
}

impl<W: ByteSink> Encoder<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            options: CodecOptions::default(),
            depth: 0,
        }
    }

    pub fn with_options(mut self, options: CodecOptions) -> Self {
        self.options = options;
        self
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    /// Writes a tagged value. A transient value is written as `Null`.
    pub fn write_value(&mut self, value: &Value) -> Result<()> {
        match value.tag() {
            Some(tag) => {
                self.sink.write_u8(tag as u8)?;
                self.write_payload(value)
            }
            None => {
                log::debug!("transient value encoded as null");
                self.sink.write_u8(Tag::Null as u8)
            }
        }
    }

    /// Writes a map payload (no tag). Transient values are skipped and
    /// excluded from the entry count.
    pub fn write_map<S>(&mut self, map: &OrderedStringMap<Value, S>) -> Result<()> {
        self.nested(|e| e.write_entries(map))
    }

    fn nested(&mut self, f: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        if self.depth >= self.options.max_depth {
            return Err(Error::DepthLimitExceeded(self.options.max_depth));
        }
        self.depth += 1;
        let res = f(self);
        self.depth -= 1;
        res
    }

    fn write_len(&mut self, len: usize) -> Result<()> {
        let len = i32::try_from(len)
            .map_err(|_| Error::InvalidArgument(format!("length {len} does not fit in an i32")))?;
        self.sink.write_i32(len)
    }

    fn write_str(&mut self, s: &str) -> Result<()> {
        self.write_len(s.encode_utf16().count())?;
        for unit in s.encode_utf16() {
            self.sink.write_u16(unit)?;
        }
        Ok(())
    }

    fn write_array<T: Copy>(
        &mut self,
        items: &[T],
        mut write: impl FnMut(&mut W, T) -> Result<()>,
    ) -> Result<()> {
        self.write_len(items.len())?;
        for &item in items {
            write(&mut self.sink, item)?;
        }
        Ok(())
    }

    fn write_entries<S>(&mut self, map: &OrderedStringMap<Value, S>) -> Result<()> {
        let count = map.values().filter(|v| v.is_persistable()).count();
        self.write_len(count)?;
        for (key, value) in map {
            if !value.is_persistable() {
                log::debug!("skipping transient value under key `{key}`");
                continue;
            }
            self.write_str(key)?;
            self.write_value(value)?;
        }
        Ok(())
    }

    fn write_list(&mut self, items: &[Value]) -> Result<()> {
        let count = items.iter().filter(|v| v.is_persistable()).count();
        self.write_len(count)?;
        for (i, item) in items.iter().enumerate() {
            if !item.is_persistable() {
                log::debug!("skipping transient list element {i}");
                continue;
            }
            self.write_value(item)?;
        }
        Ok(())
    }

    fn write_payload(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Null | Value::Transient(_) => Ok(()),
            Value::Bool(v) => self.sink.write_bool(*v),
            Value::Byte(v) => self.sink.write_i8(*v),
            Value::Char(v) => self.sink.write_u16(*v),
            Value::Short(v) => self.sink.write_i16(*v),
            Value::Int(v) => self.sink.write_i32(*v),
            Value::Long(v) => self.sink.write_i64(*v),
            Value::Float(v) => self.sink.write_f32(*v),
            Value::Double(v) => self.sink.write_f64(*v),
            Value::BoolArray(a) => self.write_array(a, |s, v| s.write_bool(v)),
            Value::ByteArray(a) => {
                self.write_len(a.len())?;
                self.sink.write_bytes(a)
            }
            Value::CharArray(a) => self.write_array(a, |s, v| s.write_u16(v)),
            Value::ShortArray(a) => self.write_array(a, |s, v| s.write_i16(v)),
            Value::IntArray(a) => self.write_array(a, |s, v| s.write_i32(v)),
            Value::LongArray(a) => self.write_array(a, |s, v| s.write_i64(v)),
            Value::FloatArray(a) => self.write_array(a, |s, v| s.write_f32(v)),
            Value::DoubleArray(a) => self.write_array(a, |s, v| s.write_f64(v)),
            Value::String(s) => self.write_str(s),
            Value::Uuid(u) => {
                let (hi, lo) = u.as_u64_pair();
                self.sink.write_u64(hi)?;
                self.sink.write_u64(lo)
            }
            Value::List(items) => self.nested(|e| e.write_list(items)),
            Value::Map(map) => self.nested(|e| e.write_entries(map)),
            Value::Blob(blob) => {
                let bytes = blob.to_bytes()?;
                self.write_str(blob.type_name())?;
                self.write_len(bytes.len())?;
                self.sink.write_bytes(&bytes)
            }
        }
    }
}

pub struct Decoder<'r, R> {
    source: R,
    registry: Option<&'r BlobRegistry>,
    options: CodecOptions,
    depth: usize,
}

impl<R: ByteSource> Decoder<'static, R> {
    /// A decoder that rejects every blob as [`Error::UnknownBlobType`].
    pub fn new(source: R) -> Self {
        Self {
            source,
            registry: None,
            options: CodecOptions::default(),
            depth: 0,
        }
    }
}

impl<'r, R: ByteSource> Decoder<'r, R> {
    pub fn with_registry(source: R, registry: &'r BlobRegistry) -> Self {
        Self {
            source,
            registry: Some(registry),
            options: CodecOptions::default(),
            depth: 0,
        }
    }

    pub fn with_options(mut self, options: CodecOptions) -> Self {
        self.options = options;
        self
    }

    pub fn into_inner(self) -> R {
        self.source
    }

    pub fn read_value(&mut self) -> Result<Value> {
        let tag = Tag::try_from(self.source.read_u8()?)?;
        self.read_payload(tag)
    }

    /// Reads a map payload (no tag). A null count is malformed here since
    /// there is no `Value::Null` to return in its place.
    pub fn read_map(&mut self) -> Result<DataMap> {
        let n = self
            .read_len()?
            .ok_or_else(|| Error::Malformed("null map".into()))?;
        self.nested(|d| d.read_entries(n))
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= self.options.max_depth {
            return Err(Error::DepthLimitExceeded(self.options.max_depth));
        }
        self.depth += 1;
        let res = f(self);
        self.depth -= 1;
        res
    }

    fn read_len(&mut self) -> Result<Option<usize>> {
        match self.source.read_i32()? {
            -1 => Ok(None),
            n if n < 0 => Err(Error::Malformed(format!("negative length {n}"))),
            n => Ok(Some(n as usize)),
        }
    }

    fn reserve_for(&self, n: usize) -> usize {
        n.min(self.options.max_prealloc)
    }

    fn read_string(&mut self) -> Result<Option<String>> {
        let Some(n) = self.read_len()? else {
            return Ok(None);
        };
        let mut units = Vec::with_capacity(self.reserve_for(n));
        for _ in 0..n {
            units.push(self.source.read_u16()?);
        }
        String::from_utf16(&units)
            .map(Some)
            .map_err(|_| Error::Malformed("string is not valid UTF-16".into()))
    }

    fn read_array<T>(
        &mut self,
        wrap: impl FnOnce(Vec<T>) -> Value,
        mut read: impl FnMut(&mut R) -> Result<T>,
    ) -> Result<Value> {
        let Some(n) = self.read_len()? else {
            return Ok(Value::Null);
        };
        let mut items = Vec::with_capacity(self.reserve_for(n));
        for _ in 0..n {
            items.push(read(&mut self.source)?);
        }
        Ok(wrap(items))
    }

    fn read_entries(&mut self, n: usize) -> Result<DataMap> {
        let mut map = DataMap::with_capacity(self.reserve_for(n));
        for _ in 0..n {
            let key = self
                .read_string()?
                .ok_or_else(|| Error::Malformed("null map key".into()))?;
            let value = self.read_value()?;
            map.put(key, value);
        }
        Ok(map)
    }

    fn read_list(&mut self, n: usize) -> Result<Vec<Value>> {
        let mut items = Vec::with_capacity(self.reserve_for(n));
        for _ in 0..n {
            items.push(self.read_value()?);
        }
        Ok(items)
    }

    fn read_payload(&mut self, tag: Tag) -> Result<Value> {
        Ok(match tag {
            Tag::Null => Value::Null,
            Tag::Byte => Value::Byte(self.source.read_i8()?),
            Tag::Short => Value::Short(self.source.read_i16()?),
            Tag::Int => Value::Int(self.source.read_i32()?),
            Tag::Long => Value::Long(self.source.read_i64()?),
            Tag::Float => Value::Float(self.source.read_f32()?),
            Tag::Double => Value::Double(self.source.read_f64()?),
            Tag::Boolean => Value::Bool(self.source.read_bool()?),
            Tag::Char => Value::Char(self.source.read_u16()?),
            Tag::ByteArray => match self.read_len()? {
                Some(n) => Value::ByteArray(self.source.read_bytes(n)?),
                None => Value::Null,
            },
            Tag::ShortArray => self.read_array(Value::ShortArray, |s| s.read_i16())?,
            Tag::IntArray => self.read_array(Value::IntArray, |s| s.read_i32())?,
            Tag::LongArray => self.read_array(Value::LongArray, |s| s.read_i64())?,
            Tag::FloatArray => self.read_array(Value::FloatArray, |s| s.read_f32())?,
            Tag::DoubleArray => self.read_array(Value::DoubleArray, |s| s.read_f64())?,
            Tag::BooleanArray => self.read_array(Value::BoolArray, |s| s.read_bool())?,
            Tag::CharArray => self.read_array(Value::CharArray, |s| s.read_u16())?,
            Tag::String => self.read_string()?.map_or(Value::Null, Value::String),
            Tag::Uuid => {
                let hi = self.source.read_u64()?;
                let lo = self.source.read_u64()?;
                Value::Uuid(Uuid::from_u64_pair(hi, lo))
            }
            Tag::List => match self.read_len()? {
                Some(n) => Value::List(self.nested(|d| d.read_list(n))?),
                None => Value::Null,
            },
            Tag::Map => match self.read_len()? {
                Some(n) => Value::Map(self.nested(|d| d.read_entries(n))?),
                None => Value::Null,
            },
            Tag::Blob => {
                let name = self
                    .read_string()?
                    .ok_or_else(|| Error::Malformed("null blob type name".into()))?;
                let len = self
                    .read_len()?
                    .ok_or_else(|| Error::Malformed("null blob payload".into()))?;
                let bytes = self.source.read_bytes(len)?;
                let registry = self
                    .registry
                    .ok_or_else(|| Error::UnknownBlobType(name.clone()))?;
                Value::Blob(registry.decode(&name, &bytes)?)
            }
        })
    }
}

/// Encodes one tagged value into a fresh buffer.
pub fn to_bytes(value: &Value) -> Result<Vec<u8>> {
    let mut enc = Encoder::new(Vec::new());
    enc.write_value(value)?;
    Ok(enc.into_inner())
}

/// Encodes a map payload (untagged) into a fresh buffer.
pub fn map_to_bytes<S>(map: &OrderedStringMap<Value, S>) -> Result<Vec<u8>> {
    let mut enc = Encoder::new(Vec::new());
    enc.write_map(map)?;
    Ok(enc.into_inner())
}

fn ensure_consumed(rest: &[u8]) -> Result<()> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(Error::Malformed(format!("{} trailing bytes", rest.len())))
    }
}

/// Decodes exactly one tagged value; blobs are rejected.
pub fn from_bytes(bytes: &[u8]) -> Result<Value> {
    let mut dec = Decoder::new(bytes);
    let value = dec.read_value()?;
    ensure_consumed(dec.into_inner())?;
    Ok(value)
}

/// Decodes exactly one tagged value, resolving blobs through `registry`.
pub fn from_bytes_with(bytes: &[u8], registry: &BlobRegistry) -> Result<Value> {
    let mut dec = Decoder::with_registry(bytes, registry);
    let value = dec.read_value()?;
    ensure_consumed(dec.into_inner())?;
    Ok(value)
}

/// Decodes exactly one map payload; blobs are rejected.
pub fn map_from_bytes(bytes: &[u8]) -> Result<DataMap> {
    let mut dec = Decoder::new(bytes);
    let map = dec.read_map()?;
    ensure_consumed(dec.into_inner())?;
    Ok(map)
}

/// Decodes exactly one map payload, resolving blobs through `registry`.
pub fn map_from_bytes_with(bytes: &[u8], registry: &BlobRegistry) -> Result<DataMap> {
    let mut dec = Decoder::with_registry(bytes, registry);
    let map = dec.read_map()?;
    ensure_consumed(dec.into_inner())?;
    Ok(map)
}
