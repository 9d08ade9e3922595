//! linked-strmap: an insertion-ordered, open-addressing map with `String`
//! keys, and a tagged binary codec for trees of dynamically typed values.
//!
//! Internal Design:
//!
//! Summary
//! - `OrderedStringMap<V, S>`: a power-of-two slot table probed linearly.
//!   Each occupied slot also holds a packed `Link` (predecessor and
//!   successor slot) so iteration follows insertion order rather than
//!   table order.
//! - `DataMap` = `OrderedStringMap<Value>`: the map specialised to the
//!   closed `Value` union, with lenient typed getters.
//! - `codec`: `Encoder`/`Decoder` over the `io::ByteSink`/`io::ByteSource`
//!   traits, one tag byte per value, big-endian payloads.
//!
//! Constraints
//! - Single-threaded: `Value` can hold an `Rc` (`Transient`), so maps of
//!   values are `!Send`/`!Sync`.
//! - No tombstones. Removal empties the slot and backward-shifts the rest
//!   of its probe run; entries that move keep their place in the order
//!   because their neighbours' links are rewritten to the new slot.
//! - Table length stays a power of two between 16 and `1 << 30`; it
//!   doubles once `len() > threshold` and halves once
//!   `len() < threshold / 4`.
//! - A map owns its values, so it can never (directly or indirectly)
//!   contain itself.
//!
//! Probe invariant
//! - For every occupied slot `i`, all slots from the key's ideal slot up
//!   to `i` (cyclically) are occupied. Backward shift preserves this by
//!   moving an entry into the gap only when the gap lies outside the
//!   range `(ideal, pos]` that its lookups scan.
//!
//! Cursor and removal
//! - `CursorMut` tracks its neighbours by slot. When a removal shifts an
//!   entry the cursor refers to, the shift reports `(from, to)` and the
//!   cursor follows it. Halving the table would move every entry, so it
//!   is postponed until the cursor is dropped.
//!
//! Codec notes
//! - Length prefixes are `i32`; `-1` decodes to `Value::Null`.
//! - `Transient` values are never written: map and list counts exclude
//!   them and a transient at top level is written as `Null`.
//! - Blobs are `(type name, bytes)`; decoding needs a `BlobRegistry`
//!   entry for the name.
//! - Nesting depth and speculative allocation are bounded by
//!   `CodecOptions`.

pub mod blob;
pub mod codec;
mod cursor;
pub mod error;
pub mod io;
mod iter;
mod links;
mod map;
mod map_proptest;
mod typed;
mod value;

// Public surface
pub use blob::{Blob, BlobRegistry, Opaque, SerdeBlob, Transient};
pub use codec::{
    from_bytes, from_bytes_with, map_from_bytes, map_from_bytes_with, map_to_bytes, to_bytes,
    CodecOptions, Decoder, Encoder, Tag,
};
pub use cursor::CursorMut;
pub use error::{Error, Result};
pub use io::{ByteSink, ByteSource};
pub use iter::{IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
pub use map::{EntryHandle, OrderedStringMap, DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR};
pub use value::{DataMap, Value};
