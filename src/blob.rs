//! Opaque values carried through the codec by type name, plus in-memory-only
//! transient values.

use crate::error::{Error, Result};
use core::any::Any;
use core::fmt;
use hashbrown::HashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::rc::Rc;

/// A value the codec stores as `(type name, bytes)` without understanding it.
pub trait Opaque: Any + fmt::Debug {
    /// Name the matching decoder is registered under.
    fn type_name(&self) -> &str;
    fn to_bytes(&self) -> Result<Vec<u8>>;
    fn clone_box(&self) -> Box<dyn Opaque>;
    fn eq_dyn(&self, other: &dyn Opaque) -> bool;
    fn as_any(&self) -> &dyn Any;
}

/// Owned, type-erased [`Opaque`] value.
pub struct Blob(Box<dyn Opaque>);

impl Blob {
    pub fn new(inner: impl Opaque) -> Self {
        Blob(Box::new(inner))
    }

    /// Wraps a serde type; it round-trips once `T` is registered with
    /// [`BlobRegistry::register_serde`].
    pub fn serde<T>(value: T) -> Self
    where
        T: Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug + 'static,
    {
        Blob::new(SerdeBlob(value))
    }

    pub fn type_name(&self) -> &str {
        self.0.type_name()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.0.to_bytes()
    }

    pub fn inner(&self) -> &dyn Opaque {
        self.0.as_ref()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref()
    }

    /// The payload of a blob built with [`Blob::serde`].
    pub fn serde_value<T: Any>(&self) -> Option<&T> {
        self.downcast_ref::<SerdeBlob<T>>().map(|b| &b.0)
    }
}

impl Clone for Blob {
    fn clone(&self) -> Self {
        Blob(self.0.clone_box())
    }
}

impl PartialEq for Blob {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_dyn(other.0.as_ref())
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Blob").field(&self.0).finish()
    }
}

/// Adapter making any serde type [`Opaque`], encoded with `bincode`.
#[derive(Clone, Debug, PartialEq)]
pub struct SerdeBlob<T>(pub T);

impl<T> Opaque for SerdeBlob<T>
where
    T: Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug + 'static,
{
    fn type_name(&self) -> &str {
        std::any::type_name::<T>()
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(&self.0)?)
    }

    fn clone_box(&self) -> Box<dyn Opaque> {
        Box::new(self.clone())
    }

    fn eq_dyn(&self, other: &dyn Opaque) -> bool {
        other
            .as_any()
            .downcast_ref::<Self>()
            .map_or(false, |o| o == self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

type DecodeFn = Box<dyn Fn(&[u8]) -> Result<Blob>>;

/// Decoders for blob payloads, keyed by type name.
#[derive(Default)]
pub struct BlobRegistry {
    decoders: HashMap<String, DecodeFn>,
}

impl BlobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        decode: impl Fn(&[u8]) -> Result<Blob> + 'static,
    ) -> &mut Self {
        self.decoders.insert(type_name.into(), Box::new(decode));
        self
    }

    pub fn register_serde<T>(&mut self) -> &mut Self
    where
        T: Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug + 'static,
    {
        self.register(std::any::type_name::<T>(), |bytes| {
            let value: T = bincode::deserialize(bytes)?;
            Ok(Blob::serde(value))
        })
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.decoders.contains_key(type_name)
    }

    pub fn decode(&self, type_name: &str, bytes: &[u8]) -> Result<Blob> {
        let decode = self
            .decoders
            .get(type_name)
            .ok_or_else(|| Error::UnknownBlobType(type_name.to_owned()))?;
        decode(bytes)
    }
}

impl fmt::Debug for BlobRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.decoders.keys()).finish()
    }
}

/// A shared in-memory value that is never encoded.
///
/// Clones share the same allocation; two transients are equal only if they
/// share it.
#[derive(Clone)]
pub struct Transient(Rc<dyn Any>);

impl Transient {
    pub fn new<T: Any>(value: T) -> Self {
        Transient(Rc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl PartialEq for Transient {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Transient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transient(..)")
    }
}
