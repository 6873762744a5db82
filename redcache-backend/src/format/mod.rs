//! Value serialization formats.
//!
//! Cache values are arbitrary `serde` types. A [`Format`] turns them into
//! [`Raw`] bytes before a backend stores them, and back again on read.
//!
//! [`Format`] is object safe (values go through `erased-serde`), so adapters
//! can hold a `Box<dyn Format>` chosen at runtime. The generic
//! [`FormatExt::serialize`] and [`FormatExt::deserialize`] helpers are
//! available on every format.
//!
//! | Format | Payload | `INCRBY` compatible |
//! |---|---|---|
//! | [`JsonFormat`] | UTF-8 JSON | yes, integers are stored as decimal text |
//! | [`BincodeFormat`] | compact binary | no |

use redcache_core::Raw;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use ::bincode::config::Configuration;
use ::bincode::de::DecoderImpl;
use ::bincode::de::read::SliceReader;
use ::bincode::enc::EncoderImpl;
use ::bincode::serde::Compat;
use ::bincode::{Decode, Encode};

use self::bincode::BincodeVecWriter;

mod bincode;
mod json;

pub use bincode::BincodeFormat;
pub use json::JsonFormat;

/// Serialization or deserialization failure.
#[derive(Error, Debug)]
pub enum FormatError {
    /// The value could not be encoded.
    #[error(transparent)]
    Serialize(Box<dyn std::error::Error + Send + Sync>),

    /// The stored bytes could not be decoded into the requested type.
    #[error(transparent)]
    Deserialize(Box<dyn std::error::Error + Send + Sync>),
}

/// Unique identifier for format types, used to compare format equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatTypeId {
    /// [`JsonFormat`].
    Json,
    /// [`BincodeFormat`].
    Bincode,
    /// For user-defined custom formats. The string should be a unique identifier.
    Custom(&'static str),
}

impl FormatTypeId {
    /// Whether integers written by this format can be updated in place with
    /// `INCRBY`/`DECRBY`.
    pub fn is_counter_compatible(&self) -> bool {
        matches!(self, FormatTypeId::Json)
    }
}

/// Serializer handed to [`Format::with_serializer`] callbacks.
pub enum FormatSerializer<'a> {
    /// Any serde data format, type-erased.
    Serde(&'a mut dyn erased_serde::Serializer),
    /// Bincode's native encoder.
    Bincode(&'a mut EncoderImpl<BincodeVecWriter, Configuration>),
}

impl FormatSerializer<'_> {
    /// Serialize `value` into the underlying buffer.
    pub fn serialize<T>(&mut self, value: &T) -> Result<(), FormatError>
    where
        T: Serialize,
    {
        match self {
            FormatSerializer::Serde(ser) => {
                let erased_value = value as &dyn erased_serde::Serialize;
                erased_value
                    .erased_serialize(&mut **ser)
                    .map_err(|e| FormatError::Serialize(Box::new(e)))
            }
            FormatSerializer::Bincode(enc) => Encode::encode(&Compat(value), &mut **enc)
                .map_err(|e| FormatError::Serialize(Box::new(e))),
        }
    }
}

/// Deserializer handed to [`Format::with_deserializer`] callbacks.
pub enum FormatDeserializer<'a> {
    /// Any serde data format, type-erased.
    Serde(&'a mut dyn erased_serde::Deserializer<'a>),
    /// Bincode's native decoder.
    Bincode(&'a mut DecoderImpl<SliceReader<'a>, Configuration, ()>),
}

impl FormatDeserializer<'_> {
    /// Deserialize a value of type `T` from the underlying bytes.
    pub fn deserialize<T>(&mut self) -> Result<T, FormatError>
    where
        T: DeserializeOwned,
    {
        match self {
            FormatDeserializer::Serde(deser) => erased_serde::deserialize(&mut **deser)
                .map_err(|e| FormatError::Deserialize(Box::new(e))),
            FormatDeserializer::Bincode(dec) => {
                let compat: Compat<T> = Decode::decode(&mut **dec)
                    .map_err(|e| FormatError::Deserialize(Box::new(e)))?;
                Ok(compat.0)
            }
        }
    }
}

/// Object-safe value format.
///
/// Implementations own a concrete serializer and expose it through a callback,
/// which keeps the trait usable as `&dyn Format`.
pub trait Format: std::fmt::Debug + Send + Sync {
    /// Provides access to a serializer via a callback and returns the written bytes.
    fn with_serializer(
        &self,
        f: &mut dyn FnMut(&mut FormatSerializer) -> Result<(), FormatError>,
    ) -> Result<Raw, FormatError>;

    /// Provides access to a deserializer over `data` via a callback.
    fn with_deserializer(
        &self,
        data: &[u8],
        f: &mut dyn FnMut(&mut FormatDeserializer) -> Result<(), FormatError>,
    ) -> Result<(), FormatError>;

    /// Clone this format into a box (for object safety).
    fn clone_box(&self) -> Box<dyn Format>;

    /// Returns a unique identifier for this format type.
    fn format_type_id(&self) -> FormatTypeId;
}

/// Extension trait providing generic serialize/deserialize methods.
///
/// Automatically implemented for every [`Format`].
pub trait FormatExt: Format {
    /// Serialize `value` to bytes.
    fn serialize<T>(&self, value: &T) -> Result<Raw, FormatError>
    where
        T: Serialize,
    {
        self.with_serializer(&mut |serializer| serializer.serialize(value))
    }

    /// Deserialize bytes into a `T`.
    fn deserialize<T>(&self, data: &[u8]) -> Result<T, FormatError>
    where
        T: DeserializeOwned,
    {
        let mut result: Option<T> = None;
        self.with_deserializer(data, &mut |deserializer| {
            result = Some(deserializer.deserialize()?);
            Ok(())
        })?;

        result.ok_or_else(|| {
            FormatError::Deserialize(Box::new(std::io::Error::other(
                "deserialization produced no result",
            )))
        })
    }
}

impl<T: Format + ?Sized> FormatExt for T {}

impl Clone for Box<dyn Format> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl Format for Box<dyn Format> {
    fn with_serializer(
        &self,
        f: &mut dyn FnMut(&mut FormatSerializer) -> Result<(), FormatError>,
    ) -> Result<Raw, FormatError> {
        (**self).with_serializer(f)
    }

    fn with_deserializer(
        &self,
        data: &[u8],
        f: &mut dyn FnMut(&mut FormatDeserializer) -> Result<(), FormatError>,
    ) -> Result<(), FormatError> {
        (**self).with_deserializer(data, f)
    }

    fn clone_box(&self) -> Box<dyn Format> {
        (**self).clone_box()
    }

    fn format_type_id(&self) -> FormatTypeId {
        (**self).format_type_id()
    }
}

impl Format for std::sync::Arc<dyn Format> {
    fn with_serializer(
        &self,
        f: &mut dyn FnMut(&mut FormatSerializer) -> Result<(), FormatError>,
    ) -> Result<Raw, FormatError> {
        (**self).with_serializer(f)
    }

    fn with_deserializer(
        &self,
        data: &[u8],
        f: &mut dyn FnMut(&mut FormatDeserializer) -> Result<(), FormatError>,
    ) -> Result<(), FormatError> {
        (**self).with_deserializer(data, f)
    }

    fn clone_box(&self) -> Box<dyn Format> {
        (**self).clone_box()
    }

    fn format_type_id(&self) -> FormatTypeId {
        (**self).format_type_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Profile {
        id: u64,
        name: String,
        tags: Vec<String>,
    }

    fn profile() -> Profile {
        Profile {
            id: 7,
            name: "ada".to_owned(),
            tags: vec!["admin".to_owned()],
        }
    }

    #[test]
    fn json_keeps_integers_as_decimal_text() {
        let raw = JsonFormat.serialize(&41_i64).unwrap();
        assert_eq!(&raw[..], b"41");
        let back: i64 = JsonFormat.deserialize(b"42").unwrap();
        assert_eq!(back, 42);
    }

    #[test]
    fn bincode_decodes_what_it_encodes() {
        let raw = BincodeFormat.serialize(&profile()).unwrap();
        let back: Profile = BincodeFormat.deserialize(&raw).unwrap();
        assert_eq!(back, profile());
    }

    #[test]
    fn boxed_format_dispatches_to_inner() {
        let format: Box<dyn Format> = Box::new(JsonFormat);
        assert_eq!(format.format_type_id(), FormatTypeId::Json);
        let raw = format.serialize(&profile()).unwrap();
        let back: Profile = format.deserialize(&raw).unwrap();
        assert_eq!(back, profile());
    }

    #[test]
    fn type_mismatch_is_a_deserialize_error() {
        let raw = JsonFormat.serialize(&"text").unwrap();
        let result: Result<u32, _> = JsonFormat.deserialize(&raw);
        assert!(matches!(result, Err(FormatError::Deserialize(_))));
    }
}
