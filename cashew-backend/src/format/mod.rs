//! Value serialization formats.
//!
//! A [`Format`] turns typed values into [`Raw`] bytes and back. The trait is
//! object safe: values pass through `erased_serde` callbacks so a backend can
//! hand out `&dyn Format`. [`FormatExt`] adds the generic convenience methods.

use cashew_core::Raw;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

mod json;

pub use json::JsonFormat;

/// Serialization failure.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error(transparent)]
    Serialize(Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Deserialize(Box<dyn std::error::Error + Send + Sync>),
}

/// Serializer handed to [`Format::with_serializer`] callbacks.
pub struct FormatSerializer<'a>(&'a mut dyn erased_serde::Serializer);

impl FormatSerializer<'_> {
    pub fn serialize<T>(&mut self, value: &T) -> Result<(), FormatError>
    where
        T: Serialize,
    {
        let erased = value as &dyn erased_serde::Serialize;
        erased
            .erased_serialize(&mut *self.0)
            .map_err(|e| FormatError::Serialize(Box::new(e)))
    }
}

/// Deserializer handed to [`Format::with_deserializer`] callbacks.
pub struct FormatDeserializer<'a, 'de>(&'a mut dyn erased_serde::Deserializer<'de>);

impl FormatDeserializer<'_, '_> {
    pub fn deserialize<T>(&mut self) -> Result<T, FormatError>
    where
        T: DeserializeOwned,
    {
        erased_serde::deserialize(&mut *self.0).map_err(|e| FormatError::Deserialize(Box::new(e)))
    }
}

/// Object-safe value format.
pub trait Format: std::fmt::Debug + Send + Sync {
    /// Runs `f` against a serializer and returns the produced bytes.
    fn with_serializer(
        &self,
        f: &mut dyn FnMut(&mut FormatSerializer) -> Result<(), FormatError>,
    ) -> Result<Raw, FormatError>;

    /// Runs `f` against a deserializer reading `data`.
    fn with_deserializer(
        &self,
        data: &[u8],
        f: &mut dyn FnMut(&mut FormatDeserializer) -> Result<(), FormatError>,
    ) -> Result<(), FormatError>;

    /// Short format name used in logs.
    fn name(&self) -> &'static str;
}

/// Generic helpers available on every [`Format`].
pub trait FormatExt: Format {
    fn serialize<T>(&self, value: &T) -> Result<Raw, FormatError>
    where
        T: Serialize,
    {
        self.with_serializer(&mut |serializer| serializer.serialize(value))
    }

    fn deserialize<T>(&self, data: &Raw) -> Result<T, FormatError>
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Payload {
        id: u32,
        name: String,
    }

    #[test]
    fn json_format_keeps_struct_fields() {
        let value = Payload {
            id: 7,
            name: "cashew".to_owned(),
        };
        let raw = JsonFormat.serialize(&value).unwrap();
        assert_eq!(&raw[..], br#"{"id":7,"name":"cashew"}"#);
        let back: Payload = JsonFormat.deserialize(&raw).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn garbage_is_a_deserialize_error() {
        let raw = Raw::from_static(b"not json");
        let result: Result<Payload, _> = JsonFormat.deserialize(&raw);
        assert!(matches!(result, Err(FormatError::Deserialize(_))));
    }

    #[test]
    fn usable_as_trait_object() {
        let format: &dyn Format = &JsonFormat;
        let raw = format.serialize(&[1, 2, 3]).unwrap();
        let back: Vec<u8> = format.deserialize(&raw).unwrap();
        assert_eq!(back, vec![1, 2, 3]);
        assert_eq!(format.name(), "json");
    }
}
