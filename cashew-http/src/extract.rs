//! Turning buffered responses into typed values.

use std::marker::PhantomData;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::error::ExtractError;
use crate::response::HttpResponse;

/// Decodes a response into a value.
///
/// Extractors see every status the origin returns; the built-in ones reject
/// anything but `2xx`.
pub trait Extractor: Send + Sync {
    type Output;

    fn extract(&self, response: &HttpResponse) -> Result<Self::Output, ExtractError>;
}

impl<F, T> Extractor for F
where
    F: Fn(&HttpResponse) -> Result<T, ExtractError> + Send + Sync,
{
    type Output = T;

    fn extract(&self, response: &HttpResponse) -> Result<T, ExtractError> {
        self(response)
    }
}

fn require_success(response: &HttpResponse) -> Result<(), ExtractError> {
    if response.is_success() {
        Ok(())
    } else {
        Err(ExtractError::Status(response.status()))
    }
}

/// Body as text, decoded lossily as UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringExtractor;

impl Extractor for StringExtractor {
    type Output = String;

    fn extract(&self, response: &HttpResponse) -> Result<String, ExtractError> {
        require_success(response)?;
        Ok(response.text())
    }
}

/// Raw body bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesExtractor;

impl Extractor for BytesExtractor {
    type Output = Bytes;

    fn extract(&self, response: &HttpResponse) -> Result<Bytes, ExtractError> {
        require_success(response)?;
        Ok(response.as_bytes().clone())
    }
}

/// Body deserialized from JSON.
///
/// ```
/// use cashew_http::{Extractor, HttpResponse, JsonExtractor};
/// use http::{HeaderMap, StatusCode};
///
/// let response = HttpResponse::new(StatusCode::OK, HeaderMap::new(), r#"[1, 2, 3]"#);
/// let values = JsonExtractor::<Vec<u32>>::new().extract(&response).unwrap();
/// assert_eq!(values, vec![1, 2, 3]);
/// ```
#[derive(Debug)]
pub struct JsonExtractor<T> {
    _output: PhantomData<fn() -> T>,
}

impl<T> JsonExtractor<T> {
    pub fn new() -> Self {
        JsonExtractor {
            _output: PhantomData,
        }
    }
}

impl<T> Default for JsonExtractor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonExtractor<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> Extractor for JsonExtractor<T>
where
    T: DeserializeOwned,
{
    type Output = T;

    fn extract(&self, response: &HttpResponse) -> Result<T, ExtractError> {
        require_success(response)?;
        serde_json::from_slice(response.as_bytes()).map_err(|e| ExtractError::Decode(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, StatusCode};

    #[test]
    fn non_success_is_rejected() {
        let response = HttpResponse::new(StatusCode::NOT_FOUND, HeaderMap::new(), "missing");
        assert!(matches!(
            StringExtractor.extract(&response),
            Err(ExtractError::Status(StatusCode::NOT_FOUND))
        ));
    }

    #[test]
    fn bad_json_is_a_decode_error() {
        let response = HttpResponse::new(StatusCode::OK, HeaderMap::new(), "{");
        let result = JsonExtractor::<serde_json::Value>::new().extract(&response);
        assert!(matches!(result, Err(ExtractError::Decode(_))));
    }

    #[test]
    fn closures_extract() {
        let length = |r: &HttpResponse| Ok::<_, ExtractError>(r.as_bytes().len());
        let response = HttpResponse::new(StatusCode::OK, HeaderMap::new(), "four");
        assert_eq!(length.extract(&response).unwrap(), 4);
    }
}
