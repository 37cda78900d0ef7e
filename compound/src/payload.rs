//! JSON payload helpers.
//!
//! The store treats payloads as opaque bytes. These helpers cover the common
//! case of a serde-serializable document stored as JSON.

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;

/// Serializes a value as a JSON payload.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    Ok(Bytes::from(serde_json::to_vec(value)?))
}

/// Deserializes a JSON payload.
pub fn from_json<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(payload)?)
}
