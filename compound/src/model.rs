//! Data types for compound record operations.

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::payload;

/// A record returned by a prefix scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedRecord {
    /// The full key tuple, in declared key order.
    pub fields: Vec<String>,
    /// The stored payload.
    pub payload: Bytes,
    prefix_len: usize,
}

impl ScannedRecord {
    pub(crate) fn new(fields: Vec<String>, payload: Bytes, prefix_len: usize) -> Self {
        Self {
            fields,
            payload,
            prefix_len,
        }
    }

    /// The key fields the scan prefix did not pin down.
    pub fn tail(&self) -> &[String] {
        &self.fields[self.prefix_len..]
    }

    /// Number of leading key fields fixed by the scan prefix.
    pub fn prefix_len(&self) -> usize {
        self.prefix_len
    }

    /// Deserializes the payload as JSON.
    pub fn payload_json<T: DeserializeOwned>(&self) -> Result<T> {
        payload::from_json(&self.payload)
    }
}
