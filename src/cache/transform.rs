//! Value Transform Module
//!
//! Reversible encoding applied to values before they are stored.

use std::fmt::Debug;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

// == Value Transform ==
/// Encodes values on `set` and decodes them on `get`.
///
/// Implementations must satisfy `decode(encode(v)) == v` for every value they
/// accept. A failing `encode` makes the store keep the raw value; a failing
/// `decode` is reported to the caller as a miss.
pub trait ValueTransform<V>: Send + Sync + Debug {
    fn encode(&self, value: &V) -> Result<String>;
    fn decode(&self, packed: &str) -> Result<V>;
}

// == JSON Transform ==
/// Stores values as their JSON text.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonTransform;

impl<V> ValueTransform<V> for JsonTransform
where
    V: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &V) -> Result<String> {
        Ok(serde_json::to_string(value)?)
    }

    fn decode(&self, packed: &str) -> Result<V> {
        Ok(serde_json::from_str(packed)?)
    }
}
