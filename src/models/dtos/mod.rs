use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub mod device;

/// Decodes a request body that must be a JSON object.
///
/// Derived `Deserialize` impls also take sequences, so `["name", "mac"]` would
/// otherwise fill the fields by position.
pub fn decode_object<T: DeserializeOwned>(body: &[u8]) -> serde_json::Result<T> {
    let object: Map<String, Value> = serde_json::from_slice(body)?;
    serde_json::from_value(Value::Object(object))
}
