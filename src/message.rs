//! The capability a value needs to be delivered as a message.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Conversion to the message map the delivery endpoints accept.
///
/// The client never interprets the fields; whatever the map contains is
/// serialized as-is and submitted. Implement this on your own message types,
/// or build a map directly and pass it through one of the provided impls.
///
/// ```
/// use postbox::MessagePayload;
/// use serde_json::{Map, Value};
///
/// struct Welcome<'a> {
///     to: &'a str,
/// }
///
/// impl MessagePayload for Welcome<'_> {
///     fn to_message_map(&self) -> Map<String, Value> {
///         let mut map = Map::new();
///         map.insert("From".to_string(), "noreply@example.com".into());
///         map.insert("To".to_string(), self.to.into());
///         map.insert("Subject".to_string(), "Welcome!".into());
///         map
///     }
/// }
/// ```
pub trait MessagePayload {
    fn to_message_map(&self) -> Map<String, Value>;
}

impl MessagePayload for Map<String, Value> {
    fn to_message_map(&self) -> Map<String, Value> {
        self.clone()
    }
}

impl MessagePayload for HashMap<String, Value> {
    fn to_message_map(&self) -> Map<String, Value> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl<T: MessagePayload + ?Sized> MessagePayload for &T {
    fn to_message_map(&self) -> Map<String, Value> {
        (**self).to_message_map()
    }
}

/// Builds a message map from any `Serialize` value representing a JSON object.
///
/// Convenient bridge for `#[derive(Serialize)]` message types that don't
/// implement [`MessagePayload`] themselves.
pub fn message_map_from<T: Serialize>(value: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(value).context("Failed to serialize message value")? {
        Value::Object(map) => Ok(map),
        other => bail!("Message must serialize to a JSON object, got {}", json_kind(&other)),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
