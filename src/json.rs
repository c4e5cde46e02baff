//! JSON encode/decode hooks for [`TypedMap`].
//!
//! The serialized form is a JSON object whose members are exactly the map's
//! entries. See [`Value`]'s `Serialize` impl for how each variant is written.

use crate::error::MapError;
use crate::map::TypedMap;
use crate::value::Value;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use std::collections::HashMap;

impl Serialize for TypedMap {
    /// Serializes the entries while holding the read lock, so the output is a
    /// consistent view even with concurrent writers.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.with_entries(|entries| serializer.collect_map(entries))
    }
}

impl<'de> Deserialize<'de> for TypedMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        HashMap::<String, Value>::deserialize(deserializer).map(TypedMap::from)
    }
}

impl TypedMap {
    /// Encodes the map as a JSON object.
    pub fn to_json(&self) -> Result<String, MapError> {
        serde_json::to_string(self).map_err(MapError::Encode)
    }

    pub fn to_json_vec(&self) -> Result<Vec<u8>, MapError> {
        serde_json::to_vec(self).map_err(MapError::Encode)
    }

    /// Builds a new map from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns `MapError::Decode` if `bytes` isn't a JSON object.
    pub fn from_json(bytes: &[u8]) -> Result<Self, MapError> {
        serde_json::from_slice(bytes).map_err(MapError::Decode)
    }

    /// Replaces every entry with the members of a JSON object.
    ///
    /// The payload is decoded before the write lock is taken, so a malformed
    /// payload leaves the current entries untouched.
    ///
    /// # Errors
    ///
    /// Returns `MapError::Decode` if `bytes` isn't a JSON object.
    ///
    /// # Examples
    ///
    /// ```
    /// use sovran_valuemap::{MapError, TypedMap};
    ///
    /// let map = TypedMap::new();
    /// map.set("stale", true);
    ///
    /// map.load_json(br#"{"user": "ada", "admin": "true"}"#)?;
    /// assert!(!map.contains_key("stale"));
    /// assert!(map.get_bool("admin"));
    ///
    /// assert!(matches!(map.load_json(b"{not json"), Err(MapError::Decode(_))));
    /// assert_eq!(map.get_string("user"), "ada");
    /// # Ok::<(), MapError>(())
    /// ```
    pub fn load_json(&self, bytes: &[u8]) -> Result<(), MapError> {
        let entries: HashMap<String, Value> = serde_json::from_slice(bytes).map_err(|err| {
            tracing::debug!(error = %err, "rejected typed map payload");
            MapError::Decode(err)
        })?;
        tracing::debug!(entries = entries.len(), "replacing typed map entries");
        self.replace(entries);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use serde_json::json;

    #[test]
    fn test_encode_is_an_object_of_entries() {
        let map = TypedMap::new();
        map.set("name", "ada");
        map.set("age", 36);
        map.set("ratio", 0.5);
        map.set("nothing", Value::Null);
        map.set("timeout", TimeDelta::seconds(2));

        let encoded: serde_json::Value = serde_json::from_str(&map.to_json().unwrap()).unwrap();
        assert_eq!(
            encoded,
            json!({
                "name": "ada",
                "age": 36,
                "ratio": 0.5,
                "nothing": null,
                "timeout": 2_000_000_000i64
            })
        );
    }

    #[test]
    fn test_empty_map_encodes_as_empty_object() {
        assert_eq!(TypedMap::new().to_json().unwrap(), "{}");
    }

    #[test]
    fn test_decode_rejects_non_objects() {
        let payloads: [&[u8]; 5] = [b"[1, 2]", b"\"text\"", b"null", b"", b"{\"a\": }"];
        for payload in payloads {
            assert!(
                matches!(TypedMap::from_json(payload), Err(MapError::Decode(_))),
                "{}",
                String::from_utf8_lossy(payload)
            );
        }
    }

    #[test]
    fn test_failed_load_keeps_entries() {
        let map = TypedMap::new();
        map.set("a", 1);

        assert!(map.load_json(b"{\"a\": 2,").is_err());
        assert_eq!(map.get_i64("a"), 1);
    }

    #[test]
    fn test_round_trip_through_bytes() {
        let map = TypedMap::new();
        map.set("text", "hello");
        map.set("int", -5);
        map.set("float", 1.2345);
        map.set("flag", false);
        map.set("list", vec![Value::from(1), Value::from("two")]);
        map.set_epoch_millis("when", 306_999_300_000);
        map.set("nested", Value::from(TypedMap::copy([("inner", 1)])));

        let decoded = TypedMap::from_json(&map.to_json_vec().unwrap()).unwrap();

        assert_eq!(decoded.len(), map.len());
        assert_eq!(decoded.get("text"), map.get("text"));
        assert_eq!(decoded.get("int"), map.get("int"));
        assert_eq!(decoded.get("float"), map.get("float"));
        assert_eq!(decoded.get("flag"), map.get("flag"));
        assert_eq!(decoded.get("list"), map.get("list"));
        assert_eq!(decoded.get_epoch_millis("when"), 306_999_300_000);
        assert_eq!(decoded.get_sub_map("nested").get_i64("inner"), 1);
    }

    #[test]
    fn test_deserialize_from_json_value() {
        let attrs: TypedMap = serde_json::from_value(json!({"color": "red", "size": 3})).unwrap();
        assert_eq!(attrs.get_string("color"), "red");
        assert_eq!(attrs.get("size"), Some(Value::Int(3)));
    }
}
