//! Lenient field decoders for backend payloads.
//!
//! The backend is not consistent about ids and coordinates: the same field may
//! arrive as a JSON string, a number, or `null`.

use serde::Deserializer;
use serde::de::{self, Visitor};
use std::fmt;

struct StringOrNumber;

impl<'de> Visitor<'de> for StringOrNumber {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a string, a number or null")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_none<E: de::Error>(self) -> Result<String, E> {
        Ok(String::new())
    }

    fn visit_unit<E: de::Error>(self) -> Result<String, E> {
        Ok(String::new())
    }
}

/// Decodes a string, number, bool or `null` into a `String`.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(StringOrNumber)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "super::string_or_number")]
        value: String,
    }

    fn decode(json: &str) -> String {
        serde_json::from_str::<Holder>(json).unwrap().value
    }

    #[test]
    fn test_accepts_every_scalar() {
        assert_eq!(decode(r#"{"value":"abc"}"#), "abc");
        assert_eq!(decode(r#"{"value":12}"#), "12");
        assert_eq!(decode(r#"{"value":-3}"#), "-3");
        assert_eq!(decode(r#"{"value":1.5}"#), "1.5");
        assert_eq!(decode(r#"{"value":null}"#), "");
        assert_eq!(decode(r#"{}"#), "");
    }

    #[test]
    fn test_rejects_objects() {
        assert!(serde_json::from_str::<Holder>(r#"{"value":{"a":1}}"#).is_err());
    }
}
