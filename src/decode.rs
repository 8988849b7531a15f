//! Decoders mapping raw JSON payloads onto typed values.
//!
//! A decoder is any `Fn(&Value) -> Result<T, DecodeError>`; the factories
//! here cover the common cases.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::DecodeError;

/// Decodes the whole payload into any deserializable type.
pub fn typed<T: DeserializeOwned>() -> impl Fn(&Value) -> Result<T, DecodeError> {
    |payload| T::deserialize(payload).map_err(|err| DecodeError::shape(err.to_string()))
}

/// Extracts a single string field from an object payload, naming the field
/// in the failure when it is missing or not a string.
pub fn string_field(name: &str) -> impl Fn(&Value) -> Result<String, DecodeError> + '_ {
    move |payload| match payload.get(name).and_then(Value::as_str) {
        Some(value) => Ok(value.to_string()),
        None => Err(DecodeError::element(
            name,
            format!("Missing or non-string field `{}`", name),
        )),
    }
}

/// Passes the JSON payload through untouched.
pub fn raw() -> impl Fn(&Value) -> Result<Value, DecodeError> {
    |payload| Ok(payload.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_typed_decodes_struct() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct CreateResult {
            id: String,
            success: bool,
        }

        let payload = json!({"id": "001xx0000003DGQAA2", "success": true});
        let decoded: CreateResult = typed()(&payload).unwrap();
        assert_eq!(decoded.id, "001xx0000003DGQAA2");
        assert!(decoded.success);
    }

    #[test]
    fn test_typed_reports_shape_mismatch() {
        #[derive(serde::Deserialize, Debug)]
        struct CreateResult {
            #[allow(dead_code)]
            id: String,
        }

        let payload = json!({"success": true});
        let err = typed::<CreateResult>()(&payload).unwrap_err();
        assert!(err.to_string().contains("id"));
    }

    #[test]
    fn test_string_field_present() {
        let payload = json!({"id": "001xx0000003DGQAA2"});
        assert_eq!(
            string_field("id")(&payload).unwrap(),
            "001xx0000003DGQAA2"
        );
    }

    #[test]
    fn test_string_field_missing_names_element() {
        let payload = json!({"id": "001xx0000003DGQAA2"});
        let err = string_field("name")(&payload).unwrap_err();
        assert_eq!(err.element.as_deref(), Some("name"));
    }

    #[test]
    fn test_string_field_wrong_type_names_element() {
        let payload = json!({"count": 3});
        let err = string_field("count")(&payload).unwrap_err();
        assert_eq!(err.element.as_deref(), Some("count"));
    }

    #[test]
    fn test_raw_passthrough() {
        let payload = json!(["a", "b"]);
        assert_eq!(raw()(&payload).unwrap(), payload);
    }
}
