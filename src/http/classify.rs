//! Classification of raw transport responses into payloads or typed errors.

use log::debug;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;

/// Result of classifying a transport response.
#[derive(Debug)]
pub enum Outcome {
    /// Success status carrying a JSON payload.
    Success(Value),
    /// Anything the caller (or the retry path) has to handle.
    Failure(ApiError),
}

/// One entry of the error array the API returns on client errors.
#[derive(Deserialize, Debug)]
struct ErrorEntry {
    #[serde(rename = "errorCode")]
    error_code: String,
    message: String,
    fields: Option<Vec<String>>,
}

/// Maps an HTTP status and body onto an [`Outcome`].
///
/// 401 and 403 both signal a rejected session; the body is ignored for those
/// so an HTML login page or empty response cannot mask the condition.
pub fn classify(status: StatusCode, body: &[u8]) -> Outcome {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            debug!("Session rejected with HTTP {}.", status.as_u16());
            Outcome::Failure(ApiError::AuthenticationRequired)
        }
        StatusCode::BAD_REQUEST
        | StatusCode::NOT_FOUND
        | StatusCode::METHOD_NOT_ALLOWED
        | StatusCode::UNSUPPORTED_MEDIA_TYPE => Outcome::Failure(structured_error(status, body)),
        StatusCode::INTERNAL_SERVER_ERROR => Outcome::Failure(ApiError::Server),
        s if s.is_success() => success_payload(body),
        s => Outcome::Failure(ApiError::UnexpectedStatus(s.as_u16())),
    }
}

/// Parses the API's error-array body, falling back to a generic entry when
/// the body is not in the documented shape.
fn structured_error(status: StatusCode, body: &[u8]) -> ApiError {
    let first = serde_json::from_slice::<Vec<ErrorEntry>>(body)
        .ok()
        .and_then(|mut entries| {
            if entries.is_empty() {
                None
            } else {
                Some(entries.remove(0))
            }
        });

    match first {
        Some(entry) => ApiError::Response {
            code: entry.error_code,
            message: entry.message,
            fields: entry.fields,
        },
        None => ApiError::Response {
            code: "UNKNOWN_ERROR".to_string(),
            message: format!("Unknown error. HTTP status: {}", status.as_u16()),
            fields: None,
        },
    }
}

fn success_payload(body: &[u8]) -> Outcome {
    // 204-style responses carry no body at all.
    if body.is_empty() {
        return Outcome::Success(Value::Null);
    }

    match serde_json::from_slice(body) {
        Ok(payload) => Outcome::Success(payload),
        Err(err) => {
            debug!("Success status with unparseable body: {}", err);
            Outcome::Failure(ApiError::Deserialization {
                element: None,
                payload: Value::String(String::from_utf8_lossy(body).into_owned()),
            })
        }
    }
}
