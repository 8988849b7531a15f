//! Error types surfaced by the request pipeline.

use serde_json::Value;

/// Terminal errors returned by [`crate::http::RestClient::execute`].
///
/// The only error the pipeline recovers from on its own is a first-attempt
/// `AuthenticationRequired`; everything else is handed to the caller as-is.
#[derive(Debug)]
pub enum ApiError {
    /// No usable credentials, or the request was still unauthorized after a refresh.
    AuthenticationRequired,
    /// The request builder could not produce a valid request.
    RequestConstruction(anyhow::Error),
    /// The API returned a structured error payload.
    Response {
        code: String,
        message: String,
        fields: Option<Vec<String>>,
    },
    /// The server reported an internal error (HTTP 500).
    Server,
    /// The response payload did not match the shape the decoder expected.
    Deserialization {
        element: Option<String>,
        payload: Value,
    },
    /// An HTTP status outside the documented set (e.g. 418, 502).
    UnexpectedStatus(u16),
    /// Network-level failure: DNS, TLS, timeout, connection reset.
    Transport(anyhow::Error),
    /// The credential refresh itself failed.
    Refresh(anyhow::Error),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::AuthenticationRequired => {
                write!(f, "Authentication required. Log in again to obtain a new session.")
            }
            ApiError::RequestConstruction(err) => {
                write!(f, "Could not build request: {}", err)
            }
            ApiError::Response {
                code,
                message,
                fields,
            } => {
                write!(f, "API error {}: {}", code, message)?;
                if let Some(fields) = fields {
                    write!(f, " (fields: {})", fields.join(", "))?;
                }
                Ok(())
            }
            ApiError::Server => {
                write!(f, "The server reported an internal error. Try again later.")
            }
            ApiError::Deserialization { element, .. } => match element {
                Some(name) => write!(f, "Unexpected response shape: element `{}`", name),
                None => write!(f, "Unexpected response shape"),
            },
            ApiError::UnexpectedStatus(status) => {
                write!(f, "Unhandled HTTP status: {}", status)
            }
            ApiError::Transport(err) => {
                write!(f, "Network error: {}", err)
            }
            ApiError::Refresh(err) => {
                write!(f, "Failed to refresh credentials: {}", err)
            }
        }
    }
}

impl std::error::Error for ApiError {}

/// Shape mismatch reported by a response decoder.
///
/// The pipeline wraps this into [`ApiError::Deserialization`] together with
/// the payload that failed to decode.
#[derive(Debug)]
pub struct DecodeError {
    /// Name of the element that was missing or mistyped, when known.
    pub element: Option<String>,
    pub message: String,
}

impl DecodeError {
    /// A mismatch attributed to a specific element of the payload.
    pub fn element(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            element: Some(name.into()),
            message: message.into(),
        }
    }

    /// A mismatch with no single element to blame.
    pub fn shape(message: impl Into<String>) -> Self {
        Self {
            element: None,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DecodeError {}
