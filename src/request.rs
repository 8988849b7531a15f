//! Request descriptors produced by per-operation builders.

use anyhow::{Context, Result};
use reqwest::Method;
use serde::Serialize;

/// A fully-formed request, ready to hand to the transport.
///
/// Builders create one of these per attempt; the transport consumes it once.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Appends a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attaches the session token as an `Authorization: Bearer` header.
    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {}", token))
    }

    /// Sets a raw body.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serializes `payload` as the JSON body and sets the content type.
    pub fn json<T: Serialize>(mut self, payload: &T) -> Result<Self> {
        let body = serde_json::to_vec(payload).context("Failed to serialize request body")?;
        self.body = Some(body);
        Ok(self.header("Content-Type", "application/json"))
    }
}
