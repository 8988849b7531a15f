//! HTTP transport over reqwest.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};

use crate::USER_AGENT;
use crate::request::RequestDescriptor;

/// Raw response handed back by the transport: status plus the full body.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

/// Sends fully-formed requests over the wire.
///
/// Dropping the returned future cancels the in-flight request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: RequestDescriptor) -> Result<RawResponse>;
}

/// reqwest-backed transport.
///
/// Timeout, proxy, and TLS policy belong to the `reqwest::Client` the caller
/// hands in; [`ReqwestTransport::with_defaults`] builds one with just the
/// crate User-Agent set.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn with_defaults() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self::new(client))
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[tracing::instrument(skip(self, request), fields(url = %request.url))]
    async fn send(&self, request: RequestDescriptor) -> Result<RawResponse> {
        debug!("{} {}", request.method, request.url);

        let RequestDescriptor {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.client.request(method, url.as_str());
        for (name, value) in &headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder.send().await.context("Failed to send request")?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .context("Failed to read response body")?
            .to_vec();

        Ok(RawResponse { status, body })
    }
}
