//! Credential management for the authenticated request pipeline.
//!
//! The pipeline consumes sessions through the [`CredentialStore`] trait and
//! never mints tokens itself; the OAuth exchange lives behind
//! [`TokenRefresher`] and is supplied by the embedding application.

mod store;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::env;

pub use store::MemoryCredentialStore;

/// An authenticated API session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Bearer token presented on every request.
    pub access_token: String,
    /// Base URL of the org instance the session is bound to.
    pub instance_url: String,
    /// Identity URL of the authenticated user, when known.
    pub identity_url: Option<String>,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>, instance_url: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            instance_url: instance_url.into(),
            identity_url: None,
        }
    }

    /// Loads a session from `SF_ACCESS_TOKEN`, `SF_INSTANCE_URL` and the
    /// optional `SF_IDENTITY_URL` environment variables.
    pub fn from_env() -> Result<Self> {
        let access_token =
            env::var("SF_ACCESS_TOKEN").context("SF_ACCESS_TOKEN environment variable not set")?;
        let instance_url =
            env::var("SF_INSTANCE_URL").context("SF_INSTANCE_URL environment variable not set")?;
        let identity_url = env::var("SF_IDENTITY_URL").ok();

        Ok(Self {
            access_token,
            instance_url,
            identity_url,
        })
    }
}

/// Holds the current session and replaces it when the API rejects it.
///
/// `current` is a non-blocking read so the pipeline can bail out before any
/// network round trip when no session exists. Implementations must serialize
/// `refresh` so that concurrent unauthorized responses trigger at most one
/// token exchange, with every waiter observing its result.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns the current credentials, or `None` when no session exists.
    fn current(&self) -> Option<Credentials>;

    /// Exchanges the long-lived secret for a fresh session.
    async fn refresh(&self) -> Result<Credentials>;
}

/// External OAuth collaborator that trades a long-lived secret for a new
/// session. Fails with a distinguishable error when the exchange itself
/// cannot succeed (revoked refresh token, unreachable token endpoint).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn exchange(&self) -> Result<Credentials>;
}
