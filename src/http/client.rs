//! The asynchronous request pipeline with one-shot session retry.

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::auth::{CredentialStore, Credentials};
use crate::decode;
use crate::error::{ApiError, DecodeError};
use crate::request::RequestDescriptor;
use crate::transport::Transport;

use super::classify::{Outcome, classify};

/// REST client that attaches the current session to every request and
/// replays a rejected request once after refreshing.
///
/// A logical call moves through two states at most: the first attempt with
/// the store's current session, and one replay with the refreshed session
/// when the first attempt came back unauthorized. A second rejection is
/// surfaced as [`ApiError::AuthenticationRequired`] so a bad refresh can
/// never loop.
pub struct RestClient<S, T> {
    store: S,
    transport: T,
}

impl<S: CredentialStore, T: Transport> RestClient<S, T> {
    pub fn new(store: S, transport: T) -> Self {
        Self { store, transport }
    }

    /// Returns a reference to the credential store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Builds, sends, classifies, and decodes one API operation.
    ///
    /// `build` maps the session to a request and runs once per attempt, so a
    /// replay picks up the refreshed token. `decode` maps the JSON payload of
    /// a successful response to the caller's type; its failure is reported as
    /// [`ApiError::Deserialization`] together with the offending payload.
    #[tracing::instrument(skip(self, build, decode))]
    pub async fn execute<B, D, Out>(&self, build: B, decode: D) -> Result<Out, ApiError>
    where
        B: Fn(&Credentials) -> anyhow::Result<RequestDescriptor>,
        D: Fn(&Value) -> Result<Out, DecodeError>,
    {
        let Some(credentials) = self.store.current() else {
            debug!("No session available, skipping the network round trip.");
            return Err(ApiError::AuthenticationRequired);
        };

        match self.attempt(&build, &decode, &credentials).await {
            Err(ApiError::AuthenticationRequired) => {
                warn!("Request rejected as unauthorized, refreshing the session...");
                let refreshed = self.store.refresh().await.map_err(ApiError::Refresh)?;
                self.attempt(&build, &decode, &refreshed).await
            }
            outcome => outcome,
        }
    }

    /// Sugar for [`execute`](Self::execute) with a serde-typed decoder.
    pub async fn fetch<B, Out>(&self, build: B) -> Result<Out, ApiError>
    where
        B: Fn(&Credentials) -> anyhow::Result<RequestDescriptor>,
        Out: DeserializeOwned,
    {
        self.execute(build, decode::typed::<Out>()).await
    }

    /// One build-send-classify-decode round trip with the given session.
    async fn attempt<B, D, Out>(
        &self,
        build: &B,
        decode: &D,
        credentials: &Credentials,
    ) -> Result<Out, ApiError>
    where
        B: Fn(&Credentials) -> anyhow::Result<RequestDescriptor>,
        D: Fn(&Value) -> Result<Out, DecodeError>,
    {
        let request = build(credentials).map_err(ApiError::RequestConstruction)?;

        let response = self
            .transport
            .send(request)
            .await
            .map_err(ApiError::Transport)?;

        match classify(response.status, &response.body) {
            Outcome::Success(payload) => match decode(&payload) {
                Ok(value) => Ok(value),
                Err(err) => Err(ApiError::Deserialization {
                    element: err.element,
                    payload,
                }),
            },
            Outcome::Failure(err) => Err(err),
        }
    }
}
