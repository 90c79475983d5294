//! Single-flight renewal of the session credential pair.
//!
//! Renewal consumes the persisted refresh token, which the endpoint
//! rotates on every success: a given value can only ever be redeemed once.
//! The coordinator therefore funnels every concurrent "credential expired"
//! discovery into one shared in-flight operation. Callers that arrive
//! while it runs await that exact operation and observe its settled
//! result; the next caller after it settles starts a fresh one.

use std::time::Duration;

use futures::FutureExt;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::{CredentialStore, SessionContext, SessionTerminator};
use crate::models::TokenPair;

/// Renewal endpoint path on the API origin
const REFRESH_PATH: &str = "/auth/refresh";

/// Timeout for the renewal call specifically.
/// Every request behind an expired credential waits on this one call, so
/// it gets a tighter bound than the client-wide default.
const RENEWAL_TIMEOUT_SECS: u64 = 15;

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Why a renewal attempt failed. Every case tears the session down.
#[derive(Debug, Error)]
enum RenewalFailure {
    #[error("no refresh token available")]
    MissingRefreshToken,

    #[error("renewal endpoint rejected the refresh token (status {0})")]
    Rejected(reqwest::StatusCode),

    #[error("renewal transport failure: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("malformed renewal payload: {0}")]
    MalformedPayload(#[source] reqwest::Error),

    #[error("failed to persist rotated credentials: {0}")]
    Storage(#[source] anyhow::Error),
}

#[derive(Clone)]
pub struct RenewalCoordinator {
    ctx: SessionContext,
    store: CredentialStore,
    terminator: SessionTerminator,
    http: Client,
    refresh_url: String,
}

impl RenewalCoordinator {
    pub fn new(
        ctx: SessionContext,
        store: CredentialStore,
        terminator: SessionTerminator,
        http: Client,
        api_origin: &str,
    ) -> Self {
        Self {
            refresh_url: format!("{}{}", api_origin, REFRESH_PATH),
            ctx,
            store,
            terminator,
            http,
        }
    }

    /// Obtain a fresh access token, joining the in-flight renewal if one
    /// exists.
    ///
    /// The check for an existing operation and the recording of a new one
    /// happen under a single lock with no intervening await, so concurrent
    /// callers always converge on one operation and one consumption of the
    /// current refresh token. Returns `None` when the session is
    /// unrecoverable; the terminator has already run by then.
    pub async fn renew(&self) -> Option<String> {
        let operation = self.ctx.join_or_install_renewal(|| {
            let coordinator = self.clone();
            coordinator.run().boxed().shared()
        });
        operation.await
    }

    /// Body of one renewal operation.
    ///
    /// Clears the recorded operation as its very last step, on every exit
    /// path, so the caller after settlement starts a fresh renewal instead
    /// of replaying this one.
    async fn run(self) -> Option<String> {
        let token = match self.exchange().await {
            Ok(token) => {
                debug!("Session credential renewed");
                Some(token)
            }
            Err(e) => {
                warn!(error = %e, "Session renewal failed, tearing down session");
                self.terminator.force_logout();
                None
            }
        };
        self.ctx.clear_renewal();
        token
    }

    /// Exchange the persisted refresh token for a rotated credential pair.
    async fn exchange(&self) -> Result<String, RenewalFailure> {
        let refresh_token = self
            .store
            .refresh_token()
            .ok_or(RenewalFailure::MissingRefreshToken)?;

        let response = self
            .http
            .post(&self.refresh_url)
            .timeout(Duration::from_secs(RENEWAL_TIMEOUT_SECS))
            .json(&RefreshRequest {
                refresh_token: &refresh_token,
            })
            .send()
            .await
            .map_err(RenewalFailure::Transport)?;

        if !response.status().is_success() {
            return Err(RenewalFailure::Rejected(response.status()));
        }

        let pair: TokenPair = response
            .json()
            .await
            .map_err(RenewalFailure::MalformedPayload)?;

        // Persist the rotated refresh token before anything can observe
        // the dead value again, then publish the access token.
        self.store
            .set_refresh_token(&pair.refresh_token)
            .map_err(RenewalFailure::Storage)?;
        self.store.set_access_token(pair.access_token.clone());

        Ok(pair.access_token)
    }
}
