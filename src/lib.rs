//! Authrelay - client-side authenticated request layer.
//!
//! This crate owns the credential lifecycle for a client application that
//! talks to a token-protected REST API:
//!
//! - [`CredentialStore`]: in-memory access token plus durable refresh-token storage
//! - [`RenewalCoordinator`]: single-flight credential renewal shared by all concurrent callers
//! - [`ApiClient`]: authenticated fetch with one renewal-and-retry on 401
//! - [`SessionTerminator`]: one-shot session teardown and login redirect
//!
//! The hosting application supplies the initial refresh credential after
//! interactive login (through [`CredentialStore::set_refresh_token`]) and
//! implements [`Navigator`] so the terminator can send the user to the
//! login surface. All clients built from the same [`SessionContext`] share
//! one in-flight renewal, which matters because the refresh token rotates
//! on every renewal and a given value can only be redeemed once.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

#[cfg(test)]
pub(crate) mod testutil;

pub use api::{ApiClient, ApiError, MultipartField, RequestBody, RequestExecutor, RequestOptions};
pub use auth::{
    CredentialStore, Navigator, ReadyGate, RenewalCoordinator, SessionContext, SessionTerminator,
};
pub use config::Config;
pub use models::{TokenPair, UserProfile};
