//! Authenticated REST client module.
//!
//! `RequestExecutor` performs a single outbound call; `ApiClient` layers
//! the credential lifecycle on top: acquire, attempt, renew once, retry
//! once. Session failures surface to callers as absent results, never as
//! errors - by the time a fetch resolves to `None` the session has already
//! been handled.

pub mod client;
pub mod error;
pub mod request;

pub use client::ApiClient;
pub use error::ApiError;
pub use request::{MultipartField, RequestBody, RequestExecutor, RequestOptions};
