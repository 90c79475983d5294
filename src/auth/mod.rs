//! Session and credential management.
//!
//! This module owns every piece of credential state for a client session:
//!
//! - `SessionContext`: shared coordination state (access token, in-flight renewal, redirect latch)
//! - `CredentialStore`: in-memory access token plus durable refresh-token storage
//! - `RenewalCoordinator`: single-flight exchange of the refresh token
//! - `SessionTerminator`: one-shot session teardown and login redirect
//! - `ReadyGate`: bootstrap gate awaited before the first credential read
//!
//! The refresh token rotates on every renewal, so a given value can be
//! redeemed at most once; everything here exists to make sure it is.

pub mod context;
pub mod cookie;
pub mod gate;
pub mod ready;
pub mod renewal;
pub mod store;
pub mod terminator;

pub use context::SessionContext;
pub use ready::ReadyGate;
pub use renewal::RenewalCoordinator;
pub use store::CredentialStore;
pub use terminator::{Navigator, SessionTerminator};
