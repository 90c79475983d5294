//! One-shot session teardown.
//!
//! When a session turns out to be unrecoverable - the refresh token is
//! missing, rejected, or a protected call stays unauthorized after renewal -
//! every piece of credential state is cleared and the user is sent to the
//! login surface. The redirect fires at most once per session epoch and
//! never while the user is already looking at the login surface, which
//! would otherwise loop if the login page itself makes a failing call.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::auth::{CredentialStore, SessionContext};

/// Host-provided navigation hook.
///
/// The hosting UI owns routing; the terminator only needs to know where
/// the user currently is and how to send them to the login surface.
pub trait Navigator: Send + Sync {
    /// Path the user is currently looking at.
    fn current_path(&self) -> String;

    /// Navigate the user to `path`.
    fn navigate(&self, path: &str);
}

#[derive(Clone)]
pub struct SessionTerminator {
    ctx: SessionContext,
    store: CredentialStore,
    navigator: Arc<dyn Navigator>,
    login_path: String,
}

impl SessionTerminator {
    pub fn new(
        ctx: SessionContext,
        store: CredentialStore,
        navigator: Arc<dyn Navigator>,
        login_path: String,
    ) -> Self {
        Self {
            ctx,
            store,
            navigator,
            login_path,
        }
    }

    /// Tear the session down and send the user to the login surface.
    ///
    /// Clearing is idempotent. The redirect is skipped when the user is
    /// already on the login surface, and when one was already issued in
    /// this session epoch.
    pub fn force_logout(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear credential state during logout");
        }
        // Drop any pending renewal so a later session starts fresh.
        self.ctx.clear_renewal();

        if self.navigator.current_path() == self.login_path {
            debug!("Already on the login surface, skipping redirect");
            return;
        }
        if !self.ctx.claim_redirect() {
            debug!("Redirect already issued, skipping");
            return;
        }
        self.navigator.navigate(&self.login_path);
    }
}
