//! Shared per-session coordination state.
//!
//! The context is the single home for the in-memory access token, the
//! in-flight renewal operation, and the redirect latch. Every component in
//! a session is constructed from a clone of the same handle, so two
//! independently built clients still observe one in-flight renewal. That
//! sharing is a correctness requirement, not a convenience: the refresh
//! token is single-use, and two renewals racing would burn it twice.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;

/// The single shared in-flight renewal operation.
///
/// Resolves to the fresh access token, or `None` when the session turned
/// out to be unrecoverable. Every caller that joins it observes the same
/// settled result.
pub(crate) type RenewalFuture = Shared<BoxFuture<'static, Option<String>>>;

/// Cheaply cloneable handle to the session's shared mutable state.
#[derive(Clone, Default)]
pub struct SessionContext {
    inner: Arc<ContextInner>,
}

#[derive(Default)]
struct ContextInner {
    access_token: Mutex<Option<String>>,
    renewal: Mutex<Option<RenewalFuture>>,
    redirect_issued: AtomicBool,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current in-memory access token, no side effects.
    pub fn access_token(&self) -> Option<String> {
        self.inner.access_token.lock().clone()
    }

    /// Replace (or drop, with `None`) the in-memory access token.
    pub fn set_access_token(&self, token: Option<String>) {
        *self.inner.access_token.lock() = token;
    }

    /// Join the in-flight renewal, or install a new one built by `start`.
    ///
    /// The existence check and the install happen under one lock with no
    /// intervening suspension point, so two callers can never both believe
    /// they are first. `start` only constructs the future; nothing runs
    /// until a caller polls it.
    pub(crate) fn join_or_install_renewal<F>(&self, start: F) -> RenewalFuture
    where
        F: FnOnce() -> RenewalFuture,
    {
        let mut slot = self.inner.renewal.lock();
        if let Some(existing) = slot.as_ref() {
            return existing.clone();
        }
        let operation = start();
        *slot = Some(operation.clone());
        operation
    }

    /// Drop the recorded renewal operation, if any. Callers already holding
    /// a clone of it still observe its settled result.
    pub(crate) fn clear_renewal(&self) {
        self.inner.renewal.lock().take();
    }

    /// Whether a renewal operation is currently recorded.
    pub(crate) fn renewal_in_flight(&self) -> bool {
        self.inner.renewal.lock().is_some()
    }

    /// Claim the one-shot redirect. Returns `false` when a redirect was
    /// already issued in this session epoch.
    pub(crate) fn claim_redirect(&self) -> bool {
        !self.inner.redirect_issued.swap(true, Ordering::SeqCst)
    }

    /// Re-arm the redirect latch. Called when a fresh refresh credential is
    /// seeded and a new session epoch begins.
    pub(crate) fn arm_redirect(&self) {
        self.inner.redirect_issued.store(false, Ordering::SeqCst);
    }
}
