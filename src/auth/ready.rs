//! Bootstrap readiness gate.
//!
//! Hosts that seed credentials asynchronously at startup hand the client a
//! future to await before its first credential read, decoupling bootstrap
//! timing from the request logic. Hosts without a bootstrap phase use
//! [`ReadyGate::immediate`].

use std::future::Future;

use futures::future::{BoxFuture, FutureExt, Shared};

/// Gate awaited before the first credential read of every request.
#[derive(Clone, Default)]
pub struct ReadyGate {
    gate: Option<Shared<BoxFuture<'static, ()>>>,
}

impl ReadyGate {
    /// A gate that is already open.
    pub fn immediate() -> Self {
        Self { gate: None }
    }

    /// Gate on `bootstrap`; every clone waits on the same completion.
    pub fn new<F>(bootstrap: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            gate: Some(bootstrap.boxed().shared()),
        }
    }

    /// Wait until the host's bootstrap has finished.
    pub async fn wait(&self) {
        if let Some(gate) = &self.gate {
            gate.clone().await;
        }
    }
}
