//! Test support: a recording navigator and a pre-wired client stack.

use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::TempDir;

use crate::api::ApiClient;
use crate::auth::{
    CredentialStore, Navigator, RenewalCoordinator, SessionContext, SessionTerminator,
};
use crate::config::Config;

/// Navigator that records navigations instead of performing them.
#[derive(Default)]
pub(crate) struct RecordingNavigator {
    current: Mutex<String>,
    visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub(crate) fn at(path: &str) -> Arc<Self> {
        Arc::new(Self {
            current: Mutex::new(path.to_string()),
            visits: Mutex::default(),
        })
    }

    pub(crate) fn set_current(&self, path: &str) {
        *self.current.lock() = path.to_string();
    }

    pub(crate) fn visits(&self) -> Vec<String> {
        self.visits.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        self.current.lock().clone()
    }

    fn navigate(&self, path: &str) {
        self.visits.lock().push(path.to_string());
        *self.current.lock() = path.to_string();
    }
}

/// Everything a scenario test needs, wired against one API origin.
///
/// The standalone components and the `ApiClient` are constructed
/// independently on purpose: they share only the `SessionContext` and the
/// storage directory, which is exactly the sharing the production design
/// relies on.
pub(crate) struct TestStack {
    pub(crate) client: ApiClient,
    pub(crate) store: CredentialStore,
    pub(crate) renewal: RenewalCoordinator,
    pub(crate) ctx: SessionContext,
    pub(crate) navigator: Arc<RecordingNavigator>,
    _storage: TempDir,
}

pub(crate) fn stack(api_origin: &str) -> TestStack {
    stack_at(api_origin, "/dashboard")
}

pub(crate) fn stack_at(api_origin: &str, current_path: &str) -> TestStack {
    let storage = TempDir::new().expect("tempdir");
    let config = Config {
        api_origin: api_origin.to_string(),
        login_path: "/login".to_string(),
        storage_dir: Some(storage.path().to_path_buf()),
    };

    let ctx = SessionContext::new();
    let navigator = RecordingNavigator::at(current_path);

    let store = CredentialStore::new(ctx.clone(), storage.path().to_path_buf()).expect("store");
    let terminator = SessionTerminator::new(
        ctx.clone(),
        store.clone(),
        navigator.clone() as Arc<dyn Navigator>,
        config.login_path.clone(),
    );
    let renewal = RenewalCoordinator::new(
        ctx.clone(),
        store.clone(),
        terminator,
        reqwest::Client::new(),
        api_origin,
    );

    let client = ApiClient::new(&config, ctx.clone(), navigator.clone() as Arc<dyn Navigator>)
        .expect("client");

    TestStack {
        client,
        store,
        renewal,
        ctx,
        navigator,
        _storage: storage,
    }
}
