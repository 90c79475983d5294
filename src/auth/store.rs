//! Credential persistence for a client session.
//!
//! The access token lives only in process memory, inside the shared
//! [`SessionContext`]. The refresh token and the cached user profile are
//! persisted to the storage directory so a session survives a full
//! application restart, and the refresh token is additionally mirrored as
//! a rendered cookie for the server-side route gate.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::debug;

use crate::auth::cookie;
use crate::auth::SessionContext;
use crate::models::UserProfile;

/// Durable storage entry holding the raw refresh token
const REFRESH_TOKEN_FILE: &str = "refresh_token";

/// Durable storage entry holding the cached user profile
const USER_FILE: &str = "user.json";

/// Mirrored cookie consumed by the server-side route gate
const COOKIE_FILE: &str = "refresh_cookie";

/// Store for both credential tiers of a session.
/// Clone is cheap - the context is an `Arc` handle and the path is small.
#[derive(Clone)]
pub struct CredentialStore {
    ctx: SessionContext,
    storage_dir: PathBuf,
}

impl CredentialStore {
    pub fn new(ctx: SessionContext, storage_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&storage_dir).with_context(|| {
            format!("Failed to create storage directory: {}", storage_dir.display())
        })?;
        Ok(Self { ctx, storage_dir })
    }

    // ===== Access token (in-memory) =====

    /// Current access token, no side effects.
    pub fn access_token(&self) -> Option<String> {
        self.ctx.access_token()
    }

    /// Replace the in-memory access token.
    pub fn set_access_token(&self, token: String) {
        self.ctx.set_access_token(Some(token));
    }

    /// Drop the in-memory access token, e.g. after a 401.
    pub fn clear_access_token(&self) {
        self.ctx.set_access_token(None);
    }

    // ===== Refresh token (durable) =====

    /// Read the persisted refresh token. Survives an application restart.
    pub fn refresh_token(&self) -> Option<String> {
        match std::fs::read_to_string(self.path(REFRESH_TOKEN_FILE)) {
            Ok(contents) => {
                let token = contents.trim().to_string();
                if token.is_empty() {
                    None
                } else {
                    Some(token)
                }
            }
            Err(_) => None,
        }
    }

    /// Persist a freshly issued refresh token and rewrite the mirrored
    /// cookie. The previous value is gone once this returns.
    pub fn set_refresh_token(&self, token: &str) -> Result<()> {
        std::fs::write(self.path(REFRESH_TOKEN_FILE), token)
            .context("Failed to persist refresh token")?;
        std::fs::write(
            self.path(COOKIE_FILE),
            cookie::refresh_cookie(token, Utc::now()),
        )
        .context("Failed to mirror refresh cookie")?;

        // A fresh refresh credential begins a new session epoch.
        self.ctx.arm_redirect();
        Ok(())
    }

    // ===== User profile =====

    /// Read the cached user profile, if one is persisted.
    pub fn user_profile(&self) -> Option<UserProfile> {
        let contents = std::fs::read_to_string(self.path(USER_FILE)).ok()?;
        match serde_json::from_str(&contents) {
            Ok(profile) => Some(profile),
            Err(e) => {
                debug!(error = %e, "Failed to parse cached user profile");
                None
            }
        }
    }

    /// Persist the user profile next to the refresh credential.
    pub fn set_user_profile(&self, profile: &UserProfile) -> Result<()> {
        let contents = serde_json::to_string_pretty(profile)?;
        std::fs::write(self.path(USER_FILE), contents)
            .context("Failed to persist user profile")?;
        Ok(())
    }

    // ===== Teardown =====

    /// Remove every piece of credential state: the in-memory access token,
    /// the persisted refresh token, the cached profile, and the mirrored
    /// cookie (rewritten with `Max-Age=0`). Safe to call repeatedly.
    pub fn clear(&self) -> Result<()> {
        self.ctx.set_access_token(None);
        remove_if_exists(&self.path(REFRESH_TOKEN_FILE))?;
        remove_if_exists(&self.path(USER_FILE))?;
        std::fs::write(self.path(COOKIE_FILE), cookie::clear_cookie())
            .context("Failed to expire refresh cookie")?;
        Ok(())
    }

    fn path(&self, name: &str) -> PathBuf {
        self.storage_dir.join(name)
    }
}

fn remove_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}
