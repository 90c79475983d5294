//! Wire and storage types shared by the auth and api modules.

use serde::{Deserialize, Serialize};

/// Credential pair issued by the renewal endpoint.
///
/// The refresh token is rotated on every issue; the previous value is dead
/// the moment this arrives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

/// User profile cached in durable storage alongside the refresh credential.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}
