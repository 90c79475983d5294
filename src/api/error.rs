use thiserror::Error;

/// Failure modes of an authenticated fetch.
///
/// Callers of [`crate::ApiClient::fetch`] never see these directly:
/// authentication failures resolve to an absent result after the session
/// has already been handled (torn down and redirected). The typed taxonomy
/// exists so the attempt/renew/retry state machine stays testable through
/// [`crate::ApiClient::try_fetch`].
#[derive(Error, Debug)]
pub enum ApiError {
    /// No access token and no way to renew one. Expected immediately after
    /// logout; no API call was attempted.
    #[error("no usable session credential")]
    NoSession,

    /// The request was still unauthorized after one renewal and one retry.
    #[error("unauthorized after credential renewal")]
    Unauthorized,

    /// The response body could not be parsed as the expected payload.
    /// Not an authentication failure; no teardown happens.
    #[error("malformed response body: {0}")]
    MalformedResponse(#[source] reqwest::Error),

    /// Transport-level failure on the API call itself.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The access token cannot be carried in an Authorization header.
    #[error("credential not representable as a header value: {0}")]
    InvalidCredential(#[source] reqwest::header::InvalidHeaderValue),
}
