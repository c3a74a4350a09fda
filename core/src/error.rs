//! Error types for the QuestLog client.
//!
//! # Design
//! A single `ApiError` covers the three failure families the store deals
//! with: transport failures (the request never completed), API failures
//! (the server answered with a non-2xx status) and caller-side validation.
//! `Display` of an `Api` error is the server-supplied message alone, so it
//! can be shown to the user as-is.

/// Message used when a failed response carries no `error` field.
pub const GENERIC_API_ERROR: &str = "API Request Failed";

/// Errors produced by the client, transports and token storage.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server returned a non-2xx status.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The request never completed (DNS, connect, reset, ...).
    #[error("network error: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Rejected before any network call.
    #[error("{0}")]
    Validation(String),

    /// The persisted token could not be read or written.
    #[error("token storage failed: {0}")]
    Storage(String),

    /// An authenticated operation was attempted without a session.
    #[error("not logged in")]
    NotAuthenticated,
}

impl ApiError {
    /// HTTP status of an `Api` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for a 401/403 answer, i.e. the bearer token was rejected.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }
}
