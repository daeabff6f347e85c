//! Error taxonomy for spotwatch.
//!
//! Every component hands its failure straight back to the caller. Nothing in
//! the library retries on its own; the single refresh-and-retry on an expired
//! access token lives in [`crate::watch`].

use thiserror::Error;

use crate::spotify::history::MAX_LIMIT;

#[derive(Error, Debug)]
pub enum Error {
    /// Credential rejected, expired or revoked.
    #[error("authorization rejected ({status}): {message}")]
    Auth { status: u16, message: String },

    /// Network, timeout or connection failure.
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// Unexpected non-2xx from a reachable endpoint, or an unusable 2xx body.
    #[error("unexpected response ({status}): {body}")]
    Remote { status: u16, body: String },

    /// A play event violates a required-field rule.
    #[error("malformed play event at index {index}: {reason}")]
    Mapping { index: usize, reason: String },

    #[error("limit must be between 1 and {max}, got {0}", max = MAX_LIMIT)]
    InvalidLimit(u32),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Short, stable name of the error kind for user-facing reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Auth { .. } => "auth",
            Error::Transport(_) => "transport",
            Error::Remote { .. } => "remote",
            Error::Mapping { .. } => "mapping",
            Error::InvalidLimit(_) => "invalid-limit",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Auth { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
