//! # Spotify Integration Module
//!
//! Thin layer over the Spotify accounts service and Web API. Each function
//! issues exactly one HTTPS request and hands the outcome back untouched by
//! retries; deciding whether to try again is the orchestrator's job.
//!
//! ```text
//! watch (orchestration)
//!      ↓
//! spotify::auth      POST /api/token, authorize URL
//! spotify::history   GET  /me/player/recently-played
//!      ↓
//! reqwest (10 s timeout)
//! ```
//!
//! ## Error mapping
//!
//! - send/connect/timeout failures → [`Error::Transport`]
//! - rejected credentials → [`Error::Auth`]
//! - any other non-2xx → [`Error::Remote`] with status and body preserved

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};

use crate::error::{Error, Result};

pub mod auth;
pub mod history;

/// Timeout applied to every outbound request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the HTTP client shared by all calls of one run.
pub fn http_client() -> Result<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(format!(
            "{}/{}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        ))
        .build()
        .map_err(Error::Transport)
}

/// Reads the body of a non-success response and turns it into an error.
///
/// `is_auth` decides which statuses count as a credential rejection.
async fn status_error(response: Response, is_auth: fn(StatusCode) -> bool) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if is_auth(status) {
        Error::Auth {
            status: status.as_u16(),
            message: body,
        }
    } else {
        Error::Remote {
            status: status.as_u16(),
            body,
        }
    }
}
