use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::{
    error::{Error, Result},
    spotify::status_error,
};

/// Endpoint-defined ceiling for `limit` on the recently-played endpoint.
pub const MAX_LIMIT: u32 = 50;

/// Checks `limit` against the endpoint's allowed range `1..=MAX_LIMIT`.
///
/// Out-of-range values are rejected, never clamped.
pub fn validate_limit(limit: u32) -> Result<u32> {
    if (1..=MAX_LIMIT).contains(&limit) {
        Ok(limit)
    } else {
        Err(Error::InvalidLimit(limit))
    }
}

/// Retrieves the first page of the user's recently played tracks.
///
/// Issues one `GET {api_url}/me/player/recently-played?limit={limit}` with
/// the access token as bearer. The payload is returned as-is: items are
/// newest first as delivered by Spotify and are not reordered. Only this
/// single page is fetched; `next` and `cursors` are never followed.
///
/// # Arguments
///
/// * `access_token` - Bearer token for the Web API
/// * `limit` - Number of play events to request (1-50)
///
/// # Errors
///
/// - [`Error::InvalidLimit`] before any request when `limit` is out of range
/// - [`Error::Auth`] on 401, the cue for the caller to refresh and retry
/// - [`Error::Transport`] on network or timeout failures
/// - [`Error::Remote`] on any other non-2xx, with status and body
/// - [`Error::Json`] when a 2xx body is not JSON
pub async fn get_recently_played(
    http: &Client,
    api_url: &str,
    access_token: &str,
    limit: u32,
) -> Result<Value> {
    let limit = validate_limit(limit)?;

    let api_url = format!(
        "{uri}/me/player/recently-played",
        uri = api_url.trim_end_matches('/')
    );

    let response = http
        .get(&api_url)
        .bearer_auth(access_token)
        .query(&[("limit", limit)])
        .send()
        .await
        .map_err(Error::Transport)?;

    if !response.status().is_success() {
        return Err(status_error(response, |s| s == StatusCode::UNAUTHORIZED).await);
    }

    let body = response.bytes().await.map_err(Error::Transport)?;
    Ok(serde_json::from_slice(&body)?)
}
