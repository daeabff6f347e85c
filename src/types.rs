use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use tabled::Tabled;

use crate::error::Result;

/// Seconds before the reported expiry at which an access token is treated as stale.
pub const EXPIRY_MARGIN_SECS: i64 = 240;

/// OAuth client credentials plus the tokens obtained for them.
///
/// Treated as an immutable value: every Authorizer call returns a fresh
/// `Credential` and the caller passes the latest one forward.
#[derive(Clone, PartialEq)]
pub struct Credential {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub access_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
            access_token: None,
            expires_at: None,
        }
    }

    /// Returns a copy carrying the tokens from `response`.
    ///
    /// The refresh token is only replaced when the service rotated it.
    pub fn with_token(&self, response: &TokenResponse, now: DateTime<Utc>) -> Self {
        Self {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            refresh_token: response
                .refresh_token
                .clone()
                .unwrap_or_else(|| self.refresh_token.clone()),
            access_token: Some(response.access_token.clone()),
            expires_at: expiry(now, response.expires_in),
        }
    }

    /// True when there is no access token or it is within the expiry margin.
    ///
    /// A token without a known expiry counts as valid until the API rejects it.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match (&self.access_token, self.expires_at) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(_), Some(at)) => now >= at - Duration::seconds(EXPIRY_MARGIN_SECS),
        }
    }
}

// `None` when `expires_in` does not fit a timestamp.
fn expiry(now: DateTime<Utc>, expires_in: u64) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(expires_in).ok()?;
    now.checked_add_signed(Duration::try_seconds(secs)?)
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Interactive authorization waiting for its callback.
pub struct PendingAuthorization {
    pub state: String,
    pub outcome: Option<Result<Credential>>,
}

impl PendingAuthorization {
    pub fn new(state: String) -> Self {
        Self {
            state,
            outcome: None,
        }
    }
}

/// Body of a successful `/api/token` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

fn default_expires_in() -> u64 {
    3600
}

/// Explicit presence/absence marker for nullable record columns.
///
/// Serializes as the value itself or as `null`; the key is always emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Field<T> {
    Present(T),
    Missing,
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Missing
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Field::Present(v),
            None => Field::Missing,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Present(v) => v.fmt(f),
            Field::Missing => f.write_str("-"),
        }
    }
}

// Raw shapes of `GET /me/player/recently-played`. Everything is optional so
// that required-field violations surface as mapping errors, not decode errors.
// Optional columns go through `lenient`: a value of the wrong type reads as absent.

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecentlyPlayedPage {
    #[serde(default)]
    pub items: Vec<RawPlayEvent>,
    pub next: Option<String>,
    pub cursors: Option<Cursors>,
    pub limit: Option<u32>,
    pub href: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cursors {
    pub after: Option<String>,
    pub before: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPlayEvent {
    pub track: Option<RawTrack>,
    pub played_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTrack {
    pub id: Option<String>,
    pub name: Option<String>,
    pub duration_ms: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub popularity: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub album: Option<RawAlbum>,
    #[serde(default, deserialize_with = "lenient")]
    pub artists: Option<Vec<RawArtist>>,
    #[serde(default, deserialize_with = "lenient")]
    pub external_ids: Option<ExternalIds>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAlbum {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawArtist {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalIds {
    #[serde(default, deserialize_with = "lenient")]
    pub isrc: Option<String>,
}

/// One row of `tbl_user_spotify_track_history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackHistoryRecord {
    pub played_at: DateTime<Utc>,
    pub selfopticon_user_id: String,
    pub spotify_user_id: String,
    pub track_id: String,
    pub track_name: String,
    pub track_duration_ms: u64,
    #[serde(default)]
    pub track_popularity: Field<u32>,
    #[serde(default)]
    pub album_id: Field<String>,
    #[serde(default)]
    pub album_name: Field<String>,
    #[serde(default)]
    pub first_artist_id: Field<String>,
    #[serde(default)]
    pub first_artist_name: Field<String>,
    #[serde(default)]
    pub isrc: Field<String>,
}

/// The two caller-supplied identifiers stamped on every record of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIds {
    pub selfopticon_user_id: String,
    pub spotify_user_id: String,
}

#[derive(Tabled)]
pub struct TrackHistoryTableRow {
    pub played_at: String,
    pub track: String,
    pub artist: String,
    pub album: String,
    pub duration: String,
}
