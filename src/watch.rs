//! One fetch-and-map cycle.
//!
//! Authorizer → HistoryFetcher → RecordMapper, strictly in sequence. The
//! only recovery is for an access token that expired mid-run: a 401 from the
//! fetch triggers exactly one refresh and one retried fetch. A second 401 is
//! terminal, as is every other failure.

use std::path::{Path, PathBuf};

use chrono::Utc;
use reqwest::Client;
use serde_json::Value;

use crate::{
    config::Endpoints,
    error::{Error, Result},
    records,
    spotify::{auth, history},
    types::{Credential, TrackHistoryRecord, UserIds},
};

pub const RAW_OUTPUT_FILE: &str = "recently_played.json";
pub const RECORDS_OUTPUT_FILE: &str = "track_history.json";

/// Result of a successful cycle.
#[derive(Debug, Clone)]
pub struct Cycle {
    /// Latest credential; differs from the input after any refresh.
    pub credential: Credential,
    /// Payload exactly as returned by the recently-played endpoint.
    pub raw: Value,
    pub records: Vec<TrackHistoryRecord>,
    /// Number of refresh-token grants issued during the cycle.
    pub refreshes: u32,
}

impl Cycle {
    /// True when the refresh token changed during the cycle.
    pub fn rotated_refresh_token(&self, original: &Credential) -> bool {
        self.credential.refresh_token != original.refresh_token
    }
}

/// Runs one cycle for `credential`.
///
/// The limit is validated before any request. An access token that is
/// missing or about to expire is refreshed up front.
pub async fn run_cycle(
    http: &Client,
    endpoints: &Endpoints,
    credential: &Credential,
    limit: u32,
    ids: &UserIds,
) -> Result<Cycle> {
    let limit = history::validate_limit(limit)?;

    let mut refreshes = 0;
    let mut current = credential.clone();
    if current.is_expired(Utc::now()) {
        current = auth::refresh_access_token(http, &endpoints.token_url, &current).await?;
        refreshes += 1;
    }

    let raw = match fetch(http, endpoints, &current, limit).await {
        Err(e) if e.is_auth() => {
            current = auth::refresh_access_token(http, &endpoints.token_url, &current).await?;
            refreshes += 1;
            fetch(http, endpoints, &current, limit).await?
        }
        other => other?,
    };

    let records = records::map_payload(&raw, ids)?;

    Ok(Cycle {
        credential: current,
        raw,
        records,
        refreshes,
    })
}

async fn fetch(
    http: &Client,
    endpoints: &Endpoints,
    credential: &Credential,
    limit: u32,
) -> Result<Value> {
    let token = credential.access_token.as_deref().ok_or_else(|| Error::Auth {
        status: 401,
        message: "no access token available".to_string(),
    })?;
    history::get_recently_played(http, &endpoints.api_url, token, limit).await
}

/// Writes both artifacts of a finished cycle into `dir`.
///
/// Everything is serialized before the first write, so a serialization
/// failure leaves the directory untouched.
///
/// # Returns
///
/// Paths of the raw payload file and the records file.
pub async fn write_output(dir: &Path, cycle: &Cycle) -> Result<(PathBuf, PathBuf)> {
    let raw = serde_json::to_string_pretty(&cycle.raw)?;
    let records = serde_json::to_string_pretty(&cycle.records)?;

    async_fs::create_dir_all(dir).await?;

    let raw_path = dir.join(RAW_OUTPUT_FILE);
    let records_path = dir.join(RECORDS_OUTPUT_FILE);
    async_fs::write(&raw_path, raw).await?;
    async_fs::write(&records_path, records).await?;

    Ok((raw_path, records_path))
}
