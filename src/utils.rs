use rand::{Rng, distr::Alphanumeric};

use crate::types::{TrackHistoryRecord, TrackHistoryTableRow};

pub const STATE_LENGTH: usize = 16;

/// Random value for the OAuth `state` parameter.
pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}

/// Formats milliseconds as `m:ss`.
pub fn format_duration_ms(duration_ms: u64) -> String {
    let total_secs = duration_ms / 1000;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

pub fn build_table_rows(records: &[TrackHistoryRecord]) -> Vec<TrackHistoryTableRow> {
    records
        .iter()
        .map(|r| TrackHistoryTableRow {
            played_at: r.played_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            track: r.track_name.clone(),
            artist: r.first_artist_name.to_string(),
            album: r.album_name.to_string(),
            duration: format_duration_ms(r.track_duration_ms),
        })
        .collect()
}

