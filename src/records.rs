//! Flattening of recently-played events into `tbl_user_spotify_track_history` rows.
//!
//! Deterministic and free of I/O. A malformed event aborts the whole batch
//! with [`Error::Mapping`] carrying its index; events are never skipped, so
//! the output always has the same length and order as the input.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::{Error, Result},
    types::{Cursors, Field, RawPlayEvent, RecentlyPlayedPage, TrackHistoryRecord, UserIds},
};

// Envelope of the page with items left undecoded, so one bad event can be
// reported with its index instead of failing the whole page.
#[derive(Deserialize)]
struct PageEnvelope {
    items: Option<Vec<Value>>,
    next: Option<String>,
    cursors: Option<Cursors>,
    limit: Option<u32>,
    href: Option<String>,
}

/// Decodes a raw recently-played payload into its typed page.
///
/// A payload without `items` yields an empty page.
///
/// # Errors
///
/// - [`Error::Json`] when the envelope is not an object or `items` is not a list
/// - [`Error::Mapping`] for the first item that is not a play event, e.g. a
///   required field of the wrong JSON type
pub fn parse_page(payload: &Value) -> Result<RecentlyPlayedPage> {
    if payload.is_null() {
        return Ok(RecentlyPlayedPage::default());
    }

    let envelope = PageEnvelope::deserialize(payload)?;
    let items = envelope
        .items
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(index, item)| {
            RawPlayEvent::deserialize(item).map_err(|e| Error::Mapping {
                index,
                reason: format!("malformed play event: {e}"),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(RecentlyPlayedPage {
        items,
        next: envelope.next,
        cursors: envelope.cursors,
        limit: envelope.limit,
        href: envelope.href,
    })
}

/// Maps every event to exactly one record, preserving order.
///
/// Both identifiers are stamped verbatim on each record.
///
/// # Errors
///
/// [`Error::Mapping`] for the first event that has no track, no track id,
/// name or duration, or a missing/unparseable `played_at`.
pub fn map_to_records(
    events: &[RawPlayEvent],
    selfopticon_user_id: &str,
    spotify_user_id: &str,
) -> Result<Vec<TrackHistoryRecord>> {
    events
        .iter()
        .enumerate()
        .map(|(index, event)| map_event(index, event, selfopticon_user_id, spotify_user_id))
        .collect()
}

/// Convenience over [`parse_page`] and [`map_to_records`].
pub fn map_payload(payload: &Value, ids: &UserIds) -> Result<Vec<TrackHistoryRecord>> {
    let page = parse_page(payload)?;
    map_to_records(&page.items, &ids.selfopticon_user_id, &ids.spotify_user_id)
}

fn map_event(
    index: usize,
    event: &RawPlayEvent,
    selfopticon_user_id: &str,
    spotify_user_id: &str,
) -> Result<TrackHistoryRecord> {
    let missing = |field: &str| Error::Mapping {
        index,
        reason: format!("missing {field}"),
    };

    let played_at = event
        .played_at
        .as_deref()
        .ok_or_else(|| missing("played_at"))
        .and_then(|raw| parse_played_at(index, raw))?;

    let track = event.track.as_ref().ok_or_else(|| missing("track"))?;
    let track_id = track.id.clone().ok_or_else(|| missing("track.id"))?;
    let track_name = track.name.clone().ok_or_else(|| missing("track.name"))?;
    let track_duration_ms = track
        .duration_ms
        .ok_or_else(|| missing("track.duration_ms"))?;

    let album = track.album.as_ref();
    // Only the first artist makes it into the row.
    let first_artist = track.artists.as_ref().and_then(|a| a.first());

    Ok(TrackHistoryRecord {
        played_at,
        selfopticon_user_id: selfopticon_user_id.to_string(),
        spotify_user_id: spotify_user_id.to_string(),
        track_id,
        track_name,
        track_duration_ms,
        track_popularity: track.popularity.into(),
        album_id: Field::from(album.and_then(|a| a.id.clone())),
        album_name: Field::from(album.and_then(|a| a.name.clone())),
        first_artist_id: Field::from(first_artist.and_then(|a| a.id.clone())),
        first_artist_name: Field::from(first_artist.and_then(|a| a.name.clone())),
        isrc: Field::from(
            track
                .external_ids
                .as_ref()
                .and_then(|ids| ids.isrc.clone()),
        ),
    })
}

fn parse_played_at(index: usize, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Mapping {
            index,
            reason: format!("invalid played_at '{raw}': {e}"),
        })
}
