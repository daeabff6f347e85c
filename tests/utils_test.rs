use std::collections::HashMap;

use chrono::{Duration, TimeZone, Utc};
use spotwatch::Error;
use spotwatch::config::{DEFAULT_API_URL, DEFAULT_SCOPE, DEFAULT_SERVER_ADDRESS, Endpoints, Settings};
use spotwatch::types::{Credential, EXPIRY_MARGIN_SECS, Field, TokenResponse, TrackHistoryRecord};
use spotwatch::utils::*;

// Helper function to create a test record
fn create_test_record(name: &str, artist: Option<&str>, duration_ms: u64) -> TrackHistoryRecord {
    TrackHistoryRecord {
        played_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 5).unwrap(),
        selfopticon_user_id: "U1".to_string(),
        spotify_user_id: "SU1".to_string(),
        track_id: format!("{}_id", name),
        track_name: name.to_string(),
        track_duration_ms: duration_ms,
        track_popularity: Field::Missing,
        album_id: Field::Missing,
        album_name: Field::Present("Album".to_string()),
        first_artist_id: Field::Missing,
        first_artist_name: artist.map(str::to_string).into(),
        isrc: Field::Missing,
    }
}

// Helper function to build a settings lookup from pairs
fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

const REQUIRED: [(&str, &str); 3] = [
    ("SPOTIFY_CLIENT_ID", "client-id"),
    ("SPOTIFY_CLIENT_SECRET", "client-secret"),
    ("SPOTIFY_REDIRECT_URI", "http://127.0.0.1:8888/callback"),
];

#[test]
fn test_generate_state() {
    let state = generate_state();

    // Should be exactly STATE_LENGTH characters
    assert_eq!(state.len(), STATE_LENGTH);

    // Should contain only alphanumeric characters
    assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));

    // Two generated states should be different
    assert_ne!(state, generate_state());
}

#[test]
fn test_format_duration_ms() {
    assert_eq!(format_duration_ms(0), "0:00");
    assert_eq!(format_duration_ms(999), "0:00");
    assert_eq!(format_duration_ms(61_000), "1:01");
    assert_eq!(format_duration_ms(210_000), "3:30");
    assert_eq!(format_duration_ms(3_600_000), "60:00");
}

#[test]
fn test_build_table_rows() {
    let records = vec![
        create_test_record("Song A", Some("Artist A"), 210_000),
        create_test_record("Song B", None, 59_999),
    ];

    let rows = build_table_rows(&records);

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].played_at, "2024-01-01 12:30:05");
    assert_eq!(rows[0].track, "Song A");
    assert_eq!(rows[0].artist, "Artist A");
    assert_eq!(rows[0].album, "Album");
    assert_eq!(rows[0].duration, "3:30");

    // Missing values render as a dash
    assert_eq!(rows[1].artist, "-");
    assert_eq!(rows[1].duration, "0:59");
}

#[test]
fn test_build_table_rows_empty() {
    assert!(build_table_rows(&[]).is_empty());
}

#[test]
fn test_settings_defaults() {
    let settings = Settings::from_lookup(lookup(&REQUIRED)).unwrap();

    assert_eq!(settings.client_id, "client-id");
    assert_eq!(settings.scope, DEFAULT_SCOPE);
    assert_eq!(settings.server_addr, DEFAULT_SERVER_ADDRESS);
    assert_eq!(settings.endpoints, Endpoints::default());
    assert_eq!(settings.endpoints.api_url, DEFAULT_API_URL);
    assert!(settings.refresh_token.is_none());
    assert_eq!(
        settings.scopes(),
        vec!["user-read-recently-played", "user-top-read"]
    );
}

#[test]
fn test_settings_missing_required_value() {
    for (missing, _) in REQUIRED {
        let pairs: Vec<(&str, &str)> = REQUIRED
            .iter()
            .copied()
            .filter(|(k, _)| *k != missing)
            .collect();

        match Settings::from_lookup(lookup(&pairs)) {
            Err(Error::Config(message)) => assert!(message.contains(missing)),
            Err(other) => panic!("Expected Config error for {missing}, got: {:?}", other),
            Ok(_) => panic!("Expected Config error for {missing}"),
        }
    }
}

#[test]
fn test_settings_empty_value_counts_as_unset() {
    let mut pairs = REQUIRED.to_vec();
    pairs[0] = ("SPOTIFY_CLIENT_ID", "  ");

    assert!(matches!(
        Settings::from_lookup(lookup(&pairs)),
        Err(Error::Config(_))
    ));
}

#[test]
fn test_settings_endpoint_overrides() {
    let mut pairs = REQUIRED.to_vec();
    pairs.push(("SPOTIFY_API_URL", "http://localhost:9000/v1"));
    pairs.push(("SPOTIFY_API_TOKEN_URL", "http://localhost:9000/api/token"));

    let settings = Settings::from_lookup(lookup(&pairs)).unwrap();

    assert_eq!(settings.endpoints.api_url, "http://localhost:9000/v1");
    assert_eq!(settings.endpoints.token_url, "http://localhost:9000/api/token");
    assert_eq!(settings.endpoints.auth_url, Endpoints::default().auth_url);
}

#[test]
fn test_endpoints_with_base() {
    let endpoints = Endpoints::with_base("http://127.0.0.1:4000/");

    assert_eq!(endpoints.auth_url, "http://127.0.0.1:4000/authorize");
    assert_eq!(endpoints.token_url, "http://127.0.0.1:4000/api/token");
    assert_eq!(endpoints.api_url, "http://127.0.0.1:4000/v1");
}

#[test]
fn test_settings_credential_requires_refresh_token() {
    let settings = Settings::from_lookup(lookup(&REQUIRED)).unwrap();
    assert!(matches!(settings.credential(), Err(Error::Config(_))));

    let mut pairs = REQUIRED.to_vec();
    pairs.push(("SPOTIFY_REFRESH_TOKEN", "refresh-1"));
    let credential = Settings::from_lookup(lookup(&pairs))
        .unwrap()
        .credential()
        .unwrap();

    assert_eq!(credential.refresh_token, "refresh-1");
    assert!(credential.access_token.is_none());
}

#[test]
fn test_settings_user_ids() {
    let mut pairs = REQUIRED.to_vec();
    pairs.push(("SELFOPTICON_USER_ID", "env-user"));
    pairs.push(("SPOTIFY_USER_ID", "env-spotify"));
    let settings = Settings::from_lookup(lookup(&pairs)).unwrap();

    let ids = settings.user_ids(None, None).unwrap();
    assert_eq!(ids.selfopticon_user_id, "env-user");
    assert_eq!(ids.spotify_user_id, "env-spotify");

    // Explicit values win
    let ids = settings.user_ids(Some("cli-user".to_string()), None).unwrap();
    assert_eq!(ids.selfopticon_user_id, "cli-user");
    assert_eq!(ids.spotify_user_id, "env-spotify");

    let bare = Settings::from_lookup(lookup(&REQUIRED)).unwrap();
    assert!(matches!(bare.user_ids(None, None), Err(Error::Config(_))));
}

#[test]
fn test_credential_expiry() {
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let bare = Credential::new("id", "secret", "refresh");

    // No access token at all
    assert!(bare.is_expired(now));

    let response = TokenResponse {
        access_token: "access".to_string(),
        token_type: Some("Bearer".to_string()),
        scope: None,
        expires_in: 3600,
        refresh_token: None,
    };
    let credential = bare.with_token(&response, now);

    assert!(!credential.is_expired(now));
    assert!(!credential.is_expired(now + Duration::seconds(3600 - EXPIRY_MARGIN_SECS - 1)));
    assert!(credential.is_expired(now + Duration::seconds(3600 - EXPIRY_MARGIN_SECS)));
    assert_eq!(credential.refresh_token, "refresh");
}

#[test]
fn test_credential_picks_up_rotated_refresh_token() {
    let now = Utc::now();
    let response = TokenResponse {
        access_token: "access".to_string(),
        token_type: None,
        scope: None,
        expires_in: 3600,
        refresh_token: Some("rotated".to_string()),
    };

    let credential = Credential::new("id", "secret", "refresh").with_token(&response, now);

    assert_eq!(credential.refresh_token, "rotated");
}

#[test]
fn test_credential_with_oversized_expiry_has_no_expiry() {
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

    for expires_in in [10_000_000_000_000_000, u64::MAX] {
        let response = TokenResponse {
            access_token: "access".to_string(),
            token_type: None,
            scope: None,
            expires_in,
            refresh_token: None,
        };

        let credential = Credential::new("id", "secret", "refresh").with_token(&response, now);

        assert_eq!(credential.access_token.as_deref(), Some("access"));
        assert!(credential.expires_at.is_none());
        assert!(!credential.is_expired(now));
    }
}

#[test]
fn test_credential_debug_redacts_secrets() {
    let credential = Credential::new("id", "top-secret", "refresh-secret");
    let debug = format!("{:?}", credential);

    assert!(!debug.contains("top-secret"));
    assert!(!debug.contains("refresh-secret"));
    assert!(debug.contains("id"));
}

#[test]
fn test_error_kind() {
    assert_eq!(
        Error::Auth {
            status: 401,
            message: String::new()
        }
        .kind(),
        "auth"
    );
    assert_eq!(Error::InvalidLimit(0).kind(), "invalid-limit");
    assert_eq!(
        Error::Mapping {
            index: 3,
            reason: "missing track.id".to_string()
        }
        .to_string(),
        "malformed play event at index 3: missing track.id"
    );
    assert!(Error::Auth {
        status: 400,
        message: String::new()
    }
    .is_auth());
    assert!(!Error::Config(String::new()).is_auth());
}
