//! Configuration management for spotwatch.
//!
//! Values come from environment variables, optionally seeded from `.env`
//! files. Lookup order:
//! 1. Environment variables already set in the process (highest priority)
//! 2. `.env` in the current working directory
//! 3. `.env` in the local data directory (`<data_local_dir>/spotwatch/.env`)
//! 4. Built-in defaults for endpoints, scope and callback address

use std::{env, path::PathBuf};

use crate::{
    error::{Error, Result},
    types::{Credential, UserIds},
};

pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_SCOPE: &str = "user-read-recently-played user-top-read";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8888";

/// Loads `.env` files into the process environment.
///
/// A missing file is fine; variables that are already set are never
/// overwritten, so the working-directory file wins over the data-directory one.
///
/// # Directory Structure
///
/// The data-directory file lives at:
/// - Linux: `~/.local/share/spotwatch/.env`
/// - macOS: `~/Library/Application Support/spotwatch/.env`
/// - Windows: `%LOCALAPPDATA%/spotwatch/.env`
///
/// # Errors
///
/// Returns an error when a file exists but cannot be parsed.
pub async fn load_env() -> Result<()> {
    let local = PathBuf::from(".env");
    if local.is_file() {
        dotenv::from_path(&local).map_err(|e| Error::Config(e.to_string()))?;
    }

    let path = data_env_path();
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }
    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| Error::Config(e.to_string()))?;
    }

    Ok(())
}

fn data_env_path() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spotwatch/.env");
    path
}

/// Base URLs of the three Spotify surfaces we talk to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Points every endpoint at one server, e.g. a local mock.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            auth_url: format!("{base}/authorize"),
            token_url: format!("{base}/api/token"),
            api_url: format!("{base}/v1"),
        }
    }
}

/// Runtime settings read from the environment.
#[derive(Clone)]
pub struct Settings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub refresh_token: Option<String>,
    pub spotify_user_id: Option<String>,
    pub selfopticon_user_id: Option<String>,
    pub scope: String,
    pub server_addr: String,
    pub endpoints: Endpoints,
}

impl Settings {
    /// Reads settings from the process environment.
    ///
    /// # Errors
    ///
    /// `Error::Config` naming the first missing required variable:
    /// `SPOTIFY_CLIENT_ID`, `SPOTIFY_CLIENT_SECRET` or `SPOTIFY_REDIRECT_URI`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Settings::from_env`] with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| Error::Config(format!("{key} must be set")))
        };

        let defaults = Endpoints::default();
        Ok(Self {
            client_id: required("SPOTIFY_CLIENT_ID")?,
            client_secret: required("SPOTIFY_CLIENT_SECRET")?,
            redirect_uri: required("SPOTIFY_REDIRECT_URI")?,
            refresh_token: get("SPOTIFY_REFRESH_TOKEN"),
            spotify_user_id: get("SPOTIFY_USER_ID"),
            selfopticon_user_id: get("SELFOPTICON_USER_ID"),
            scope: get("SPOTIFY_API_AUTH_SCOPE").unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
            server_addr: get("SERVER_ADDRESS")
                .unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string()),
            endpoints: Endpoints {
                auth_url: get("SPOTIFY_API_AUTH_URL").unwrap_or(defaults.auth_url),
                token_url: get("SPOTIFY_API_TOKEN_URL").unwrap_or(defaults.token_url),
                api_url: get("SPOTIFY_API_URL").unwrap_or(defaults.api_url),
            },
        })
    }

    /// Builds the credential used for the refresh-token grant.
    pub fn credential(&self) -> Result<Credential> {
        let refresh_token = self.refresh_token.clone().ok_or_else(|| {
            Error::Config(
                "SPOTIFY_REFRESH_TOKEN must be set. Run spotwatch authorize first".to_string(),
            )
        })?;
        Ok(Credential::new(
            self.client_id.clone(),
            self.client_secret.clone(),
            refresh_token,
        ))
    }

    /// Resolves the record identifiers, letting explicit values win over the environment.
    pub fn user_ids(
        &self,
        selfopticon_user_id: Option<String>,
        spotify_user_id: Option<String>,
    ) -> Result<UserIds> {
        let selfopticon_user_id = selfopticon_user_id
            .or_else(|| self.selfopticon_user_id.clone())
            .ok_or_else(|| Error::Config("SELFOPTICON_USER_ID must be set".to_string()))?;
        let spotify_user_id = spotify_user_id
            .or_else(|| self.spotify_user_id.clone())
            .ok_or_else(|| Error::Config("SPOTIFY_USER_ID must be set".to_string()))?;
        Ok(UserIds {
            selfopticon_user_id,
            spotify_user_id,
        })
    }

    pub fn scopes(&self) -> Vec<&str> {
        self.scope.split_whitespace().collect()
    }
}
