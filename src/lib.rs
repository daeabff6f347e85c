//! spotwatch library
//!
//! Fetches a user's recently played tracks from the Spotify Web API,
//! refreshing the OAuth credential as needed, and flattens the response into
//! rows for the `tbl_user_spotify_track_history` table.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints for the local OAuth callback server
//! - `cli` - Command-line interface implementations
//! - `config` - Environment loading and runtime settings
//! - `error` - Error taxonomy shared by all components
//! - `records` - Mapping of raw play events into table records
//! - `server` - Local HTTP server for OAuth callbacks
//! - `spotify` - Authorization and recently-played endpoints
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//! - `watch` - One fetch-and-map cycle and its output artifacts
//!
//! # Example
//!
//! ```
//! use spotwatch::{config, spotify, watch};
//!
//! #[tokio::main]
//! async fn main() -> spotwatch::Result<()> {
//!     config::load_env().await?;
//!     let settings = config::Settings::from_env()?;
//!     let http = spotify::http_client()?;
//!     let ids = settings.user_ids(None, None)?;
//!     let cycle = watch::run_cycle(&http, &settings.endpoints, &settings.credential()?, 50, &ids).await?;
//!     println!("{} records", cycle.records.len());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod records;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;
pub mod watch;

pub use error::{Error, Result};

// Console output. Each line is prefixed with a colored marker:
// `[o]` info, `[✓]` success, `[!]` warning (yellow) or error (red).

/// Prints a progress or status line with a blue `o` marker.
///
/// Goes to stdout, so it mixes with the records table and can be piped.
///
/// # Arguments
///
/// Same as `println!`: a format string followed by its arguments.
///
/// # Example
///
/// ```
/// info!("Waiting for the authorization callback on {}...", addr);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a line confirming a completed step, marked with a green check.
///
/// # Arguments
///
/// Same as `println!`: a format string followed by its arguments.
///
/// # Example
///
/// ```
/// success!("Mapped {} play events", records.len());
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a notice the user should act on without stopping the run.
///
/// Written to stderr with a yellow `!` marker, e.g. when Spotify rotated the
/// refresh token or the browser could not be opened.
///
/// # Arguments
///
/// Same as `eprintln!`: a format string followed by its arguments.
///
/// # Example
///
/// ```
/// warning!("Spotify rotated the refresh token. Update your .env file");
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}

/// Prints the failure to stderr with a red `!` marker and exits with status 1.
///
/// Only the CLI layer uses this; library functions return [`Error`]. The
/// macro never returns, so it can stand in a `match` arm of any type.
///
/// # Arguments
///
/// Same as `eprintln!`: a format string followed by its arguments.
///
/// # Example
///
/// ```
/// let settings = match config::Settings::from_env() {
///     Ok(s) => s,
///     Err(e) => error!("{}", e),
/// };
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}
