//! # CLI Module
//!
//! User-facing commands of spotwatch. Each command reads what it needs from
//! [`crate::config::Settings`], drives the library and reports through the
//! console macros. Failures end the process via `error!` with exit code 1.
//!
//! ## Commands
//!
//! - [`authorize`] - Interactive consent in the browser, prints a refresh token
//! - [`exchange`] - Headless variant: trade a pasted authorization code
//! - [`fetch`] - One fetch-and-map cycle, writes `recently_played.json` and
//!   `track_history.json`
//!
//! ## Usage Patterns
//!
//! ```bash
//! spotwatch authorize                     # one-time setup
//! spotwatch fetch --limit 50              # run from cron
//! spotwatch fetch --output-dir /var/spool/spotwatch --quiet
//! ```

mod auth;
mod fetch;

pub use auth::authorize;
pub use auth::exchange;
pub use fetch::FetchArgs;
pub use fetch::fetch;
