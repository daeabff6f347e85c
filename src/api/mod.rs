//! # API Module
//!
//! HTTP endpoints served by the short-lived local server that the
//! `authorize` command starts.
//!
//! ## Endpoints
//!
//! - [`callback`] - Target of the OAuth redirect. Checks `state`, exchanges
//!   the authorization code and hands the resulting credential to the
//!   waiting flow.
//! - [`health`] - Liveness probe returning name and version.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use spotwatch::server::router;
//!
//! let app = router(context);
//! ```

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
