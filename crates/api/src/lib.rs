//! HTTP API layer for folio.
//!
//! This crate provides the JSON endpoints over the engagement and feed
//! services:
//!
//! - **Endpoints**: reactions, follows, comments, feed, catalog sync
//! - **Extractors**: upstream-auth user context
//! - **Response**: standard envelope with typed error codes
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod response;
pub mod state;

pub use endpoints::router;
pub use state::AppState;
