//! HTTP API server for Shelfwise.
//!
//! This crate provides the library and shelving API:
//! - Shelf creation, renaming and deletion
//! - Library book upsert with full shelf-set replacement
//! - Single-shelf assignment changes
//! - The shelf-grouped library view
//! - Bearer-token authentication and startup provisioning

pub mod auth;
pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;

pub use auth::{AuthenticatedUser, StoredTokenVerifier, TokenVerifier, TraceId};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
