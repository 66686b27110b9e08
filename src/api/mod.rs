//! API Module
//!
//! HTTP handlers and routing for the region cache REST API.
//!
//! # Endpoints
//! - `PUT /regions/:region/entries` - Store a key-value pair
//! - `DELETE /regions/:region/entries` - Clear a region
//! - `GET /regions/:region/entries/:key` - Retrieve a value
//! - `DELETE /regions/:region/entries/:key` - Remove a key
//! - `GET /regions/:region/stats` - Region statistics
//! - `GET /regions` - List regions
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
