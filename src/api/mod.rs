//! API Module
//!
//! HTTP handlers and routing for the proxy's REST surface.
//!
//! # Endpoints
//! - `PUT /set` - Store a key-value pair in a bin
//! - `GET /get/:bin/:key` - Retrieve a value from a bin
//! - `DELETE /del` - Delete one key, a key prefix, or a whole bin
//! - `POST /flush` - Purge a bin's temporary keys on every node
//! - `GET /nodes` - Live node pool status
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
