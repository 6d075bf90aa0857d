//! pdk-daemon library target.
//!
//! Exposes the router, state and background loops for integration tests.
//! The binary `main.rs` depends on this library target.

pub mod api_types;
pub mod bot;
pub mod routes;
pub mod scheduler;
pub mod state;
