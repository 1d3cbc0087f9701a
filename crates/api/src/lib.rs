//! Image interpretation web server library.
//!
//! Exposes the building blocks (config, state, error handling, page
//! rendering, routes) so integration tests and the binary entrypoint can
//! both access them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod page;
pub mod render;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
