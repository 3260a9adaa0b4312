//! Bearing catalog kernel library.
//!
//! This library exposes kernel internals for integration testing.
//! The main entry point for running the server is the `catalog` binary.

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod locale;
pub mod routes;
pub mod state;

pub use config::Config;
pub use state::AppState;
