// Core modules
pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod indicators;
pub mod models;
pub mod persistence;
pub mod scanner;
pub mod scheduler;
pub mod scoring;
pub mod server;
pub mod state;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use models::*;

// Error handling
pub use error::{Result, ScoutError};
