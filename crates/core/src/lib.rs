//! Core types and configuration for the cLab minute-factor engine.
//!
//! This crate provides shared types used across all other crates:
//! - Raw and normalized trade records
//! - Minute bar and minute factor rows
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
