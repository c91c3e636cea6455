//! # scantde Common Library
//!
//! Shared code for the scantde crates:
//! - Error type and result alias
//! - Configuration loading (data directory, TOML config, logging)
//! - Night date strings and Julian date conversion

pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
