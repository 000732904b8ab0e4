//! # katalog Common Library
//!
//! Shared code for katalog services:
//! - Error and result types
//! - Bootstrap configuration loading
//! - Tracing subscriber setup

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
