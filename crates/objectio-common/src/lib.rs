//! ObjectIO Common - Shared types and utilities
//!
//! This crate provides the error definitions, configuration types and
//! path helpers used across all ObjectIO components.

pub mod config;
pub mod error;
pub mod path;

pub use config::Config;
pub use error::{DiskError, DiskResult, Error, Result, to_object_err};
