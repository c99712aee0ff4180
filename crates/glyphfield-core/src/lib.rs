//! glyphfield core
//!
//! Shared utilities for the glyphfield crates: logging setup, profiling hooks,
//! integer geometry for texture regions and environment configuration.

pub mod config;
pub mod geometry;
pub mod logging;
pub mod profiling;
