//! Test case fixtures.
//!
//! This module provides:
//! - `TestCase`: one scripted prompt and its expectations
//! - `FixtureRegistry`: registration, lookup and JSON loading
//! - Built-in cases covering each tool of the catalog

pub mod builtins;
mod registry;
mod types;

pub use registry::FixtureRegistry;
pub use types::*;
