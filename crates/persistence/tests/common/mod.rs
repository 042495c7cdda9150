//! Test infrastructure for the persistence layer.
//!
//! Shared fixtures and assertion helpers for the integration tests.

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;
