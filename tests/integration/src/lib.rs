//! Integration test utilities for the ride engine
//!
//! This crate provides helpers for driving the service layer end to end,
//! either over the in-memory gateway or against PostgreSQL.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
