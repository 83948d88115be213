//! Test utilities and fixtures for r6bind
//!
//! This crate provides shared test helpers that can be used by both
//! unit tests (#[cfg(test)]) and integration tests (tests/ directory).

pub mod fixtures;
pub mod mocks;

pub use mocks::{GeneratorSpec, Invocation, MockMethod, MockRuntime};
