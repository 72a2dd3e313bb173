//! Test utilities and fixture diffs for DiffArena
//!
//! Shared by the core crate's integration tests, benches and the
//! allocation profiler.

pub mod fixtures;
pub mod synthetic;
