//! Common test utilities for tender-sweep end-to-end tests

#[allow(dead_code)]
pub mod fixtures;
#[allow(dead_code)]
pub mod portal;

#[allow(unused_imports)]
pub use fixtures::*;
pub use portal::*;
