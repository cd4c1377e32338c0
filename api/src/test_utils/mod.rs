//! Test utilities
//!
//! Manual mock implementations and test fixtures for unit testing.
//!
//! Why manual mocks instead of mockall?
//! - mockall has lifetime issues with traits containing `&str` parameters
//! - Manual mocks are more explicit and easier to debug
//! - We control exactly what they return without macro magic
//!
//! Mocks are `Clone` and share their storage, so a test can hand one copy to
//! a service and inspect another. Services take `Arc<dyn Repository>`, which
//! lets the HTTP tests build the full router on top of these mocks.

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
