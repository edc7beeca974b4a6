//! Shared test utilities for slidegen integration tests.
//!
//! This module provides:
//! - `TestHarness`: a service over a temp data root with scripted collaborators
//! - Fake collaborators that count their calls and can be told to fail

pub mod fakes;
pub mod harness;

pub use fakes::{sample_content, Gate, Script};
pub use harness::TestHarness;
