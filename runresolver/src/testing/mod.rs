//! Testing utilities for run resolution.
//!
//! This module provides:
//! - A store fixture that writes runs the way an orchestrator does
//! - Assertions on resolution outcomes

mod assertions;
mod fixtures;

pub use assertions::{assert_resolved, assert_resolved_ids, assert_skipped, assert_skipped_with};
pub use fixtures::{Channels, StoreFixture};
