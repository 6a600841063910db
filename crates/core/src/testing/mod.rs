//! Testing utilities and mock implementations for E2E tests.
//!
//! This module provides a mock implementation of the [`SourceFetcher`]
//! trait, allowing the orchestrator and the HTTP surface to be exercised
//! end-to-end without the real external tool installed.
//!
//! [`SourceFetcher`]: crate::fetcher::SourceFetcher

mod mock_fetcher;

pub use mock_fetcher::{MockBehavior, MockFetcher};
