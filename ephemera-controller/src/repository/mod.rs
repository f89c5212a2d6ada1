//! Repository layer
//!
//! Repositories are thin adapters over the GitHub API. They resolve the
//! organization's installation credential and issue the call, without any
//! scanning or provisioning policy of their own.
//!
//! All repositories are trait-based to enable testing and mocking.

mod actions;

// Re-export traits
pub use actions::ActionsRepository;

// Re-export implementations
pub use actions::HttpActionsRepository;
