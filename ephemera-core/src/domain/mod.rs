//! Core domain types
//!
//! These types describe what the controller watches and what it is allowed to
//! do. They are loaded once at startup and never change afterwards.

pub mod organization;
pub mod permissions;
