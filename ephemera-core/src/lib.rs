//! Ephemera Core
//!
//! Core types shared by the Ephemera runner controller.
//!
//! This crate contains:
//! - Domain types: the static organization universe and app permissions
//! - DTOs: request and response bodies of the GitHub REST endpoints the
//!   controller talks to

pub mod domain;
pub mod dto;
