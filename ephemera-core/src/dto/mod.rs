//! Data Transfer Objects for the GitHub REST API
//!
//! Only the fields the controller actually reads are modelled; everything
//! else in the response bodies is ignored during deserialization.

pub mod actions;
pub mod installation;
