//! Shared HTTP plumbing for the mailgate crates
//!
//! Error responses follow RFC 7807 (Problem Details for HTTP APIs) and are
//! built through the helpers in [`error_builder`].

pub mod error_builder;
pub mod problemdetails;

pub use problemdetails::{Problem, ProblemDetails};
