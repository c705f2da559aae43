//! Core types, store traits and the issue service for the civic reporting
//! platform.
//!
//! This crate is free of HTTP and database dependencies. Storage backends
//! implement the traits in [`store`]; the HTTP layer drives
//! [`service::IssueService`].

pub mod audit;
pub mod comment;
pub mod error;
pub mod identity;
pub mod issue;
pub mod service;
pub mod store;

pub use error::{Error, Result};
