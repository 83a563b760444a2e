//! `schoolhouse-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult, require_non_empty};
pub use id::{ClassId, StudentId, TeacherId};
