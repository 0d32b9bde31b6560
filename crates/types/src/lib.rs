#![deny(unsafe_code)]

//! # Albar Types
//!
//! Entity types and the shared error type for the Albar API.
//!
//! Entities are plain serde structs constructed through fallible `bon`
//! builders that validate their invariants, and carry their own soft-delete
//! marker (`deleted_at`). Storage and HTTP concerns live elsewhere.

pub mod entities;
pub mod error;

pub use error::{Error, Result};
