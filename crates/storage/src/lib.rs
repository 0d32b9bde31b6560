#![deny(unsafe_code)]

//! # Albar Storage
//!
//! Storage backend seam for the Albar API: a small key-value contract with
//! atomic multi-key transactions and compare-and-set, plus the in-memory
//! implementation used in production and tests. Archival semantics live in
//! the repository layer, not here.

pub mod backend;
pub mod memory;

pub use backend::{KeyValue, StorageBackend, StorageError, StorageResult, Transaction};
pub use memory::MemoryBackend;
