//! # Storage Backends
//!
//! Disk-backed implementations of [`crate::store::InventoryStore`].

pub mod redb_store;

pub use redb_store::RedbStore;
