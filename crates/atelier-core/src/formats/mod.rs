//! # Formats
//!
//! Binary serialization formats. File I/O lives in the app layer; this
//! module is pure byte transformation.

pub mod persistence;

pub use persistence::{SnapshotHeader, WorkshopSnapshot, snapshot_from_bytes, snapshot_to_bytes};
