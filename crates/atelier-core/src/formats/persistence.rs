//! # Snapshot Format
//!
//! Binary serialization for full workshop state.
//!
//! Format: Header (5 bytes) + postcard-serialized snapshot.
//! - 4 bytes: Magic ("ATLR")
//! - 1 byte: Version
//!
//! Pre-deserialization validation guards against corrupted or hostile
//! files: the payload size bound and the header are checked before any
//! payload parsing.

use crate::catalog::ProductDefinition;
use crate::ledger::FinishedStock;
use crate::orders::Order;
use crate::primitives;
use crate::store::InventoryStore;
use crate::types::{AtelierError, ComponentRecord};
use serde::{Deserialize, Serialize};

/// Minimum valid snapshot size (header only).
const MIN_FILE_SIZE: usize = 5;

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Full workshop state as a serializable value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkshopSnapshot {
    pub components: Vec<ComponentRecord>,
    pub finished: FinishedStock,
    pub products: Vec<ProductDefinition>,
    pub orders: Vec<Order>,
    pub next_item_id: u64,
}

impl WorkshopSnapshot {
    /// Capture the complete state of a store.
    pub fn capture<S: InventoryStore + ?Sized>(store: &S) -> Result<Self, AtelierError> {
        Ok(Self {
            components: store.components()?,
            finished: store.finished()?,
            products: store.load_products()?,
            orders: store.orders()?,
            next_item_id: store.item_id_counter()?,
        })
    }

    /// Write this snapshot into a store. The target is expected to be
    /// empty; existing entries with matching keys are overwritten, not
    /// merged.
    pub fn apply<S: InventoryStore + ?Sized>(&self, store: &mut S) -> Result<(), AtelierError> {
        for record in &self.components {
            store.add_component(&record.name, &record.color, record.stock, record.alert_threshold)?;
        }
        for (product, colors) in &self.finished {
            for (color, quantity) in colors {
                store.credit_finished(product, color, *quantity)?;
            }
        }
        for definition in &self.products {
            store.put_product(definition)?;
        }
        for order in &self.orders {
            store.save_order(order)?;
        }
        store.set_item_id_counter(self.next_item_id)?;
        Ok(())
    }
}

// =============================================================================
// FILE HEADER
// =============================================================================

/// The snapshot header precedes all workshop data.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl SnapshotHeader {
    /// Create a new header with current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Validate the header.
    pub fn validate(&self) -> Result<(), AtelierError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(AtelierError::SerializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(AtelierError::SerializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Write header to bytes.
    pub fn to_bytes(&self) -> [u8; 5] {
        let mut bytes = [0u8; 5];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AtelierError> {
        if bytes.len() < MIN_FILE_SIZE {
            return Err(AtelierError::SerializationError(
                "Header too short".to_string(),
            ));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a snapshot to bytes (header + payload).
///
/// This is a pure transformation - no file I/O.
pub fn snapshot_to_bytes(snapshot: &WorkshopSnapshot) -> Result<Vec<u8>, AtelierError> {
    let header = SnapshotHeader::new();
    let payload = postcard::to_stdvec(snapshot)
        .map_err(|e| AtelierError::SerializationError(e.to_string()))?;

    let mut result = Vec::with_capacity(MIN_FILE_SIZE + payload.len());
    result.extend_from_slice(&header.to_bytes());
    result.extend_from_slice(&payload);

    Ok(result)
}

/// Deserialize a snapshot from bytes.
///
/// Validates, in order: minimum data size, maximum payload size, header
/// magic and version. All validation occurs BEFORE payload parsing.
pub fn snapshot_from_bytes(bytes: &[u8]) -> Result<WorkshopSnapshot, AtelierError> {
    if bytes.len() < MIN_FILE_SIZE {
        return Err(AtelierError::SerializationError(
            "Data too short: minimum 5 bytes required".to_string(),
        ));
    }
    if bytes.len() > primitives::MAX_SNAPSHOT_PAYLOAD_SIZE {
        return Err(AtelierError::SerializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            primitives::MAX_SNAPSHOT_PAYLOAD_SIZE
        )));
    }

    let header = SnapshotHeader::from_bytes(bytes)?;
    header.validate()?;

    let payload = &bytes[MIN_FILE_SIZE..];
    postcard::from_bytes(payload).map_err(|e| {
        AtelierError::SerializationError(format!("Failed to deserialize snapshot: {}", e))
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ColorRule;
    use crate::orders::OrderItem;
    use crate::store::MemoryStore;
    use crate::types::{Color, ItemStatus};

    fn populated_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.add_component("body", &Color::new("Black"), 10, 3).expect("add");
        store.credit_finished("Widget", &Color::new("Red"), 2).expect("credit");

        let mut def = ProductDefinition::new("Widget", "a widget");
        def.upsert_requirement("body", 1, Some(ColorRule::SameAsMain)).expect("req");
        store.put_product(&def).expect("put");

        let mut order = Order::new("A-1", "2026-03-03", "Client", "client@example.com");
        order.push_item(OrderItem {
            id: store.next_item_id().expect("id"),
            product: "Widget".to_string(),
            color: Color::new("Red"),
            quantity: 3,
            status: ItemStatus::ToProduce,
        });
        store.save_order(&order).expect("save");
        store
    }

    #[test]
    fn header_roundtrip() {
        let header = SnapshotHeader::new();
        let bytes = header.to_bytes();
        let restored = SnapshotHeader::from_bytes(&bytes).expect("parse header");

        assert_eq!(restored.magic, *primitives::MAGIC_BYTES);
        assert_eq!(restored.version, primitives::FORMAT_VERSION);
    }

    #[test]
    fn bytes_roundtrip_bit_exact() {
        let store = populated_store();
        let snapshot = WorkshopSnapshot::capture(&store).expect("capture");

        let bytes1 = snapshot_to_bytes(&snapshot).expect("first serialize");
        let restored = snapshot_from_bytes(&bytes1).expect("deserialize");
        let bytes2 = snapshot_to_bytes(&restored).expect("second serialize");

        assert_eq!(
            bytes1, bytes2,
            "save -> load -> save must produce identical bytes"
        );
    }

    #[test]
    fn capture_then_apply_restores_state() {
        let store = populated_store();
        let snapshot = WorkshopSnapshot::capture(&store).expect("capture");

        let mut fresh = MemoryStore::new();
        snapshot.apply(&mut fresh).expect("apply");
        assert_eq!(fresh, store);
    }

    #[test]
    fn invalid_magic_rejected() {
        let mut bytes = vec![0u8; 10];
        bytes[0..4].copy_from_slice(b"XXXX");

        let result = snapshot_from_bytes(&bytes);
        assert!(result.is_err());
    }

    #[test]
    fn truncated_data_rejected() {
        let result = snapshot_from_bytes(b"AT");
        assert!(result.is_err());
    }

    #[test]
    fn unsupported_version_rejected() {
        let snapshot = WorkshopSnapshot::default();
        let mut bytes = snapshot_to_bytes(&snapshot).expect("serialize");
        bytes[4] = primitives::FORMAT_VERSION + 1;

        let result = snapshot_from_bytes(&bytes);
        assert!(result.is_err());
    }
}
