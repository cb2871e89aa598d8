//! # Core Primitives
//!
//! Hardcoded constants for the Atelier core. These are deliberate,
//! fixed policy values, not tunables.

use std::time::Duration;

// =============================================================================
// STOCK POLICY
// =============================================================================

/// Alert threshold assigned to components created without an explicit one.
pub const DEFAULT_ALERT_THRESHOLD: u32 = 3;

// =============================================================================
// PRIORITY THRESHOLDS
// =============================================================================

/// Queued quantity strictly above this is high priority.
pub const PRIORITY_HIGH_OVER: u32 = 3;

/// Queued quantity strictly above this (and not high) is medium priority.
pub const PRIORITY_MEDIUM_OVER: u32 = 1;

// =============================================================================
// PLAN SCORING (integer weights, scaled x10 to avoid floats)
// =============================================================================

/// Weight of total queued quantity in the plan color score.
pub const PLAN_WEIGHT_QUANTITY: u64 = 5;

/// Weight of distinct product count in the plan color score.
pub const PLAN_WEIGHT_PRODUCTS: u64 = 3;

/// Weight of impacted order count in the plan color score.
pub const PLAN_WEIGHT_ORDERS: u64 = 2;

// =============================================================================
// CONCURRENCY
// =============================================================================

/// Deadline for acquiring the workshop lock before surfacing `Busy`.
pub const LOCK_TIMEOUT: Duration = Duration::from_millis(250);

/// Pause between lock acquisition attempts.
pub const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(5);

// =============================================================================
// SNAPSHOT FORMAT
// =============================================================================

/// Magic bytes identifying an Atelier snapshot.
pub const MAGIC_BYTES: &[u8; 4] = b"ATLR";

/// Current snapshot format version.
pub const FORMAT_VERSION: u8 = 1;

/// Maximum allowed snapshot payload size.
///
/// Validated BEFORE deserialization to prevent allocation-based memory
/// exhaustion from corrupted or hostile files.
pub const MAX_SNAPSHOT_PAYLOAD_SIZE: usize = 64 * 1024 * 1024; // 64 MB
