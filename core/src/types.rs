//! Shared primitive types used across the analytics pipeline.

use serde::{Deserialize, Serialize};

/// A merchant identifier exactly as it appears in the input files.
pub type MerchantId = String;

/// The number of columns a well-formed activity row carries.
pub const ACTIVITY_COLUMNS: usize = 10;

/// One merchant activity event, in the exact shape it is stored.
///
/// Every field except `amount` passes through as the raw string from the
/// input file; `amount` is coerced at normalization time and an
/// unparseable value becomes 0.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub event_id: String,
    pub merchant_id: MerchantId,
    pub event_timestamp: String,
    pub product: String,
    pub event_type: String,
    pub amount: f64,
    pub status: String,
    pub channel: String,
    pub region: String,
    pub merchant_tier: String,
}
