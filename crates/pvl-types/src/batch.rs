use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::ids::{ActorId, BatchId};
use crate::lookup::LookupKey;
use crate::status::BatchStatus;
use crate::temporal::Timestamp;

/// Descriptive fields supplied by the producer when a batch is registered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDetails {
    /// Product name, e.g. "Organic Tomatoes".
    pub name: String,
    /// Product category, e.g. "Vegetable".
    pub category: String,
    /// Where the goods were grown or made.
    pub origin_location: String,
    /// Harvest or production date.
    pub produced_on: NaiveDate,
    pub quantity: u64,
    /// Unit of `quantity`, e.g. "kg".
    pub unit: String,
    /// Price per unit in minor currency units (cents).
    pub unit_price: u64,
}

impl BatchDetails {
    /// Trim free-text fields and reject incomplete input.
    pub fn normalised(mut self) -> Result<Self, TypeError> {
        for (field, value) in [
            ("name", &mut self.name),
            ("category", &mut self.category),
            ("origin_location", &mut self.origin_location),
            ("unit", &mut self.unit),
        ] {
            *value = value.trim().to_string();
            if value.is_empty() {
                return Err(TypeError::InvalidDetails(format!("{field} must not be empty")));
            }
        }
        if self.quantity == 0 {
            return Err(TypeError::InvalidDetails("quantity must be positive".into()));
        }
        Ok(self)
    }

    /// Total value of the batch in minor currency units.
    pub fn total_value(&self) -> u128 {
        self.quantity as u128 * self.unit_price as u128
    }
}

/// Current-state record of a tracked batch.
///
/// `status` is a materialised view of the ledger: it always equals the
/// resulting status of the batch's most recent ledger entry and is only
/// changed together with an append.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    pub owner: ActorId,
    pub details: BatchDetails,
    pub lookup_key: LookupKey,
    pub status: BatchStatus,
    pub created_at: Timestamp,
}
