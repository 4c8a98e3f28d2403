use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Lifecycle status of a batch.
///
/// Statuses form a strict linear order; the only legal move is to the
/// immediate successor, and `Verified` has none.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchStatus {
    Harvested,
    InTransit,
    Delivered,
    Verified,
}

impl BatchStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [BatchStatus; 4] = [
        BatchStatus::Harvested,
        BatchStatus::InTransit,
        BatchStatus::Delivered,
        BatchStatus::Verified,
    ];

    /// Position in the lifecycle, starting at 0.
    pub fn ordinal(&self) -> u8 {
        match self {
            Self::Harvested => 0,
            Self::InTransit => 1,
            Self::Delivered => 2,
            Self::Verified => 3,
        }
    }

    /// The only status this one may move to, if any.
    pub fn successor(&self) -> Option<BatchStatus> {
        match self {
            Self::Harvested => Some(Self::InTransit),
            Self::InTransit => Some(Self::Delivered),
            Self::Delivered => Some(Self::Verified),
            Self::Verified => None,
        }
    }

    /// `true` when no further transitions exist.
    pub fn is_terminal(&self) -> bool {
        self.successor().is_none()
    }

    /// The ledger action whose entry produces this status.
    pub fn entering_action(&self) -> LedgerAction {
        match self {
            Self::Harvested => LedgerAction::Harvest,
            Self::InTransit => LedgerAction::Dispatch,
            Self::Delivered => LedgerAction::Deliver,
            Self::Verified => LedgerAction::Verify,
        }
    }

    /// Canonical kebab-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Harvested => "harvested",
            Self::InTransit => "in-transit",
            Self::Delivered => "delivered",
            Self::Verified => "verified",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatchStatus {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "harvested" => Ok(Self::Harvested),
            "in-transit" | "intransit" => Ok(Self::InTransit),
            "delivered" => Ok(Self::Delivered),
            "verified" => Ok(Self::Verified),
            _ => Err(TypeError::UnknownStatus(s.to_string())),
        }
    }
}

/// Action recorded by a ledger entry.
///
/// Actions map one-to-one onto the status they leave the batch in, so the
/// batch view can always be recomputed from the tail of its chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LedgerAction {
    /// Genesis: the batch was produced and registered.
    Harvest,
    /// The batch left its origin and is moving downstream.
    Dispatch,
    /// The batch reached its destination.
    Deliver,
    /// The final recipient confirmed the batch.
    Verify,
}

impl LedgerAction {
    /// Status the batch holds once this entry is the chain tail.
    pub fn resulting_status(&self) -> BatchStatus {
        match self {
            Self::Harvest => BatchStatus::Harvested,
            Self::Dispatch => BatchStatus::InTransit,
            Self::Deliver => BatchStatus::Delivered,
            Self::Verify => BatchStatus::Verified,
        }
    }

    /// Canonical kebab-case name, also used in the hash encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Harvest => "harvest",
            Self::Dispatch => "dispatch",
            Self::Deliver => "deliver",
            Self::Verify => "verify",
        }
    }
}

impl fmt::Display for LedgerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
