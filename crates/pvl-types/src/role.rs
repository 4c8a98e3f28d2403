use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Supply-chain role of an actor.
///
/// Roles are a closed set; authorization decisions are table lookups over
/// this enum rather than string comparisons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Grows or manufactures goods and registers batches.
    #[serde(alias = "farmer")]
    Producer,
    /// Consolidates batches from several producers.
    #[serde(alias = "wholesaler")]
    Aggregator,
    /// Moves and sells batches downstream.
    #[serde(alias = "retailer")]
    Distributor,
    /// Final recipient that confirms delivery and authenticity.
    #[serde(alias = "consumer")]
    EndpointVerifier,
    /// Operator with override rights over legal transitions.
    #[serde(alias = "admin")]
    Administrator,
}

impl Role {
    /// All roles in declaration order.
    pub const ALL: [Role; 5] = [
        Role::Producer,
        Role::Aggregator,
        Role::Distributor,
        Role::EndpointVerifier,
        Role::Administrator,
    ];

    /// Canonical kebab-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Producer => "producer",
            Self::Aggregator => "aggregator",
            Self::Distributor => "distributor",
            Self::EndpointVerifier => "endpoint-verifier",
            Self::Administrator => "administrator",
        }
    }

    /// Whether this role may register new batches.
    pub fn may_create_batches(&self) -> bool {
        matches!(self, Self::Producer | Self::Administrator)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = TypeError;

    /// Accepts canonical names and the legacy farm-to-table aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "producer" | "farmer" => Ok(Self::Producer),
            "aggregator" | "wholesaler" => Ok(Self::Aggregator),
            "distributor" | "retailer" => Ok(Self::Distributor),
            "endpoint-verifier" | "verifier" | "consumer" => Ok(Self::EndpointVerifier),
            "administrator" | "admin" => Ok(Self::Administrator),
            _ => Err(TypeError::UnknownRole(s.to_string())),
        }
    }
}
