use std::fmt;

use pvl_types::{BatchStatus, Role};
use serde::{Deserialize, Serialize};

/// Why a requested status change was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum Denial {
    /// The batch is in its final status; no role may move it.
    TerminalState { status: BatchStatus },
    /// The requested status is not the immediate successor (skip, backward, or same).
    OutOfOrder { from: BatchStatus, to: BatchStatus },
    /// The step is legal but not for this role. `from` is `None` for batch creation.
    RoleNotPermitted {
        role: Role,
        from: Option<BatchStatus>,
        to: BatchStatus,
    },
}

impl Denial {
    /// `true` for denials caused by the caller's role rather than the batch state.
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::RoleNotPermitted { .. })
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TerminalState { status } => {
                write!(f, "batch is already {status}; no further transitions exist")
            }
            Self::OutOfOrder { from, to } => match from.successor() {
                Some(next) => write!(f, "cannot move from {from} to {to}; the next status is {next}"),
                None => write!(f, "cannot move from {from} to {to}"),
            },
            Self::RoleNotPermitted {
                role,
                from: None,
                ..
            } => write!(f, "role {role} may not create batches"),
            Self::RoleNotPermitted {
                role,
                from: Some(from),
                to,
            } => write!(f, "role {role} may not move a batch from {from} to {to}"),
        }
    }
}

impl std::error::Error for Denial {}
