//! Error classification shared by the domain error types.

use serde::{Deserialize, Serialize};

/// Broad class of a domain error, used by outer layers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input was rejected before any write.
    Validation,
    /// The write conflicts with the current state (locked, applied, stale).
    StateConflict,
    /// The referenced record does not exist for this owner.
    NotFound,
}
