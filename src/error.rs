use thiserror::Error;

use crate::probe::ProbePolicy;

/// Reasons a table operation can be refused.
///
/// The plain operations (`insert`, `remove`, `find`) fold these into a
/// `bool` or `Option`; [`ProbeTable::try_insert`](crate::ProbeTable::try_insert)
/// hands them back as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("record id {id} outside valid range [{min}, {max}]")]
    InvalidId { id: i32, min: i32, max: i32 },

    #[error("record {key} (ID {id}) is already present")]
    Duplicate { key: String, id: i32 },

    #[error("home slot {home} already occupied and policy {policy:?} does not probe")]
    Collision { home: usize, policy: ProbePolicy },

    #[error("probe sequence exhausted after {probes} probes in a table of capacity {capacity}")]
    ProbeExhausted { probes: usize, capacity: usize },

    #[error("table holds {limit} records, the most its largest capacity can keep")]
    TableFull { limit: usize },

    #[error("invalid table config: {reason}")]
    InvalidConfig { reason: String },
}

pub type Result<T> = std::result::Result<T, ProbeError>;
