//! Stored record and per-slot state.

use std::fmt;

/// A fixed-shape record: string key plus integer identifier.
///
/// Two records are equal when both key and id match; that is what duplicate
/// detection and removal compare against.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Record {
    pub key: String,
    pub id: i32,
}

impl Record {
    pub fn new(key: impl Into<String>, id: i32) -> Self {
        Self { key: key.into(), id }
    }

    #[inline]
    pub(crate) fn matches(&self, key: &str, id: i32) -> bool {
        self.id == id && self.key == key
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.key.is_empty() {
            return Ok(());
        }
        write!(f, "{} (ID {})", self.key, self.id)
    }
}

/// State of a single table slot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Slot {
    /// Never used. Terminates lookups.
    #[default]
    Empty,
    /// Tombstone: the occupant was removed. Lookups probe past it, inserts
    /// may reuse it.
    Deleted,
    Occupied(Record),
}

impl Slot {
    /// True for `Empty` and `Deleted`, the slots an insert may claim.
    #[inline]
    pub fn is_vacant(&self) -> bool {
        !matches!(self, Slot::Occupied(_))
    }

    #[inline]
    pub fn record(&self) -> Option<&Record> {
        match self {
            Slot::Occupied(r) => Some(r),
            _ => None,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Occupied(r) => r.fmt(f),
            Slot::Empty | Slot::Deleted => Ok(()),
        }
    }
}
