//! Table bounds: capacity range and accepted identifier range.

use crate::error::{ProbeError, Result};
use crate::prime::is_prime;
use crate::{MAXID, MAXPRIME, MINID, MINPRIME};

/// Bounds a [`ProbeTable`](crate::ProbeTable) enforces.
///
/// Defaults to [`MINPRIME`]..=[`MAXPRIME`] capacities and
/// [`MINID`]..=[`MAXID`] identifiers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TableConfig {
    pub min_prime: usize,
    pub max_prime: usize,
    pub min_id: i32,
    pub max_id: i32,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            min_prime: MINPRIME,
            max_prime: MAXPRIME,
            min_id: MINID,
            max_id: MAXID,
        }
    }
}

impl TableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the capacity range. Both ends must be prime.
    pub fn with_prime_bounds(mut self, min_prime: usize, max_prime: usize) -> Self {
        self.min_prime = min_prime;
        self.max_prime = max_prime;
        self
    }

    /// Sets the inclusive range of identifiers the table accepts.
    pub fn with_id_range(mut self, min_id: i32, max_id: i32) -> Self {
        self.min_id = min_id;
        self.max_id = max_id;
        self
    }

    #[inline]
    pub fn id_in_range(&self, id: i32) -> bool {
        (self.min_id..=self.max_id).contains(&id)
    }

    pub fn validate(&self) -> Result<()> {
        if !is_prime(self.min_prime) || !is_prime(self.max_prime) {
            return Err(ProbeError::InvalidConfig {
                reason: format!(
                    "prime bounds [{}, {}] must both be prime",
                    self.min_prime, self.max_prime
                ),
            });
        }
        if self.min_prime > self.max_prime {
            return Err(ProbeError::InvalidConfig {
                reason: format!(
                    "min_prime {} exceeds max_prime {}",
                    self.min_prime, self.max_prime
                ),
            });
        }
        if self.min_id > self.max_id {
            return Err(ProbeError::InvalidConfig {
                reason: format!("min_id {} exceeds max_id {}", self.min_id, self.max_id),
            });
        }
        Ok(())
    }
}
