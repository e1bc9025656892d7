//! The unrestricted `2^N` basis

use super::SubspaceKind;
use crate::traits::Subspace;
use crate::validation::{state_limit, validate_spin_count};
use crate::Result;

/// Every `N`-bit basis state; the index of a state is the state itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawFull")
)]
pub struct Full {
    spins: usize,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawFull {
    spins: usize,
}

#[cfg(feature = "serde")]
impl TryFrom<RawFull> for Full {
    type Error = crate::QshellError;

    fn try_from(raw: RawFull) -> Result<Self> {
        Self::new(raw.spins)
    }
}

impl Full {
    /// Create the full space on `spins` spins
    pub fn new(spins: usize) -> Result<Self> {
        validate_spin_count(spins)?;
        Ok(Self { spins })
    }
}

impl Subspace for Full {
    fn kind(&self) -> SubspaceKind {
        SubspaceKind::Full
    }

    fn spins(&self) -> usize {
        self.spins
    }

    fn dimension(&self) -> usize {
        state_limit(self.spins) as usize
    }

    #[inline]
    fn state_to_index(&self, state: u64) -> Option<usize> {
        (state >> self.spins == 0).then_some(state as usize)
    }

    #[inline]
    fn index_to_state(&self, index: usize) -> u64 {
        index as u64
    }
}
