//! Fixed Hamming-weight sector, indexed by the combinatorial number system
//!
//! A state with set bits at positions `p_1 < p_2 < ... < p_k` has index
//! `C(p_1, 1) + C(p_2, 2) + ... + C(p_k, k)`.

use super::SubspaceKind;
use crate::traits::Subspace;
use crate::validation::{validate_spin_count, MAX_SPINS};
use crate::{QshellError, Result};

const TABLE_SIZE: usize = MAX_SPINS + 1;

/// Pascal's triangle up to `C(63, k)`; every entry fits in a `u64`
static BINOMIAL: [[u64; TABLE_SIZE]; TABLE_SIZE] = build_binomial_table();

const fn build_binomial_table() -> [[u64; TABLE_SIZE]; TABLE_SIZE] {
    let mut table = [[0u64; TABLE_SIZE]; TABLE_SIZE];
    let mut n = 0;
    while n < TABLE_SIZE {
        table[n][0] = 1;
        let mut k = 1;
        while k <= n {
            table[n][k] = table[n - 1][k - 1] + table[n - 1][k];
            k += 1;
        }
        n += 1;
    }
    table
}

/// Binomial coefficient `C(n, k)`, zero when `k > n`
///
/// `n` must not exceed 63.
#[inline]
pub fn binomial(n: usize, k: usize) -> u64 {
    if k > n {
        return 0;
    }
    BINOMIAL[n][k]
}

/// States with exactly `weight` set bits out of `spins`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawSpinConserve")
)]
pub struct SpinConserve {
    spins: usize,
    weight: usize,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawSpinConserve {
    spins: usize,
    weight: usize,
}

#[cfg(feature = "serde")]
impl TryFrom<RawSpinConserve> for SpinConserve {
    type Error = QshellError;

    fn try_from(raw: RawSpinConserve) -> Result<Self> {
        Self::new(raw.spins, raw.weight)
    }
}

impl SpinConserve {
    /// Create the sector of `weight` up spins on `spins` spins
    pub fn new(spins: usize, weight: usize) -> Result<Self> {
        validate_spin_count(spins)?;
        if weight > spins {
            return Err(QshellError::InvalidState);
        }
        Ok(Self { spins, weight })
    }

    /// Number of set bits of every state in the sector
    pub fn weight(&self) -> usize {
        self.weight
    }
}

impl Subspace for SpinConserve {
    fn kind(&self) -> SubspaceKind {
        SubspaceKind::SpinConserve
    }

    fn spins(&self) -> usize {
        self.spins
    }

    fn dimension(&self) -> usize {
        binomial(self.spins, self.weight) as usize
    }

    #[inline]
    fn state_to_index(&self, state: u64) -> Option<usize> {
        if state >> self.spins != 0 || state.count_ones() as usize != self.weight {
            return None;
        }

        let mut rest = state;
        let mut rank = 0u64;
        let mut j = 1;
        while rest != 0 {
            let p = rest.trailing_zeros() as usize;
            rank += BINOMIAL[p][j];
            rest &= rest - 1;
            j += 1;
        }
        Some(rank as usize)
    }

    #[inline]
    fn index_to_state(&self, index: usize) -> u64 {
        debug_assert!(index < self.dimension());

        let mut rank = index as u64;
        let mut state = 0u64;
        let mut p = self.spins;
        for j in (1..=self.weight).rev() {
            p -= 1;
            // C(p, j) is zero for p < j, so this stops by p == j - 1
            while BINOMIAL[p][j] > rank {
                p -= 1;
            }
            state |= 1u64 << p;
            rank -= BINOMIAL[p][j];
        }
        state
    }
}
