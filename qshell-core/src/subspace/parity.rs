//! Fixed-parity sector of the full basis
//!
//! The parity of a state fixes its lowest bit given the others, so the
//! index of a state is the state shifted right by one.

use super::SubspaceKind;
use crate::traits::Subspace;
use crate::validation::{state_limit, validate_spin_count};
use crate::Result;

/// Which parity of the total set-bit count is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParitySector {
    Even,
    Odd,
}

impl ParitySector {
    #[inline]
    const fn bit(self) -> u32 {
        match self {
            ParitySector::Even => 0,
            ParitySector::Odd => 1,
        }
    }
}

/// States whose number of set bits has a fixed parity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawParity")
)]
pub struct Parity {
    spins: usize,
    sector: ParitySector,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawParity {
    spins: usize,
    sector: ParitySector,
}

#[cfg(feature = "serde")]
impl TryFrom<RawParity> for Parity {
    type Error = crate::QshellError;

    fn try_from(raw: RawParity) -> Result<Self> {
        Self::new(raw.spins, raw.sector)
    }
}

impl Parity {
    /// Create the parity sector on `spins` spins
    pub fn new(spins: usize, sector: ParitySector) -> Result<Self> {
        validate_spin_count(spins)?;
        Ok(Self { spins, sector })
    }

    /// The kept sector
    pub fn sector(&self) -> ParitySector {
        self.sector
    }
}

impl Subspace for Parity {
    fn kind(&self) -> SubspaceKind {
        SubspaceKind::Parity
    }

    fn spins(&self) -> usize {
        self.spins
    }

    fn dimension(&self) -> usize {
        (state_limit(self.spins) >> 1) as usize
    }

    #[inline]
    fn state_to_index(&self, state: u64) -> Option<usize> {
        if state >> self.spins != 0 || state.count_ones() & 1 != self.sector.bit() {
            return None;
        }
        Some((state >> 1) as usize)
    }

    #[inline]
    fn index_to_state(&self, index: usize) -> u64 {
        let upper = (index as u64) << 1;
        upper | u64::from((upper.count_ones() & 1) ^ self.sector.bit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parity_dimension() {
        let even = Parity::new(4, ParitySector::Even).unwrap();
        assert_eq!(even.dimension(), 8);
        assert_eq!(even.states().filter(|s| s.count_ones() % 2 == 0).count(), 8);
    }

    #[test]
    fn test_parity_roundtrip_and_exclusion() {
        for sector in [ParitySector::Even, ParitySector::Odd] {
            let sub = Parity::new(5, sector).unwrap();
            for s in 0..32u64 {
                let in_sector = (s.count_ones() & 1) == sector.bit();
                match sub.state_to_index(s) {
                    Some(i) => {
                        assert!(in_sector);
                        assert!(i < sub.dimension());
                        assert_eq!(sub.index_to_state(i), s);
                    }
                    None => assert!(!in_sector),
                }
            }
        }
    }

    #[test]
    fn test_parity_single_spin() {
        let odd = Parity::new(1, ParitySector::Odd).unwrap();
        assert_eq!(odd.dimension(), 1);
        assert_eq!(odd.index_to_state(0), 1);
        assert_eq!(odd.state_to_index(0), None);
    }
}
