//! Product and random states

use num_complex::Complex64;
use qshell_core::validation::validate_state;
use qshell_core::{parse_product_state, QshellError, Result, Subspace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::comm::Communicator;
use crate::vector::{DistVector, Layout};

/// A single basis state given as bits or as a spin string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductState<'s> {
    /// Bit `i` is spin `i`, set bit = up
    Bits(u64),
    /// One `U` or `D` per spin, leftmost is spin 0
    Spins(&'s str),
}

impl ProductState<'_> {
    /// Resolve to a basis state of an `spins`-spin chain
    pub fn to_bits(self, spins: usize) -> Result<u64> {
        match self {
            ProductState::Bits(bits) => {
                validate_state(bits, spins)?;
                Ok(bits)
            }
            ProductState::Spins(text) => parse_product_state(text, spins),
        }
    }
}

impl From<u64> for ProductState<'_> {
    fn from(bits: u64) -> Self {
        ProductState::Bits(bits)
    }
}

impl<'s> From<&'s str> for ProductState<'s> {
    fn from(text: &'s str) -> Self {
        ProductState::Spins(text)
    }
}

impl DistVector {
    /// Unit vector on one basis state of `subspace`
    ///
    /// Fails with [`QshellError::InvalidState`] if the state is not in the subspace.
    pub fn product<'s, S, C>(subspace: &S, comm: &C, state: impl Into<ProductState<'s>>) -> Result<Self>
    where
        S: Subspace,
        C: Communicator,
    {
        let bits = state.into().to_bits(subspace.spins())?;
        let index = subspace
            .state_to_index(bits)
            .ok_or(QshellError::InvalidState)?;

        let layout = Layout::for_comm(subspace.dimension(), comm);
        let mut vector = DistVector::zeros(layout)?;
        if layout.contains(index) {
            vector.local_mut()[index - layout.start()] = Complex64::new(1.0, 0.0);
        }
        Ok(vector)
    }

    /// Gaussian random vector over `subspace`
    ///
    /// Each worker seeds its generator with `seed + rank` and draws the real
    /// and imaginary parts from a standard normal. With `normalize` the
    /// result is rescaled to unit norm (collective).
    pub fn random<S, C>(subspace: &S, comm: &C, seed: u64, normalize: bool) -> Result<Self>
    where
        S: Subspace,
        C: Communicator,
    {
        let layout = Layout::for_comm(subspace.dimension(), comm);
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(comm.rank() as u64));
        let mut vector = DistVector::zeros(layout)?;
        for a in vector.local_mut() {
            *a = Complex64::new(rng.sample(StandardNormal), rng.sample(StandardNormal));
        }
        if normalize {
            vector.normalize(comm)?;
        }
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::SelfComm;
    use qshell_core::{Full, SpinConserve};

    #[test]
    fn test_product_from_spin_string() {
        let full = Full::new(3).unwrap();
        let v = DistVector::product(&full, &SelfComm, "UDD").unwrap();
        assert_eq!(v.local()[1], Complex64::new(1.0, 0.0));
        assert_eq!(v.local().iter().filter(|a| a.norm() > 0.0).count(), 1);

        let w = DistVector::product(&full, &SelfComm, 0b110u64).unwrap();
        assert_eq!(w.local()[6], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_product_outside_subspace() {
        let sc = SpinConserve::new(4, 2).unwrap();
        assert_eq!(
            DistVector::product(&sc, &SelfComm, "UUUD"),
            Err(QshellError::InvalidState)
        );
        assert_eq!(
            DistVector::product(&sc, &SelfComm, 1u64 << 4),
            Err(QshellError::InvalidState)
        );
        assert!(DistVector::product(&sc, &SelfComm, "UDUD").is_ok());
    }

    #[test]
    fn test_random_is_seeded_and_normalized() {
        let full = Full::new(4).unwrap();
        let a = DistVector::random(&full, &SelfComm, 7, true).unwrap();
        let b = DistVector::random(&full, &SelfComm, 7, true).unwrap();
        let c = DistVector::random(&full, &SelfComm, 8, true).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!((a.norm(&SelfComm).unwrap() - 1.0).abs() < 1e-12);
    }
}
