//! Mask/sign/coefficient encoding of Pauli-string terms
//!
//! A term is stored as three words:
//!
//! - `mask`: positions where the term flips a bit (`X` or `Y`)
//! - `sign`: positions whose value in the source state contributes a
//!   factor of -1 (`Z` or `Y`)
//! - `coeff`: the scalar weight, with the `i` of every `Y` already folded in
//!
//! Applied to basis state `s`, a term produces state `s ^ mask` with
//! amplitude `coeff * (-1)^popcount(sign & s)`.

pub mod pauli;
pub mod table;

pub use pauli::{Pauli, PauliTerm};
pub use table::{TermList, TermTable};

use num_complex::Complex64;

use crate::{QshellError, Result};

/// `(-1)^popcount(bits)` as a float
#[inline]
pub fn parity_sign(bits: u64) -> f64 {
    if bits.count_ones() & 1 == 0 {
        1.0
    } else {
        -1.0
    }
}

/// `i^n`
#[inline]
pub fn i_pow(n: u32) -> Complex64 {
    match n & 3 {
        0 => Complex64::new(1.0, 0.0),
        1 => Complex64::new(0.0, 1.0),
        2 => Complex64::new(-1.0, 0.0),
        _ => Complex64::new(0.0, -1.0),
    }
}

/// One operator term
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Term {
    /// Bit-flip positions
    pub mask: u64,
    /// Phase-determining positions
    pub sign: u64,
    /// Scalar weight
    pub coeff: Complex64,
}

impl Term {
    /// Create a term
    pub const fn new(mask: u64, sign: u64, coeff: Complex64) -> Self {
        Self { mask, sign, coeff }
    }

    /// Apply to a basis state, returning the target state and its amplitude factor
    #[inline]
    pub fn apply(&self, state: u64) -> (u64, Complex64) {
        (state ^ self.mask, self.coeff * self.phase(state))
    }

    /// `(-1)^popcount(sign & state)` for a source state
    #[inline]
    pub fn phase(&self, state: u64) -> f64 {
        parity_sign(self.sign & state)
    }

    /// Number of `Y` factors in the underlying Pauli string
    #[inline]
    pub fn y_count(&self) -> u32 {
        (self.mask & self.sign).count_ones()
    }

    /// Whether a Hermitian term carries a real weight
    ///
    /// An even number of `Y` factors leaves a real coefficient real; an odd
    /// number turns it purely imaginary.
    #[inline]
    pub fn is_real_weighted(&self) -> bool {
        self.y_count() & 1 == 0
    }

    /// The single nonzero component of the coefficient
    ///
    /// Fails with [`QshellError::NonHermitianTerm`] if the other component
    /// exceeds `tolerance` in magnitude.
    pub fn weight(&self, tolerance: f64) -> Result<f64> {
        let (kept, dropped) = if self.is_real_weighted() {
            (self.coeff.re, self.coeff.im)
        } else {
            (self.coeff.im, self.coeff.re)
        };
        if dropped * dropped > tolerance * tolerance {
            return Err(QshellError::NonHermitianTerm);
        }
        Ok(kept)
    }
}
