//! Pauli-string front end for building term tables

use num_complex::Complex64;

use super::{i_pow, Term};
use crate::validation::{parse_pauli_string, MAX_SPINS};
use crate::{QshellError, Result};

/// Single-site Pauli operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Pauli {
    I,
    X,
    Y,
    Z,
}

impl Pauli {
    /// (flips bit, reads phase)
    const fn bits(self) -> (bool, bool) {
        match self {
            Pauli::I => (false, false),
            Pauli::X => (true, false),
            Pauli::Y => (true, true),
            Pauli::Z => (false, true),
        }
    }
}

/// A coefficient times a tensor product of single-site Paulis
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PauliTerm {
    x: u64,
    z: u64,
    coeff: Complex64,
}

impl PauliTerm {
    /// `coeff` times the identity
    pub const fn identity(coeff: Complex64) -> Self {
        Self { x: 0, z: 0, coeff }
    }

    /// Parse a string such as `"XIZY"`; character `i` acts on spin `i`
    pub fn parse(text: &str, coeff: Complex64) -> Result<Self> {
        let bits = parse_pauli_string(text)?;
        Ok(Self {
            x: bits.x,
            z: bits.z,
            coeff,
        })
    }

    /// Build from `(site, operator)` factors; each site may appear once
    pub fn from_factors(factors: &[(usize, Pauli)], coeff: Complex64) -> Result<Self> {
        let mut term = Self::identity(coeff);
        let mut used = 0u64;
        for &(site, op) in factors {
            if site >= MAX_SPINS {
                return Err(QshellError::InvalidQubit);
            }
            let bit = 1u64 << site;
            if used & bit != 0 {
                return Err(QshellError::InvalidQubit);
            }
            used |= bit;

            let (flip, phase) = op.bits();
            if flip {
                term.x |= bit;
            }
            if phase {
                term.z |= bit;
            }
        }
        Ok(term)
    }

    /// Single-site operator `op` on `site` with unit coefficient
    pub fn sigma(site: usize, op: Pauli) -> Result<Self> {
        Self::from_factors(&[(site, op)], Complex64::new(1.0, 0.0))
    }

    /// Operator on `site`, or identity
    pub fn at(&self, site: usize) -> Pauli {
        let Some(bit) = u32::try_from(site).ok().and_then(|s| 1u64.checked_shl(s)) else {
            return Pauli::I;
        };
        match (self.x & bit != 0, self.z & bit != 0) {
            (false, false) => Pauli::I,
            (true, false) => Pauli::X,
            (true, true) => Pauli::Y,
            (false, true) => Pauli::Z,
        }
    }

    /// Highest site touched plus one
    pub fn support_len(&self) -> usize {
        64 - (self.x | self.z).leading_zeros() as usize
    }

    /// Convert to mask/sign form with the `Y` phases folded into the coefficient
    ///
    /// Per site `Y = i X Z` with `Z` acting first, so a string with `n` `Y`
    /// factors contributes `i^n`.
    pub fn to_term(&self) -> Term {
        let y_count = (self.x & self.z).count_ones();
        Term::new(self.x, self.z, self.coeff * i_pow(y_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_convert() {
        let p = PauliTerm::parse("XYZ", Complex64::new(2.0, 0.0)).unwrap();
        assert_eq!(p.at(0), Pauli::X);
        assert_eq!(p.at(1), Pauli::Y);
        assert_eq!(p.at(2), Pauli::Z);
        assert_eq!(p.at(3), Pauli::I);
        assert_eq!(p.support_len(), 3);
        assert_eq!(p.at(63), Pauli::I);
        assert_eq!(p.at(64), Pauli::I);
        assert_eq!(p.at(200), Pauli::I);

        let t = p.to_term();
        assert_eq!(t.mask, 0b011);
        assert_eq!(t.sign, 0b110);
        assert_eq!(t.coeff, Complex64::new(0.0, 2.0));
    }

    #[test]
    fn test_from_factors() {
        let p = PauliTerm::from_factors(&[(3, Pauli::Y), (0, Pauli::Z)], Complex64::new(1.0, 0.0))
            .unwrap();
        assert_eq!(p.to_term().mask, 0b1000);
        assert_eq!(p.to_term().sign, 0b1001);

        assert_eq!(
            PauliTerm::from_factors(&[(1, Pauli::X), (1, Pauli::Z)], Complex64::new(1.0, 0.0)),
            Err(QshellError::InvalidQubit)
        );
    }

    #[test]
    fn test_y_applied_to_basis_states() {
        let y = PauliTerm::sigma(0, Pauli::Y).unwrap().to_term();
        // Y|0> = i|1>, Y|1> = -i|0>
        assert_eq!(y.apply(0), (1, Complex64::new(0.0, 1.0)));
        assert_eq!(y.apply(1), (0, Complex64::new(0.0, -1.0)));
    }
}
