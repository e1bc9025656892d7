//! Immutable, mask-grouped table of operator terms

use alloc::vec::Vec;

use num_complex::Complex64;

use super::{PauliTerm, Term};
use crate::traits::Subspace;
use crate::validation::validate_spin_count;
use crate::{QshellError, Result};

/// Amplitudes below this magnitude count as cancelled in [`TermTable::conserves`]
const CANCEL_TOLERANCE: f64 = 1e-12;

/// Operator terms sorted by `(mask, sign)` and grouped by mask
///
/// Terms of group `g` are `terms[mask_offsets[g]..mask_offsets[g + 1]]`
/// and all share the same mask. Equal `(mask, sign)` pairs are merged and
/// terms with a zero coefficient are dropped at construction. The table is
/// never mutated afterwards.
///
/// The serialized form is the spin count and the term list; loading it
/// goes through [`TermTable::new`] and rebuilds the grouping.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "TermList", into = "TermList")
)]
pub struct TermTable {
    spins: usize,
    terms: Vec<Term>,
    mask_offsets: Vec<usize>,
}

/// Serialized form of [`TermTable`]
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TermList {
    pub spins: usize,
    pub terms: Vec<Term>,
}

impl TryFrom<TermList> for TermTable {
    type Error = QshellError;

    fn try_from(list: TermList) -> Result<Self> {
        Self::new(list.spins, list.terms)
    }
}

impl From<TermTable> for TermList {
    fn from(table: TermTable) -> Self {
        Self {
            spins: table.spins,
            terms: table.terms,
        }
    }
}

impl TermTable {
    /// Build a table from raw terms
    ///
    /// Fails with [`QshellError::InvalidTerm`] if any term touches a bit at or
    /// above `spins`.
    pub fn new(spins: usize, mut terms: Vec<Term>) -> Result<Self> {
        validate_spin_count(spins)?;
        if terms
            .iter()
            .any(|t| (t.mask | t.sign) >> spins != 0)
        {
            return Err(QshellError::InvalidTerm);
        }

        terms.sort_unstable_by_key(|t| (t.mask, t.sign));

        let mut merged: Vec<Term> = Vec::with_capacity(terms.len());
        for term in terms {
            match merged.last_mut() {
                Some(last) if last.mask == term.mask && last.sign == term.sign => {
                    last.coeff += term.coeff;
                }
                _ => merged.push(term),
            }
        }
        merged.retain(|t| t.coeff != Complex64::new(0.0, 0.0));

        let mut mask_offsets = Vec::new();
        for (i, term) in merged.iter().enumerate() {
            if i == 0 || merged[i - 1].mask != term.mask {
                mask_offsets.push(i);
            }
        }
        mask_offsets.push(merged.len());

        Ok(Self {
            spins,
            terms: merged,
            mask_offsets,
        })
    }

    /// Build a table from Pauli strings
    pub fn from_paulis<I>(spins: usize, paulis: I) -> Result<Self>
    where
        I: IntoIterator<Item = PauliTerm>,
    {
        let terms = paulis.into_iter().map(|p| p.to_term()).collect();
        Self::new(spins, terms)
    }

    /// Number of spins the operator acts on
    pub fn spins(&self) -> usize {
        self.spins
    }

    /// Total number of terms
    pub fn nterms(&self) -> usize {
        self.terms.len()
    }

    /// Number of distinct masks
    pub fn nmasks(&self) -> usize {
        self.mask_offsets.len() - 1
    }

    /// Whether the table has no terms
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// All terms in `(mask, sign)` order
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Group boundaries; has `nmasks() + 1` entries
    pub fn mask_offsets(&self) -> &[usize] {
        &self.mask_offsets
    }

    /// Mask shared by group `g`
    pub fn mask(&self, g: usize) -> u64 {
        self.terms[self.mask_offsets[g]].mask
    }

    /// Terms of group `g`
    pub fn group(&self, g: usize) -> &[Term] {
        &self.terms[self.mask_offsets[g]..self.mask_offsets[g + 1]]
    }

    /// Iterate over `(mask, terms)` groups
    pub fn groups(&self) -> impl Iterator<Item = (u64, &[Term])> + '_ {
        (0..self.nmasks()).map(move |g| (self.mask(g), self.group(g)))
    }

    /// Combined amplitude of group `g` applied to source state `state`
    #[inline]
    pub fn group_amplitude(&self, g: usize, state: u64) -> Complex64 {
        self.group(g)
            .iter()
            .map(|t| t.coeff * t.phase(state))
            .sum()
    }

    /// Fail with [`QshellError::SubspaceMismatch`] unless `subspace` has the same spin count
    pub fn check_spins<S: Subspace>(&self, subspace: &S) -> Result<()> {
        if subspace.spins() != self.spins {
            return Err(QshellError::SubspaceMismatch);
        }
        Ok(())
    }

    /// Whether the operator maps every state of `right` only into `left`
    ///
    /// Groups whose terms cancel on a given state are ignored.
    pub fn conserves<L: Subspace, R: Subspace>(&self, left: &L, right: &R) -> Result<bool> {
        self.check_spins(left)?;
        self.check_spins(right)?;

        for state in right.states() {
            for g in 0..self.nmasks() {
                if left.contains(state ^ self.mask(g)) {
                    continue;
                }
                let amp = self.group_amplitude(g, state);
                if amp.norm_sqr() > CANCEL_TOLERANCE * CANCEL_TOLERANCE {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// Dense row-major matrix of the operator from `right` to `left`
    ///
    /// Intended for small reference systems.
    pub fn to_dense<L: Subspace, R: Subspace>(&self, left: &L, right: &R) -> Result<Vec<Complex64>> {
        self.check_spins(left)?;
        self.check_spins(right)?;

        let nrows = left.dimension();
        let ncols = right.dimension();
        let len = nrows
            .checked_mul(ncols)
            .ok_or(QshellError::AllocationFailed)?;

        let mut dense = Vec::new();
        dense
            .try_reserve_exact(len)
            .map_err(|_| QshellError::AllocationFailed)?;
        dense.resize(len, Complex64::new(0.0, 0.0));

        for (col, state) in right.states().enumerate() {
            for term in &self.terms {
                let (target, value) = term.apply(state);
                if let Some(row) = left.state_to_index(target) {
                    dense[row * ncols + col] += value;
                }
            }
        }
        Ok(dense)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subspace::{Full, Parity, ParitySector, SpinConserve};
    use crate::term::Pauli;
    use alloc::vec;

    fn c(re: f64) -> Complex64 {
        Complex64::new(re, 0.0)
    }

    #[test]
    fn test_grouping_and_merging() {
        let table = TermTable::new(
            3,
            vec![
                Term::new(0b011, 0b000, c(1.0)),
                Term::new(0b000, 0b001, c(0.5)),
                Term::new(0b011, 0b011, c(-1.0)),
                Term::new(0b000, 0b001, c(0.25)),
                Term::new(0b100, 0b000, c(0.0)),
            ],
        )
        .unwrap();

        assert_eq!(table.nterms(), 3);
        assert_eq!(table.nmasks(), 2);
        assert_eq!(table.mask_offsets(), &[0, 1, 3]);
        assert_eq!(table.mask(0), 0);
        assert_eq!(table.group(0)[0].coeff, c(0.75));
        assert_eq!(table.mask(1), 0b011);
        assert_eq!(table.group(1).len(), 2);
    }

    #[test]
    fn test_rejects_out_of_range_terms() {
        assert_eq!(
            TermTable::new(2, vec![Term::new(0b100, 0, c(1.0))]).unwrap_err(),
            QshellError::InvalidTerm
        );
    }

    #[test]
    fn test_term_list_goes_through_constructor() {
        let list = TermList {
            spins: 2,
            terms: vec![Term::new(0b01, 0, c(1.0)), Term::new(0b01, 0, c(1.0))],
        };
        let table = TermTable::try_from(list).unwrap();
        assert_eq!(table.nterms(), 1);
        assert_eq!(table.mask_offsets(), &[0, 1]);

        let back = TermList::from(table.clone());
        assert_eq!(back.terms, table.terms());

        let bad = TermList {
            spins: 2,
            terms: vec![Term::new(0b100, 0, c(1.0))],
        };
        assert_eq!(TermTable::try_from(bad).unwrap_err(), QshellError::InvalidTerm);
    }

    #[test]
    fn test_empty_table() {
        let table = TermTable::new(2, vec![]).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.nmasks(), 0);
        assert_eq!(table.mask_offsets(), &[0]);
    }

    #[test]
    fn test_to_dense_pauli_y() {
        let table = TermTable::from_paulis(1, [PauliTerm::parse("Y", c(1.0)).unwrap()]).unwrap();
        let full = Full::new(1).unwrap();
        let dense = table.to_dense(&full, &full).unwrap();
        // Y = [[0, -i], [i, 0]]
        assert_eq!(dense[0], c(0.0));
        assert_eq!(dense[1], Complex64::new(0.0, -1.0));
        assert_eq!(dense[2], Complex64::new(0.0, 1.0));
        assert_eq!(dense[3], c(0.0));
    }

    #[test]
    fn test_conserves() {
        // XX + YY hops one excitation and keeps the Hamming weight
        let hop = TermTable::from_paulis(
            4,
            [
                PauliTerm::from_factors(&[(0, Pauli::X), (1, Pauli::X)], c(1.0)).unwrap(),
                PauliTerm::from_factors(&[(0, Pauli::Y), (1, Pauli::Y)], c(1.0)).unwrap(),
            ],
        )
        .unwrap();
        let sc = SpinConserve::new(4, 2).unwrap();
        assert!(hop.conserves(&sc, &sc).unwrap());

        let flip = TermTable::from_paulis(4, [PauliTerm::parse("XIII", c(1.0)).unwrap()]).unwrap();
        assert!(!flip.conserves(&sc, &sc).unwrap());

        let even = Parity::new(4, ParitySector::Even).unwrap();
        let odd = Parity::new(4, ParitySector::Odd).unwrap();
        assert!(!flip.conserves(&even, &even).unwrap());
        assert!(flip.conserves(&odd, &even).unwrap());
    }

    #[test]
    fn test_spin_mismatch() {
        let table = TermTable::new(3, vec![Term::new(0, 0, c(1.0))]).unwrap();
        let full = Full::new(4).unwrap();
        assert_eq!(
            table.to_dense(&full, &full).unwrap_err(),
            QshellError::SubspaceMismatch
        );
    }
}
