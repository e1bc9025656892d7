//! Shell Context: a term table bound to a (left, right) subspace pair and a row layout
//!
//! Construction flattens the table into per-group buffers in which every
//! coefficient is reduced to its single nonzero component. Within a group
//! the real-weighted terms come first, then the imaginary-weighted ones, so
//! a row sweep accumulates two real sums and never multiplies complex
//! coefficients.
//!
//! Groups are split once at build time:
//!
//! - **local** groups read columns that are either outside the right
//!   subspace or inside this worker's owned column range, so they are served
//!   from the resident input slice
//! - **global** groups read at least one foreign column and need the
//!   replicated input buffer

use num_complex::Complex64;
use qshell_core::{parity_sign, QshellError, Result, Subspace, TermTable};
use tracing::{debug, error};

use crate::comm::Communicator;
use crate::config::ShellConfig;
use crate::vector::{try_zeroed, Layout};

/// Flattened, validated term data owned by a context
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermBuffers {
    pub(crate) masks: Vec<u64>,
    pub(crate) offsets: Vec<usize>,
    pub(crate) imag_offsets: Vec<usize>,
    pub(crate) signs: Vec<u64>,
    pub(crate) weights: Vec<f64>,
}

impl TermBuffers {
    /// Flatten `table`, rejecting coefficients whose phase would make the operator non-Hermitian
    pub fn build(table: &TermTable, tolerance: f64) -> Result<Self> {
        let nterms = table.nterms();
        let mut buffers = Self {
            masks: Vec::with_capacity(table.nmasks()),
            offsets: Vec::with_capacity(table.nmasks() + 1),
            imag_offsets: Vec::with_capacity(table.nmasks()),
            signs: Vec::with_capacity(nterms),
            weights: Vec::with_capacity(nterms),
        };

        buffers.offsets.push(0);
        for (mask, group) in table.groups() {
            buffers.masks.push(mask);
            for imaginary in [false, true] {
                if imaginary {
                    buffers.imag_offsets.push(buffers.signs.len());
                }
                for term in group.iter().filter(|t| t.is_real_weighted() != imaginary) {
                    buffers.signs.push(term.sign);
                    buffers.weights.push(term.weight(tolerance)?);
                }
            }
            buffers.offsets.push(buffers.signs.len());
        }
        Ok(buffers)
    }

    /// Number of mask groups
    pub fn nmasks(&self) -> usize {
        self.masks.len()
    }

    /// Number of terms
    pub fn nterms(&self) -> usize {
        self.weights.len()
    }

    /// Borrow as a kernel view
    pub fn view(&self) -> TermView<'_> {
        TermView {
            masks: &self.masks,
            offsets: &self.offsets,
            imag_offsets: &self.imag_offsets,
            signs: &self.signs,
            weights: &self.weights,
        }
    }
}

/// Read-only view of term buffers, resident on the host or on the device
#[derive(Debug, Clone, Copy)]
pub struct TermView<'a> {
    pub(crate) masks: &'a [u64],
    pub(crate) offsets: &'a [usize],
    pub(crate) imag_offsets: &'a [usize],
    pub(crate) signs: &'a [u64],
    pub(crate) weights: &'a [f64],
}

impl TermView<'_> {
    /// Mask of group `g`
    #[inline]
    pub fn mask(&self, g: usize) -> u64 {
        self.masks[g]
    }

    /// Matrix element contributed by group `g` reading source state `source`
    #[inline]
    pub fn group_weight(&self, g: usize, source: u64) -> Complex64 {
        let (lo, mid, hi) = (self.offsets[g], self.imag_offsets[g], self.offsets[g + 1]);
        let mut re = 0.0;
        for t in lo..mid {
            re += self.weights[t] * parity_sign(self.signs[t] & source);
        }
        let mut im = 0.0;
        for t in mid..hi {
            im += self.weights[t] * parity_sign(self.signs[t] & source);
        }
        Complex64::new(re, im)
    }

    /// Contribution of group `g` to the output row of `row_state`
    ///
    /// `x[col - offset]` holds the input at right-subspace column `col`.
    /// Sources outside the right subspace contribute nothing.
    #[inline]
    pub fn group_contribution<R: Subspace>(
        &self,
        g: usize,
        row_state: u64,
        x: &[Complex64],
        offset: usize,
        right: &R,
    ) -> Complex64 {
        let source = row_state ^ self.masks[g];
        match right.state_to_index(source) {
            Some(col) => self.group_weight(g, source) * x[col - offset],
            None => Complex64::new(0.0, 0.0),
        }
    }

    /// Sum of [`TermView::group_contribution`] over `groups`
    #[inline]
    pub fn row_value<R: Subspace>(
        &self,
        row_state: u64,
        groups: &[usize],
        x: &[Complex64],
        offset: usize,
        right: &R,
    ) -> Complex64 {
        groups
            .iter()
            .map(|&g| self.group_contribution(g, row_state, x, offset, right))
            .sum()
    }

    /// Absolute row sum of the operator restricted to `groups`
    #[inline]
    pub fn row_abs_sum<R: Subspace>(&self, row_state: u64, groups: &[usize], right: &R) -> f64 {
        groups
            .iter()
            .filter_map(|&g| {
                let source = row_state ^ self.masks[g];
                right
                    .state_to_index(source)
                    .map(|_| self.group_weight(g, source).norm())
            })
            .sum()
    }
}

/// A term table bound to a subspace pair and a distributed layout
///
/// Borrows the table, both subspaces and the communicator, which must
/// outlive it. Owns the flattened term buffers and the replicated input
/// buffer, which is overwritten by every global phase.
pub struct ShellContext<'a, L, R, C> {
    pub(crate) table: &'a TermTable,
    pub(crate) left: &'a L,
    pub(crate) right: &'a R,
    pub(crate) comm: &'a C,
    pub(crate) config: ShellConfig,
    pub(crate) row_layout: Layout,
    pub(crate) col_layout: Layout,
    pub(crate) terms: TermBuffers,
    pub(crate) local_groups: Vec<usize>,
    pub(crate) global_groups: Vec<usize>,
    pub(crate) needs_gather: bool,
    pub(crate) x_all: Vec<Complex64>,
    pub(crate) nrm: Option<f64>,
}

impl<'a, L, R, C> ShellContext<'a, L, R, C>
where
    L: Subspace,
    R: Subspace,
    C: Communicator,
{
    /// Build a context with the default row split of both subspaces over `comm` (collective)
    pub fn new(
        table: &'a TermTable,
        left: &'a L,
        right: &'a R,
        comm: &'a C,
        config: ShellConfig,
    ) -> Result<Self> {
        let row_layout = Layout::for_comm(left.dimension(), comm);
        let col_layout = Layout::for_comm(right.dimension(), comm);
        Self::with_layouts(table, left, right, comm, config, row_layout, col_layout)
    }

    /// Build a context over explicit output and input layouts (collective)
    pub fn with_layouts(
        table: &'a TermTable,
        left: &'a L,
        right: &'a R,
        comm: &'a C,
        config: ShellConfig,
        row_layout: Layout,
        col_layout: Layout,
    ) -> Result<Self> {
        table.check_spins(left)?;
        table.check_spins(right)?;
        if row_layout.global_len() != left.dimension()
            || col_layout.global_len() != right.dimension()
        {
            return Err(QshellError::DimensionMismatch);
        }

        let terms = TermBuffers::build(table, config.coeff_tolerance)?;
        let (local_groups, global_groups) = split_groups(&terms, left, right, &row_layout, &col_layout);

        let needs_gather = comm.all_reduce_or(!global_groups.is_empty())?;
        let x_all = if needs_gather {
            try_zeroed(right.dimension()).inspect_err(|e| {
                error!(dimension = right.dimension(), error = %e, "gather buffer allocation failed");
            })?
        } else {
            Vec::new()
        };

        debug!(
            left = %left.kind(),
            right = %right.kind(),
            spins = table.spins(),
            nterms = terms.nterms(),
            nmasks = terms.nmasks(),
            local_masks = local_groups.len(),
            global_masks = global_groups.len(),
            rows = row_layout.local_len(),
            needs_gather,
            backend = config.backend.name(),
            "built shell context"
        );

        Ok(Self {
            table,
            left,
            right,
            comm,
            config,
            row_layout,
            col_layout,
            terms,
            local_groups,
            global_groups,
            needs_gather,
            x_all,
            nrm: None,
        })
    }

    /// Term table the context was built from
    pub fn table(&self) -> &'a TermTable {
        self.table
    }

    /// Output subspace
    pub fn left(&self) -> &'a L {
        self.left
    }

    /// Input subspace
    pub fn right(&self) -> &'a R {
        self.right
    }

    /// Communicator the context was built over
    pub fn comm(&self) -> &'a C {
        self.comm
    }

    /// Configuration used at build time
    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Layout of output vectors
    pub fn row_layout(&self) -> &Layout {
        &self.row_layout
    }

    /// Layout of input vectors
    pub fn col_layout(&self) -> &Layout {
        &self.col_layout
    }

    /// Flattened term buffers
    pub fn terms(&self) -> &TermBuffers {
        &self.terms
    }

    /// Number of mask groups served from the resident input slice
    pub fn nmasks_local(&self) -> usize {
        self.local_groups.len()
    }

    /// Total number of mask groups
    pub fn nmasks(&self) -> usize {
        self.terms.nmasks()
    }

    /// Whether MatMult performs the collective gather
    pub fn needs_gather(&self) -> bool {
        self.needs_gather
    }
}

fn split_groups<L: Subspace, R: Subspace>(
    terms: &TermBuffers,
    left: &L,
    right: &R,
    rows: &Layout,
    cols: &Layout,
) -> (Vec<usize>, Vec<usize>) {
    let mut local = Vec::new();
    let mut global = Vec::new();
    for (g, &mask) in terms.masks.iter().enumerate() {
        let is_local = rows.range().all(|row| {
            let source = left.index_to_state(row) ^ mask;
            right
                .state_to_index(source)
                .map_or(true, |col| cols.contains(col))
        });
        if is_local {
            local.push(g);
        } else {
            global.push(g);
        }
    }
    (local, global)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::SelfComm;
    use qshell_core::{Full, PauliTerm, Term};

    fn table(spins: usize, paulis: &[(&str, f64)]) -> TermTable {
        TermTable::from_paulis(
            spins,
            paulis
                .iter()
                .map(|&(p, c)| PauliTerm::parse(p, Complex64::new(c, 0.0)).unwrap()),
        )
        .unwrap()
    }

    #[test]
    fn test_buffers_split_real_and_imaginary() {
        // XY carries i, XX stays real; both share mask 0b11
        let table = table(2, &[("XY", 1.0), ("XX", 2.0)]);
        let buffers = TermBuffers::build(&table, 1e-12).unwrap();
        assert_eq!(buffers.masks, vec![0b11]);
        assert_eq!(buffers.offsets, vec![0, 2]);
        assert_eq!(buffers.imag_offsets, vec![1]);
        assert_eq!(buffers.weights[0], 2.0);
        assert_eq!(buffers.weights[1].abs(), 1.0);
    }

    #[test]
    fn test_rejects_non_hermitian_phase() {
        let table = TermTable::new(1, vec![Term::new(1, 0, Complex64::new(0.0, 1.0))]).unwrap();
        assert_eq!(
            TermBuffers::build(&table, 1e-12),
            Err(QshellError::NonHermitianTerm)
        );
    }

    #[test]
    fn test_single_worker_is_all_local() {
        let table = table(3, &[("XII", 1.0), ("ZZI", 0.5)]);
        let full = Full::new(3).unwrap();
        let ctx = ShellContext::new(&table, &full, &full, &SelfComm, ShellConfig::default()).unwrap();
        assert_eq!(ctx.nmasks(), 2);
        assert_eq!(ctx.nmasks_local(), 2);
        assert!(!ctx.needs_gather());
        assert_eq!(ctx.row_layout().local_len(), 8);
    }

    #[test]
    fn test_partial_layout_needs_foreign_columns() {
        // spin 2 is the highest bit, so X on it jumps across halves
        let table = table(3, &[("IIX", 1.0), ("XII", 1.0)]);
        let full = Full::new(3).unwrap();
        let rows = Layout::split(8, 0, 2);
        let ctx = ShellContext::with_layouts(
            &table,
            &full,
            &full,
            &SelfComm,
            ShellConfig::default(),
            rows,
            rows,
        )
        .unwrap();
        assert_eq!(ctx.nmasks_local(), 1);
        assert!(ctx.needs_gather());
        assert_eq!(ctx.x_all.len(), 8);
    }

    #[test]
    fn test_spin_mismatch() {
        let table = table(2, &[("XX", 1.0)]);
        let full = Full::new(3).unwrap();
        assert!(matches!(
            ShellContext::new(&table, &full, &full, &SelfComm, ShellConfig::default()),
            Err(QshellError::SubspaceMismatch)
        ));
    }
}
