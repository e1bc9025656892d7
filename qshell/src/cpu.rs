//! Host MatMult engine
//!
//! Each call runs a local phase over the resident input slice and, when any
//! worker owns a foreign-column group, a global phase over the replicated
//! input. Output rows are independent, so both phases are row-parallel.

use qshell_core::{QshellError, Result, Subspace};
use rayon::prelude::*;
use tracing::{error, trace};

use crate::comm::Communicator;
use crate::context::ShellContext;
use crate::vector::DistVector;

impl<L, R, C> ShellContext<'_, L, R, C>
where
    L: Subspace,
    R: Subspace,
    C: Communicator,
{
    /// `y = A x` (collective when the context needs a gather)
    pub fn mat_mult(&mut self, x: &DistVector, y: &mut DistVector) -> Result<()> {
        self.check_vectors(x, y)?;
        trace!(
            rows = self.row_layout.local_len(),
            global_phase = self.needs_gather,
            "cpu matmult"
        );

        let view = self.terms.view();
        let left = self.left;
        let right = self.right;
        let row_start = self.row_layout.start();
        let col_start = self.col_layout.start();
        let local_groups = &self.local_groups;
        let x_local = x.local();

        y.local_mut()
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, out)| {
                let state = left.index_to_state(row_start + i);
                *out = view.row_value(state, local_groups, x_local, col_start, right);
            });

        if !self.needs_gather {
            return Ok(());
        }

        self.comm
            .all_gather(x.local(), &mut self.x_all)
            .inspect_err(|e| error!(error = %e, "input gather failed"))?;

        let global_groups = &self.global_groups;
        let x_all = &self.x_all;
        y.local_mut()
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, out)| {
                let state = left.index_to_state(row_start + i);
                *out += view.row_value(state, global_groups, x_all, 0, right);
            });
        Ok(())
    }

    /// Local rows of the infinity norm, before the cross-worker reduction
    pub(crate) fn local_row_max(&self) -> f64 {
        let view = self.terms.view();
        let left = self.left;
        let right = self.right;
        let all_groups: Vec<usize> = (0..self.terms.nmasks()).collect();
        self.row_layout
            .range()
            .into_par_iter()
            .map(|row| view.row_abs_sum(left.index_to_state(row), &all_groups, right))
            .reduce(|| 0.0, f64::max)
    }

    pub(crate) fn check_vectors(&self, x: &DistVector, y: &DistVector) -> Result<()> {
        if x.layout() != &self.col_layout || y.layout() != &self.row_layout {
            return Err(QshellError::LayoutMismatch);
        }
        Ok(())
    }
}
