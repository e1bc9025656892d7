//! Device MatMult and Norm engines
//!
//! The device context wraps a host [`ShellContext`] and mirrors its term
//! buffers and group lists into device memory. Every MatMult call uploads
//! the resident input slice, runs the local kernel, and, if any worker needs
//! foreign columns, gathers on the host, uploads the replicated input and
//! runs the global kernel before downloading the output. Kernel launches
//! return only after every group has finished.

pub mod buffer;
pub mod grid;

pub use buffer::DeviceBuffer;
pub use grid::Grid;

use num_complex::Complex64;
use qshell_core::{Result, Subspace, TermTable};
use tracing::{debug, error, trace};

use crate::comm::Communicator;
use crate::config::ShellConfig;
use crate::context::{ShellContext, TermView};
use crate::norm::NormType;
use crate::vector::{DistVector, Layout};

struct DeviceTerms {
    masks: DeviceBuffer<u64>,
    offsets: DeviceBuffer<usize>,
    imag_offsets: DeviceBuffer<usize>,
    signs: DeviceBuffer<u64>,
    weights: DeviceBuffer<f64>,
    local_groups: DeviceBuffer<usize>,
    global_groups: DeviceBuffer<usize>,
}

impl DeviceTerms {
    fn view(&self) -> TermView<'_> {
        TermView {
            masks: self.masks.as_slice(),
            offsets: self.offsets.as_slice(),
            imag_offsets: self.imag_offsets.as_slice(),
            signs: self.signs.as_slice(),
            weights: self.weights.as_slice(),
        }
    }
}

/// Shell Context whose engines run on the device
pub struct DeviceContext<'a, L, R, C> {
    host: ShellContext<'a, L, R, C>,
    grid: Grid,
    terms: DeviceTerms,
    x_local: DeviceBuffer<Complex64>,
    x_all: DeviceBuffer<Complex64>,
    y: DeviceBuffer<Complex64>,
    maxs: DeviceBuffer<f64>,
}

impl<'a, L, R, C> DeviceContext<'a, L, R, C>
where
    L: Subspace,
    R: Subspace,
    C: Communicator,
{
    /// Build the host context and mirror it to the device (collective)
    pub fn new(
        table: &'a TermTable,
        left: &'a L,
        right: &'a R,
        comm: &'a C,
        config: ShellConfig,
    ) -> Result<Self> {
        Self::from_host(ShellContext::new(table, left, right, comm, config)?)
    }

    /// Mirror an existing host context to the device
    pub fn from_host(host: ShellContext<'a, L, R, C>) -> Result<Self> {
        let (block_num, block_size) = host.config.grid(host.row_layout.local_len());
        let grid = Grid::new(block_num, block_size);

        let buffers = &host.terms;
        let terms = DeviceTerms {
            masks: DeviceBuffer::from_host(&buffers.masks)?,
            offsets: DeviceBuffer::from_host(&buffers.offsets)?,
            imag_offsets: DeviceBuffer::from_host(&buffers.imag_offsets)?,
            signs: DeviceBuffer::from_host(&buffers.signs)?,
            weights: DeviceBuffer::from_host(&buffers.weights)?,
            local_groups: DeviceBuffer::from_host(&host.local_groups)?,
            global_groups: DeviceBuffer::from_host(&host.global_groups)?,
        };
        let x_local = DeviceBuffer::alloc_zeroed(host.col_layout.local_len())?;
        let x_all = DeviceBuffer::alloc_zeroed(host.x_all.len())?;
        let y = DeviceBuffer::alloc_zeroed(host.row_layout.local_len())?;
        let maxs = DeviceBuffer::alloc_zeroed(grid.block_num)?;

        debug!(
            block_num = grid.block_num,
            block_size = grid.block_size,
            device_bytes = terms.masks.size_bytes()
                + terms.offsets.size_bytes()
                + terms.imag_offsets.size_bytes()
                + terms.signs.size_bytes()
                + terms.weights.size_bytes()
                + x_local.size_bytes()
                + x_all.size_bytes()
                + y.size_bytes(),
            "mirrored shell context to device"
        );

        Ok(Self {
            host,
            grid,
            terms,
            x_local,
            x_all,
            y,
            maxs,
        })
    }

    /// Host-side context
    pub fn host(&self) -> &ShellContext<'a, L, R, C> {
        &self.host
    }

    /// Launch shape used by both kernels
    pub fn grid(&self) -> Grid {
        self.grid
    }

    /// Layout of output vectors
    pub fn row_layout(&self) -> &Layout {
        self.host.row_layout()
    }

    /// Layout of input vectors
    pub fn col_layout(&self) -> &Layout {
        self.host.col_layout()
    }

    /// `y = A x` on the device (collective when the context needs a gather)
    pub fn mat_mult(&mut self, x: &DistVector, y: &mut DistVector) -> Result<()> {
        self.host.check_vectors(x, y)?;
        trace!(
            rows = self.host.row_layout.local_len(),
            global_phase = self.host.needs_gather,
            "device matmult"
        );

        self.x_local.upload(x.local())?;
        self.y.fill_zeroed();

        let view = self.terms.view();
        let left = self.host.left;
        let right = self.host.right;
        let row_start = self.host.row_layout.start();
        let col_start = self.host.col_layout.start();

        let local_groups = self.terms.local_groups.as_slice();
        let x_local = self.x_local.as_slice();
        self.grid
            .launch_rows(self.y.as_mut_slice(), local_groups.len(), |i, item| {
                let state = left.index_to_state(row_start + i);
                view.group_contribution(local_groups[item], state, x_local, col_start, right)
            });

        if self.host.needs_gather {
            self.host
                .comm
                .all_gather(x.local(), &mut self.host.x_all)
                .inspect_err(|e| error!(error = %e, "input gather failed"))?;
            self.x_all.upload(&self.host.x_all)?;

            let global_groups = self.terms.global_groups.as_slice();
            let x_all = self.x_all.as_slice();
            self.grid
                .launch_rows(self.y.as_mut_slice(), global_groups.len(), |i, item| {
                    let state = left.index_to_state(row_start + i);
                    view.group_contribution(global_groups[item], state, x_all, 0, right)
                });
        }

        self.y.download(y.local_mut())
    }

    /// Induced infinity norm computed by the norm kernel (collective on first call)
    pub fn norm(&mut self, norm_type: NormType) -> Result<f64> {
        norm_type.require_infinity()?;
        if let Some(nrm) = self.host.nrm {
            return Ok(nrm);
        }
        trace!("device norm");

        let view = self.terms.view();
        let left = self.host.left;
        let right = self.host.right;
        let row_start = self.host.row_layout.start();
        let rows = self.host.row_layout.local_len();

        self.grid
            .launch_block_max(self.maxs.as_mut_slice(), rows, view.masks.len(), |i, g| {
                let state = left.index_to_state(row_start + i);
                view.row_abs_sum(state, &[g], right)
            });

        let mut maxs = vec![0.0; self.maxs.len()];
        self.maxs.download(&mut maxs)?;
        let local = maxs.into_iter().fold(0.0, f64::max);
        let nrm = self.host.comm.all_reduce_max(local)?;
        self.host.nrm = Some(nrm);
        Ok(nrm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::SelfComm;
    use qshell_core::{Full, PauliTerm, SpinConserve};

    fn c(re: f64) -> Complex64 {
        Complex64::new(re, 0.0)
    }

    #[test]
    fn test_device_matches_dense_reference() {
        let table = TermTable::from_paulis(
            4,
            [
                PauliTerm::parse("XXII", c(1.0)).unwrap(),
                PauliTerm::parse("YYII", c(1.0)).unwrap(),
                PauliTerm::parse("IZZI", c(0.5)).unwrap(),
                PauliTerm::parse("IIXY", c(-0.25)).unwrap(),
                PauliTerm::parse("IIYX", c(0.25)).unwrap(),
            ],
        )
        .unwrap();
        let sc = SpinConserve::new(4, 2).unwrap();
        let config = ShellConfig::device().with_grid(2, 3);
        let mut ctx = DeviceContext::new(&table, &sc, &sc, &SelfComm, config).unwrap();

        let dim = sc.dimension();
        let values: Vec<_> = (0..dim).map(|i| Complex64::new(i as f64 + 1.0, 0.5)).collect();
        let x = DistVector::from_local(*ctx.col_layout(), values.clone()).unwrap();
        let mut y = DistVector::zeros(*ctx.row_layout()).unwrap();
        ctx.mat_mult(&x, &mut y).unwrap();

        let dense = table.to_dense(&sc, &sc).unwrap();
        for row in 0..dim {
            let expected: Complex64 = (0..dim).map(|col| dense[row * dim + col] * values[col]).sum();
            assert!((y.local()[row] - expected).norm() < 1e-12);
        }
    }

    #[test]
    fn test_device_norm_cached() {
        let table = TermTable::from_paulis(
            2,
            [
                PauliTerm::parse("XI", c(1.0)).unwrap(),
                PauliTerm::parse("ZZ", c(-2.0)).unwrap(),
            ],
        )
        .unwrap();
        let full = Full::new(2).unwrap();
        let mut ctx = DeviceContext::new(&table, &full, &full, &SelfComm, ShellConfig::device()).unwrap();
        assert_eq!(ctx.norm(NormType::Infinity).unwrap(), 3.0);
        assert_eq!(ctx.norm(NormType::Infinity).unwrap(), 3.0);
        assert!(ctx.norm(NormType::Frobenius).is_err());
    }
}
