//! Dispatch over (left, right) subspace pairs and backends
//!
//! The variant of each descriptor is resolved once here. Every one of the
//! 16 pairings and both backends then runs engine code monomorphized on the
//! concrete subspace types, behind a single object-safe interface.

use qshell_core::{AnySubspace, Result, Subspace, SubspaceKind, TermTable};
use tracing::debug;

use crate::comm::Communicator;
use crate::config::{Backend, ShellConfig};
use crate::context::ShellContext;
use crate::device::DeviceContext;
use crate::norm::NormType;
use crate::vector::{DistVector, Layout};

/// A built, storage-free operator
pub trait ShellOperator {
    /// `y = A x` (collective)
    fn mult(&mut self, x: &DistVector, y: &mut DistVector) -> Result<()>;

    /// Norm of the operator, only [`NormType::Infinity`] is supported
    fn norm(&mut self, norm_type: NormType) -> Result<f64>;

    /// Layout of output vectors
    fn row_layout(&self) -> &Layout;

    /// Layout of input vectors
    fn col_layout(&self) -> &Layout;

    /// Variants of the (left, right) subspaces
    fn kinds(&self) -> (SubspaceKind, SubspaceKind);

    /// Engine that applies the operator
    fn backend(&self) -> Backend;
}

impl<L, R, C> ShellOperator for ShellContext<'_, L, R, C>
where
    L: Subspace,
    R: Subspace,
    C: Communicator,
{
    fn mult(&mut self, x: &DistVector, y: &mut DistVector) -> Result<()> {
        self.mat_mult(x, y)
    }

    fn norm(&mut self, norm_type: NormType) -> Result<f64> {
        ShellContext::norm(self, norm_type)
    }

    fn row_layout(&self) -> &Layout {
        ShellContext::row_layout(self)
    }

    fn col_layout(&self) -> &Layout {
        ShellContext::col_layout(self)
    }

    fn kinds(&self) -> (SubspaceKind, SubspaceKind) {
        (self.left.kind(), self.right.kind())
    }

    fn backend(&self) -> Backend {
        Backend::Cpu
    }
}

impl<L, R, C> ShellOperator for DeviceContext<'_, L, R, C>
where
    L: Subspace,
    R: Subspace,
    C: Communicator,
{
    fn mult(&mut self, x: &DistVector, y: &mut DistVector) -> Result<()> {
        self.mat_mult(x, y)
    }

    fn norm(&mut self, norm_type: NormType) -> Result<f64> {
        DeviceContext::norm(self, norm_type)
    }

    fn row_layout(&self) -> &Layout {
        DeviceContext::row_layout(self)
    }

    fn col_layout(&self) -> &Layout {
        DeviceContext::col_layout(self)
    }

    fn kinds(&self) -> (SubspaceKind, SubspaceKind) {
        (self.host().left().kind(), self.host().right().kind())
    }

    fn backend(&self) -> Backend {
        Backend::Device
    }
}

fn build_pair<'a, L, R, C>(
    table: &'a TermTable,
    left: &'a L,
    right: &'a R,
    comm: &'a C,
    config: ShellConfig,
) -> Result<Box<dyn ShellOperator + 'a>>
where
    L: Subspace,
    R: Subspace,
    C: Communicator,
{
    let backend = config.backend;
    let host = ShellContext::new(table, left, right, comm, config)?;
    Ok(match backend {
        Backend::Cpu => Box::new(host),
        Backend::Device => Box::new(DeviceContext::from_host(host)?),
    })
}

fn build_with_left<'a, L, C>(
    table: &'a TermTable,
    left: &'a L,
    right: &'a AnySubspace,
    comm: &'a C,
    config: ShellConfig,
) -> Result<Box<dyn ShellOperator + 'a>>
where
    L: Subspace,
    C: Communicator,
{
    match right {
        AnySubspace::Full(r) => build_pair(table, left, r, comm, config),
        AnySubspace::Parity(r) => build_pair(table, left, r, comm, config),
        AnySubspace::SpinConserve(r) => build_pair(table, left, r, comm, config),
        AnySubspace::Explicit(r) => build_pair(table, left, r, comm, config),
    }
}

/// Build the specialized operator for a subspace pair (collective)
pub fn build_operator<'a, C: Communicator>(
    table: &'a TermTable,
    left: &'a AnySubspace,
    right: &'a AnySubspace,
    comm: &'a C,
    config: ShellConfig,
) -> Result<Box<dyn ShellOperator + 'a>> {
    debug!(
        left = %left.kind(),
        right = %right.kind(),
        backend = config.backend.name(),
        "dispatching shell operator"
    );
    match left {
        AnySubspace::Full(l) => build_with_left(table, l, right, comm, config),
        AnySubspace::Parity(l) => build_with_left(table, l, right, comm, config),
        AnySubspace::SpinConserve(l) => build_with_left(table, l, right, comm, config),
        AnySubspace::Explicit(l) => build_with_left(table, l, right, comm, config),
    }
}

/// Build from raw subspace tags, checking each against its descriptor (collective)
///
/// Fails with [`qshell_core::QshellError::InvalidSubspaceType`] for an
/// unknown tag and [`qshell_core::QshellError::SubspaceMismatch`] if a tag
/// disagrees with its descriptor.
pub fn build_operator_tagged<'a, C: Communicator>(
    table: &'a TermTable,
    left_type: i64,
    left: &'a AnySubspace,
    right_type: i64,
    right: &'a AnySubspace,
    comm: &'a C,
    config: ShellConfig,
) -> Result<Box<dyn ShellOperator + 'a>> {
    let left = left.expect_kind(SubspaceKind::from_tag(left_type)?)?;
    let right = right.expect_kind(SubspaceKind::from_tag(right_type)?)?;
    build_operator(table, left, right, comm, config)
}

/// Storage-free matrix backed by a dispatched Shell Context
///
/// Dropping the matrix, or calling [`ShellMatrix::destroy`], releases every
/// buffer the context owns.
pub struct ShellMatrix<'a> {
    op: Box<dyn ShellOperator + 'a>,
}

impl<'a> ShellMatrix<'a> {
    /// Dispatch and build (collective)
    pub fn new<C: Communicator>(
        table: &'a TermTable,
        left: &'a AnySubspace,
        right: &'a AnySubspace,
        comm: &'a C,
        config: ShellConfig,
    ) -> Result<Self> {
        Ok(Self {
            op: build_operator(table, left, right, comm, config)?,
        })
    }

    /// Dispatch on raw subspace tags and build (collective)
    pub fn with_tags<C: Communicator>(
        table: &'a TermTable,
        left_type: i64,
        left: &'a AnySubspace,
        right_type: i64,
        right: &'a AnySubspace,
        comm: &'a C,
        config: ShellConfig,
    ) -> Result<Self> {
        Ok(Self {
            op: build_operator_tagged(table, left_type, left, right_type, right, comm, config)?,
        })
    }

    /// `y = A x` (collective)
    pub fn mult(&mut self, x: &DistVector, y: &mut DistVector) -> Result<()> {
        self.op.mult(x, y)
    }

    /// `A x` into a freshly allocated vector (collective)
    pub fn apply(&mut self, x: &DistVector) -> Result<DistVector> {
        let mut y = DistVector::zeros(*self.op.row_layout())?;
        self.op.mult(x, &mut y)?;
        Ok(y)
    }

    /// Infinity-norm bound (collective on first call)
    pub fn norm(&mut self, norm_type: NormType) -> Result<f64> {
        self.op.norm(norm_type)
    }

    /// Global `(rows, cols)`
    pub fn dims(&self) -> (usize, usize) {
        (
            self.op.row_layout().global_len(),
            self.op.col_layout().global_len(),
        )
    }

    /// Owned output row range
    pub fn local_rows(&self) -> core::ops::Range<usize> {
        self.op.row_layout().range()
    }

    /// Layout of output vectors
    pub fn row_layout(&self) -> &Layout {
        self.op.row_layout()
    }

    /// Layout of input vectors
    pub fn col_layout(&self) -> &Layout {
        self.op.col_layout()
    }

    /// Zeroed `(input, output)` vectors matching the matrix layouts
    pub fn create_vecs(&self) -> Result<(DistVector, DistVector)> {
        Ok((
            DistVector::zeros(*self.op.col_layout())?,
            DistVector::zeros(*self.op.row_layout())?,
        ))
    }

    /// Subspace variants of the (left, right) pair
    pub fn kinds(&self) -> (SubspaceKind, SubspaceKind) {
        self.op.kinds()
    }

    /// Engine applying the operator
    pub fn backend(&self) -> Backend {
        self.op.backend()
    }

    /// Release the context and its buffers
    pub fn destroy(self) {
        drop(self.op);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::SelfComm;
    use num_complex::Complex64;
    use qshell_core::{Explicit, Full, Parity, ParitySector, PauliTerm, QshellError, SpinConserve};

    #[test]
    fn test_all_pairs_dispatch_to_matching_kinds() {
        let table = TermTable::from_paulis(3, [PauliTerm::parse("ZII", Complex64::new(1.0, 0.0)).unwrap()]).unwrap();
        let subspaces: Vec<AnySubspace> = vec![
            Full::new(3).unwrap().into(),
            Parity::new(3, ParitySector::Even).unwrap().into(),
            SpinConserve::new(3, 1).unwrap().into(),
            Explicit::new(3, vec![5, 0, 3]).unwrap().into(),
        ];
        for backend in [Backend::Cpu, Backend::Device] {
            for left in &subspaces {
                for right in &subspaces {
                    let config = ShellConfig::default().with_backend(backend);
                    let matrix = ShellMatrix::new(&table, left, right, &SelfComm, config).unwrap();
                    assert_eq!(matrix.kinds(), (left.kind(), right.kind()));
                    assert_eq!(matrix.backend(), backend);
                    assert_eq!(matrix.dims(), (left.dimension(), right.dimension()));
                    matrix.destroy();
                }
            }
        }
    }

    #[test]
    fn test_tagged_dispatch_errors() {
        let table = TermTable::new(2, vec![]).unwrap();
        let full: AnySubspace = Full::new(2).unwrap().into();
        let err = |l, r| {
            ShellMatrix::with_tags(&table, l, &full, r, &full, &SelfComm, ShellConfig::cpu())
                .err()
        };
        assert_eq!(err(4, 0), Some(QshellError::InvalidSubspaceType));
        assert_eq!(err(0, -1), Some(QshellError::InvalidSubspaceType));
        assert_eq!(err(0, 2), Some(QshellError::SubspaceMismatch));
        assert_eq!(err(0, 0), None);
    }
}
