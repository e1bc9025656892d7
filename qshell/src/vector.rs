//! Row-partitioned distributed vectors

use std::ops::Range;

use num_complex::Complex64;
use qshell_core::validation::validate_row_range;
use qshell_core::{QshellError, Result};

use crate::comm::Communicator;

/// Ownership of a contiguous row range of a vector of global length `global`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Layout {
    global: usize,
    start: usize,
    end: usize,
}

impl Layout {
    /// Default split: `global / size` rows each, the first `global % size` workers take one extra
    pub fn split(global: usize, rank: usize, size: usize) -> Self {
        let size = size.max(1);
        let base = global / size;
        let extra = global % size;
        let start = rank * base + rank.min(extra);
        let len = base + usize::from(rank < extra);
        Self {
            global,
            start,
            end: start + len,
        }
    }

    /// Default split for this worker of `comm`
    pub fn for_comm<C: Communicator>(global: usize, comm: &C) -> Self {
        Self::split(global, comm.rank(), comm.size())
    }

    /// Explicit ownership range
    pub fn from_range(global: usize, start: usize, end: usize) -> Result<Self> {
        validate_row_range(start, end, global)?;
        Ok(Self { global, start, end })
    }

    /// Global vector length
    pub fn global_len(&self) -> usize {
        self.global
    }

    /// First owned row
    pub fn start(&self) -> usize {
        self.start
    }

    /// One past the last owned row
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of owned rows
    pub fn local_len(&self) -> usize {
        self.end - self.start
    }

    /// Owned rows as a range
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Whether `row` is owned
    pub fn contains(&self, row: usize) -> bool {
        row >= self.start && row < self.end
    }
}

/// Allocate a zeroed amplitude buffer, reporting exhaustion as an error
pub(crate) fn try_zeroed(len: usize) -> Result<Vec<Complex64>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| QshellError::AllocationFailed)?;
    buf.resize(len, Complex64::new(0.0, 0.0));
    Ok(buf)
}

/// The locally owned slice of a distributed complex vector
#[derive(Debug, Clone, PartialEq)]
pub struct DistVector {
    layout: Layout,
    local: Vec<Complex64>,
}

impl DistVector {
    /// Zero vector with the given layout
    pub fn zeros(layout: Layout) -> Result<Self> {
        Ok(Self {
            layout,
            local: try_zeroed(layout.local_len())?,
        })
    }

    /// Wrap owned local values
    pub fn from_local(layout: Layout, local: Vec<Complex64>) -> Result<Self> {
        if local.len() != layout.local_len() {
            return Err(QshellError::DimensionMismatch);
        }
        Ok(Self { layout, local })
    }

    /// Take the owned range out of a replicated full vector
    pub fn from_global(layout: Layout, global: &[Complex64]) -> Result<Self> {
        if global.len() != layout.global_len() {
            return Err(QshellError::DimensionMismatch);
        }
        Ok(Self {
            layout,
            local: global[layout.range()].to_vec(),
        })
    }

    /// Ownership layout
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Owned values
    pub fn local(&self) -> &[Complex64] {
        &self.local
    }

    /// Owned values, mutably
    pub fn local_mut(&mut self) -> &mut [Complex64] {
        &mut self.local
    }

    /// Consume and return the owned values
    pub fn into_local(self) -> Vec<Complex64> {
        self.local
    }

    /// Replicate the full vector on every worker (collective)
    pub fn gather_all<C: Communicator>(&self, comm: &C) -> Result<Vec<Complex64>> {
        let mut global = try_zeroed(self.layout.global_len())?;
        comm.all_gather(&self.local, &mut global)?;
        Ok(global)
    }

    /// `<self|other>`, conjugating `self` (collective)
    pub fn dot<C: Communicator>(&self, other: &DistVector, comm: &C) -> Result<Complex64> {
        if self.layout != other.layout {
            return Err(QshellError::LayoutMismatch);
        }
        let local: Complex64 = self
            .local
            .iter()
            .zip(&other.local)
            .map(|(a, b)| a.conj() * b)
            .sum();
        comm.all_reduce_sum(local)
    }

    /// Euclidean norm (collective)
    pub fn norm<C: Communicator>(&self, comm: &C) -> Result<f64> {
        let local: f64 = self.local.iter().map(|a| a.norm_sqr()).sum();
        Ok(comm.all_reduce_sum(Complex64::new(local, 0.0))?.re.sqrt())
    }

    /// Rescale to unit norm, returning the previous norm (collective)
    ///
    /// A zero vector is left unchanged.
    pub fn normalize<C: Communicator>(&mut self, comm: &C) -> Result<f64> {
        let norm = self.norm(comm)?;
        if norm > 0.0 {
            self.scale(Complex64::new(1.0 / norm, 0.0));
        }
        Ok(norm)
    }

    /// Multiply every entry by `alpha`
    pub fn scale(&mut self, alpha: Complex64) {
        for a in &mut self.local {
            *a *= alpha;
        }
    }

    /// `self += alpha * x`
    pub fn axpy(&mut self, alpha: Complex64, x: &DistVector) -> Result<()> {
        if self.layout != x.layout {
            return Err(QshellError::LayoutMismatch);
        }
        for (a, b) in self.local.iter_mut().zip(&x.local) {
            *a += alpha * b;
        }
        Ok(())
    }
}
