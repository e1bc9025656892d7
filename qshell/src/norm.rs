//! Norm engine
//!
//! The only supported norm is the induced infinity norm, the largest
//! absolute row sum. It is an upper bound on the spectral norm. The value
//! is computed once per context and cached.

use qshell_core::{QshellError, Result, Subspace};
use tracing::trace;

use crate::comm::Communicator;
use crate::context::ShellContext;

/// Matrix norm selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NormType {
    One,
    Frobenius,
    Infinity,
}

impl NormType {
    /// Fail with [`QshellError::UnsupportedNorm`] unless this is [`NormType::Infinity`]
    pub fn require_infinity(self) -> Result<()> {
        match self {
            NormType::Infinity => Ok(()),
            NormType::One | NormType::Frobenius => Err(QshellError::UnsupportedNorm),
        }
    }
}

impl<L, R, C> ShellContext<'_, L, R, C>
where
    L: Subspace,
    R: Subspace,
    C: Communicator,
{
    /// Induced infinity norm of the operator (collective on first call)
    pub fn norm(&mut self, norm_type: NormType) -> Result<f64> {
        norm_type.require_infinity()?;
        if let Some(nrm) = self.nrm {
            return Ok(nrm);
        }
        trace!(rows = self.row_layout.local_len(), "cpu norm");
        let nrm = self.comm.all_reduce_max(self.local_row_max())?;
        self.nrm = Some(nrm);
        Ok(nrm)
    }
}
