//! Error types for qshell operations

/// Errors that can occur while building or applying shell operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QshellError {
    /// A buffer could not be allocated
    AllocationFailed,
    /// A collective exchange between workers failed
    CommunicationFailed,
    /// Device allocation, copy or launch failed
    DeviceFailure,
    /// Subspace type tag is not one of the recognized variants
    InvalidSubspaceType,
    /// Subspace descriptor does not match the requested variant or pairing
    SubspaceMismatch,
    /// Requested norm type is not supported
    UnsupportedNorm,
    /// Vector or buffer length does not match the operator dimension
    DimensionMismatch,
    /// Distributed layouts of two vectors disagree
    LayoutMismatch,
    /// Qubit position out of range or repeated
    InvalidQubit,
    /// Spin count is zero or too large for the state representation
    InvalidSpinCount,
    /// Basis state is outside the subspace or otherwise malformed
    InvalidState,
    /// Term acts outside the spin chain
    InvalidTerm,
    /// Term coefficient is not purely real or purely imaginary after phase resolution
    NonHermitianTerm,
    /// Range bounds are inverted or exceed the total size
    InvalidRange,
    /// Text could not be parsed
    ParseError,
}

/// Coarse classification used by callers to decide whether to abort collectively
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Resource or transport failure; all cooperating workers must abort
    Fatal,
    /// Caller bug; only the failing call is aborted
    ContractViolation,
}

impl QshellError {
    /// Classify this error
    pub const fn category(&self) -> ErrorCategory {
        match self {
            QshellError::AllocationFailed
            | QshellError::CommunicationFailed
            | QshellError::DeviceFailure => ErrorCategory::Fatal,
            _ => ErrorCategory::ContractViolation,
        }
    }

    /// Whether this error must abort the current collective operation
    pub const fn is_fatal(&self) -> bool {
        matches!(self.category(), ErrorCategory::Fatal)
    }
}

impl core::fmt::Display for QshellError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            QshellError::AllocationFailed => "Buffer allocation failed",
            QshellError::CommunicationFailed => "Collective communication failed",
            QshellError::DeviceFailure => "Device operation failed",
            QshellError::InvalidSubspaceType => "Invalid subspace type",
            QshellError::SubspaceMismatch => "Subspace descriptor does not match requested type",
            QshellError::UnsupportedNorm => "Unsupported norm type",
            QshellError::DimensionMismatch => "Dimension mismatch",
            QshellError::LayoutMismatch => "Distributed layout mismatch",
            QshellError::InvalidQubit => "Invalid qubit index",
            QshellError::InvalidSpinCount => "Invalid spin count",
            QshellError::InvalidState => "Invalid basis state",
            QshellError::InvalidTerm => "Term acts outside the spin chain",
            QshellError::NonHermitianTerm => "Term coefficient has the wrong phase",
            QshellError::InvalidRange => "Invalid range",
            QshellError::ParseError => "Parse error",
        };
        write!(f, "{msg}")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for QshellError {}

/// Result type for qshell operations
pub type Result<T> = core::result::Result<T, QshellError>;
