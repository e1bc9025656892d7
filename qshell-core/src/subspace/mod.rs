//! Subspace variants and the tagged descriptor used for dispatch
//!
//! Four variants restrict computation to a symmetry-reduced basis:
//!
//! - [`Full`]: every `N`-bit state, index equals state
//! - [`Parity`]: states with a fixed parity of set bits
//! - [`SpinConserve`]: states with a fixed Hamming weight
//! - [`Explicit`]: a caller-supplied ordered list of states

pub mod explicit;
pub mod full;
pub mod parity;
pub mod spin_conserve;

pub use explicit::Explicit;
pub use full::Full;
pub use parity::{Parity, ParitySector};
pub use spin_conserve::{binomial, SpinConserve};

use crate::traits::Subspace;
use crate::{QshellError, Result};

/// Variant tag of a subspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum SubspaceKind {
    Full = 0,
    Parity = 1,
    SpinConserve = 2,
    Explicit = 3,
}

impl SubspaceKind {
    /// All variants, in tag order
    pub const ALL: [SubspaceKind; 4] = [
        SubspaceKind::Full,
        SubspaceKind::Parity,
        SubspaceKind::SpinConserve,
        SubspaceKind::Explicit,
    ];

    /// Convert an integer tag to a variant
    pub const fn from_tag(tag: i64) -> Result<Self> {
        match tag {
            0 => Ok(SubspaceKind::Full),
            1 => Ok(SubspaceKind::Parity),
            2 => Ok(SubspaceKind::SpinConserve),
            3 => Ok(SubspaceKind::Explicit),
            _ => Err(QshellError::InvalidSubspaceType),
        }
    }

    /// Integer tag of this variant
    pub const fn tag(self) -> i64 {
        self as i64
    }

    /// Human-readable name
    pub const fn name(self) -> &'static str {
        match self {
            SubspaceKind::Full => "Full",
            SubspaceKind::Parity => "Parity",
            SubspaceKind::SpinConserve => "SpinConserve",
            SubspaceKind::Explicit => "Explicit",
        }
    }
}

impl TryFrom<i64> for SubspaceKind {
    type Error = QshellError;

    fn try_from(tag: i64) -> Result<Self> {
        Self::from_tag(tag)
    }
}

impl core::fmt::Display for SubspaceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// A subspace descriptor of any variant
///
/// Engines resolve the variant once and then run a loop monomorphized on
/// the concrete type; the trait implementation here is for cold paths.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AnySubspace {
    Full(Full),
    Parity(Parity),
    SpinConserve(SpinConserve),
    Explicit(Explicit),
}

impl AnySubspace {
    /// Fail with [`QshellError::SubspaceMismatch`] unless this descriptor is of `kind`
    pub fn expect_kind(&self, kind: SubspaceKind) -> Result<&Self> {
        if self.kind() != kind {
            return Err(QshellError::SubspaceMismatch);
        }
        Ok(self)
    }
}

impl Subspace for AnySubspace {
    fn kind(&self) -> SubspaceKind {
        match self {
            AnySubspace::Full(_) => SubspaceKind::Full,
            AnySubspace::Parity(_) => SubspaceKind::Parity,
            AnySubspace::SpinConserve(_) => SubspaceKind::SpinConserve,
            AnySubspace::Explicit(_) => SubspaceKind::Explicit,
        }
    }

    fn spins(&self) -> usize {
        match self {
            AnySubspace::Full(s) => s.spins(),
            AnySubspace::Parity(s) => s.spins(),
            AnySubspace::SpinConserve(s) => s.spins(),
            AnySubspace::Explicit(s) => s.spins(),
        }
    }

    fn dimension(&self) -> usize {
        match self {
            AnySubspace::Full(s) => s.dimension(),
            AnySubspace::Parity(s) => s.dimension(),
            AnySubspace::SpinConserve(s) => s.dimension(),
            AnySubspace::Explicit(s) => s.dimension(),
        }
    }

    fn state_to_index(&self, state: u64) -> Option<usize> {
        match self {
            AnySubspace::Full(s) => s.state_to_index(state),
            AnySubspace::Parity(s) => s.state_to_index(state),
            AnySubspace::SpinConserve(s) => s.state_to_index(state),
            AnySubspace::Explicit(s) => s.state_to_index(state),
        }
    }

    fn index_to_state(&self, index: usize) -> u64 {
        match self {
            AnySubspace::Full(s) => s.index_to_state(index),
            AnySubspace::Parity(s) => s.index_to_state(index),
            AnySubspace::SpinConserve(s) => s.index_to_state(index),
            AnySubspace::Explicit(s) => s.index_to_state(index),
        }
    }
}

impl From<Full> for AnySubspace {
    fn from(s: Full) -> Self {
        AnySubspace::Full(s)
    }
}

impl From<Parity> for AnySubspace {
    fn from(s: Parity) -> Self {
        AnySubspace::Parity(s)
    }
}

impl From<SpinConserve> for AnySubspace {
    fn from(s: SpinConserve) -> Self {
        AnySubspace::SpinConserve(s)
    }
}

impl From<Explicit> for AnySubspace {
    fn from(s: Explicit) -> Self {
        AnySubspace::Explicit(s)
    }
}
