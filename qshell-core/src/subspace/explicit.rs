//! Caller-enumerated basis with hashed reverse lookup

use alloc::vec::Vec;

use hashbrown::HashMap;

use super::SubspaceKind;
use crate::traits::Subspace;
use crate::validation::{state_limit, validate_spin_count, validate_state};
use crate::{QshellError, Result};

/// An arbitrary ordered set of basis states
///
/// Index `i` is the `i`-th state of the list. The reverse map is rebuilt
/// from the list whenever the subspace is constructed or deserialized.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "ExplicitStates", into = "ExplicitStates")
)]
pub struct Explicit {
    spins: usize,
    states: Vec<u64>,
    lookup: HashMap<u64, usize>,
}

/// Serialized form of [`Explicit`]
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExplicitStates {
    pub spins: usize,
    pub states: Vec<u64>,
}

impl Explicit {
    /// Create from an ordered list of distinct states
    pub fn new(spins: usize, states: Vec<u64>) -> Result<Self> {
        validate_spin_count(spins)?;

        let mut lookup = HashMap::with_capacity(states.len());
        for (i, &s) in states.iter().enumerate() {
            validate_state(s, spins)?;
            if lookup.insert(s, i).is_some() {
                return Err(QshellError::InvalidState);
            }
        }

        Ok(Self {
            spins,
            states,
            lookup,
        })
    }

    /// Create from every state of the full space accepted by `keep`, in increasing order
    pub fn from_predicate<F>(spins: usize, keep: F) -> Result<Self>
    where
        F: Fn(u64) -> bool,
    {
        validate_spin_count(spins)?;
        let states = (0..state_limit(spins)).filter(|&s| keep(s)).collect();
        Self::new(spins, states)
    }

    /// The ordered state list
    pub fn as_slice(&self) -> &[u64] {
        &self.states
    }
}

impl PartialEq for Explicit {
    fn eq(&self, other: &Self) -> bool {
        self.spins == other.spins && self.states == other.states
    }
}

impl TryFrom<ExplicitStates> for Explicit {
    type Error = QshellError;

    fn try_from(value: ExplicitStates) -> Result<Self> {
        Self::new(value.spins, value.states)
    }
}

impl From<Explicit> for ExplicitStates {
    fn from(value: Explicit) -> Self {
        Self {
            spins: value.spins,
            states: value.states,
        }
    }
}

impl Subspace for Explicit {
    fn kind(&self) -> SubspaceKind {
        SubspaceKind::Explicit
    }

    fn spins(&self) -> usize {
        self.spins
    }

    fn dimension(&self) -> usize {
        self.states.len()
    }

    #[inline]
    fn state_to_index(&self, state: u64) -> Option<usize> {
        self.lookup.get(&state).copied()
    }

    #[inline]
    fn index_to_state(&self, index: usize) -> u64 {
        self.states[index]
    }
}
