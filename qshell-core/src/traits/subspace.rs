//! Index mapping between full basis states and a reduced basis
//!
//! This module defines the interface every subspace variant satisfies.
//! Engines are generic over it so each (left, right) pairing is
//! monomorphized and the hot loops carry no variant branching.

use crate::subspace::SubspaceKind;

/// A subset of the `2^N` basis states with a bijection onto `0..dimension()`
///
/// For every `s` in the subspace, `index_to_state(state_to_index(s)?) == s`.
/// For every `s` outside it, `state_to_index(s)` is `None`.
pub trait Subspace: Send + Sync {
    /// Variant tag of this subspace
    fn kind(&self) -> SubspaceKind;

    /// Number of spins `N` in the chain
    fn spins(&self) -> usize;

    /// Number of basis states in the subspace
    fn dimension(&self) -> usize;

    /// Map a basis state to its reduced index, `None` if outside the subspace
    fn state_to_index(&self, state: u64) -> Option<usize>;

    /// Map a reduced index back to its basis state
    ///
    /// `index` must be below [`Subspace::dimension`].
    fn index_to_state(&self, index: usize) -> u64;

    /// Whether a basis state belongs to the subspace
    fn contains(&self, state: u64) -> bool {
        self.state_to_index(state).is_some()
    }

    /// Iterate over the basis states in index order
    fn states(&self) -> States<'_, Self>
    where
        Self: Sized,
    {
        States {
            subspace: self,
            next: 0,
            end: self.dimension(),
        }
    }
}

/// Iterator over the basis states of a subspace in index order
pub struct States<'a, S> {
    subspace: &'a S,
    next: usize,
    end: usize,
}

impl<S: Subspace> Iterator for States<'_, S> {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let state = self.subspace.index_to_state(self.next);
        self.next += 1;
        Some(state)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.end - self.next;
        (len, Some(len))
    }
}

impl<S: Subspace> ExactSizeIterator for States<'_, S> {}
