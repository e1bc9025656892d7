#![no_std]

//! qshell core - Pauli-sum term encoding and subspace definitions
//!
//! This crate provides the data model shared by every engine in `qshell`:
//! the mask/sign/coefficient term table, the subspace index mappings, and
//! the validation helpers they rely on. Nothing here performs I/O or
//! spawns threads.

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod error;
pub mod subspace;
pub mod term;
pub mod traits;
pub mod validation;

pub use error::*;
pub use subspace::{
    AnySubspace, Explicit, Full, Parity, ParitySector, SpinConserve, SubspaceKind,
};
pub use term::{parity_sign, Pauli, PauliTerm, Term, TermList, TermTable};
pub use traits::{States, Subspace};
pub use validation::{parse_pauli_string, parse_product_state, validate_keep, MAX_SPINS};

pub use num_complex::Complex64;
