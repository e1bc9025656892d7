//! qshell - Matrix-free Pauli-sum operators on symmetry-reduced subspaces
//!
//! This library applies quantum many-body operators written as sums of
//! Pauli strings to state vectors without ever storing matrix entries. A
//! term is three words (flip mask, sign mask, coefficient) and every matrix
//! element is recomputed from them on demand.
//!
//! ## Architecture
//!
//! qshell separates definitions from implementation:
//!
//! - **qshell-core**: term encoding, subspace mappings and validation (no threads, no I/O)
//! - **qshell**: distributed vectors, Shell Contexts, the CPU and device engines,
//!   norms, reduced density matrices and dispatch
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use qshell::{
//!     AnySubspace, Complex64, DistVector, NormType, PauliTerm, SelfComm, ShellConfig,
//!     ShellMatrix, SpinConserve, TermTable,
//! };
//!
//! fn example() -> qshell::Result<()> {
//!     // XX + YY + ZZ on the first bond of a 4-spin chain
//!     let table = TermTable::from_paulis(
//!         4,
//!         ["XXII", "YYII", "ZZII"]
//!             .into_iter()
//!             .map(|p| PauliTerm::parse(p, Complex64::new(1.0, 0.0)))
//!             .collect::<qshell::Result<Vec<_>>>()?,
//!     )?;
//!     let sector: AnySubspace = SpinConserve::new(4, 2)?.into();
//!
//!     let comm = SelfComm;
//!     let mut matrix = ShellMatrix::new(&table, &sector, &sector, &comm, ShellConfig::default())?;
//!     let x = DistVector::product(&sector, &comm, "UUDD")?;
//!     let y = matrix.apply(&x)?;
//!     println!("|Hx| = {}", y.norm(&comm)?);
//!     println!("norm bound = {}", matrix.norm(NormType::Infinity)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Subspaces**: full space, parity sectors, fixed magnetization, explicit state lists
//! - **Two-phase MatMult**: a communication-free local phase, then a gathered global phase
//! - **Device backend**: grid-launched kernels over device buffers with explicit transfers
//! - **Partial trace**: reduced density matrices for every subspace variant
//! - **Serde**: term tables and subspace descriptors serialize behind the `serde` feature

// Re-export core abstractions
pub use qshell_core::{
    // Term encoding
    parity_sign, Pauli, PauliTerm, Term, TermList, TermTable,
    // Subspaces
    AnySubspace, Explicit, Full, Parity, ParitySector, SpinConserve, Subspace, SubspaceKind,
    // Error handling
    ErrorCategory, QshellError, Result,
    // Validation utilities
    parse_pauli_string, parse_product_state, validate_keep, MAX_SPINS,
    Complex64,
};

// Implementation modules
pub mod comm;
pub mod config;
pub mod context;
pub mod cpu;
pub mod device;
pub mod dispatch;
pub mod norm;
pub mod rdm;
pub mod state;
pub mod vector;

pub use comm::{Communicator, SelfComm, ThreadComm};
pub use config::{Backend, ShellConfig};
pub use context::{ShellContext, TermBuffers, TermView};
pub use device::{DeviceBuffer, DeviceContext, Grid};
pub use dispatch::{build_operator, build_operator_tagged, ShellMatrix, ShellOperator};
pub use norm::NormType;
pub use rdm::{
    rdm_dimension, reduced_density_matrix, reduced_density_matrix_dist,
    reduced_density_matrix_into, reduced_density_matrix_tagged,
};
pub use state::ProductState;
pub use vector::{DistVector, Layout};
