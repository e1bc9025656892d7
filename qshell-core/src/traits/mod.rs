//! Abstract interfaces shared by all engines
//!
//! Traits are pure interfaces; the concrete variants live in
//! [`crate::subspace`].

pub mod subspace;

pub use subspace::{States, Subspace};
