//! Validation and parsing utilities
//!
//! Pure functions over bit patterns and strings with no I/O dependencies.

pub mod bounds;
pub mod parsing;

pub use bounds::{
    state_limit, validate_keep, validate_row_range, validate_spin_count, validate_state,
    MAX_SPINS,
};
pub use parsing::{parse_pauli_string, parse_product_state, PauliBits};
