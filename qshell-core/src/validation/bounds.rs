//! Range and bit-pattern validation for spin chains
//!
//! Basis states are `u64` bit patterns, bit `i` being spin `i`.

use crate::{QshellError, Result};

/// Largest supported spin chain length
pub const MAX_SPINS: usize = 63;

/// Validate a spin chain length
pub const fn validate_spin_count(spins: usize) -> Result<()> {
    if spins == 0 || spins > MAX_SPINS {
        return Err(QshellError::InvalidSpinCount);
    }
    Ok(())
}

/// Number of basis states of the full space, `2^spins`
///
/// `spins` must already be validated.
pub const fn state_limit(spins: usize) -> u64 {
    1u64 << spins
}

/// Validate that a basis state only uses the lowest `spins` bits
pub const fn validate_state(state: u64, spins: usize) -> Result<()> {
    if state >> spins != 0 {
        return Err(QshellError::InvalidState);
    }
    Ok(())
}

/// Validate a set of kept qubit positions, returning their bit mask
///
/// Positions must be distinct and below `spins`.
pub fn validate_keep(keep: &[usize], spins: usize) -> Result<u64> {
    let mut mask = 0u64;
    for &q in keep {
        if q >= spins {
            return Err(QshellError::InvalidQubit);
        }
        let bit = 1u64 << q;
        if mask & bit != 0 {
            return Err(QshellError::InvalidQubit);
        }
        mask |= bit;
    }
    Ok(mask)
}

/// Validate a half-open row range against a total size
pub const fn validate_row_range(start: usize, end: usize, total: usize) -> Result<()> {
    if start > end {
        return Err(QshellError::InvalidRange);
    }

    if end > total {
        return Err(QshellError::InvalidRange);
    }

    Ok(())
}
