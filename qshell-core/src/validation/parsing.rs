//! Parsing of product-state and Pauli-string notation
//!
//! In both notations the leftmost character is spin 0, which is the least
//! significant bit of the resulting bit pattern.

use crate::validation::bounds::MAX_SPINS;
use crate::{QshellError, Result};

/// Bit representation of a parsed Pauli string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PauliBits {
    /// Positions carrying `X` or `Y` (bit flips)
    pub x: u64,
    /// Positions carrying `Z` or `Y` (phase from the source state)
    pub z: u64,
    /// Number of characters parsed
    pub len: usize,
}

impl PauliBits {
    /// Number of `Y` factors
    pub const fn y_count(&self) -> u32 {
        (self.x & self.z).count_ones()
    }
}

/// Parse a product state written as `U`/`D` characters
///
/// `U` is a set bit. The string length must equal `spins`.
pub fn parse_product_state(text: &str, spins: usize) -> Result<u64> {
    if text.len() != spins || spins > MAX_SPINS {
        return Err(QshellError::ParseError);
    }

    let mut state = 0u64;
    for (i, byte) in text.bytes().enumerate() {
        match byte {
            b'U' => state |= 1u64 << i,
            b'D' => {}
            _ => return Err(QshellError::ParseError),
        }
    }

    Ok(state)
}

/// Parse a Pauli string such as `"XIZY"`
///
/// Lowercase letters are accepted. `I` marks an identity factor.
pub fn parse_pauli_string(text: &str) -> Result<PauliBits> {
    if text.is_empty() {
        return Err(QshellError::ParseError);
    }
    if text.len() > MAX_SPINS {
        return Err(QshellError::InvalidTerm);
    }

    let mut bits = PauliBits {
        x: 0,
        z: 0,
        len: text.len(),
    };

    for (i, byte) in text.bytes().enumerate() {
        let bit = 1u64 << i;
        match byte.to_ascii_uppercase() {
            b'I' => {}
            b'X' => bits.x |= bit,
            b'Z' => bits.z |= bit,
            b'Y' => {
                bits.x |= bit;
                bits.z |= bit;
            }
            _ => return Err(QshellError::ParseError),
        }
    }

    Ok(bits)
}
