//! Reduced density matrices by partial trace
//!
//! For a state `|psi> = sum_s a(s) |s>`, the reduced density matrix over
//! the kept spins is
//!
//! ```text
//! rho[i][j] = sum over s, s' agreeing on every traced spin of a(s) * conj(a(s'))
//! ```
//!
//! where `i` and `j` are the kept sub-bitstrings of `s` and `s'`: bit `k`
//! of the output index is the value of spin `keep[k]`. States outside the
//! subspace have zero amplitude and are never visited.

use hashbrown::HashMap;
use num_complex::Complex64;
use qshell_core::validation::validate_keep;
use qshell_core::{AnySubspace, QshellError, Result, Subspace, SubspaceKind};
use rayon::prelude::*;
use tracing::trace;

use crate::comm::Communicator;
use crate::vector::{try_zeroed, DistVector};

/// Side length of the reduced matrix for `kept` spins
pub fn rdm_dimension(kept: usize) -> Result<usize> {
    u32::try_from(kept)
        .ok()
        .and_then(|k| 1usize.checked_shl(k))
        .ok_or(QshellError::AllocationFailed)
}

/// Allocate and fill the reduced density matrix, row-major
pub fn reduced_density_matrix(
    amplitudes: &[Complex64],
    subspace: &AnySubspace,
    keep: &[usize],
    triangular: bool,
) -> Result<Vec<Complex64>> {
    let dim = rdm_dimension(keep.len())?;
    let mut out = try_zeroed(dim.checked_mul(dim).ok_or(QshellError::AllocationFailed)?)?;
    reduced_density_matrix_into(amplitudes, subspace, keep, triangular, &mut out)?;
    Ok(out)
}

/// Fill `out` with the reduced density matrix, row-major
///
/// `amplitudes` is the replicated state in the basis of `subspace`. With
/// `triangular`, only entries `(i, j)` with `i <= j` are written and the
/// rest are left zero.
pub fn reduced_density_matrix_into(
    amplitudes: &[Complex64],
    subspace: &AnySubspace,
    keep: &[usize],
    triangular: bool,
    out: &mut [Complex64],
) -> Result<()> {
    let keep_mask = validate_keep(keep, subspace.spins())?;
    if amplitudes.len() != subspace.dimension() {
        return Err(QshellError::DimensionMismatch);
    }
    let dim = rdm_dimension(keep.len())?;
    if Some(out.len()) != dim.checked_mul(dim) {
        return Err(QshellError::DimensionMismatch);
    }
    trace!(kind = %subspace.kind(), kept = keep.len(), triangular, "reduced density matrix");

    out.fill(Complex64::new(0.0, 0.0));
    match subspace {
        AnySubspace::Full(_) => rdm_full(amplitudes, subspace.spins(), keep, keep_mask, triangular, out),
        AnySubspace::Parity(s) => rdm_grouped(amplitudes, s, keep, keep_mask, triangular, out),
        AnySubspace::SpinConserve(s) => rdm_grouped(amplitudes, s, keep, keep_mask, triangular, out),
        AnySubspace::Explicit(s) => rdm_grouped(amplitudes, s, keep, keep_mask, triangular, out),
    }
    Ok(())
}

/// Entry point taking the raw subspace tag alongside its descriptor
///
/// Fails with [`QshellError::InvalidSubspaceType`] for an unknown tag and
/// [`QshellError::SubspaceMismatch`] if the tag disagrees with the descriptor.
pub fn reduced_density_matrix_tagged(
    amplitudes: &[Complex64],
    sub_type: i64,
    subspace: &AnySubspace,
    keep: &[usize],
    triangular: bool,
) -> Result<Vec<Complex64>> {
    let kind = SubspaceKind::from_tag(sub_type)?;
    reduced_density_matrix(amplitudes, subspace.expect_kind(kind)?, keep, triangular)
}

/// Gather a distributed state and reduce it (collective)
pub fn reduced_density_matrix_dist<C: Communicator>(
    vector: &DistVector,
    comm: &C,
    subspace: &AnySubspace,
    keep: &[usize],
    triangular: bool,
) -> Result<Vec<Complex64>> {
    let amplitudes = vector.gather_all(comm)?;
    reduced_density_matrix(&amplitudes, subspace, keep, triangular)
}

/// Kept sub-bitstring of `state`
#[inline]
fn kept_index(state: u64, keep: &[usize]) -> usize {
    keep.iter()
        .enumerate()
        .fold(0, |acc, (k, &q)| acc | (((state >> q) & 1) as usize) << k)
}

/// Place the low bits of `bits` at `positions`, in order
#[inline]
fn deposit(bits: usize, positions: &[usize]) -> u64 {
    positions
        .iter()
        .enumerate()
        .fold(0, |acc, (k, &q)| acc | (((bits >> k) & 1) as u64) << q)
}

fn rdm_full(
    amplitudes: &[Complex64],
    spins: usize,
    keep: &[usize],
    keep_mask: u64,
    triangular: bool,
    out: &mut [Complex64],
) {
    let traced: Vec<usize> = (0..spins).filter(|&q| (keep_mask >> q) & 1 == 0).collect();
    let dim = 1usize << keep.len();
    let kept_states: Vec<u64> = (0..dim).map(|i| deposit(i, keep)).collect();
    let traced_configs = 1usize << traced.len();

    out.par_chunks_mut(dim).enumerate().for_each(|(i, row)| {
        let first = if triangular { i } else { 0 };
        for t in 0..traced_configs {
            let base = deposit(t, &traced);
            let a = amplitudes[(base | kept_states[i]) as usize];
            if a == Complex64::new(0.0, 0.0) {
                continue;
            }
            for j in first..dim {
                row[j] += a * amplitudes[(base | kept_states[j]) as usize].conj();
            }
        }
    });
}

fn rdm_grouped<S: Subspace>(
    amplitudes: &[Complex64],
    subspace: &S,
    keep: &[usize],
    keep_mask: u64,
    triangular: bool,
    out: &mut [Complex64],
) {
    let dim = 1usize << keep.len();
    let mut groups: HashMap<u64, Vec<(usize, Complex64)>> = HashMap::new();
    for (state, &a) in subspace.states().zip(amplitudes) {
        groups
            .entry(state & !keep_mask)
            .or_default()
            .push((kept_index(state, keep), a));
    }

    for members in groups.values() {
        for &(i, a) in members {
            for &(j, b) in members {
                if triangular && j < i {
                    continue;
                }
                out[i * dim + j] += a * b.conj();
            }
        }
    }
}
