#![allow(dead_code)]

use std::thread;

use qshell::{
    AnySubspace, Communicator, Complex64, Explicit, Full, Parity, ParitySector, Pauli, PauliTerm,
    SpinConserve, Subspace, TermTable, ThreadComm,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

/// One descriptor of every variant on `spins` spins
pub fn all_subspaces(spins: usize) -> Vec<AnySubspace> {
    let explicit: Vec<u64> = (0..1u64 << spins)
        .rev()
        .filter(|s| s % 3 != 1)
        .collect();
    vec![
        Full::new(spins).unwrap().into(),
        Parity::new(spins, ParitySector::Odd).unwrap().into(),
        SpinConserve::new(spins, spins / 2).unwrap().into(),
        Explicit::new(spins, explicit).unwrap().into(),
    ]
}

/// Random Hermitian Pauli sum with real coefficients
pub fn random_table(spins: usize, nterms: usize, seed: u64) -> TermTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let ops = [Pauli::I, Pauli::X, Pauli::Y, Pauli::Z];
    let paulis = (0..nterms).map(|_| {
        let factors: Vec<(usize, Pauli)> = (0..spins)
            .map(|site| (site, ops[rng.gen_range(0..4)]))
            .collect();
        PauliTerm::from_factors(&factors, c(rng.gen_range(-1.0..1.0), 0.0)).unwrap()
    });
    TermTable::from_paulis(spins, paulis.collect::<Vec<_>>()).unwrap()
}

/// Random complex vector of length `len`
pub fn random_vector(len: usize, seed: u64) -> Vec<Complex64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len)
        .map(|_| c(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
        .collect()
}

/// `dense * x` for a row-major `rows x x.len()` matrix
pub fn dense_apply(dense: &[Complex64], x: &[Complex64]) -> Vec<Complex64> {
    dense
        .chunks(x.len().max(1))
        .map(|row| row.iter().zip(x).map(|(a, b)| a * b).sum())
        .collect()
}

/// Reference `A x` through the dense matrix
pub fn reference<L: Subspace, R: Subspace>(
    table: &TermTable,
    left: &L,
    right: &R,
    x: &[Complex64],
) -> Vec<Complex64> {
    if left.dimension() == 0 {
        return Vec::new();
    }
    let dense = table.to_dense(left, right).unwrap();
    dense_apply(&dense, x)
}

pub fn assert_close(actual: &[Complex64], expected: &[Complex64]) {
    assert_eq!(actual.len(), expected.len());
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!((a - e).norm() < 1e-10, "entry {i}: {a} != {e}");
    }
}

/// Run `work` on `size` threaded workers and collect the results in rank order
pub fn run_ranks<T, F>(size: usize, work: F) -> Vec<T>
where
    T: Send,
    F: Fn(&ThreadComm) -> T + Sync,
{
    let comms = ThreadComm::group(size);
    thread::scope(|s| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| {
                let work = &work;
                s.spawn(move || {
                    assert!(comm.rank() < size);
                    work(&comm)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}
