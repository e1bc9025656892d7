mod common;

use common::*;
use qshell::{
    AnySubspace, Backend, Complex64, DistVector, Full, Layout, Parity, ParitySector, PauliTerm,
    ShellConfig, ShellMatrix, Subspace, Term, TermTable,
};

fn configs() -> [ShellConfig; 3] {
    [
        ShellConfig::cpu(),
        ShellConfig::device(),
        ShellConfig::device().with_grid(3, 2).with_adaptive_grid(true),
    ]
}

fn apply_single(
    table: &TermTable,
    left: &AnySubspace,
    right: &AnySubspace,
    config: ShellConfig,
    x: &[Complex64],
) -> Vec<Complex64> {
    let comm = qshell::SelfComm;
    let mut matrix = ShellMatrix::new(table, left, right, &comm, config).unwrap();
    let x = DistVector::from_global(*matrix.col_layout(), x).unwrap();
    matrix.apply(&x).unwrap().into_local()
}

#[test]
fn test_flip_on_two_spins() {
    let table = TermTable::new(2, vec![Term::new(0b01, 0b00, c(1.0, 0.0))]).unwrap();
    let full: AnySubspace = Full::new(2).unwrap().into();
    let x = [c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(0.0, 0.0)];
    for config in configs() {
        let y = apply_single(&table, &full, &full, config, &x);
        assert_eq!(y, vec![c(0.0, 0.0), c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0)]);
    }
}

#[test]
fn test_identity_term_is_exact() {
    let table = TermTable::new(4, vec![Term::new(0, 0, c(1.0, 0.0))]).unwrap();
    for subspace in all_subspaces(4) {
        let x = random_vector(subspace.dimension(), 11);
        for config in configs() {
            assert_eq!(apply_single(&table, &subspace, &subspace, config, &x), x);
        }
    }
}

#[test]
fn test_all_pairs_match_dense_reference() {
    let table = random_table(4, 12, 3);
    let subspaces = all_subspaces(4);
    for left in &subspaces {
        for right in &subspaces {
            let x = random_vector(right.dimension(), 5);
            let expected = reference(&table, left, right, &x);
            for config in configs() {
                let y = apply_single(&table, left, right, config.clone(), &x);
                assert_close(&y, &expected);
            }
        }
    }
}

#[test]
fn test_linearity() {
    let table = random_table(5, 10, 17);
    let sub: AnySubspace = Parity::new(5, ParitySector::Even).unwrap().into();
    let dim = sub.dimension();
    let u = random_vector(dim, 1);
    let v = random_vector(dim, 2);
    let (a, b) = (c(0.3, -1.2), c(-2.0, 0.5));
    let mixed: Vec<_> = u.iter().zip(&v).map(|(p, q)| a * p + b * q).collect();

    for config in configs() {
        let au = apply_single(&table, &sub, &sub, config.clone(), &u);
        let av = apply_single(&table, &sub, &sub, config.clone(), &v);
        let amixed = apply_single(&table, &sub, &sub, config, &mixed);
        let combined: Vec<_> = au.iter().zip(&av).map(|(p, q)| a * p + b * q).collect();
        assert_close(&amixed, &combined);
    }
}

#[test]
fn test_parity_sector_agrees_with_full_space() {
    // XX + YY conserves parity: applying it in the full space and then
    // projecting onto the even sector matches applying it in the sector
    let spins = 4;
    let paulis = [("XXII", 1.0), ("YYII", 1.0), ("IXXI", 0.5), ("IYYI", 0.5), ("IIZZ", -0.7)];
    let table = TermTable::from_paulis(
        spins,
        paulis
            .iter()
            .map(|&(p, w)| PauliTerm::parse(p, c(w, 0.0)).unwrap())
            .collect::<Vec<_>>(),
    )
    .unwrap();
    let full = Full::new(spins).unwrap();
    let even = Parity::new(spins, ParitySector::Even).unwrap();
    assert!(table.conserves(&even, &even).unwrap());

    let x_sub = random_vector(even.dimension(), 23);
    let mut x_full = vec![c(0.0, 0.0); full.dimension()];
    for (state, &a) in even.states().zip(&x_sub) {
        x_full[state as usize] = a;
    }

    let full_any: AnySubspace = full.into();
    let even_any: AnySubspace = even.clone().into();
    for config in configs() {
        let y_full = apply_single(&table, &full_any, &full_any, config.clone(), &x_full);
        let y_sub = apply_single(&table, &even_any, &even_any, config, &x_sub);
        let projected: Vec<_> = even.states().map(|s| y_full[s as usize]).collect();
        assert_close(&y_sub, &projected);
    }
}

#[test]
fn test_multi_worker_matches_single_worker() {
    let table = random_table(5, 14, 41);
    let subspaces = all_subspaces(5);
    for left in &subspaces {
        for right in &subspaces {
            let x = random_vector(right.dimension(), 9);
            let expected = reference(&table, left, right, &x);
            for config in configs() {
                let gathered = run_ranks(3, |comm| {
                    let mut matrix =
                        ShellMatrix::new(&table, left, right, comm, config.clone()).unwrap();
                    let xv = DistVector::from_global(*matrix.col_layout(), &x).unwrap();
                    // two calls reuse the gather buffer
                    let first = matrix.apply(&xv).unwrap();
                    let second = matrix.apply(&xv).unwrap();
                    assert_eq!(first, second);
                    second.gather_all(comm).unwrap()
                });
                for y in &gathered {
                    assert_close(y, &expected);
                }
            }
        }
    }
}

#[test]
fn test_more_workers_than_rows() {
    let table = TermTable::from_paulis(
        2,
        [PauliTerm::parse("XX", c(1.0, 0.0)).unwrap()],
    )
    .unwrap();
    let sub: AnySubspace = Parity::new(2, ParitySector::Odd).unwrap().into();
    let x = [c(1.0, 0.0), c(2.0, 0.0)];
    for backend in [Backend::Cpu, Backend::Device] {
        let config = ShellConfig::default().with_backend(backend);
        let gathered = run_ranks(4, |comm| {
            let mut matrix = ShellMatrix::new(&table, &sub, &sub, comm, config.clone()).unwrap();
            let layout = *matrix.row_layout();
            assert!(layout.local_len() <= 1);
            let xv = DistVector::from_global(*matrix.col_layout(), &x).unwrap();
            matrix.apply(&xv).unwrap().gather_all(comm).unwrap()
        });
        for y in gathered {
            assert_eq!(y, vec![c(2.0, 0.0), c(1.0, 0.0)]);
        }
    }
}

#[test]
fn test_explicit_layout_rejects_foreign_vectors() {
    let table = TermTable::new(3, vec![Term::new(0b001, 0, c(1.0, 0.0))]).unwrap();
    let full: AnySubspace = Full::new(3).unwrap().into();
    let comm = qshell::SelfComm;
    let mut matrix = ShellMatrix::new(&table, &full, &full, &comm, ShellConfig::cpu()).unwrap();
    let x = DistVector::zeros(Layout::split(8, 0, 2)).unwrap();
    let mut y = DistVector::zeros(*matrix.row_layout()).unwrap();
    assert_eq!(
        matrix.mult(&x, &mut y),
        Err(qshell::QshellError::LayoutMismatch)
    );
    let (x, mut y) = matrix.create_vecs().unwrap();
    assert!(matrix.mult(&x, &mut y).is_ok());
    assert_eq!(matrix.local_rows(), 0..8);
}
