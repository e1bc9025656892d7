//! Apply a Heisenberg chain Hamiltonian in every subspace and report timings

use qshell::{
    reduced_density_matrix_dist, AnySubspace, Complex64, DistVector, Explicit, Full, NormType,
    Parity, ParitySector, PauliTerm, SelfComm, ShellConfig, ShellMatrix, SpinConserve, Subspace,
    TermTable,
};
use std::time::Instant;

fn main() -> qshell::Result<()> {
    let spins = 14;
    println!("Building periodic Heisenberg chain on {spins} spins...");
    let mut paulis = Vec::new();
    for site in 0..spins {
        let next = (site + 1) % spins;
        for op in ["X", "Y", "Z"] {
            let text: String = (0..spins)
                .map(|i| if i == site || i == next { op } else { "I" })
                .collect();
            paulis.push(PauliTerm::parse(&text, Complex64::new(0.25, 0.0))?);
        }
    }
    let table = TermTable::from_paulis(spins, paulis)?;
    println!("   Terms: {}, mask groups: {}", table.nterms(), table.nmasks());

    let subspaces: Vec<(&str, AnySubspace)> = vec![
        ("full", Full::new(spins)?.into()),
        ("parity", Parity::new(spins, ParitySector::Even)?.into()),
        ("spin conserve", SpinConserve::new(spins, spins / 2)?.into()),
        (
            "explicit",
            Explicit::from_predicate(spins, |s| s.count_ones() as usize == spins / 2 && s & 1 == 0)?
                .into(),
        ),
    ];

    let comm = SelfComm;
    for (name, subspace) in &subspaces {
        println!("\nSubspace: {name} (dimension {})", subspace.dimension());
        for config in [ShellConfig::cpu(), ShellConfig::device()] {
            let backend = config.backend.name();
            let start = Instant::now();
            let mut matrix = ShellMatrix::new(&table, subspace, subspace, &comm, config)?;
            let build_time = start.elapsed();

            let x = DistVector::random(subspace, &comm, 42, true)?;
            let start = Instant::now();
            let y = matrix.apply(&x)?;
            let mult_time = start.elapsed();

            let energy = x.dot(&y, &comm)?;
            println!(
                "   [{backend}] build {:.3}ms, matmult {:.3}ms, <x|H|x> = {:.6}, norm bound = {:.3}",
                build_time.as_secs_f64() * 1000.0,
                mult_time.as_secs_f64() * 1000.0,
                energy.re,
                matrix.norm(NormType::Infinity)?
            );
            matrix.destroy();
        }

        let x = DistVector::random(subspace, &comm, 7, true)?;
        let rho = reduced_density_matrix_dist(&x, &comm, subspace, &[0, 1], false)?;
        let purity: f64 = rho.iter().map(|a| a.norm_sqr()).sum();
        println!("   Two-spin purity of a random state: {purity:.6}");
    }

    Ok(())
}
