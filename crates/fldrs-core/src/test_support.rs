//! Synthetic backbones for unit tests.
//!
//! Chains are planar zigzags: the interleaved N, CA, C atoms sit at
//! `x = j * RISE`, alternating between `y = 0` and `y = PUCKER`. With these
//! constants every covalent backbone bond is 1.44 Angstroms, every backbone
//! angle is 2.03 rad and atoms two bonds apart are 2.45 Angstroms apart.
//! Carbonyl oxygens and amide hydrogens stick out of the plane.

use crate::core::models::atom::AtomRecord;
use crate::core::models::structure::Structure;
use nalgebra::{Point3, Vector3};

pub const RISE: f64 = 1.2234;
pub const PUCKER: f64 = 0.7595;
pub const CARBONYL_LENGTH: f64 = 1.23;

/// Position of the `j`-th interleaved backbone atom of a zigzag starting at `origin`.
pub fn zigzag_point(origin: &Vector3<f64>, j: usize) -> Point3<f64> {
    let y = if j % 2 == 1 { PUCKER } else { 0.0 };
    Point3::new(j as f64 * RISE, y, 0.0) + origin
}

/// Atoms of one zigzag residue at chain position `index`.
pub fn residue_atoms(
    residue_name: &str,
    residue_number: isize,
    index: usize,
    origin: &Vector3<f64>,
    with_hydrogen: bool,
) -> Vec<AtomRecord> {
    let n = zigzag_point(origin, 3 * index);
    let ca = zigzag_point(origin, 3 * index + 1);
    let c = zigzag_point(origin, 3 * index + 2);
    let mut atoms = vec![AtomRecord::new("N", "N", residue_name, residue_number, n)];
    if with_hydrogen && residue_name != "PRO" {
        atoms.push(AtomRecord::new(
            "H",
            "H",
            residue_name,
            residue_number,
            n + Vector3::new(0.0, 0.0, -1.0),
        ));
    }
    atoms.push(AtomRecord::new("CA", "C", residue_name, residue_number, ca));
    atoms.push(AtomRecord::new("C", "C", residue_name, residue_number, c));
    atoms.push(AtomRecord::new(
        "O",
        "O",
        residue_name,
        residue_number,
        c + Vector3::new(0.0, 0.0, CARBONYL_LENGTH),
    ));
    atoms
}

/// A zigzag chain with one residue per entry of `names`, numbered from `first_number`.
pub fn named_chain(first_number: isize, names: &[&str], origin: Vector3<f64>) -> Structure {
    let atoms = names
        .iter()
        .enumerate()
        .flat_map(|(index, name)| {
            residue_atoms(name, first_number + index as isize, index, &origin, true)
        })
        .collect();
    Structure::from_atoms(atoms).expect("synthetic chains are well formed")
}

/// A poly-alanine zigzag chain of `count` residues.
pub fn chain(first_number: isize, count: usize, origin: Vector3<f64>) -> Structure {
    named_chain(first_number, &vec!["ALA"; count], origin)
}

/// A poly-alanine zigzag chain without amide hydrogens.
pub fn heavy_chain(first_number: isize, count: usize, origin: Vector3<f64>) -> Structure {
    let atoms = (0..count)
        .flat_map(|index| residue_atoms("ALA", first_number + index as isize, index, &origin, false))
        .collect();
    Structure::from_atoms(atoms).expect("synthetic chains are well formed")
}

/// Residue numbers of a structure in array order, one entry per residue.
pub fn residue_numbers(structure: &Structure) -> Vec<isize> {
    (0..structure.residue_count())
        .filter_map(|index| structure.residue_number(index))
        .collect()
}

pub fn assert_points_close(a: &Point3<f64>, b: &Point3<f64>, tolerance: f64) {
    assert!(
        (a - b).norm() < tolerance,
        "points differ by {}: {a:?} vs {b:?}",
        (a - b).norm()
    );
}
