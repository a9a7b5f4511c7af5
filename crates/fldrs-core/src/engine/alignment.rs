use crate::core::models::atom::round_position;
use crate::core::models::structure::Structure;
use crate::core::utils::geometry::{GeometryError, plane_normal, superposition_rotation};
use crate::core::utils::identifiers::{ALPHA_CARBON, CARBONYL_CARBON, NITROGEN};
use crate::engine::error::EngineError;
use nalgebra::{Point3, UnitQuaternion, Vector3};
use tracing::{debug, instrument};

/// Where a disordered fragment attaches to the folded structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisorderCase {
    /// The fragment precedes the folded structure.
    NTerminal,
    /// The fragment fills an internal chain break.
    Break,
    /// The fragment follows the folded structure.
    CTerminal,
}

impl DisorderCase {
    /// The end of the fragment carrying its anchor atoms.
    pub fn fragment_anchor_end(self) -> AnchorEnd {
        match self {
            DisorderCase::NTerminal => AnchorEnd::Trailing,
            DisorderCase::Break | DisorderCase::CTerminal => AnchorEnd::Leading,
        }
    }

    /// The end of the folded structure the fragment is attached to.
    pub fn folded_anchor_end(self) -> AnchorEnd {
        self.fragment_anchor_end().opposite()
    }
}

/// A terminus of a structure, used to locate its anchor atoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorEnd {
    /// C of the first residue, N and CA of the second.
    Leading,
    /// C of the second-to-last residue, N and CA of the last.
    Trailing,
}

impl AnchorEnd {
    pub fn opposite(self) -> Self {
        match self {
            AnchorEnd::Leading => AnchorEnd::Trailing,
            AnchorEnd::Trailing => AnchorEnd::Leading,
        }
    }
}

/// Three backbone points spanning a peptide bond: C of one residue, N and CA of the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorFrame {
    pub c: Point3<f64>,
    pub n: Point3<f64>,
    pub ca: Point3<f64>,
}

impl AnchorFrame {
    pub fn new(c: Point3<f64>, n: Point3<f64>, ca: Point3<f64>) -> Self {
        Self { c, n, ca }
    }

    pub fn points(&self) -> [Point3<f64>; 3] {
        [self.c, self.n, self.ca]
    }

    /// Normal of the anchor plane. Fails for coincident or collinear anchors,
    /// which do not determine an orientation.
    pub fn normal(&self) -> Result<Vector3<f64>, GeometryError> {
        plane_normal(&self.c, &self.n, &self.ca)
    }

    /// Reads the anchor at `end` of `structure`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InsufficientResidues`] for structures with fewer
    /// than two residues and [`EngineError::AnchorAtomNotFound`] if one of the
    /// anchor atoms is missing.
    pub fn of(structure: &Structure, end: AnchorEnd) -> Result<Self, EngineError> {
        let count = structure.residue_count();
        if count < 2 {
            return Err(EngineError::InsufficientResidues {
                what: "anchor frame",
                required: 2,
                found: count,
            });
        }
        match end {
            AnchorEnd::Leading => Self::spanning(structure, 0),
            AnchorEnd::Trailing => Self::spanning(structure, count - 2),
        }
    }

    /// The anchor across the peptide bond following residue `carbonyl_residue`
    /// (an index into the structure, not a residue number).
    pub fn spanning(structure: &Structure, carbonyl_residue: usize) -> Result<Self, EngineError> {
        let amide_residue = carbonyl_residue + 1;
        let found = structure.residue_count();
        if amide_residue >= found {
            return Err(EngineError::InsufficientResidues {
                what: "anchor frame",
                required: amide_residue + 1,
                found,
            });
        }
        Ok(Self {
            c: anchor_atom(structure, carbonyl_residue, CARBONYL_CARBON)?,
            n: anchor_atom(structure, amide_residue, NITROGEN)?,
            ca: anchor_atom(structure, amide_residue, ALPHA_CARBON)?,
        })
    }
}

pub(crate) fn anchor_atom(
    structure: &Structure,
    residue_index: usize,
    atom_name: &'static str,
) -> Result<Point3<f64>, EngineError> {
    structure
        .find_atom(residue_index, atom_name)
        .map(|(_, atom)| atom.position)
        .ok_or(EngineError::AnchorAtomNotFound {
            atom_name,
            residue_number: structure.residue_number(residue_index).unwrap_or_default(),
        })
}

/// Superimposes the fragment's anchor for `case` onto `target`.
///
/// The fragment is rotated by the least-squares rotation between the two
/// anchors and then translated so that its anchor C lands exactly on
/// `target.c`. Coordinates of the result are rounded to 3 decimals.
///
/// # Errors
///
/// Fails when the fragment lacks the anchor residues or atoms, and with
/// [`EngineError::Geometry`] when either anchor is coincident or collinear.
pub fn align(
    fragment: &Structure,
    target: &AnchorFrame,
    case: DisorderCase,
) -> Result<Structure, EngineError> {
    align_at(fragment, target, case.fragment_anchor_end())
}

/// Like [`align`], with the fragment's anchor end chosen explicitly.
#[instrument(skip_all, name = "anchor_alignment", fields(end = ?end))]
pub fn align_at(
    fragment: &Structure,
    target: &AnchorFrame,
    end: AnchorEnd,
) -> Result<Structure, EngineError> {
    let source = AnchorFrame::of(fragment, end)?;
    source.normal()?;
    target.normal()?;
    let rotation = superposition_rotation(&source.points(), &target.points())?;
    let translation = target.c - rotation * source.c;

    let mut aligned = fragment.clone();
    aligned.transform_positions(|p| round_position(&(rotation * p + translation)));

    debug!(
        angle = UnitQuaternion::from_rotation_matrix(&rotation).angle(),
        atoms = aligned.len(),
        "Fragment aligned onto anchor."
    );
    Ok(aligned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::AtomRecord;
    use crate::test_support::{assert_points_close, chain};
    use nalgebra::Rotation3;

    fn tumbled_chain(first_number: isize, count: usize) -> Structure {
        let mut structure = chain(first_number, count, Vector3::zeros());
        let rotation = Rotation3::from_euler_angles(1.1, -0.4, 2.5);
        let shift = Vector3::new(-7.0, 3.5, 12.0);
        structure.transform_positions(|p| rotation * p + shift);
        structure
    }

    #[test]
    fn anchor_ends_follow_disorder_case() {
        assert_eq!(DisorderCase::NTerminal.fragment_anchor_end(), AnchorEnd::Trailing);
        assert_eq!(DisorderCase::NTerminal.folded_anchor_end(), AnchorEnd::Leading);
        assert_eq!(DisorderCase::CTerminal.fragment_anchor_end(), AnchorEnd::Leading);
        assert_eq!(DisorderCase::Break.folded_anchor_end(), AnchorEnd::Trailing);
    }

    #[test]
    fn anchor_frame_reads_expected_atoms() {
        let structure = chain(1, 3, Vector3::zeros());

        let leading = AnchorFrame::of(&structure, AnchorEnd::Leading).unwrap();
        let trailing = AnchorFrame::of(&structure, AnchorEnd::Trailing).unwrap();

        assert_eq!(leading.c, structure.find_atom(0, "C").unwrap().1.position);
        assert_eq!(leading.n, structure.find_atom(1, "N").unwrap().1.position);
        assert_eq!(trailing.c, structure.find_atom(1, "C").unwrap().1.position);
        assert_eq!(trailing.ca, structure.find_atom(2, "CA").unwrap().1.position);
    }

    #[test]
    fn spanning_anchor_reads_inner_peptide_bond() {
        let structure = chain(1, 5, Vector3::zeros());

        let frame = AnchorFrame::spanning(&structure, 2).unwrap();

        assert_eq!(frame.c, structure.find_atom(2, "C").unwrap().1.position);
        assert_eq!(frame.ca, structure.find_atom(3, "CA").unwrap().1.position);
        assert!(matches!(
            AnchorFrame::spanning(&structure, 4),
            Err(EngineError::InsufficientResidues { required: 6, found: 5, .. })
        ));
    }

    #[test]
    fn anchor_frame_requires_two_residues() {
        let structure = chain(1, 1, Vector3::zeros());
        assert!(matches!(
            AnchorFrame::of(&structure, AnchorEnd::Leading),
            Err(EngineError::InsufficientResidues { found: 1, .. })
        ));
    }

    #[test]
    fn anchor_frame_reports_missing_atom() {
        let atoms = chain(5, 2, Vector3::zeros())
            .into_atoms()
            .into_iter()
            .filter(|a| !(a.residue_number == 6 && a.name == "CA"))
            .collect();
        let structure = Structure::from_atoms(atoms).unwrap();

        assert!(matches!(
            AnchorFrame::of(&structure, AnchorEnd::Leading),
            Err(EngineError::AnchorAtomNotFound {
                atom_name: "CA",
                residue_number: 6
            })
        ));
    }

    #[test]
    fn n_terminal_alignment_places_anchor_on_target() {
        let folded = chain(20, 5, Vector3::new(2.0, -1.0, 4.0));
        let target = AnchorFrame::of(&folded, AnchorEnd::Leading).unwrap();
        let fragment = tumbled_chain(1, 6);

        let aligned = align(&fragment, &target, DisorderCase::NTerminal).unwrap();

        let placed = AnchorFrame::of(&aligned, AnchorEnd::Trailing).unwrap();
        assert_points_close(&placed.c, &target.c, 1e-3);
        assert_points_close(&placed.n, &target.n, 1e-3);
        assert_points_close(&placed.ca, &target.ca, 1e-3);
    }

    #[test]
    fn c_terminal_alignment_uses_leading_anchor() {
        let folded = tumbled_chain(1, 4);
        let target = AnchorFrame::of(&folded, AnchorEnd::Trailing).unwrap();
        let fragment = chain(1, 5, Vector3::new(30.0, 0.0, 0.0));

        let aligned = align(&fragment, &target, DisorderCase::CTerminal).unwrap();

        let placed = AnchorFrame::of(&aligned, AnchorEnd::Leading).unwrap();
        assert_points_close(&placed.c, &target.c, 1e-3);
        assert_points_close(&placed.ca, &target.ca, 1e-3);
    }

    #[test]
    fn collinear_fragment_anchor_is_a_geometry_error() {
        let atoms = ["N", "CA", "C", "N", "CA", "C"]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                AtomRecord::new(name, &name[..1], "GLY", 1 + i as isize / 3, Point3::new(1.45 * i as f64, 0.0, 0.0))
            })
            .collect();
        let fragment = Structure::from_atoms(atoms).unwrap();
        let target = AnchorFrame::of(&chain(1, 3, Vector3::zeros()), AnchorEnd::Leading).unwrap();

        let result = align(&fragment, &target, DisorderCase::CTerminal);

        assert!(matches!(result, Err(EngineError::Geometry { .. })));
    }

    #[test]
    fn coincident_target_anchor_is_a_geometry_error() {
        let p = Point3::new(1.0, 2.0, 3.0);
        let target = AnchorFrame::new(p, p, p);

        let result = align(&chain(1, 4, Vector3::zeros()), &target, DisorderCase::NTerminal);

        assert!(matches!(result, Err(EngineError::Geometry { .. })));
        assert!(target.normal().is_err());
    }

    #[test]
    fn alignment_is_rigid_and_rounded() {
        let fragment = tumbled_chain(1, 4);
        let target = AnchorFrame::of(&chain(1, 3, Vector3::zeros()), AnchorEnd::Leading).unwrap();

        let aligned = align(&fragment, &target, DisorderCase::Break).unwrap();

        assert_eq!(aligned.len(), fragment.len());
        let (a0, a1) = (&fragment.atoms()[0].position, &fragment.atoms()[7].position);
        let (b0, b1) = (&aligned.atoms()[0].position, &aligned.atoms()[7].position);
        assert!(((a0 - a1).norm() - (b0 - b1).norm()).abs() < 2e-3);
        assert!(aligned.positions().all(|p| {
            p.iter().all(|v| ((v * 1000.0).round() - v * 1000.0).abs() < 1e-6)
        }));
        assert_eq!(aligned.atoms()[3].name, fragment.atoms()[3].name);
    }
}
