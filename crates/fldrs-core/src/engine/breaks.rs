use crate::core::models::structure::Structure;
use crate::core::utils::geometry::distance;
use crate::core::utils::identifiers::{
    ALPHA_CARBON, AMIDE_HYDROGEN, CARBONYL_CARBON, CARBONYL_OXYGEN, NITROGEN, one_letter_code,
};
use crate::engine::error::EngineError;
use nalgebra::Point3;
use std::ops::Range;
use tracing::{debug, info, instrument};

/// Longest distance in Angstroms between consecutive backbone atoms still
/// considered covalently bonded.
pub const BACKBONE_BREAK_DISTANCE: f64 = 2.1;

/// Backbone positions of one residue, with the optional atoms the break
/// closer needs for junction repair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackboneResidue {
    /// Index of the residue in the source structure.
    pub residue_index: usize,
    pub n: Point3<f64>,
    pub ca: Point3<f64>,
    pub c: Point3<f64>,
    pub o: Option<Point3<f64>>,
    pub h: Option<Point3<f64>>,
}

/// The N, CA, C path of a structure, one entry per residue carrying backbone atoms.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BackboneTrace {
    residues: Vec<BackboneResidue>,
}

impl BackboneTrace {
    /// Collects the backbone of `structure`. Residues without any of N, CA and C
    /// (ligands, waters) are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::BackboneMismatch`] when the structure holds
    /// different numbers of N, CA and C atoms, and
    /// [`EngineError::AnchorAtomNotFound`] when the counts agree but a residue
    /// still lacks one of them.
    pub fn from_structure(structure: &Structure) -> Result<Self, EngineError> {
        let count = |name: &str| structure.atoms().iter().filter(|a| a.name == name).count();
        let (n, ca, c) = (count(NITROGEN), count(ALPHA_CARBON), count(CARBONYL_CARBON));
        if n != ca || ca != c {
            return Err(EngineError::BackboneMismatch { n, ca, c });
        }

        let mut residues = Vec::with_capacity(n);
        for residue_index in 0..structure.residue_count() {
            let position = |name: &str| {
                structure
                    .find_atom(residue_index, name)
                    .map(|(_, atom)| atom.position)
            };
            let backbone = [NITROGEN, ALPHA_CARBON, CARBONYL_CARBON].map(position);
            if backbone.iter().all(Option::is_none) {
                continue;
            }
            let [Some(n), Some(ca), Some(c)] = backbone else {
                let missing = [NITROGEN, ALPHA_CARBON, CARBONYL_CARBON]
                    .into_iter()
                    .zip(backbone)
                    .find_map(|(name, p)| p.is_none().then_some(name))
                    .unwrap_or(NITROGEN);
                return Err(EngineError::AnchorAtomNotFound {
                    atom_name: missing,
                    residue_number: structure.residue_number(residue_index).unwrap_or_default(),
                });
            };
            residues.push(BackboneResidue {
                residue_index,
                n,
                ca,
                c,
                o: position(CARBONYL_OXYGEN),
                h: position(AMIDE_HYDROGEN),
            });
        }
        Ok(Self { residues })
    }

    pub fn residues(&self) -> &[BackboneResidue] {
        &self.residues
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&BackboneResidue> {
        self.residues.get(index)
    }

    /// Backbone atoms interleaved as N0, CA0, C0, N1, CA1, C1, ...
    pub fn interleaved(&self) -> Vec<Point3<f64>> {
        self.residues
            .iter()
            .flat_map(|r| [r.n, r.ca, r.c])
            .collect()
    }
}

/// A covalently continuous stretch of a structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldedSegment {
    /// Residue indices into the source structure.
    pub residues: Range<usize>,
    /// One-letter sequence of the segment.
    pub sequence: String,
}

/// Groups sorted indices into runs of consecutive integers, each returned as a
/// half-open range.
pub fn group_consecutive(indices: &[usize]) -> Vec<Range<usize>> {
    let mut groups: Vec<Range<usize>> = Vec::new();
    for &index in indices {
        match groups.last_mut() {
            Some(group) if group.end == index => group.end = index + 1,
            _ => groups.push(index..index + 1),
        }
    }
    groups
}

/// Locates chain breaks and returns the continuous segments between them.
///
/// Returns `Ok(None)` when every consecutive backbone distance is within
/// [`BACKBONE_BREAK_DISTANCE`].
#[instrument(skip_all, name = "break_detection")]
pub fn detect_folded_segments(
    structure: &Structure,
) -> Result<Option<Vec<FoldedSegment>>, EngineError> {
    let trace = BackboneTrace::from_structure(structure)?;
    let backbone = trace.interleaved();
    let distances: Vec<f64> = backbone
        .windows(2)
        .map(|pair| distance(&pair[0], &pair[1]))
        .collect();

    if !distances.iter().any(|&d| d > BACKBONE_BREAK_DISTANCE) {
        debug!(residues = trace.len(), "Backbone is continuous.");
        return Ok(None);
    }

    let bonded: Vec<usize> = distances
        .iter()
        .enumerate()
        .filter_map(|(i, &d)| (d < BACKBONE_BREAK_DISTANCE).then_some(i))
        .collect();

    let segments: Vec<FoldedSegment> = group_consecutive(&bonded)
        .into_iter()
        .filter_map(|run| {
            let members: Vec<usize> = run
                .step_by(3)
                .filter_map(|atom| trace.get(atom / 3).map(|r| r.residue_index))
                .collect();
            let (&first, &last) = (members.first()?, members.last()?);
            let sequence = members
                .iter()
                .map(|&index| one_letter_code(structure.residue_name(index).unwrap_or_default()))
                .collect();
            Some(FoldedSegment {
                residues: first..last + 1,
                sequence,
            })
        })
        .collect();

    info!(segments = segments.len(), "Chain breaks detected.");
    Ok(Some(segments))
}

/// One-letter sequences of the folded segments separated by chain breaks, or
/// `None` if the backbone is continuous.
pub fn detect_breaks(structure: &Structure) -> Result<Option<Vec<String>>, EngineError> {
    Ok(detect_folded_segments(structure)?
        .map(|segments| segments.into_iter().map(|s| s.sequence).collect()))
}
