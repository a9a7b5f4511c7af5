use crate::core::models::atom::AtomRecord;
use crate::core::models::structure::Structure;
use crate::engine::config::{DEFAULT_CHAIN_ID, DEFAULT_SEGMENT_ID};
use crate::engine::error::EngineError;
use tracing::{debug, info, instrument};

/// Residue numbers of the folded residues kept on either side of a chain break.
///
/// Folded residues numbered strictly between `lower` and `upper` are replaced
/// by the grafted fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainBreakBoundary {
    pub lower: isize,
    pub upper: isize,
}

impl ChainBreakBoundary {
    pub fn new(lower: isize, upper: isize) -> Self {
        Self { lower, upper }
    }

    /// Number of residues a fragment must supply to fill the gap.
    pub fn gap_len(&self) -> usize {
        (self.upper - self.lower - 1).max(0) as usize
    }

    fn mismatch(&self, reason: impl Into<String>) -> EngineError {
        EngineError::BoundaryMismatch {
            lower: self.lower,
            upper: self.upper,
            reason: reason.into(),
        }
    }
}

/// What to splice onto a folded structure.
#[derive(Debug, Clone, Copy)]
pub enum GraftPlan<'a> {
    NTerminal {
        fragment: &'a Structure,
    },
    Break {
        fragment: &'a Structure,
        boundary: ChainBreakBoundary,
    },
    CTerminal {
        fragment: &'a Structure,
    },
    NAndCTerminal {
        n_fragment: &'a Structure,
        c_fragment: &'a Structure,
    },
}

/// Deterministic splicing of aligned fragments into folded structures.
///
/// Every splice drops the duplicated junction residue on both sides, renumbers
/// the fragment so residue numbers run on without gaps, and finally resets
/// serials to `1..=N` and all chain and segment identifiers to the assembler's
/// labels. Atom order inside residues is never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraftAssembler {
    chain_id: char,
    segment_id: String,
}

impl Default for GraftAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_CHAIN_ID, DEFAULT_SEGMENT_ID)
    }
}

impl GraftAssembler {
    pub fn new(chain_id: char, segment_id: &str) -> Self {
        Self {
            chain_id,
            segment_id: segment_id.to_string(),
        }
    }

    #[instrument(skip_all, name = "graft_assembly")]
    pub fn graft(&self, plan: &GraftPlan<'_>, folded: &Structure) -> Result<Structure, EngineError> {
        let assembled = match *plan {
            GraftPlan::NTerminal { fragment } => self.splice_n_terminal(fragment, folded)?,
            GraftPlan::CTerminal { fragment } => self.splice_c_terminal(folded, fragment)?,
            GraftPlan::Break { fragment, boundary } => {
                self.splice_break(fragment, folded, &boundary)?
            }
            GraftPlan::NAndCTerminal {
                n_fragment,
                c_fragment,
            } => {
                let with_n = self.splice_n_terminal(n_fragment, folded)?;
                self.splice_c_terminal(&with_n, c_fragment)?
            }
        };
        info!(
            residues = assembled.residue_count(),
            atoms = assembled.len(),
            "Graft assembled."
        );
        Ok(assembled)
    }

    fn splice_n_terminal(
        &self,
        fragment: &Structure,
        folded: &Structure,
    ) -> Result<Structure, EngineError> {
        require_residues("N-terminal fragment", fragment, 2)?;
        require_residues("folded structure", folded, 2)?;
        let kept_fragment = fragment.window().drop_last(1);
        let kept_folded = folded.window().drop_first(1);

        let first_folded = kept_folded.first_residue_number().unwrap_or_default();
        let first_number = first_folded - kept_fragment.residue_count() as isize;
        debug!(first_number, "Prepending N-terminal fragment.");

        let mut atoms = kept_fragment.to_renumbered(first_number);
        atoms.extend_from_slice(kept_folded.atoms());
        self.assemble(atoms)
    }

    fn splice_c_terminal(
        &self,
        folded: &Structure,
        fragment: &Structure,
    ) -> Result<Structure, EngineError> {
        require_residues("C-terminal fragment", fragment, 2)?;
        require_residues("folded structure", folded, 2)?;
        let kept_folded = folded.window().drop_last(1);
        let kept_fragment = fragment.window().drop_first(1);

        let first_number = kept_folded.last_residue_number().unwrap_or_default() + 1;
        debug!(first_number, "Appending C-terminal fragment.");

        let mut atoms = kept_folded.atoms().to_vec();
        atoms.extend(kept_fragment.to_renumbered(first_number));
        self.assemble(atoms)
    }

    fn splice_break(
        &self,
        fragment: &Structure,
        folded: &Structure,
        boundary: &ChainBreakBoundary,
    ) -> Result<Structure, EngineError> {
        if boundary.lower >= boundary.upper {
            return Err(boundary.mismatch("lower bound must precede upper bound"));
        }
        let lower = folded
            .find_residue(boundary.lower)
            .ok_or_else(|| boundary.mismatch("lower residue not found"))?;
        let upper = folded
            .find_residue(boundary.upper)
            .ok_or_else(|| boundary.mismatch("upper residue not found"))?;
        if upper <= lower {
            return Err(boundary.mismatch("upper residue precedes lower residue"));
        }

        let filler = fragment.window().drop_first(1);
        if filler.residue_count() != boundary.gap_len() {
            return Err(boundary.mismatch(format!(
                "fragment supplies {} residues for a gap of {}",
                filler.residue_count(),
                boundary.gap_len()
            )));
        }
        debug!(
            removed = upper - lower - 1,
            inserted = filler.residue_count(),
            "Filling chain break."
        );

        let whole = folded.window();
        let before = whole.keep_first(lower + 1);
        let after = whole.drop_first(upper);
        let mut atoms = before.atoms().to_vec();
        atoms.extend(filler.to_renumbered(boundary.lower + 1));
        atoms.extend_from_slice(after.atoms());
        self.assemble(atoms)
    }

    fn assemble(&self, mut atoms: Vec<AtomRecord>) -> Result<Structure, EngineError> {
        for atom in &mut atoms {
            atom.chain_id = self.chain_id;
        }
        let structure = Structure::from_atoms(atoms)?;
        Ok(canonicalize(structure, self.chain_id, &self.segment_id))
    }
}

fn require_residues(
    what: &'static str,
    structure: &Structure,
    required: usize,
) -> Result<(), EngineError> {
    let found = structure.residue_count();
    if found < required {
        return Err(EngineError::InsufficientResidues {
            what,
            required,
            found,
        });
    }
    Ok(())
}

/// Splices with the default chain `'A'` and segment `"A"`.
pub fn graft(plan: &GraftPlan<'_>, folded: &Structure) -> Result<Structure, EngineError> {
    GraftAssembler::default().graft(plan, folded)
}

/// Serials `1..=N` in array order, one chain and one segment identifier.
/// Applying it to an already canonical structure changes nothing.
pub fn canonicalize(mut structure: Structure, chain_id: char, segment_id: &str) -> Structure {
    structure.relabel(chain_id, segment_id);
    structure
}
