use crate::core::forcefield::vdw::VdwRadii;
use crate::core::models::atom::AtomRecord;
use crate::core::models::structure::{ResidueWindow, Structure};
use crate::core::utils::geometry::distance;
use crate::engine::alignment::DisorderCase;
use crate::engine::config::ClashBudget;
use crate::engine::error::EngineError;
use tracing::{instrument, trace};

/// Residues at the joining end of a single-sided graft excluded from clash counting.
pub const TERMINAL_JUNCTION_RESIDUES: usize = 1;
/// Residues at the joining end of a bridged fragment excluded from clash counting.
pub const BRIDGE_JUNCTION_RESIDUES: usize = 3;

/// Result of a clash check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClashCount {
    /// Exact number of clashes, at most the budget's `max_clash`.
    Within(usize),
    /// The count passed `max_clash` and the check stopped early.
    Exceeded,
}

impl ClashCount {
    pub fn is_exceeded(&self) -> bool {
        matches!(self, ClashCount::Exceeded)
    }

    pub fn count(&self) -> Option<usize> {
        match self {
            ClashCount::Within(n) => Some(*n),
            ClashCount::Exceeded => None,
        }
    }
}

/// The part of `fragment` that takes part in clash counting for `case`.
///
/// Residues at the junction overlap the partner structure by construction and
/// are dropped: trailing residues for N-terminal and break fragments, the
/// leading residue for C-terminal ones.
pub fn clash_window(fragment: &Structure, case: DisorderCase) -> ResidueWindow<'_> {
    trim_junction(fragment.window(), case)
}

/// Applies the junction trimming of [`clash_window`] to an existing window.
pub fn trim_junction(window: ResidueWindow<'_>, case: DisorderCase) -> ResidueWindow<'_> {
    match case {
        DisorderCase::NTerminal => window.drop_last(TERMINAL_JUNCTION_RESIDUES),
        DisorderCase::Break => window.drop_last(BRIDGE_JUNCTION_RESIDUES),
        DisorderCase::CTerminal => window.drop_first(TERMINAL_JUNCTION_RESIDUES),
    }
}

/// Counts steric overlaps between atom sets using van der Waals radii.
#[derive(Debug, Clone, Copy)]
pub struct ClashDetector<'a> {
    radii: &'a VdwRadii,
}

impl<'a> ClashDetector<'a> {
    pub fn new(radii: &'a VdwRadii) -> Self {
        Self { radii }
    }

    /// Counts clashes between the junction-trimmed `fragment` and `parent`.
    ///
    /// A pair clashes when its distance is below the sum of both radii plus
    /// the budget's distance tolerance. The check returns
    /// [`ClashCount::Exceeded`] as soon as the running count passes
    /// `budget.max_clash`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownElement`] for an atom whose element has no
    /// radius. Parent atoms are only looked up once they are reached, so an
    /// early exit can happen before an unknown parent element is seen.
    #[instrument(level = "trace", skip_all, name = "clash_check", fields(case = ?case))]
    pub fn count(
        &self,
        fragment: &Structure,
        parent: &Structure,
        case: DisorderCase,
        budget: &ClashBudget,
    ) -> Result<ClashCount, EngineError> {
        self.count_window(fragment.window(), parent.atoms(), case, budget)
    }

    /// Like [`ClashDetector::count`] for a fragment that is itself a window.
    pub fn count_window(
        &self,
        fragment: ResidueWindow<'_>,
        parent: &[AtomRecord],
        case: DisorderCase,
        budget: &ClashBudget,
    ) -> Result<ClashCount, EngineError> {
        self.count_atoms(trim_junction(fragment, case).atoms(), parent, budget)
    }

    /// Counts clashes between two plain atom slices, without any trimming.
    pub fn count_atoms(
        &self,
        fragment: &[AtomRecord],
        parent: &[AtomRecord],
        budget: &ClashBudget,
    ) -> Result<ClashCount, EngineError> {
        if fragment.is_empty() {
            return Ok(ClashCount::Within(0));
        }
        let fragment_radii = fragment
            .iter()
            .map(|atom| self.radius(atom))
            .collect::<Result<Vec<_>, _>>()?;

        let mut clashes = 0usize;
        for parent_atom in parent {
            let parent_radius = self.radius(parent_atom)?;
            for (atom, radius) in fragment.iter().zip(&fragment_radii) {
                let limit = parent_radius + radius + budget.distance_tolerance;
                if distance(&parent_atom.position, &atom.position) < limit {
                    clashes += 1;
                    if clashes > budget.max_clash {
                        trace!(max_clash = budget.max_clash, "Clash budget exceeded.");
                        return Ok(ClashCount::Exceeded);
                    }
                }
            }
        }
        trace!(clashes, "Clash check complete.");
        Ok(ClashCount::Within(clashes))
    }

    fn radius(&self, atom: &AtomRecord) -> Result<f64, EngineError> {
        self.radii
            .radius(&atom.element)
            .ok_or_else(|| EngineError::UnknownElement {
                element: atom.element.clone(),
            })
    }
}

/// Clash check with the built-in Tsai (1999) radii.
pub fn count_clashes(
    fragment: &Structure,
    parent: &Structure,
    case: DisorderCase,
    budget: &ClashBudget,
) -> Result<ClashCount, EngineError> {
    let radii = VdwRadii::tsai_1999();
    ClashDetector::new(&radii).count(fragment, parent, case, budget)
}
