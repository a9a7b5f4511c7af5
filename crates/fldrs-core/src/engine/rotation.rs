use crate::core::models::atom::{AtomRecord, round_position};
use crate::core::models::structure::Structure;
use crate::core::utils::geometry::rotation_about_axis;
use crate::core::utils::identifiers::{ALPHA_CARBON, NITROGEN};
use crate::engine::alignment::{AnchorEnd, DisorderCase, anchor_atom};
use crate::engine::clash::{ClashCount, ClashDetector};
use crate::engine::config::ClashBudget;
use crate::engine::error::EngineError;
use rand::Rng;
use std::f64::consts::TAU;
use tracing::{debug, instrument, trace};

/// Rotates `fragment` by `angle` radians about its junction N-CA bond.
///
/// The bond belongs to the residue that overlaps the folded structure after
/// alignment (the last residue for N-terminal fragments, the second for the
/// others), so both junction atoms stay in place. Coordinates are rounded to 3
/// decimals.
pub fn rotate_about_pivot(
    fragment: &Structure,
    case: DisorderCase,
    angle: f64,
) -> Result<Structure, EngineError> {
    let count = fragment.residue_count();
    if count < 2 {
        return Err(EngineError::InsufficientResidues {
            what: "pivot rotation",
            required: 2,
            found: count,
        });
    }
    let junction = match case.fragment_anchor_end() {
        AnchorEnd::Leading => 1,
        AnchorEnd::Trailing => count - 1,
    };
    let n = anchor_atom(fragment, junction, NITROGEN)?;
    let pivot = anchor_atom(fragment, junction, ALPHA_CARBON)?;
    let isometry = rotation_about_axis(&n, &pivot, angle)?;

    let mut rotated = fragment.clone();
    rotated.transform_positions(|p| round_position(&(isometry * p)));
    Ok(rotated)
}

/// Final state of a rotation search.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryOutcome {
    /// The last orientation tried.
    pub fragment: Structure,
    /// Clash result for that orientation.
    pub clashes: ClashCount,
    /// Number of orientations tried.
    pub attempts: usize,
}

impl RetryOutcome {
    pub fn is_accepted(&self) -> bool {
        !self.clashes.is_exceeded()
    }
}

/// Spins a fragment about its junction until it clears the clash budget.
#[derive(Debug, Clone, Copy)]
pub struct RotationRetryLoop<'a> {
    detector: ClashDetector<'a>,
    budget: ClashBudget,
    max_attempts: usize,
}

impl<'a> RotationRetryLoop<'a> {
    /// `max_attempts` below 1 is raised to 1.
    pub fn new(detector: ClashDetector<'a>, budget: ClashBudget, max_attempts: usize) -> Self {
        Self {
            detector,
            budget,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Draws uniform angles in `[0, 2π)` and rotates `fragment` about its pivot
    /// until the clash check against `parent` passes.
    ///
    /// Every attempt starts again from the input orientation. Returns the first
    /// accepted orientation, or the last rejected one once `max_attempts` is
    /// used up.
    pub fn run<R: Rng>(
        &self,
        fragment: &Structure,
        parent: &Structure,
        case: DisorderCase,
        rng: &mut R,
    ) -> Result<RetryOutcome, EngineError> {
        self.run_against(fragment, parent.atoms(), case, rng)
    }

    /// Like [`RotationRetryLoop::run`] with the parent given as a plain atom
    /// slice, e.g. the part of a structure that survives grafting.
    #[instrument(skip_all, name = "rotation_retry", fields(case = ?case, max_attempts = self.max_attempts))]
    pub fn run_against<R: Rng>(
        &self,
        fragment: &Structure,
        parent: &[AtomRecord],
        case: DisorderCase,
        rng: &mut R,
    ) -> Result<RetryOutcome, EngineError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let angle = rng.gen_range(0.0..TAU);
            let rotated = rotate_about_pivot(fragment, case, angle)?;
            let clashes = self
                .detector
                .count_window(rotated.window(), parent, case, &self.budget)?;
            trace!(attempt, angle, ?clashes, "Rotation attempt.");

            if !clashes.is_exceeded() || attempt >= self.max_attempts {
                debug!(attempts = attempt, ?clashes, "Rotation search finished.");
                return Ok(RetryOutcome {
                    fragment: rotated,
                    clashes,
                    attempts: attempt,
                });
            }
        }
    }
}

/// Convenience wrapper around [`RotationRetryLoop`].
pub fn rotate_until_clear<R: Rng>(
    fragment: &Structure,
    parent: &Structure,
    case: DisorderCase,
    detector: ClashDetector<'_>,
    budget: ClashBudget,
    max_attempts: usize,
    rng: &mut R,
) -> Result<RetryOutcome, EngineError> {
    RotationRetryLoop::new(detector, budget, max_attempts).run(fragment, parent, case, rng)
}
