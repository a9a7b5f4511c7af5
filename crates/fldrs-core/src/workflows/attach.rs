use crate::core::forcefield::vdw::VdwRadii;
use crate::core::models::atom::AtomRecord;
use crate::core::models::structure::Structure;
use crate::engine::alignment::{AnchorFrame, DisorderCase, align};
use crate::engine::clash::{ClashCount, ClashDetector};
use crate::engine::config::GraftConfig;
use crate::engine::error::EngineError;
use crate::engine::graft::{GraftAssembler, GraftPlan};
use crate::engine::rotation::{RetryOutcome, RotationRetryLoop};
use rand::Rng;
use tracing::{info, instrument};

/// The terminus of the folded structure a disordered tail is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terminus {
    N,
    C,
}

impl Terminus {
    pub fn case(self) -> DisorderCase {
        match self {
            Terminus::N => DisorderCase::NTerminal,
            Terminus::C => DisorderCase::CTerminal,
        }
    }
}

/// A folded structure with one or both disordered tails attached.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachedGraft {
    pub structure: Structure,
    /// Clashes counted for the accepted orientation(s).
    pub clashes: usize,
    /// Orientations tried in total.
    pub attempts: usize,
}

/// Atoms of `parent` that survive grafting a tail at `terminus`. The junction
/// residue is replaced by the tail and takes no part in clash checks.
fn retained_atoms(parent: &Structure, terminus: Terminus) -> &[AtomRecord] {
    match terminus {
        Terminus::N => parent.window().drop_first(1).atoms(),
        Terminus::C => parent.window().drop_last(1).atoms(),
    }
}

/// Aligns `fragment` onto the anchor at `terminus`, spins it until it clears
/// the retained part of `parent`, and returns the accepted orientation.
fn place_tail<R: Rng>(
    fragment: &Structure,
    folded: &Structure,
    parent: &Structure,
    terminus: Terminus,
    config: &GraftConfig,
    detector: ClashDetector<'_>,
    rng: &mut R,
) -> Result<RetryOutcome, EngineError> {
    let case = terminus.case();
    let target = AnchorFrame::of(folded, case.folded_anchor_end())?;
    let aligned = align(fragment, &target, case)?;
    RotationRetryLoop::new(detector, config.clash_budget, config.max_rotations).run_against(
        &aligned,
        retained_atoms(parent, terminus),
        case,
        rng,
    )
}

/// Attaches one disordered tail to `folded`.
///
/// Returns `Ok(None)` when no orientation within `config.max_rotations`
/// attempts satisfies the clash budget.
#[instrument(skip_all, name = "attach_workflow", fields(terminus = ?terminus))]
pub fn attach_terminal<R: Rng>(
    fragment: &Structure,
    folded: &Structure,
    terminus: Terminus,
    config: &GraftConfig,
    radii: &VdwRadii,
    rng: &mut R,
) -> Result<Option<AttachedGraft>, EngineError> {
    let detector = ClashDetector::new(radii);
    let outcome = place_tail(fragment, folded, folded, terminus, config, detector, rng)?;
    let ClashCount::Within(clashes) = outcome.clashes else {
        info!(attempts = outcome.attempts, "No clash-free orientation found.");
        return Ok(None);
    };

    let plan = match terminus {
        Terminus::N => GraftPlan::NTerminal {
            fragment: &outcome.fragment,
        },
        Terminus::C => GraftPlan::CTerminal {
            fragment: &outcome.fragment,
        },
    };
    let structure = GraftAssembler::new(config.chain_id, &config.segment_id).graft(&plan, folded)?;
    Ok(Some(AttachedGraft {
        structure,
        clashes,
        attempts: outcome.attempts,
    }))
}

/// Attaches an N-terminal and a C-terminal tail to `folded`.
///
/// The N-terminal tail is placed first. The C-terminal tail is then checked
/// against the folded structure with the N-terminal tail already attached,
/// minus the C-terminal junction residue.
/// Returns `Ok(None)` if either tail finds no acceptable orientation.
#[instrument(skip_all, name = "attach_both_workflow")]
pub fn attach_both_termini<R: Rng>(
    n_fragment: &Structure,
    c_fragment: &Structure,
    folded: &Structure,
    config: &GraftConfig,
    radii: &VdwRadii,
    rng: &mut R,
) -> Result<Option<AttachedGraft>, EngineError> {
    let detector = ClashDetector::new(radii);
    let assembler = GraftAssembler::new(config.chain_id, &config.segment_id);

    let n_outcome = place_tail(n_fragment, folded, folded, Terminus::N, config, detector, rng)?;
    let ClashCount::Within(n_clashes) = n_outcome.clashes else {
        info!(attempts = n_outcome.attempts, "N-terminal tail rejected.");
        return Ok(None);
    };
    let with_n = assembler.graft(
        &GraftPlan::NTerminal {
            fragment: &n_outcome.fragment,
        },
        folded,
    )?;

    let c_outcome = place_tail(c_fragment, folded, &with_n, Terminus::C, config, detector, rng)?;
    let attempts = n_outcome.attempts + c_outcome.attempts;
    let ClashCount::Within(c_clashes) = c_outcome.clashes else {
        info!(attempts, "C-terminal tail rejected.");
        return Ok(None);
    };

    let structure = assembler.graft(
        &GraftPlan::NAndCTerminal {
            n_fragment: &n_outcome.fragment,
            c_fragment: &c_outcome.fragment,
        },
        folded,
    )?;
    Ok(Some(AttachedGraft {
        structure,
        clashes: n_clashes + c_clashes,
        attempts,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::utils::geometry::distance;
    use crate::engine::config::{ClashBudget, GraftConfigBuilder};
    use crate::test_support::{chain, residue_numbers};
    use nalgebra::{Rotation3, Vector3};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn config(budget: ClashBudget, max_rotations: usize) -> GraftConfig {
        GraftConfigBuilder::new()
            .tolerance(0.5)
            .clash_budget(budget)
            .max_rotations(max_rotations)
            .build()
            .unwrap()
    }

    fn tumbled_chain(count: usize) -> Structure {
        let mut structure = chain(1, count, Vector3::zeros());
        let rotation = Rotation3::from_euler_angles(0.3, 1.2, -2.0);
        structure.transform_positions(|p| rotation * p + Vector3::new(40.0, -12.0, 7.0));
        structure
    }

    fn peptide_bond(structure: &Structure, carbonyl_residue: usize) -> f64 {
        let c = structure.find_atom(carbonyl_residue, "C").unwrap().1.position;
        let n = structure.find_atom(carbonyl_residue + 1, "N").unwrap().1.position;
        distance(&c, &n)
    }

    #[test]
    fn terminus_maps_to_disorder_case() {
        assert_eq!(Terminus::N.case(), DisorderCase::NTerminal);
        assert_eq!(Terminus::C.case(), DisorderCase::CTerminal);
    }

    #[test]
    fn n_terminal_tail_is_bonded_to_folded_structure() {
        let folded = chain(10, 10, Vector3::zeros());
        let radii = VdwRadii::tsai_1999();
        let mut rng = StdRng::seed_from_u64(5);

        let graft = attach_terminal(
            &tumbled_chain(5),
            &folded,
            Terminus::N,
            &config(ClashBudget::new(1_000, 0.0), 8),
            &radii,
            &mut rng,
        )
        .unwrap()
        .unwrap();

        assert_eq!(graft.attempts, 1);
        assert_eq!(residue_numbers(&graft.structure), (7..=19).collect::<Vec<_>>());
        assert!((peptide_bond(&graft.structure, 3) - 1.44).abs() < 1e-2);
        assert_eq!(graft.structure.atoms()[0].serial, 1);
    }

    #[test]
    fn c_terminal_tail_continues_numbering() {
        let folded = chain(10, 10, Vector3::zeros());
        let radii = VdwRadii::tsai_1999();
        let mut rng = StdRng::seed_from_u64(9);

        let graft = attach_terminal(
            &tumbled_chain(4),
            &folded,
            Terminus::C,
            &config(ClashBudget::new(1_000, 0.0), 8),
            &radii,
            &mut rng,
        )
        .unwrap()
        .unwrap();

        assert_eq!(residue_numbers(&graft.structure), (10..=21).collect::<Vec<_>>());
        assert!((peptide_bond(&graft.structure, 8) - 1.44).abs() < 1e-2);
    }

    #[test]
    fn strict_tolerance_attaches_both_termini() {
        let folded = chain(10, 10, Vector3::zeros());
        let radii = VdwRadii::tsai_1999();
        let strict = GraftConfigBuilder::new().tolerance(0.1).build().unwrap();
        assert_eq!(strict.clash_budget.max_clash, 8);

        for (terminus, seed) in [(Terminus::C, 31), (Terminus::N, 32)] {
            let graft = attach_terminal(
                &tumbled_chain(4),
                &folded,
                terminus,
                &strict,
                &radii,
                &mut StdRng::seed_from_u64(seed),
            )
            .unwrap();

            let graft = graft.unwrap_or_else(|| panic!("{terminus:?} tail was rejected"));
            assert!(graft.clashes <= 8);
        }
    }

    #[test]
    fn junction_residue_is_left_out_of_the_clash_parent() {
        let folded = chain(10, 10, Vector3::zeros());

        let n_side = retained_atoms(&folded, Terminus::N);
        let c_side = retained_atoms(&folded, Terminus::C);

        assert_eq!(n_side.first().map(|a| a.residue_number), Some(11));
        assert_eq!(c_side.last().map(|a| a.residue_number), Some(18));
        assert_eq!(n_side.len(), folded.len() - 5);
    }

    #[test]
    fn tail_that_always_clashes_is_rejected() {
        // The junction carbonyl carbon stays bonded to a folded nitrogen in
        // every orientation, so a zero budget can never be met.
        let folded = chain(10, 10, Vector3::zeros());
        let radii = VdwRadii::tsai_1999();
        let mut rng = StdRng::seed_from_u64(1);

        let result = attach_terminal(
            &tumbled_chain(5),
            &folded,
            Terminus::N,
            &config(ClashBudget::new(0, 0.0), 3),
            &radii,
            &mut rng,
        )
        .unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn both_tails_match_separate_splices() {
        let folded = chain(10, 10, Vector3::zeros());
        let radii = VdwRadii::tsai_1999();
        let mut rng = StdRng::seed_from_u64(21);

        let graft = attach_both_termini(
            &tumbled_chain(5),
            &tumbled_chain(4),
            &folded,
            &config(ClashBudget::new(1_000, 0.0), 4),
            &radii,
            &mut rng,
        )
        .unwrap()
        .unwrap();

        assert_eq!(graft.attempts, 2);
        assert_eq!(residue_numbers(&graft.structure), (7..=21).collect::<Vec<_>>());
        assert!((peptide_bond(&graft.structure, 3) - 1.44).abs() < 1e-2);
        assert!((peptide_bond(&graft.structure, 11) - 1.44).abs() < 1e-2);
    }

    #[test]
    fn short_folded_structure_is_an_error() {
        let folded = chain(1, 1, Vector3::zeros());
        let radii = VdwRadii::tsai_1999();
        let mut rng = StdRng::seed_from_u64(0);

        let result = attach_terminal(
            &tumbled_chain(3),
            &folded,
            Terminus::C,
            &config(ClashBudget::new(10, 0.0), 2),
            &radii,
            &mut rng,
        );

        assert!(matches!(result, Err(EngineError::InsufficientResidues { .. })));
    }
}
