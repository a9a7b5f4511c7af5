use crate::core::forcefield::vdw::VdwRadii;
use crate::core::models::structure::Structure;
use crate::engine::alignment::{AnchorEnd, AnchorFrame, align_at};
use crate::engine::breaks::detect_folded_segments;
use crate::engine::bridge::{BreakCloser, BridgeMatch, BridgeSummary, NamedFragment};
use crate::engine::clash::ClashDetector;
use crate::engine::config::GraftConfig;
use crate::engine::error::EngineError;
use crate::engine::graft::{ChainBreakBoundary, GraftAssembler, GraftPlan};
use crate::engine::progress::{Progress, ProgressReporter};
use itertools::Itertools;
use tracing::{info, instrument, warn};

/// An internal chain break, given as residue indices of the folded structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BreakSite {
    /// Last residue before the gap.
    pub last_before: usize,
    /// First residue after the gap.
    pub first_after: usize,
}

impl BreakSite {
    /// Anchor the C-side fragment's leading end is placed on: C of the residue
    /// before `last_before`, N and CA of `last_before`.
    pub fn c_side_anchor(&self, folded: &Structure) -> Result<AnchorFrame, EngineError> {
        let carbonyl = self.last_before.checked_sub(1).ok_or(EngineError::InsufficientResidues {
            what: "residues before the break",
            required: 2,
            found: self.last_before + 1,
        })?;
        AnchorFrame::spanning(folded, carbonyl)
    }

    /// Anchor the N-side candidates' trailing end is placed on: C of
    /// `first_after`, N and CA of the residue after it.
    pub fn n_side_anchor(&self, folded: &Structure) -> Result<AnchorFrame, EngineError> {
        AnchorFrame::spanning(folded, self.first_after)
    }

    /// Folded residues retained around a bridge: the one preceding
    /// `last_before`, and the second residue after `first_after`. Everything
    /// between them is overlaid by the aligned bridge.
    pub fn boundary(&self, folded: &Structure) -> Result<ChainBreakBoundary, EngineError> {
        let found = folded.residue_count();
        let upper_index = self.first_after + 2;
        let lower = self
            .last_before
            .checked_sub(1)
            .and_then(|index| folded.residue_number(index));
        let upper = folded.residue_number(upper_index);
        match (lower, upper) {
            (Some(lower), Some(upper)) => Ok(ChainBreakBoundary::new(lower, upper)),
            _ => Err(EngineError::InsufficientResidues {
                what: "folded structure around the break",
                required: upper_index + 1,
                found,
            }),
        }
    }
}

/// Every chain break of `folded`, in chain order.
pub fn find_break_sites(folded: &Structure) -> Result<Vec<BreakSite>, EngineError> {
    let Some(segments) = detect_folded_segments(folded)? else {
        return Ok(Vec::new());
    };
    Ok(segments
        .iter()
        .tuple_windows()
        .map(|(before, after)| BreakSite {
            last_before: before.residues.end - 1,
            first_after: after.residues.start,
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq)]
pub struct BridgeGapReport {
    /// Folded structures with the break closed, keyed by bridge name.
    pub grafts: Vec<(String, Structure)>,
    pub summary: BridgeSummary,
    /// Accepted bridges that did not fit the gap.
    pub skipped: usize,
}

/// Closes the chain break at `site` and grafts every accepted bridge.
///
/// `c_side` is aligned onto the residues preceding the gap and every library
/// candidate onto the residues following it. The break closer then joins them
/// and each resulting bridge replaces the folded residues strictly between
/// the [`BreakSite::boundary`] residues. Bridges whose length does not match
/// the gap are logged and skipped.
#[instrument(skip_all, name = "bridge_workflow", fields(c_side = %c_side.name, library = library.len()))]
pub fn bridge_gap(
    folded: &Structure,
    site: BreakSite,
    c_side: &NamedFragment,
    library: &[NamedFragment],
    config: &GraftConfig,
    radii: &VdwRadii,
    reporter: &ProgressReporter,
) -> Result<BridgeGapReport, EngineError> {
    let boundary = site.boundary(folded)?;
    let c_target = site.c_side_anchor(folded)?;
    let n_target = site.n_side_anchor(folded)?;

    let placed_c_side = NamedFragment::new(
        c_side.name.clone(),
        align_at(&c_side.structure, &c_target, AnchorEnd::Leading)?,
    );
    let placed_library = library
        .iter()
        .map(|candidate| {
            align_at(&candidate.structure, &n_target, AnchorEnd::Trailing)
                .map(|structure| NamedFragment::new(candidate.name.clone(), structure))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut bridges: Vec<BridgeMatch> = Vec::new();
    let summary = BreakCloser::new(ClashDetector::new(radii), config.clash_budget)
        .with_limits(config.bridge)
        .with_labels(config.chain_id, &config.segment_id)
        .with_reporter(reporter)
        .close(&placed_c_side, &placed_library, &mut bridges)?;

    let assembler = GraftAssembler::new(config.chain_id, &config.segment_id);
    let mut grafts = Vec::with_capacity(bridges.len());
    let mut skipped = 0;
    for bridge in bridges {
        let plan = GraftPlan::Break {
            fragment: &bridge.structure,
            boundary,
        };
        match assembler.graft(&plan, folded) {
            Ok(structure) => grafts.push((bridge.name, structure)),
            Err(EngineError::BoundaryMismatch { reason, .. }) => {
                warn!(name = %bridge.name, %reason, "Bridge does not fit the gap; skipping.");
                skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    reporter.report(Progress::Message(format!(
        "{} of {} bridges grafted",
        grafts.len(),
        summary.matches
    )));
    info!(grafts = grafts.len(), skipped, "Chain break bridged.");
    Ok(BridgeGapReport {
        grafts,
        summary,
        skipped,
    })
}
