use crate::core::forcefield::vdw::VdwRadii;
use crate::core::models::atom::{AtomRecord, round_position};
use crate::core::models::structure::Structure;
use crate::core::utils::geometry::{bond_angle, distance, external_bisector_position};
use crate::core::utils::identifiers::{AMIDE_HYDROGEN, CARBONYL_OXYGEN};
use crate::engine::alignment::DisorderCase;
use crate::engine::breaks::{BackboneResidue, BackboneTrace};
use crate::engine::clash::{ClashCount, ClashDetector};
use crate::engine::config::{BridgeSearchLimits, ClashBudget, DEFAULT_CHAIN_ID, DEFAULT_SEGMENT_ID};
use crate::engine::error::EngineError;
use crate::engine::graft::canonicalize;
use crate::engine::progress::{Progress, ProgressReporter};
use std::error::Error;
use std::ops::RangeInclusive;
use std::time::Instant;
use tracing::{debug, info, instrument, trace, warn};

/// Accepted C-N peptide bond length in Angstroms.
pub const PEPTIDE_BOND_RANGE: RangeInclusive<f64> = 1.32..=1.56;
/// Accepted CA-C-N angle in radians.
pub const CARBONYL_ANGLE_RANGE: RangeInclusive<f64> = 1.91..=2.15;
/// Accepted C···CA distance across the peptide bond in Angstroms.
pub const CARBON_REACH_RANGE: RangeInclusive<f64> = 2.2..=2.7;
/// N-H bond length used when rebuilding the junction hydrogen.
pub const AMIDE_HYDROGEN_LENGTH: f64 = 1.0;

/// A fragment together with the name used to label bridges built from it.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedFragment {
    pub name: String,
    pub structure: Structure,
}

impl NamedFragment {
    pub fn new(name: impl Into<String>, structure: Structure) -> Self {
        Self {
            name: name.into(),
            structure,
        }
    }
}

/// A merged fragment that closes a chain break.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeMatch {
    /// `"{c_side}+{candidate}"`.
    pub name: String,
    pub structure: Structure,
    /// Residue index in the C-side fragment where the candidate takes over.
    pub junction_offset: usize,
    pub clashes: usize,
}

/// Destination for accepted bridges.
pub trait BridgeSink {
    fn accept(&mut self, bridge: BridgeMatch) -> Result<(), Box<dyn Error + Send + Sync>>;
}

impl BridgeSink for Vec<BridgeMatch> {
    fn accept(&mut self, bridge: BridgeMatch) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.push(bridge);
        Ok(())
    }
}

/// Why a bridge search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStop {
    Exhausted,
    CandidateLimit,
    TimeLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeSummary {
    pub matches: usize,
    pub candidates_examined: usize,
    pub stop: SearchStop,
}

/// Geometry of a prospective peptide bond between two fragments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JunctionGeometry {
    pub bond_length: f64,
    pub carbonyl_angle: f64,
    pub carbon_reach: f64,
}

impl JunctionGeometry {
    /// Measures the bond from `carbonyl`'s C to `amide`'s N.
    pub fn measure(carbonyl: &BackboneResidue, amide: &BackboneResidue) -> Result<Self, EngineError> {
        Ok(Self {
            bond_length: distance(&carbonyl.c, &amide.n),
            carbonyl_angle: bond_angle(&carbonyl.ca, &carbonyl.c, &amide.n)?,
            carbon_reach: distance(&carbonyl.c, &amide.ca),
        })
    }

    pub fn is_valid(&self) -> bool {
        PEPTIDE_BOND_RANGE.contains(&self.bond_length)
            && CARBONYL_ANGLE_RANGE.contains(&self.carbonyl_angle)
            && CARBON_REACH_RANGE.contains(&self.carbon_reach)
    }
}

/// Sliding-window search joining a C-side fragment to N-side candidates.
pub struct BreakCloser<'a> {
    detector: ClashDetector<'a>,
    budget: ClashBudget,
    limits: BridgeSearchLimits,
    chain_id: char,
    segment_id: String,
    reporter: Option<&'a ProgressReporter<'a>>,
}

impl<'a> BreakCloser<'a> {
    pub fn new(detector: ClashDetector<'a>, budget: ClashBudget) -> Self {
        Self {
            detector,
            budget,
            limits: BridgeSearchLimits::default(),
            chain_id: DEFAULT_CHAIN_ID,
            segment_id: DEFAULT_SEGMENT_ID.to_string(),
            reporter: None,
        }
    }

    pub fn with_limits(mut self, limits: BridgeSearchLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Chain and segment identifiers written onto every bridge.
    pub fn with_labels(mut self, chain_id: char, segment_id: &str) -> Self {
        self.chain_id = chain_id;
        self.segment_id = segment_id.to_string();
        self
    }

    pub fn with_reporter(mut self, reporter: &'a ProgressReporter<'a>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    fn report(&self, event: Progress) {
        if let Some(reporter) = self.reporter {
            reporter.report(event);
        }
    }

    /// Tries every candidate in `library` against `c_side` and hands each
    /// accepted bridge to `sink`.
    ///
    /// For a candidate, offsets `i = 0, 1, ...` are walked while the candidate
    /// has a residue `i + 1`; the first offset whose junction geometry is valid
    /// is the only one considered. The bridge keeps residues `0..=i` of the
    /// C-side fragment followed by the candidate from residue `i + 1`, and is
    /// accepted when the C-side part stays within the clash budget against the
    /// candidate part.
    ///
    /// # Errors
    ///
    /// Fails on malformed backbones, degenerate junction geometry, unknown
    /// elements, or when the sink rejects a bridge. Finding no bridge is not an
    /// error. A single candidate whose amide N coincides with a C-side carbonyl
    /// C aborts the whole search with [`EngineError::Geometry`]; bridges already
    /// handed to `sink` stay there.
    #[instrument(skip_all, name = "break_closing", fields(c_side = %c_side.name, library = library.len()))]
    pub fn close<S: BridgeSink + ?Sized>(
        &self,
        c_side: &NamedFragment,
        library: &[NamedFragment],
        sink: &mut S,
    ) -> Result<BridgeSummary, EngineError> {
        let started = Instant::now();
        let c_trace = BackboneTrace::from_structure(&c_side.structure)?;
        self.report(Progress::SearchStart {
            total_candidates: library.len(),
        });

        let mut matches = 0;
        let mut examined = 0;
        let mut stop = SearchStop::Exhausted;
        for candidate in library {
            if self.limits.max_candidates.is_some_and(|max| examined >= max) {
                warn!(examined, "Candidate limit reached; stopping bridge search.");
                stop = SearchStop::CandidateLimit;
                break;
            }
            if self.limits.time_limit.is_some_and(|limit| started.elapsed() >= limit) {
                warn!(examined, "Time limit reached; stopping bridge search.");
                stop = SearchStop::TimeLimit;
                break;
            }

            examined += 1;
            if let Some(bridge) = self.try_candidate(c_side, &c_trace, candidate)? {
                debug!(name = %bridge.name, offset = bridge.junction_offset, "Bridge accepted.");
                self.report(Progress::MatchAccepted {
                    name: bridge.name.clone(),
                });
                sink.accept(bridge)
                    .map_err(|source| EngineError::Sink { source })?;
                matches += 1;
            }
            self.report(Progress::CandidateExamined);
        }

        self.report(Progress::SearchFinish { matches });
        info!(matches, examined, "Bridge search complete.");
        Ok(BridgeSummary {
            matches,
            candidates_examined: examined,
            stop,
        })
    }

    fn try_candidate(
        &self,
        c_side: &NamedFragment,
        c_trace: &BackboneTrace,
        candidate: &NamedFragment,
    ) -> Result<Option<BridgeMatch>, EngineError> {
        let n_trace = BackboneTrace::from_structure(&candidate.structure)?;

        let mut junction = None;
        for (offset, carbonyl) in c_trace.residues().iter().enumerate() {
            let Some(amide) = n_trace.get(offset + 1) else {
                break;
            };
            let geometry = JunctionGeometry::measure(carbonyl, amide)?;
            trace!(offset, ?geometry, "Junction gates evaluated.");
            if geometry.is_valid() {
                junction = Some((offset, carbonyl, amide));
                break;
            }
        }
        let Some((offset, carbonyl, amide)) = junction else {
            debug!(candidate = %candidate.name, "No valid junction.");
            return Ok(None);
        };

        let c_part = c_side.structure.window().keep_first(carbonyl.residue_index + 1);
        let n_part = candidate.structure.window().drop_first(amide.residue_index);
        let clashes = self
            .detector
            .count_window(c_part, n_part.atoms(), DisorderCase::Break, &self.budget)?;
        let ClashCount::Within(clashes) = clashes else {
            debug!(candidate = %candidate.name, offset, "Bridge rejected by clash budget.");
            return Ok(None);
        };

        let next_number = c_part.last_residue_number().map_or(1, |n| n + 1);
        let mut atoms: Vec<AtomRecord> = c_part.atoms().to_vec();
        atoms.extend(n_part.to_renumbered(next_number));
        let mut merged = Structure::from_atoms(atoms)?;
        repair_junction(&mut merged, carbonyl, amide)?;
        let merged = canonicalize(merged, self.chain_id, &self.segment_id);

        Ok(Some(BridgeMatch {
            name: format!("{}+{}", c_side.name, candidate.name),
            structure: merged,
            junction_offset: offset,
            clashes,
        }))
    }
}

/// Rebuilds the carbonyl O before the new peptide bond and the amide H after it.
///
/// `carbonyl` is the last C-side residue, which is also the residue at the
/// same index in `merged`; the candidate residue follows it. Each atom goes on
/// the external bisector of its in-plane bond angle: O at the C-side C=O
/// length, H at [`AMIDE_HYDROGEN_LENGTH`]. Missing O or H atoms are left alone.
fn repair_junction(
    merged: &mut Structure,
    carbonyl: &BackboneResidue,
    amide: &BackboneResidue,
) -> Result<(), EngineError> {
    let carbonyl_index = carbonyl.residue_index;
    if let (Some(old_o), Some((o_index, _))) = (
        carbonyl.o,
        merged.find_atom(carbonyl_index, CARBONYL_OXYGEN),
    ) {
        let length = distance(&carbonyl.c, &old_o);
        let o = external_bisector_position(&carbonyl.c, &carbonyl.ca, &amide.n, length)?;
        merged.set_position(o_index, round_position(&o));
    }
    if let Some((h_index, _)) = merged.find_atom(carbonyl_index + 1, AMIDE_HYDROGEN) {
        let h = external_bisector_position(&amide.n, &carbonyl.c, &amide.ca, AMIDE_HYDROGEN_LENGTH)?;
        merged.set_position(h_index, round_position(&h));
    }
    Ok(())
}

/// Closes a break with the built-in radii and no search limits. Returns the
/// number of bridges written to `sink`.
pub fn close_break<S: BridgeSink + ?Sized>(
    c_side: &NamedFragment,
    library: &[NamedFragment],
    budget: &ClashBudget,
    sink: &mut S,
) -> Result<usize, EngineError> {
    let radii = VdwRadii::tsai_1999();
    let summary = BreakCloser::new(ClashDetector::new(&radii), *budget).close(c_side, library, sink)?;
    Ok(summary.matches)
}
