use crate::core::forcefield::vdw::{ParamLoadError, VdwRadii};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Clashes tolerated per unit of normalized tolerance.
const CLASHES_PER_TOLERANCE: f64 = 80.0;
/// Distance slack in Angstroms per unit of normalized tolerance.
const DISTANCE_SLACK_PER_TOLERANCE: f64 = 1.25;
const FULL_ROTATION_BUDGET: f64 = 256.0;
const HIGH_TOLERANCE_ROTATION_BUDGET: usize = 32;
const HIGH_TOLERANCE_THRESHOLD: f64 = 0.9;

pub const DEFAULT_CHAIN_ID: char = 'A';
pub const DEFAULT_SEGMENT_ID: &str = "A";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Tolerance must lie within [0, 1], got {0}")]
    ToleranceOutOfRange(f64),

    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

/// Steric acceptance limits for one clash check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClashBudget {
    /// Largest number of clashes still accepted.
    pub max_clash: usize,
    /// Slack in Angstroms added to every van der Waals radius sum.
    pub distance_tolerance: f64,
}

impl ClashBudget {
    pub fn new(max_clash: usize, distance_tolerance: f64) -> Self {
        Self {
            max_clash,
            distance_tolerance,
        }
    }

    /// Derives a budget from a normalized tolerance; values outside [0, 1] are clamped.
    ///
    /// Higher tolerance admits more clashes and a larger distance slack.
    pub fn from_tolerance(tolerance: f64) -> Self {
        let t = clamp_tolerance(tolerance);
        Self {
            max_clash: (t * CLASHES_PER_TOLERANCE) as usize,
            distance_tolerance: t * DISTANCE_SLACK_PER_TOLERANCE,
        }
    }
}

/// Number of random pivot rotations allowed for a normalized tolerance.
///
/// Strict tolerances get more attempts; above 0.9 the budget is fixed at 32.
pub fn max_rotations_for_tolerance(tolerance: f64) -> usize {
    let t = clamp_tolerance(tolerance);
    if t > HIGH_TOLERANCE_THRESHOLD {
        return HIGH_TOLERANCE_ROTATION_BUDGET;
    }
    (FULL_ROTATION_BUDGET - t * FULL_ROTATION_BUDGET) as usize
}

fn clamp_tolerance(tolerance: f64) -> f64 {
    if tolerance.is_nan() {
        0.0
    } else {
        tolerance.clamp(0.0, 1.0)
    }
}

/// Bounds on the break-closing search over a candidate library.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BridgeSearchLimits {
    /// Stop after examining this many candidates.
    pub max_candidates: Option<usize>,
    /// Stop once this much wall-clock time has elapsed.
    pub time_limit: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraftConfig {
    pub tolerance: f64,
    pub clash_budget: ClashBudget,
    pub max_rotations: usize,
    pub chain_id: char,
    pub segment_id: String,
    pub bridge: BridgeSearchLimits,
    pub vdw_radii_path: Option<PathBuf>,
}

impl GraftConfig {
    /// Loads a configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let path_str = path.to_string_lossy().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path_str.clone(),
            source: e,
        })?;
        let file: GraftConfigFile = toml::from_str(&content).map_err(|e| ConfigError::Toml {
            path: path_str,
            source: e,
        })?;
        file.into_builder()?.build()
    }

    /// The radius table to use: the configured CSV file, or the built-in Tsai table.
    pub fn vdw_radii(&self) -> Result<VdwRadii, ParamLoadError> {
        match &self.vdw_radii_path {
            Some(path) => VdwRadii::from_csv(path),
            None => Ok(VdwRadii::tsai_1999()),
        }
    }
}

#[derive(Default)]
pub struct GraftConfigBuilder {
    tolerance: Option<f64>,
    clash_budget: Option<ClashBudget>,
    max_rotations: Option<usize>,
    chain_id: Option<char>,
    segment_id: Option<String>,
    bridge: BridgeSearchLimits,
    vdw_radii_path: Option<PathBuf>,
}

impl GraftConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }
    pub fn clash_budget(mut self, budget: ClashBudget) -> Self {
        self.clash_budget = Some(budget);
        self
    }
    pub fn max_rotations(mut self, attempts: usize) -> Self {
        self.max_rotations = Some(attempts);
        self
    }
    pub fn chain_id(mut self, chain_id: char) -> Self {
        self.chain_id = Some(chain_id);
        self
    }
    pub fn segment_id(mut self, segment_id: &str) -> Self {
        self.segment_id = Some(segment_id.to_string());
        self
    }
    pub fn max_candidates(mut self, count: usize) -> Self {
        self.bridge.max_candidates = Some(count);
        self
    }
    pub fn time_limit(mut self, limit: Duration) -> Self {
        self.bridge.time_limit = Some(limit);
        self
    }
    pub fn vdw_radii_path(mut self, path: PathBuf) -> Self {
        self.vdw_radii_path = Some(path);
        self
    }

    pub fn build(self) -> Result<GraftConfig, ConfigError> {
        let tolerance = self
            .tolerance
            .ok_or(ConfigError::MissingParameter("tolerance"))?;
        if !(0.0..=1.0).contains(&tolerance) {
            return Err(ConfigError::ToleranceOutOfRange(tolerance));
        }
        let max_rotations = self
            .max_rotations
            .unwrap_or_else(|| max_rotations_for_tolerance(tolerance));
        if max_rotations == 0 {
            return Err(ConfigError::InvalidValue {
                parameter: "max_rotations",
                reason: "at least one rotation attempt is required".to_string(),
            });
        }
        Ok(GraftConfig {
            tolerance,
            clash_budget: self
                .clash_budget
                .unwrap_or_else(|| ClashBudget::from_tolerance(tolerance)),
            max_rotations,
            chain_id: self.chain_id.unwrap_or(DEFAULT_CHAIN_ID),
            segment_id: self
                .segment_id
                .unwrap_or_else(|| DEFAULT_SEGMENT_ID.to_string()),
            bridge: self.bridge,
            vdw_radii_path: self.vdw_radii_path,
        })
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct GraftConfigFile {
    tolerance: Option<f64>,
    max_clash: Option<usize>,
    distance_tolerance: Option<f64>,
    max_rotations: Option<usize>,
    chain_id: Option<char>,
    segment_id: Option<String>,
    vdw_radii_path: Option<PathBuf>,
    #[serde(default)]
    bridge: BridgeSectionFile,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct BridgeSectionFile {
    max_candidates: Option<usize>,
    time_limit_secs: Option<f64>,
}

impl GraftConfigFile {
    fn into_builder(self) -> Result<GraftConfigBuilder, ConfigError> {
        let mut builder = GraftConfigBuilder::new();
        if let Some(tolerance) = self.tolerance {
            builder = builder.tolerance(tolerance);
        }
        match (self.max_clash, self.distance_tolerance) {
            (Some(max_clash), Some(distance)) => {
                builder = builder.clash_budget(ClashBudget::new(max_clash, distance));
            }
            (None, None) => {}
            _ => {
                return Err(ConfigError::InvalidValue {
                    parameter: "max-clash",
                    reason: "max-clash and distance-tolerance must be given together".to_string(),
                });
            }
        }
        if let Some(attempts) = self.max_rotations {
            builder = builder.max_rotations(attempts);
        }
        if let Some(chain_id) = self.chain_id {
            builder = builder.chain_id(chain_id);
        }
        if let Some(segment_id) = &self.segment_id {
            builder = builder.segment_id(segment_id);
        }
        if let Some(path) = self.vdw_radii_path {
            builder = builder.vdw_radii_path(path);
        }
        if let Some(count) = self.bridge.max_candidates {
            builder = builder.max_candidates(count);
        }
        if let Some(secs) = self.bridge.time_limit_secs {
            let limit = Duration::try_from_secs_f64(secs).map_err(|e| ConfigError::InvalidValue {
                parameter: "time-limit-secs",
                reason: e.to_string(),
            })?;
            builder = builder.time_limit(limit);
        }
        Ok(builder)
    }
}
