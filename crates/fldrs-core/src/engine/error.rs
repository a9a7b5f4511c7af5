use crate::core::forcefield::vdw::ParamLoadError;
use crate::core::models::structure::StructureError;
use crate::core::utils::geometry::GeometryError;
use thiserror::Error;

use super::config::ConfigError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid structure: {source}")]
    Structure {
        #[from]
        source: StructureError,
    },

    #[error("Geometry error: {source}")]
    Geometry {
        #[from]
        source: GeometryError,
    },

    #[error("Parameter loading failed: {source}")]
    Parameters {
        #[from]
        source: ParamLoadError,
    },

    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error(
        "Backbone atoms do not match: found {n} N, {ca} CA and {c} C atoms; some are possibly missing"
    )]
    BackboneMismatch { n: usize, ca: usize, c: usize },

    #[error("Anchor atom '{atom_name}' not found in residue {residue_number}")]
    AnchorAtomNotFound {
        atom_name: &'static str,
        residue_number: isize,
    },

    #[error("No van der Waals radius for element '{element}'")]
    UnknownElement { element: String },

    #[error("{what} needs at least {required} residues, but has {found}")]
    InsufficientResidues {
        what: &'static str,
        required: usize,
        found: usize,
    },

    #[error("Chain break boundary {lower}..{upper} does not fit the structure: {reason}")]
    BoundaryMismatch {
        lower: isize,
        upper: isize,
        reason: String,
    },

    #[error("Output sink rejected a bridged structure: {source}")]
    Sink {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
