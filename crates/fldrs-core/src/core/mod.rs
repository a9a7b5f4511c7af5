//! # Core Module
//!
//! Fundamental building blocks shared by every engine operation.
//!
//! - **Structural Arrays** ([`models`]) - Atom records and the residue-indexed
//!   `Structure` produced by building a `RawStructure`
//! - **Parameters** ([`forcefield`]) - Van der Waals radius tables used for steric checks
//! - **Utilities** ([`utils`]) - Geometry (distances, angles, superposition) and
//!   residue/atom identifiers

pub mod forcefield;
pub mod models;
pub mod utils;
