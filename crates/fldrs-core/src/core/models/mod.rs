//! # Core Models Module
//!
//! Data structures for the structural arrays handled by the engine.
//!
//! - [`atom`] - One row of a structural array (`AtomRecord`)
//! - [`structure`] - The two-state structure model: an unvalidated `RawStructure`
//!   and the built, residue-indexed `Structure` with O(1) residue windows
//!
//! ## Usage
//!
//! ```ignore
//! use fldrs::core::models::{atom::AtomRecord, structure::RawStructure};
//!
//! let mut raw = RawStructure::new();
//! raw.push(AtomRecord::new("N", "N", "ALA", 1, Point3::new(0.0, 0.0, 0.0)));
//! let structure = raw.build()?;
//! assert_eq!(structure.residue_count(), 1);
//! ```

pub mod atom;
pub mod structure;
