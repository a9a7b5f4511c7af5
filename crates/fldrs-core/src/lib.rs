//! # FLDR/S Core Library
//!
//! Structural assembly and collision engine for grafting conformers of
//! intrinsically disordered regions (IDRs) onto folded protein domains.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless atom-array models (`Structure`),
//!   parameter tables (van der Waals radii, residue codes) and geometry helpers.
//!
//! - **[`engine`]: The Logic Core.** The assembly and collision operations:
//!   break detection, anchor alignment, clash counting, randomized pivot retries,
//!   break closing and the graft assembler ("protein surgeon").
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures that chain the engine
//!   operations for a single build attempt, e.g. attaching a terminal IDR or
//!   bridging an internal chain break.
//!
//! Every operation is synchronous and works on exclusively owned arrays, so callers
//! are free to fan out one invocation per candidate conformer across a worker pool.

pub mod core;
pub mod engine;
pub mod workflows;

#[cfg(test)]
pub(crate) mod test_support;
