//! # Engine Module
//!
//! The structural assembly and collision engine.
//!
//! ## Overview
//!
//! Each submodule implements one stage of grafting a disordered fragment onto a
//! folded template. Data flows leaf-first:
//!
//! - **Break Detection** ([`breaks`]) - Finds covalent discontinuities in the backbone
//!   and reports the folded segments between them
//! - **Alignment** ([`alignment`]) - Rigid-body superposition of a fragment's anchor
//!   onto a target anchor frame
//! - **Clash Detection** ([`clash`]) - Van der Waals overlap counting with an
//!   early-exit budget
//! - **Rotation Retries** ([`rotation`]) - Random pivot reorientation until the clash
//!   budget is met
//! - **Break Closing** ([`bridge`]) - Sliding-window search joining two fragment
//!   libraries across an internal chain break
//! - **Graft Assembly** ([`graft`]) - Deterministic splicing and renumbering of the
//!   final structure
//!
//! Supporting modules provide configuration ([`config`]), progress callbacks
//! ([`progress`]) and the engine error type ([`error`]).

pub mod alignment;
pub mod breaks;
pub mod bridge;
pub mod clash;
pub mod config;
pub mod error;
pub mod graft;
pub mod progress;
pub mod rotation;
