//! # Workflows Module
//!
//! End-to-end procedures that chain the engine operations for one build attempt.
//!
//! ## Overview
//!
//! - **Terminal Attachment** ([`attach`]) - Aligns an N- or C-terminal tail onto the
//!   folded structure, spins it clear of clashes and grafts it; also covers
//!   attaching both tails at once
//! - **Break Bridging** ([`bridge`]) - Locates chain breaks, places both fragment
//!   libraries on either side of a gap, closes it and grafts every accepted bridge
//! - **Pair Sampling** ([`pairing`]) - Random (N-tail, C-tail) combinations for the
//!   combined case
//!
//! Randomness always comes from a caller-supplied generator, so each worker of a
//! parallel driver can own an independently seeded one.

pub mod attach;
pub mod bridge;
pub mod pairing;
