//! # Forcefield Parameters Module
//!
//! Steric parameters consumed by the clash detector. Only van der Waals radii are
//! needed: collision checks compare inter-atomic distances against radius sums and
//! never evaluate an energy.

pub mod vdw;
