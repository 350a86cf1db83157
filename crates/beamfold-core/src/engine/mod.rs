//! # Engine Module
//!
//! The beam-pruned dynamic-programming lattice behind linear-time folding.
//!
//! ## Overview
//!
//! The sequence is swept once from left to right. At each position the engine keeps, for
//! every kind of partial structure, a beam of the best candidates ending there, expands the
//! survivors into successor states further right, and discards the rest for good. Bounding
//! each beam makes the work per position constant, which is what turns the cubic recursions
//! of classical folding into a linear-time search.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Fold options and their builder
//! - **State Model** ([`state`]) - State kinds, derivation manners and lattice addresses
//! - **Beam Manager** ([`beam`]) - Per-position candidate pools and deterministic pruning
//! - **Lattice** ([`lattice`]) - The inside sweep and the retained state store
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress reporting
//! - **Error Handling** ([`error`]) - Fold error taxonomy
//!
//! Backtracing and the outside sweep used for suboptimal structures are internal and are
//! driven by [`crate::workflows::fold`].
//!
//! ## Scores
//!
//! Internally every state carries an `i32` score equal to the negated free energy in
//! dcal/mol, so the search maximizes. Reported energies are `score / -100.0` kcal/mol.

pub(crate) mod backtrace;
pub mod beam;
pub mod config;
pub(crate) mod context;
pub mod error;
pub mod lattice;
pub(crate) mod outside;
pub mod progress;
pub mod state;
