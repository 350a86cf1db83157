//! # Core Module
//!
//! Stateless building blocks shared by the folding engine and the public workflows.
//!
//! - **Sequences** ([`sequence`]) - nucleotide alphabet, normalization and validation
//! - **Structures** ([`structure`]) - dot-bracket notation and pair tables
//! - **Energy Model** ([`energy`]) - nearest-neighbor parameters and loop energy functions
//!
//! Nothing in this module holds mutable state across calls. The energy model in particular
//! is frozen at construction and can be shared by reference between any number of folds.

pub mod energy;
pub mod sequence;
pub mod structure;
