//! # Workflows Module
//!
//! High-level procedures that tie the core models and the folding engine together. These
//! are the entry points applications are expected to call.
//!
//! ## Available Workflows
//!
//! - **Folding** ([`fold`]) - Predicts the minimum-free-energy structure of a sequence and,
//!   on request, the distinct structures within an energy window of it
//! - **Evaluation** ([`eval`]) - Scores a given dot-bracket structure under the same model,
//!   broken down by loop type
//! - **Model Registry** ([`registry`]) - Shares one energy model across folds and swaps in
//!   reloaded parameters without disturbing folds already running
//!
//! Each workflow is a synchronous function over immutable inputs. Independent sequences can
//! be folded concurrently by the caller; a single fold never spawns work of its own.

pub mod eval;
pub mod fold;
pub mod registry;
