//! # beamfold Core Library
//!
//! Linear-time prediction of RNA minimum-free-energy secondary structures. Instead of the
//! cubic-time CKY recursions of classical folding, the sequence is swept left to right and
//! at every position only a bounded beam of the most promising partial structures is kept.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless models: validated nucleotide sequences,
//!   dot-bracket structures, and the nearest-neighbor energy model with its parameter tables.
//!
//! - **[`engine`]: The Logic Core.** The beam-pruned dynamic-programming lattice, the beam
//!   manager, the outside sweep used for suboptimal structures, and backtracing.
//!
//! - **[`workflows`]: The Public API.** Complete procedures built from the layers below:
//!   folding a sequence, evaluating the energy of a given structure, and sharing an energy
//!   model across folds with atomic reloads.
//!
//! ```ignore
//! use beamfold::engine::config::FoldConfigBuilder;
//! use beamfold::workflows::fold;
//!
//! let config = FoldConfigBuilder::new().beam_size(100).build()?;
//! let result = fold::fold("GGGAAACCC", &config)?;
//! assert_eq!(result.structure, "(((...)))");
//! ```

pub mod core;
pub mod engine;
pub mod workflows;
