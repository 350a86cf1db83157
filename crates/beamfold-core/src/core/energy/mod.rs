//! # Energy Model Module
//!
//! Nearest-neighbor thermodynamics for RNA secondary structure, following the Turner 2004
//! parameter set in the table conventions popularized by the Vienna package.
//!
//! ## Key Components
//!
//! - [`params`] - Parameter tables, loaded from TOML and validated at construction
//! - [`pair`] - The six canonical pair types and their orientation rules
//! - [`model`] - Loop energy functions: hairpin, stack/bulge/interior, multiloop, exterior
//! - [`shape`] - SHAPE reactivity profiles and their pseudo-energy transform
//! - [`term`] - Per-motif energy breakdown used by structure evaluation
//!
//! All energies are integers in dcal/mol (hundredths of kcal/mol). Lookups never fail:
//! entries missing from a table fall back to a neutral value or to the generic formula of
//! the motif, so a fold always completes once the model has been constructed.
//!
//! ```ignore
//! use beamfold::core::energy::model::{DangleMode, EnergyModel};
//!
//! let model = EnergyModel::turner2004(DangleMode::Double)?;
//! let hairpin = model.hairpin(sequence.bases(), 2, 6, false);
//! ```

pub mod model;
pub mod pair;
pub mod params;
pub mod shape;
pub mod term;
