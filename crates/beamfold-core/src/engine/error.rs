use thiserror::Error;

use super::config::ConfigError;
use crate::core::energy::params::ParamLoadError;
use crate::core::sequence::SequenceError;
use crate::core::structure::StructureError;

#[derive(Debug, Error)]
pub enum FoldError {
    #[error("Invalid sequence: {0}")]
    Sequence(#[from] SequenceError),

    #[error("Invalid structure: {0}")]
    Structure(#[from] StructureError),

    #[error("Structure has length {structure} but the sequence has length {sequence}")]
    LengthMismatch { sequence: usize, structure: usize },

    #[error("SHAPE profile has {profile} values but the sequence has length {sequence}")]
    ShapeLength { sequence: usize, profile: usize },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Energy parameters unavailable: {0}")]
    Params(#[from] ParamLoadError),

    #[error("Internal logic error: {0}")]
    Internal(String),
}
