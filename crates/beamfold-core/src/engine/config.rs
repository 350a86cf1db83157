use crate::core::energy::model::DangleMode;
use crate::core::energy::shape::{ShapeProfile, ShapeTransform};
use thiserror::Error;

pub const DEFAULT_BEAM_SIZE: usize = 100;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },
}

/// Options for a single fold.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldConfig {
    /// Candidates kept per state kind and position; `0` disables pruning.
    pub beam_size: usize,
    /// Allow hairpins shorter than the model's minimum loop.
    pub sharp_turn: bool,
    /// Dangle convention the fold is scored with. Overrides the mode of the model passed in.
    pub dangles: DangleMode,
    /// Suboptimal window in kcal/mol; `0.0` reports the MFE structure only.
    pub energy_delta: f64,
    pub max_suboptimals: Option<usize>,
    pub shape: Option<ShapeProfile>,
    pub shape_transform: ShapeTransform,
    /// Extra diagnostic logging. Never changes the result.
    pub verbose: bool,
}

impl Default for FoldConfig {
    fn default() -> Self {
        Self {
            beam_size: DEFAULT_BEAM_SIZE,
            sharp_turn: false,
            dangles: DangleMode::Double,
            energy_delta: 0.0,
            max_suboptimals: None,
            shape: None,
            shape_transform: ShapeTransform::default(),
            verbose: false,
        }
    }
}

impl FoldConfig {
    #[inline]
    pub fn suboptimals_enabled(&self) -> bool {
        self.energy_delta > 0.0
    }

    #[inline]
    pub fn is_exhaustive(&self) -> bool {
        self.beam_size == 0
    }

    /// The suboptimal window in dcal/mol.
    pub fn energy_delta_dcal(&self) -> i32 {
        (self.energy_delta * 100.0).round() as i32
    }
}

#[derive(Default)]
pub struct FoldConfigBuilder {
    beam_size: Option<i64>,
    sharp_turn: Option<bool>,
    dangles: Option<DangleMode>,
    energy_delta: Option<f64>,
    max_suboptimals: Option<usize>,
    shape: Option<ShapeProfile>,
    shape_transform: Option<ShapeTransform>,
    verbose: Option<bool>,
}

impl FoldConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero or negative values disable pruning.
    pub fn beam_size(mut self, size: i64) -> Self {
        self.beam_size = Some(size);
        self
    }
    pub fn sharp_turn(mut self, allow: bool) -> Self {
        self.sharp_turn = Some(allow);
        self
    }
    pub fn dangles(mut self, mode: DangleMode) -> Self {
        self.dangles = Some(mode);
        self
    }
    pub fn energy_delta(mut self, delta: f64) -> Self {
        self.energy_delta = Some(delta);
        self
    }
    pub fn max_suboptimals(mut self, limit: usize) -> Self {
        self.max_suboptimals = Some(limit);
        self
    }
    pub fn shape(mut self, profile: ShapeProfile) -> Self {
        self.shape = Some(profile);
        self
    }
    pub fn shape_transform(mut self, transform: ShapeTransform) -> Self {
        self.shape_transform = Some(transform);
        self
    }
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    pub fn build(self) -> Result<FoldConfig, ConfigError> {
        let defaults = FoldConfig::default();

        let energy_delta = self.energy_delta.unwrap_or(defaults.energy_delta);
        if !energy_delta.is_finite() || energy_delta < 0.0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "energy_delta",
                reason: format!("expected a finite, non-negative value, got {}", energy_delta),
            });
        }

        if self.max_suboptimals == Some(0) {
            return Err(ConfigError::InvalidParameter {
                parameter: "max_suboptimals",
                reason: "must be at least 1".to_string(),
            });
        }

        let shape_transform = self.shape_transform.unwrap_or(defaults.shape_transform);
        if !shape_transform.is_finite() {
            return Err(ConfigError::InvalidParameter {
                parameter: "shape_transform",
                reason: "slope and intercept must be finite".to_string(),
            });
        }

        let beam_size = match self.beam_size {
            Some(size) if size <= 0 => 0,
            Some(size) => usize::try_from(size).map_err(|_| ConfigError::InvalidParameter {
                parameter: "beam_size",
                reason: format!("{} does not fit in memory addressing", size),
            })?,
            None => defaults.beam_size,
        };

        Ok(FoldConfig {
            beam_size,
            sharp_turn: self.sharp_turn.unwrap_or(defaults.sharp_turn),
            dangles: self.dangles.unwrap_or(defaults.dangles),
            energy_delta,
            max_suboptimals: self.max_suboptimals,
            shape: self.shape,
            shape_transform,
            verbose: self.verbose.unwrap_or(defaults.verbose),
        })
    }
}
