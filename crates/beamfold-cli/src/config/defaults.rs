use beamfold::core::energy::model::DangleMode;
use beamfold::engine::config::DEFAULT_BEAM_SIZE;

/// Values used when neither the command line nor the config file sets an option.
pub struct DefaultsConfig {
    pub beam_size: i64,
    pub sharp_turn: bool,
    pub dangles: DangleMode,
    pub zuker_delta: f64,
    pub verbose: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            beam_size: DEFAULT_BEAM_SIZE as i64,
            sharp_turn: false,
            dangles: DangleMode::Double,
            zuker_delta: 5.0,
            verbose: false,
        }
    }
}
