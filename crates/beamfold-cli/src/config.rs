pub mod defaults;

use crate::cli::{EvalArgs, FoldArgs, ModelArgs};
use crate::error::{CliError, Result};
use beamfold::core::energy::model::DangleMode;
use beamfold::core::energy::shape::ShapeTransform;
use beamfold::engine::config::{FoldConfig, FoldConfigBuilder};
use defaults::DefaultsConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialSearchConfig {
    beam_size: Option<i64>,
    sharp_turn: Option<bool>,
    verbose: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialEnergyConfig {
    dangles: Option<u8>,
    params_path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialSuboptimalConfig {
    enabled: Option<bool>,
    delta: Option<f64>,
    max_structures: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialShapeConfig {
    slope: Option<f64>,
    intercept: Option<f64>,
}

/// Options read from a TOML config file, every one of them optional.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialFoldConfig {
    search: Option<PartialSearchConfig>,
    energy: Option<PartialEnergyConfig>,
    suboptimal: Option<PartialSuboptimalConfig>,
    shape: Option<PartialShapeConfig>,
}

/// Fully resolved options for one command.
#[derive(Debug, Clone)]
pub struct Settings {
    pub fold: FoldConfig,
    pub params_path: Option<PathBuf>,
}

impl PartialFoldConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Reads the file named by `--config`, or starts empty.
    pub fn load(args: &ModelArgs) -> Result<Self> {
        match &args.config {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn merge_with_fold_args(mut self, args: &FoldArgs) -> Result<Settings> {
        self.apply_set_values(&args.model.set_values)?;
        let defaults = DefaultsConfig::default();

        let search = self.search.take().unwrap_or_default();
        let suboptimal = self.suboptimal.take().unwrap_or_default();

        let zuker = args.zuker || suboptimal.enabled.unwrap_or(false);
        let delta = args
            .delta
            .or(suboptimal.delta)
            .unwrap_or(defaults.zuker_delta);

        let mut builder = self
            .model_builder(&args.model, &defaults)?
            .beam_size(
                args.beam_size
                    .or(search.beam_size)
                    .unwrap_or(defaults.beam_size),
            )
            .sharp_turn(
                args.model.sharp_turn || search.sharp_turn.unwrap_or(defaults.sharp_turn),
            )
            .energy_delta(if zuker { delta } else { 0.0 })
            .verbose(args.stats || search.verbose.unwrap_or(defaults.verbose));
        if let Some(limit) = args.max_structures.or(suboptimal.max_structures) {
            builder = builder.max_suboptimals(limit);
        }

        Ok(Settings {
            fold: builder
                .build()
                .map_err(|e| CliError::Config(e.to_string()))?,
            params_path: self.params_path(&args.model),
        })
    }

    pub fn merge_with_eval_args(mut self, args: &EvalArgs) -> Result<Settings> {
        self.apply_set_values(&args.model.set_values)?;
        let defaults = DefaultsConfig::default();
        let search = self.search.take().unwrap_or_default();

        let builder = self.model_builder(&args.model, &defaults)?.sharp_turn(
            args.model.sharp_turn || search.sharp_turn.unwrap_or(defaults.sharp_turn),
        );
        Ok(Settings {
            fold: builder
                .build()
                .map_err(|e| CliError::Config(e.to_string()))?,
            params_path: self.params_path(&args.model),
        })
    }

    fn model_builder(&self, args: &ModelArgs, defaults: &DefaultsConfig) -> Result<FoldConfigBuilder> {
        let file_dangles = self
            .energy
            .as_ref()
            .and_then(|energy| energy.dangles)
            .map(DangleMode::try_from)
            .transpose()
            .map_err(|e| CliError::Config(e.to_string()))?;
        let dangles = args.dangles.or(file_dangles).unwrap_or(defaults.dangles);

        let mut builder = FoldConfigBuilder::new().dangles(dangles);
        if let Some(shape) = &self.shape {
            let fallback = ShapeTransform::default();
            builder = builder.shape_transform(ShapeTransform {
                slope: shape.slope.unwrap_or(fallback.slope),
                intercept: shape.intercept.unwrap_or(fallback.intercept),
            });
        }
        Ok(builder)
    }

    fn params_path(&self, args: &ModelArgs) -> Option<PathBuf> {
        args.params.clone().or_else(|| {
            self.energy
                .as_ref()
                .and_then(|energy| energy.params_path.clone())
        })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };

            match key {
                "search.beam-size" => {
                    self.search.get_or_insert_with(Default::default).beam_size =
                        Some(parse_value(key, value_str)?);
                }
                "search.sharp-turn" => {
                    self.search.get_or_insert_with(Default::default).sharp_turn =
                        Some(parse_value(key, value_str)?);
                }
                "search.verbose" => {
                    self.search.get_or_insert_with(Default::default).verbose =
                        Some(parse_value(key, value_str)?);
                }
                "energy.dangles" => {
                    self.energy.get_or_insert_with(Default::default).dangles =
                        Some(parse_value(key, value_str)?);
                }
                "energy.params-path" => {
                    self.energy.get_or_insert_with(Default::default).params_path =
                        Some(PathBuf::from(value_str));
                }
                "suboptimal.enabled" => {
                    self.suboptimal.get_or_insert_with(Default::default).enabled =
                        Some(parse_value(key, value_str)?);
                }
                "suboptimal.delta" => {
                    self.suboptimal.get_or_insert_with(Default::default).delta =
                        Some(parse_value(key, value_str)?);
                }
                "suboptimal.max-structures" => {
                    self.suboptimal
                        .get_or_insert_with(Default::default)
                        .max_structures = Some(parse_value(key, value_str)?);
                }
                "shape.slope" => {
                    self.shape.get_or_insert_with(Default::default).slope =
                        Some(parse_value(key, value_str)?);
                }
                "shape.intercept" => {
                    self.shape.get_or_insert_with(Default::default).intercept =
                        Some(parse_value(key, value_str)?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        CliError::Config(format!(
            "Invalid {} value for {}: {}",
            std::any::type_name::<T>(),
            key,
            value
        ))
    })
}
