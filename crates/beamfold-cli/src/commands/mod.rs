pub mod eval;
pub mod fold;

use crate::error::{CliError, Result};
use crate::utils::input::InputError;
use beamfold::core::energy::model::DangleMode;
use beamfold::workflows::registry::ModelRegistry;
use std::path::{Path, PathBuf};
use tracing::info;

/// Bundled Turner 2004 parameters, replaced by `params` when a file is given.
fn load_registry(params: Option<&Path>, dangles: DangleMode) -> Result<ModelRegistry> {
    let registry = ModelRegistry::turner2004(dangles)?;
    if let Some(path) = params {
        info!("Loading energy parameters from {:?}", path);
        registry.reload(path, dangles)?;
    }
    Ok(registry)
}

fn input_error(input: Option<&Path>, source: InputError) -> CliError {
    CliError::FileParsing {
        path: input.map_or_else(|| PathBuf::from("<stdin>"), Path::to_path_buf),
        source: source.into(),
    }
}

fn record_label(name: Option<&str>, index: usize) -> String {
    name.map_or_else(|| format!("#{}", index + 1), str::to_string)
}
