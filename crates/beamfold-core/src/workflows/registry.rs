use crate::core::energy::model::{DangleMode, EnergyModel};
use crate::core::energy::params::{EnergyParams, ParamLoadError};
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::info;

/// The energy model current folds should use.
///
/// Folds take a [`snapshot`](Self::snapshot) when they start and keep it until they finish,
/// so a [`replace`](Self::replace) or [`reload`](Self::reload) is only seen by folds started
/// afterwards. Models are never mutated in place.
#[derive(Debug)]
pub struct ModelRegistry {
    current: RwLock<Arc<EnergyModel>>,
}

impl ModelRegistry {
    pub fn new(model: EnergyModel) -> Self {
        Self {
            current: RwLock::new(Arc::new(model)),
        }
    }

    /// A registry serving the bundled Turner 2004 parameters.
    pub fn turner2004(dangles: DangleMode) -> Result<Self, ParamLoadError> {
        Ok(Self::new(EnergyModel::turner2004(dangles)?))
    }

    pub fn snapshot(&self) -> Arc<EnergyModel> {
        // The lock only guards an Arc swap, which cannot leave it inconsistent.
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Installs `model` and returns the one it replaced.
    pub fn replace(&self, model: EnergyModel) -> Arc<EnergyModel> {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        std::mem::replace(&mut *guard, Arc::new(model))
    }

    /// Loads a parameter file and installs it. On failure the current model stays in place.
    pub fn reload(&self, path: &Path, dangles: DangleMode) -> Result<(), ParamLoadError> {
        let params = EnergyParams::load(path)?;
        self.replace(EnergyModel::new(Arc::new(params), dangles));
        info!(path = %path.display(), %dangles, "Energy parameters reloaded.");
        Ok(())
    }
}
