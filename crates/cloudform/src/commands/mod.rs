pub mod apply;
pub mod destroy;
pub mod import;
pub mod lookup;
pub mod plan;
pub mod refresh;
pub mod state;

use crate::engine::Engine;
use crate::provider;
use crate::state::StateManager;
use cloudform_config::{ConfigError, Manifest};
use std::path::PathBuf;

/// Settings shared by every subcommand
pub struct Context {
    /// `--config`; discovery is used when unset
    pub manifest_path: Option<PathBuf>,
    /// Directory holding `.cloudform/`
    pub project_root: PathBuf,
}

impl Context {
    pub fn new(manifest_path: Option<PathBuf>) -> anyhow::Result<Self> {
        Ok(Self {
            manifest_path,
            project_root: std::env::current_dir()?,
        })
    }

    pub fn load_manifest(&self) -> anyhow::Result<Manifest> {
        let (path, manifest) = cloudform_config::load_manifest(self.manifest_path.as_deref())?;
        tracing::info!(path = %path.display(), "loaded manifest");
        Ok(manifest)
    }

    /// Manifest when one exists; commands working on state alone only
    /// need its provider block
    pub fn load_manifest_or_default(&self) -> anyhow::Result<Manifest> {
        match cloudform_config::load_manifest(self.manifest_path.as_deref()) {
            Ok((_, manifest)) => Ok(manifest),
            Err(ConfigError::ManifestNotFound) => Ok(Manifest::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn state_manager(&self) -> StateManager {
        StateManager::new(&self.project_root)
    }

    pub fn engine(&self, manifest: &Manifest) -> anyhow::Result<Engine> {
        Ok(Engine::new(provider::build_registry(&manifest.provider)?))
    }
}
