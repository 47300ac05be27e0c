use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use arc_swap::ArcSwap;
use confique::{Config, toml};
use directories::ProjectDirs;
use servitor_core::Label;
use tracing::{debug, info};

use crate::{ServiceSettings, SettingsError};

/// Points at a settings file outside the platform config directory.
pub const CONFIG_FILE_VAR: &str = "SERVITOR_CONFIG_FILE";
pub const CONFIG_FILE_NAME: &str = "servitor.toml";

/// [`ServiceSettings`] layered from the environment over an optional TOML file.
///
/// Clones share the loaded value, so a [`reload`](Self::reload) is visible to every holder.
#[derive(Clone, Debug)]
pub struct SettingsStore {
    source: Source,
    current: Arc<ArcSwap<ServiceSettings>>,
}

#[derive(Clone, Debug)]
enum Source {
    Fixed,
    Loaded { file: Option<PathBuf> },
}

impl SettingsStore {
    /// Loads from `file` (skipped when it does not exist) with environment overrides.
    pub fn load(file: Option<PathBuf>) -> Result<Self, SettingsError> {
        let settings = read(file.as_deref())?;
        Ok(Self {
            source: Source::Loaded { file },
            current: Arc::new(ArcSwap::from_pointee(settings)),
        })
    }

    /// Settings file from `SERVITOR_CONFIG_FILE`, else `servitor.toml` in the config
    /// directory of `label`.
    pub fn for_label(label: &Label) -> Result<Self, SettingsError> {
        let file = std::env::var_os(CONFIG_FILE_VAR)
            .map(PathBuf::from)
            .or_else(|| {
                ProjectDirs::from(&label.qualifier, &label.organization, &label.application)
                    .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
            });
        debug!("Settings file for {}: {file:?}", label.application);
        Self::load(file)
    }

    /// A store with no sources. Reloading keeps `settings`.
    pub fn fixed(settings: ServiceSettings) -> Self {
        Self {
            source: Source::Fixed,
            current: Arc::new(ArcSwap::from_pointee(settings)),
        }
    }

    pub fn file(&self) -> Option<&Path> {
        match &self.source {
            Source::Loaded { file } => file.as_deref(),
            Source::Fixed => None,
        }
    }

    pub fn current(&self) -> Arc<ServiceSettings> {
        self.current.load_full()
    }

    /// Reads the sources again. The previous value stays in place when that fails.
    pub fn reload(&self) -> Result<Arc<ServiceSettings>, SettingsError> {
        let Source::Loaded { file } = &self.source else {
            return Ok(self.current());
        };
        let settings = Arc::new(read(file.as_deref())?);
        self.current.store(settings.clone());
        info!("Reloaded settings");
        Ok(settings)
    }

    /// Commented TOML listing every setting with its default.
    pub fn template() -> String {
        toml::template::<ServiceSettings>(toml::FormatOptions::default())
    }
}

fn read(file: Option<&Path>) -> Result<ServiceSettings, SettingsError> {
    let builder = ServiceSettings::builder().env();
    let builder = match file {
        Some(file) => builder.file(file),
        None => builder,
    };
    builder.load().map_err(|e| SettingsError {
        path: file.map(Path::to_owned),
        message: e.to_string(),
    })
}

#[cfg(test)]
#[path = "./settings_store_test.rs"]
mod settings_store_test;
