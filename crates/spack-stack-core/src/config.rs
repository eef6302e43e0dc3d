//! User configuration from ~/.config/spack-stack/config.toml

use crate::paths::StackPaths;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the stack checkout root.
pub const ROOT_ENV_VAR: &str = "SPACK_STACK_ROOT";

/// Default directory environments are written to.
pub const DEFAULT_ENV_DIR: &str = "envs";

/// User configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// Overrides for the checkout layout.
    pub paths: PathsConfig,
    /// Defaults for `create` commands.
    pub defaults: DefaultsConfig,
}

/// Overrides for the checkout layout. Unset entries are derived from the
/// checkout root.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub root: Option<PathBuf>,
    pub spack: Option<PathBuf>,
    pub templates: Option<PathBuf>,
    pub sites: Option<PathBuf>,
    pub common: Option<PathBuf>,
    pub containers: Option<PathBuf>,
}

/// Defaults for `create` commands.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Output directory for environments and containers.
    pub dir: PathBuf,
    /// Site used when none is given.
    pub site: Option<String>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_ENV_DIR),
            site: None,
        }
    }
}

/// Errors from loading configuration or locating the checkout.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[source] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("no spack-stack checkout found from {0} (looked for a .spackstack file)")]
    NoStackRoot(String),
}

impl UserConfig {
    /// Load user config from the default path, falling back to defaults.
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_path(&path).unwrap_or_else(|e| {
                tracing::warn!("ignoring {}: {e}", path.display());
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    /// Load user config from a specific path.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Get the default config path.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("spack-stack").join("config.toml"))
    }

    /// Resolve the checkout layout.
    ///
    /// The root comes from `root_override`, then `SPACK_STACK_ROOT`, then the
    /// config file, then the nearest ancestor of `cwd` holding `.spackstack`.
    pub fn stack_paths(
        &self,
        root_override: Option<PathBuf>,
        cwd: &Path,
    ) -> Result<StackPaths, ConfigError> {
        let root = root_override
            .or_else(|| std::env::var_os(ROOT_ENV_VAR).map(PathBuf::from))
            .or_else(|| self.paths.root.clone());

        let paths = match root {
            Some(root) => StackPaths::from_root(root),
            None => StackPaths::discover(cwd)
                .ok_or_else(|| ConfigError::NoStackRoot(cwd.display().to_string()))?,
        };

        Ok(paths.with_overrides(&self.paths))
    }
}
