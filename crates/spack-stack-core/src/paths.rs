//! Layout of a spack-stack checkout.

use crate::config::PathsConfig;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Hidden file marking the top of a spack-stack checkout.
pub const CHECK_FILE: &str = ".spackstack";

/// Directories an environment build reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackPaths {
    /// Top of the spack-stack checkout.
    pub root: PathBuf,
    /// Spack checkout (a submodule of the stack by default).
    pub spack_root: PathBuf,
    /// One subdirectory per named template.
    pub templates: PathBuf,
    /// One subdirectory per site.
    pub sites: PathBuf,
    /// Configuration included in every environment.
    pub common: PathBuf,
    /// One `<name>.yaml` per container definition.
    pub containers: PathBuf,
}

impl StackPaths {
    /// Default layout under a checkout root.
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let configs = root.join("configs");
        Self {
            spack_root: root.join("spack"),
            templates: configs.join("templates"),
            sites: configs.join("sites"),
            common: configs.join("common"),
            containers: configs.join("containers"),
            root,
        }
    }

    /// Find the checkout containing `start` by walking up to the first
    /// directory holding [`CHECK_FILE`].
    pub fn discover(start: &Path) -> Option<Self> {
        start
            .ancestors()
            .find(|dir| dir.join(CHECK_FILE).is_file())
            .map(Self::from_root)
    }

    /// Apply configured overrides on top of this layout.
    pub fn with_overrides(mut self, overrides: &PathsConfig) -> Self {
        if let Some(spack) = &overrides.spack {
            self.spack_root = spack.clone();
        }
        if let Some(templates) = &overrides.templates {
            self.templates = templates.clone();
        }
        if let Some(sites) = &overrides.sites {
            self.sites = sites.clone();
        }
        if let Some(common) = &overrides.common {
            self.common = common.clone();
        }
        if let Some(containers) = &overrides.containers {
            self.containers = containers.clone();
        }
        self
    }

    /// Configuration directory for a site.
    pub fn site_dir(&self, site: &str) -> PathBuf {
        self.sites.join(site)
    }

    /// Names of all site directories, sorted.
    pub fn list_sites(&self) -> io::Result<Vec<String>> {
        if !self.sites.is_dir() {
            return Ok(Vec::new());
        }
        let mut sites = Vec::new();
        for entry in fs::read_dir(&self.sites)? {
            let entry = entry?;
            if entry.path().is_dir() {
                sites.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        sites.sort();
        Ok(sites)
    }
}
