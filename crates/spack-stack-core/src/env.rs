//! Environment composition: template, includes, overrides, provenance.

use crate::activation::ActiveEnvironment;
use crate::config::DEFAULT_ENV_DIR;
use crate::error::StackError;
use crate::manifest::Manifest;
use crate::paths::StackPaths;
use crate::revision::{Provenance, RevisionSource};
use serde::Deserialize;
use serde_yaml::Value;
use spack_stack_template::{copy_tree, TemplateResolver, MANIFEST_FILE};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Include directory name for site configuration.
pub const SITE_INCLUDE: &str = "site";

/// Include directory name for common configuration.
pub const COMMON_INCLUDE: &str = "common";

/// Site name meaning "no site".
const NO_SITE: &str = "none";

/// Options for building an environment.
///
/// Deserializable so a whole build can be described in a YAML file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EnvOptions {
    /// Environment name; defaults to `<template>.<site>`.
    pub name: Option<String>,
    /// Directory the environment is created in.
    pub dir: Option<PathBuf>,
    /// Template name or absolute path; the empty template if unset.
    pub template: Option<String>,
    /// Site configuration to include.
    pub site: Option<String>,
    /// Compiler spec for `packages:all:compiler`.
    pub compiler: Option<String>,
    /// MPI provider for `packages:all:providers:mpi`.
    pub mpi: Option<String>,
    /// Install tree root; module files go under `<prefix>/modulefiles`.
    pub install_prefix: Option<PathBuf>,
    /// `packages.yaml` replacing the common package pins.
    pub base_packages: Option<PathBuf>,
    /// Skip the common include.
    pub no_common: bool,
    /// Extra include names appended after `site` and `common`.
    pub includes: Vec<String>,
}

impl EnvOptions {
    /// Load options from a YAML file.
    pub fn from_path(path: &Path) -> Result<Self, StackError> {
        let contents = fs::read_to_string(path).map_err(|source| StackError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_yaml::from_str(&contents)?)
    }

    /// Fill every unset field from `fallback`.
    pub fn or(self, fallback: EnvOptions) -> Self {
        Self {
            name: self.name.or(fallback.name),
            dir: self.dir.or(fallback.dir),
            template: self.template.or(fallback.template),
            site: self.site.or(fallback.site),
            compiler: self.compiler.or(fallback.compiler),
            mpi: self.mpi.or(fallback.mpi),
            install_prefix: self.install_prefix.or(fallback.install_prefix),
            base_packages: self.base_packages.or(fallback.base_packages),
            no_common: self.no_common || fallback.no_common,
            includes: if self.includes.is_empty() {
                fallback.includes
            } else {
                self.includes
            },
        }
    }
}

/// A Spack environment built from a template, site and common includes,
/// and a few named overrides.
///
/// Precedence, lowest first: site, common, base package pins, named
/// overrides, the template itself.
#[derive(Debug, Clone)]
pub struct StackEnv {
    paths: StackPaths,
    name: String,
    dir: PathBuf,
    template_name: String,
    manifest: Manifest,
    site: Option<String>,
    compiler: Option<String>,
    mpi: Option<String>,
    install_prefix: Option<PathBuf>,
    base_packages: Option<PathBuf>,
    common: bool,
    includes: Vec<String>,
}

impl StackEnv {
    /// Resolve the template and load it. Touches nothing on disk.
    pub fn new(paths: StackPaths, options: EnvOptions) -> Result<Self, StackError> {
        let resolver = TemplateResolver::new(&paths.templates);
        let template = resolver.resolve(options.template.as_deref())?;
        let manifest = Manifest::from_str(&template.read()?)?;

        let site = options.site.filter(|s| s != NO_SITE);
        let name = options.name.unwrap_or_else(|| {
            format!("{}.{}", template.name, site.as_deref().unwrap_or(NO_SITE))
        });

        Ok(Self {
            paths,
            name,
            dir: options.dir.unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_DIR)),
            template_name: template.name,
            manifest,
            site,
            compiler: options.compiler,
            mpi: options.mpi,
            install_prefix: options.install_prefix,
            base_packages: options.base_packages,
            common: !options.no_common,
            includes: options.includes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template_name(&self) -> &str {
        &self.template_name
    }

    pub fn site(&self) -> Option<&str> {
        self.site.as_deref()
    }

    /// The template manifest, before includes and overrides.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// `<dir>/<name>`
    pub fn env_dir(&self) -> PathBuf {
        self.dir.join(&self.name)
    }

    /// Register extra include names, appended after `site` and `common`.
    pub fn add_includes(&mut self, includes: impl IntoIterator<Item = String>) {
        self.includes.extend(includes);
    }

    /// Configuration directory of the selected site.
    pub fn site_configs_dir(&self) -> Result<PathBuf, StackError> {
        let site = self.site.as_deref().ok_or(StackError::SiteNotSet)?;
        Ok(self.paths.site_dir(site))
    }

    /// Create the environment directory and write `spack.yaml`.
    ///
    /// Fails without touching the disk if the directory already exists or
    /// the site is unknown. Later failures leave the partially populated
    /// directory in place.
    pub fn write(&self, revisions: &dyn RevisionSource) -> Result<PathBuf, StackError> {
        let env_dir = self.env_dir();
        if env_dir.exists() {
            return Err(StackError::AlreadyExists(env_dir.display().to_string()));
        }
        if let Some(site) = &self.site
            && !self.site_configs_dir()?.is_dir()
        {
            return Err(StackError::SiteNotFound(site.clone()));
        }

        fs::create_dir_all(&env_dir).map_err(|source| StackError::CreateDir {
            path: env_dir.display().to_string(),
            source,
        })?;

        // Site first so it has the lowest precedence of the includes
        let mut includes = Vec::new();
        if self.site.is_some() {
            self.copy_site_includes(&env_dir)?;
            includes.push(SITE_INCLUDE.to_string());
        }
        if self.common {
            self.copy_common_includes(&env_dir)?;
            includes.push(COMMON_INCLUDE.to_string());
        }
        if let Some(packages) = &self.base_packages {
            self.copy_package_pins(&env_dir, packages)?;
            if !includes.iter().any(|i| i == COMMON_INCLUDE) {
                includes.push(COMMON_INCLUDE.to_string());
            }
        }
        includes.extend(self.includes.iter().cloned());

        let mut manifest = self.manifest.clone();
        manifest.set_includes(&includes);

        let _active = ActiveEnvironment::activate(&env_dir)?;

        // The template's own settings win over the convenience overrides
        let original = manifest.config_sections();
        self.apply_overrides(&mut manifest);
        manifest.restore_sections(&original);

        let provenance = Provenance::collect(revisions, &self.paths)?;
        let env_file = env_dir.join(MANIFEST_FILE);
        manifest.write(&env_file, Some(&provenance.header()))?;

        info!("successfully wrote environment at {}", env_file.display());
        Ok(env_file)
    }

    fn copy_site_includes(&self, env_dir: &Path) -> Result<(), StackError> {
        let site_dir = self.site_configs_dir()?;
        debug!("including site configs from {}", site_dir.display());
        copy_tree(&site_dir, &env_dir.join(SITE_INCLUDE))?;
        Ok(())
    }

    fn copy_common_includes(&self, env_dir: &Path) -> Result<(), StackError> {
        debug!("including common configs from {}", self.paths.common.display());
        copy_tree(&self.paths.common, &env_dir.join(COMMON_INCLUDE))?;
        Ok(())
    }

    fn copy_package_pins(&self, env_dir: &Path, packages: &Path) -> Result<(), StackError> {
        let common_dir = env_dir.join(COMMON_INCLUDE);
        fs::create_dir_all(&common_dir).map_err(|source| StackError::CreateDir {
            path: common_dir.display().to_string(),
            source,
        })?;
        let dest = common_dir.join("packages.yaml");
        debug!("pinning packages from {}", packages.display());
        fs::copy(packages, &dest).map_err(|source| StackError::Write {
            path: dest.display().to_string(),
            source,
        })?;
        Ok(())
    }

    fn apply_overrides(&self, manifest: &mut Manifest) {
        if let Some(compiler) = &self.compiler {
            debug!("setting compiler {compiler}");
            manifest.set("packages:all:compiler", singleton(compiler));
        }
        if let Some(mpi) = &self.mpi {
            debug!("setting mpi provider {mpi}");
            manifest.set("packages:all:providers:mpi", singleton(mpi));
        }
        if let Some(prefix) = &self.install_prefix {
            debug!("setting install prefix {}", prefix.display());
            let module_root = prefix.join("modulefiles").display().to_string();
            manifest.set(
                "config:install_tree:root",
                Value::String(prefix.display().to_string()),
            );
            manifest.set("modules:default:roots:lmod", Value::String(module_root.clone()));
            manifest.set("modules:default:roots:tcl", Value::String(module_root));
        }
    }
}

fn singleton(item: &str) -> Value {
    Value::Sequence(vec![Value::String(item.to_string())])
}
