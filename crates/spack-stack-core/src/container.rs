//! Container manifests: a container definition merged with an app template
//! and package pins.

use crate::error::StackError;
use crate::manifest::{load_document, Manifest};
use crate::merge::MergeStrategy;
use spack_stack_template::{Template, TemplateResolver, MANIFEST_FILE};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Path of the label recording which template a container was built from.
const APP_LABEL: &str = "container:labels:app";

/// A container manifest built from a container definition, a template and
/// optional package pins.
#[derive(Debug, Clone)]
pub struct StackContainer {
    container_path: PathBuf,
    template: Template,
    name: String,
    dir: PathBuf,
    base_packages: Option<PathBuf>,
}

impl StackContainer {
    /// Resolve the container definition and template. Touches nothing on
    /// disk.
    ///
    /// `container` is a name in `containers_dir` (`<name>.yaml`) or an
    /// absolute path to a definition file.
    pub fn new(
        containers_dir: &Path,
        templates: &TemplateResolver,
        container: &str,
        template: &str,
        name: Option<String>,
        dir: PathBuf,
        base_packages: Option<PathBuf>,
    ) -> Result<Self, StackError> {
        let container_path = resolve_container(containers_dir, container)?;
        let template = templates.resolve(Some(template))?;
        let name =
            name.unwrap_or_else(|| format!("{}.{}", template.name, container_stem(container)));

        Ok(Self {
            container_path,
            template,
            name,
            dir,
            base_packages,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `<dir>/<name>`
    pub fn env_dir(&self) -> PathBuf {
        self.dir.join(&self.name)
    }

    /// Compose the container manifest without writing it.
    ///
    /// Order: container definition, package pins into `packages`, the
    /// template, then the untouched container definition again so it wins.
    pub fn compose(&self) -> Result<Manifest, StackError> {
        let mut template = Manifest::from_str(&self.template.read()?)?;
        template.strip_override_markers();

        let container = Manifest::from_path(&self.container_path)?;
        let original = container.clone();
        let mut merged = container;

        if let Some(path) = &self.base_packages {
            let pins = load_document(path)?;
            let packages = pins.get("packages").ok_or_else(|| {
                StackError::InvalidManifest(format!(
                    "{} has no 'packages' section",
                    path.display()
                ))
            })?;
            debug!("merging package pins from {}", path.display());
            merged.merge_section("packages", packages, MergeStrategy::LAYER);
        }

        merged.merge(&template, MergeStrategy::LAYER);
        merged.merge(&original, MergeStrategy::LAYER);
        merged.set(APP_LABEL, serde_yaml::Value::String(self.template.name.clone()));

        Ok(merged)
    }

    /// Compose and write `<dir>/<name>/spack.yaml`.
    pub fn write(&self) -> Result<PathBuf, StackError> {
        let env_dir = self.env_dir();
        if env_dir.exists() {
            return Err(StackError::AlreadyExists(env_dir.display().to_string()));
        }

        let manifest = self.compose()?;

        fs::create_dir_all(&env_dir).map_err(|source| StackError::CreateDir {
            path: env_dir.display().to_string(),
            source,
        })?;
        let file = env_dir.join(MANIFEST_FILE);
        manifest.write(&file, None)?;

        info!("successfully wrote container manifest at {}", file.display());
        Ok(file)
    }
}

fn resolve_container(containers_dir: &Path, container: &str) -> Result<PathBuf, StackError> {
    let named = containers_dir.join(format!("{container}.yaml"));
    if !container.contains(['/', '\\']) && named.is_file() {
        return Ok(named);
    }
    let path = Path::new(container);
    if path.is_absolute() && path.is_file() {
        return Ok(path.to_path_buf());
    }
    Err(StackError::InvalidContainer(container.to_string()))
}

fn container_stem(container: &str) -> String {
    Path::new(container)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| container.to_string())
}
