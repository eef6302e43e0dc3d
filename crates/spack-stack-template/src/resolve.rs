//! Template resolution from names and paths.

use crate::builtin::{builtins, DEFAULT_TEMPLATE};
use crate::{Template, TemplateError, MANIFEST_FILE};
use std::fs;
use std::path::{Path, PathBuf};

/// Where a template's manifest comes from.
#[derive(Debug, Clone)]
pub enum TemplateSource {
    /// Built-in template with static contents.
    Builtin(&'static str),
    /// Template directory and the manifest inside it.
    Directory(PathBuf, PathBuf),
    /// A manifest file given by absolute path.
    File(PathBuf),
}

/// Resolves templates by name or absolute path.
#[derive(Debug)]
pub struct TemplateResolver {
    /// Directory holding one subdirectory per named template.
    templates_dir: Option<PathBuf>,
}

impl TemplateResolver {
    /// Create a resolver for a templates directory.
    pub fn new(templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            templates_dir: Some(templates_dir.into()),
        }
    }

    /// Create a resolver that only knows the built-in templates.
    pub fn builtin_only() -> Self {
        Self {
            templates_dir: None,
        }
    }

    /// Resolve an optional template identifier.
    ///
    /// `None` yields the built-in empty template. An absolute path must name
    /// an existing manifest file or a directory containing `spack.yaml`.
    /// Anything else is looked up by name in the templates directory, then
    /// among the built-ins.
    pub fn resolve(&self, identifier: Option<&str>) -> Result<Template, TemplateError> {
        match identifier {
            None => self.get(DEFAULT_TEMPLATE),
            Some(id) if Path::new(id).is_absolute() => load_absolute(Path::new(id))
                .ok_or_else(|| TemplateError::UnknownTemplate(id.to_string())),
            Some(name) => self.get(name),
        }
    }

    /// Get a template by name.
    pub fn get(&self, name: &str) -> Result<Template, TemplateError> {
        // Template directories shadow built-ins
        if let Some(template) = self.get_dir_template(name) {
            return Ok(template);
        }

        builtins()
            .into_iter()
            .find(|t| t.name == name)
            .ok_or_else(|| TemplateError::UnknownTemplate(name.to_string()))
    }

    /// List all available templates, sorted by name.
    pub fn list(&self) -> Result<Vec<Template>, TemplateError> {
        let mut templates = builtins();

        if let Some(ref dir) = self.templates_dir
            && dir.is_dir()
        {
            for entry in fs::read_dir(dir).map_err(TemplateError::ReadTemplate)? {
                let entry = entry.map_err(TemplateError::ReadTemplate)?;
                let path = entry.path();

                if let Some(template) = load_dir(&path) {
                    templates.retain(|t| t.name != template.name);
                    templates.push(template);
                }
            }
        }

        templates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(templates)
    }

    fn get_dir_template(&self, name: &str) -> Option<Template> {
        let dir = self.templates_dir.as_ref()?;
        // Names are single path components
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return None;
        }
        load_dir(&dir.join(name))
    }
}

fn load_dir(path: &Path) -> Option<Template> {
    let manifest = path.join(MANIFEST_FILE);
    if !path.is_dir() || !manifest.is_file() {
        return None;
    }
    let name = path.file_name()?.to_string_lossy().into_owned();
    Some(Template {
        name,
        source: TemplateSource::Directory(path.to_path_buf(), manifest),
    })
}

fn load_absolute(path: &Path) -> Option<Template> {
    if path.is_dir() {
        return load_dir(path);
    }
    if !path.is_file() {
        return None;
    }
    let name = path.file_stem()?.to_string_lossy().into_owned();
    Some(Template {
        name,
        source: TemplateSource::File(path.to_path_buf()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn templates_dir(names: &[&str]) -> TempDir {
        let temp = TempDir::new().unwrap();
        for name in names {
            let dir = temp.path().join(name);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(MANIFEST_FILE), format!("spack:\n  specs: [{name}]\n")).unwrap();
        }
        temp
    }

    #[test]
    fn default_is_builtin_empty() {
        let resolver = TemplateResolver::builtin_only();
        let template = resolver.resolve(None).unwrap();
        assert_eq!(template.name, DEFAULT_TEMPLATE);
        assert!(template.manifest_path().is_none());
        assert!(template.read().unwrap().contains("view: false"));
    }

    #[test]
    fn named_template() {
        let temp = templates_dir(&["skylab-dev"]);
        let resolver = TemplateResolver::new(temp.path());
        let template = resolver.resolve(Some("skylab-dev")).unwrap();
        assert_eq!(template.name, "skylab-dev");
        assert!(template.read().unwrap().contains("skylab-dev"));
    }

    #[test]
    fn absolute_directory_and_file() {
        let temp = templates_dir(&["ufs-weather-model"]);
        let dir = temp.path().join("ufs-weather-model");
        let resolver = TemplateResolver::builtin_only();

        let from_dir = resolver.resolve(Some(dir.to_str().unwrap())).unwrap();
        assert_eq!(from_dir.name, "ufs-weather-model");

        let file = dir.join(MANIFEST_FILE);
        let from_file = resolver.resolve(Some(file.to_str().unwrap())).unwrap();
        assert_eq!(from_file.name, "spack");
        assert_eq!(from_file.manifest_path(), Some(file.as_path()));
    }

    #[test]
    fn unknown_template() {
        let temp = templates_dir(&[]);
        let resolver = TemplateResolver::new(temp.path());
        let err = resolver.resolve(Some("nonexistent")).unwrap_err();
        assert!(matches!(err, TemplateError::UnknownTemplate(_)));

        let missing = temp.path().join("missing");
        let err = resolver.resolve(Some(missing.to_str().unwrap())).unwrap_err();
        assert!(matches!(err, TemplateError::UnknownTemplate(_)));
    }

    #[test]
    fn directory_without_manifest_is_unknown() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("half-done")).unwrap();
        let resolver = TemplateResolver::new(temp.path());
        assert!(resolver.get("half-done").is_err());
    }

    #[test]
    fn relative_paths_are_not_names() {
        let temp = templates_dir(&["a"]);
        let resolver = TemplateResolver::new(temp.path().join("a"));
        assert!(resolver.get("../a").is_err());
    }

    #[test]
    fn list_templates() {
        let temp = templates_dir(&["skylab-dev", "empty", "jedi-fv3"]);
        fs::create_dir_all(temp.path().join("not-a-template")).unwrap();
        let resolver = TemplateResolver::new(temp.path());

        let names: Vec<_> = resolver
            .list()
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, ["empty", "jedi-fv3", "skylab-dev"]);

        // The directory template shadows the built-in
        let empty = resolver.get("empty").unwrap();
        assert!(matches!(empty.source(), TemplateSource::Directory(..)));
    }
}
