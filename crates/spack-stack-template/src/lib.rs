//! Environment templates and include trees for spack-stack.
//!
//! A template is a base `spack.yaml` an environment starts from. Templates
//! live one per subdirectory of the templates directory; a built-in empty
//! template is used when none is requested.

mod builtin;
mod resolve;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub use builtin::DEFAULT_TEMPLATE;
pub use resolve::{TemplateResolver, TemplateSource};

/// File name of an environment manifest inside a template or environment.
pub const MANIFEST_FILE: &str = "spack.yaml";

/// An environment template.
#[derive(Debug, Clone)]
pub struct Template {
    /// Template name, used to derive default environment names.
    pub name: String,
    /// Where this template came from.
    source: TemplateSource,
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template \"{0}\" does not exist")]
    UnknownTemplate(String),
    #[error("failed to read template: {0}")]
    ReadTemplate(#[source] io::Error),
    #[error("destination already exists: {0}")]
    AlreadyExists(String),
    #[error("failed to copy {path}: {source}")]
    Copy {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl Template {
    /// Where the template's manifest comes from.
    pub fn source(&self) -> &TemplateSource {
        &self.source
    }

    /// Path of the manifest file on disk, if any.
    pub fn manifest_path(&self) -> Option<&Path> {
        match &self.source {
            TemplateSource::Builtin(_) => None,
            TemplateSource::Directory(_, manifest) | TemplateSource::File(manifest) => {
                Some(manifest)
            }
        }
    }

    /// Read the raw manifest text.
    pub fn read(&self) -> Result<String, TemplateError> {
        match &self.source {
            TemplateSource::Builtin(contents) => Ok((*contents).to_string()),
            TemplateSource::Directory(_, manifest) | TemplateSource::File(manifest) => {
                fs::read_to_string(manifest).map_err(TemplateError::ReadTemplate)
            }
        }
    }
}

/// Copy a directory tree verbatim to `dest`.
///
/// `dest` must not exist yet; it is created along with any missing parents.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<(), TemplateError> {
    if dest.exists() {
        return Err(TemplateError::AlreadyExists(dest.display().to_string()));
    }
    tracing::debug!("copying {} to {}", src.display(), dest.display());
    copy_dir(src, dest)
}

fn copy_dir(src: &Path, dest: &Path) -> Result<(), TemplateError> {
    fs::create_dir_all(dest).map_err(|e| copy_error(dest, e))?;

    for entry in fs::read_dir(src).map_err(|e| copy_error(src, e))? {
        let entry = entry.map_err(|e| copy_error(src, e))?;
        let src_path = entry.path();
        let dest_path: PathBuf = dest.join(entry.file_name());

        if src_path.is_dir() {
            copy_dir(&src_path, &dest_path)?;
        } else {
            fs::copy(&src_path, &dest_path).map_err(|e| copy_error(&src_path, e))?;
        }
    }

    Ok(())
}

fn copy_error(path: &Path, source: io::Error) -> TemplateError {
    TemplateError::Copy {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn copy_nested_tree() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("linux")).unwrap();
        fs::write(src.join("packages.yaml"), "packages: {}\n").unwrap();
        fs::write(src.join("linux").join("compilers.yaml"), "compilers: []\n").unwrap();

        let dest = temp.path().join("env").join("common");
        copy_tree(&src, &dest).unwrap();

        assert_eq!(
            fs::read_to_string(dest.join("packages.yaml")).unwrap(),
            "packages: {}\n"
        );
        assert!(dest.join("linux").join("compilers.yaml").is_file());
    }

    #[test]
    fn copy_refuses_existing_destination() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dest = temp.path().join("dest");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("keep.yaml"), "keep").unwrap();

        let err = copy_tree(&src, &dest).unwrap_err();
        assert!(matches!(err, TemplateError::AlreadyExists(_)));
        assert_eq!(fs::read_to_string(dest.join("keep.yaml")).unwrap(), "keep");
    }

    #[test]
    fn copy_missing_source() {
        let temp = TempDir::new().unwrap();
        let err = copy_tree(&temp.path().join("nope"), &temp.path().join("dest")).unwrap_err();
        assert!(matches!(err, TemplateError::Copy { .. }));
    }
}
