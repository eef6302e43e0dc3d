//! Source revisions recorded in generated manifests.

use crate::error::StackError;
use crate::paths::StackPaths;
use std::path::Path;
use std::process::Command;

/// Looks up the short revision of a checkout.
pub trait RevisionSource {
    /// Short revision hash of the checkout at `dir`.
    fn short_hash(&self, dir: &Path) -> Result<String, StackError>;
}

/// Queries git with `git rev-parse --short HEAD`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitRevision;

impl RevisionSource for GitRevision {
    fn short_hash(&self, dir: &Path) -> Result<String, StackError> {
        let revision_err = |reason: String| StackError::Revision {
            path: dir.display().to_string(),
            reason,
        };

        let output = Command::new("git")
            .args(["rev-parse", "--short", "HEAD"])
            .current_dir(dir)
            .output()
            .map_err(|e| revision_err(format!("failed to run git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(revision_err(stderr.trim().to_string()));
        }

        let hash = String::from_utf8(output.stdout)
            .map_err(|_| revision_err("git printed a non-UTF-8 revision".to_string()))?;
        let hash = hash.trim();
        if hash.is_empty() {
            return Err(revision_err("git printed no revision".to_string()));
        }
        Ok(hash.to_string())
    }
}

/// A revision source that always answers with the same hash.
#[derive(Debug, Clone)]
pub struct FixedRevision(pub String);

impl RevisionSource for FixedRevision {
    fn short_hash(&self, _dir: &Path) -> Result<String, StackError> {
        Ok(self.0.clone())
    }
}

/// Revisions of the stack and Spack checkouts an environment was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub stack: String,
    pub spack: String,
}

impl Provenance {
    /// Look up both revisions. Either lookup failing fails the whole call.
    pub fn collect(source: &dyn RevisionSource, paths: &StackPaths) -> Result<Self, StackError> {
        Ok(Self {
            stack: source.short_hash(&paths.root)?,
            spack: source.short_hash(&paths.spack_root)?,
        })
    }

    /// Two-line header written above the manifest.
    pub fn header(&self) -> String {
        format!("spack-stack hash: {}\nspack hash: {}", self.stack, self.spack)
    }
}
