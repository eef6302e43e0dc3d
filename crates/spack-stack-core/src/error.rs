//! Errors raised while composing an environment or container.

use spack_stack_template::TemplateError;
use std::io;

/// Errors that abort an environment or container build.
///
/// None of these are retried. A failure after the environment directory has
/// been created leaves that directory partially populated.
#[derive(Debug, thiserror::Error)]
pub enum StackError {
    #[error("template \"{0}\" does not exist")]
    InvalidTemplate(String),
    #[error("invalid container {0}")]
    InvalidContainer(String),
    #[error("environment '{0}' already exists")]
    AlreadyExists(String),
    #[error("site is not set")]
    SiteNotSet,
    #[error("site '{0}' does not exist")]
    SiteNotFound(String),
    #[error("failed to get git revision in {path}: {reason}")]
    Revision { path: String, reason: String },
    #[error("environment '{0}' is already active")]
    AlreadyActive(String),
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to copy include: {0}")]
    Copy(#[source] TemplateError),
    #[error("failed to parse manifest: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to serialize manifest: {0}")]
    Serialize(#[source] serde_yaml::Error),
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),
}

impl From<TemplateError> for StackError {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::UnknownTemplate(name) => StackError::InvalidTemplate(name),
            other => StackError::Copy(other),
        }
    }
}
