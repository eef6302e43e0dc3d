//! spack-stack core: layered composition of Spack environment manifests.
//!
//! An environment is built from a template `spack.yaml`, site and common
//! configuration includes, package pins and a few named overrides, then
//! written with the revisions of the stack and Spack checkouts it came from.

mod activation;
mod config;
mod container;
mod env;
mod error;
mod manifest;
mod merge;
mod paths;
mod revision;

pub use activation::{active_environment, ActiveEnvironment};
pub use config::{
    ConfigError, DefaultsConfig, PathsConfig, UserConfig, DEFAULT_ENV_DIR, ROOT_ENV_VAR,
};
pub use container::StackContainer;
pub use env::{EnvOptions, StackEnv, COMMON_INCLUDE, SITE_INCLUDE};
pub use error::StackError;
pub use manifest::{
    load_document, write_atomic, Manifest, CONFIG_SECTIONS, INCLUDE_KEY, ROOT_KEY,
};
pub use merge::{
    is_override_key, key_name, merge, merge_mappings, strip_override_markers, MergeStrategy,
    Precedence, SequenceMerge,
};
pub use paths::{StackPaths, CHECK_FILE};
pub use revision::{FixedRevision, GitRevision, Provenance, RevisionSource};
