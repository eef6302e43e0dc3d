//! Scoped environment activation.

use crate::error::StackError;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tracing::debug;

thread_local! {
    static ACTIVE: RefCell<Option<PathBuf>> = const { RefCell::new(None) };
}

/// An active environment. Deactivated when dropped, including on early
/// returns through `?`.
#[derive(Debug)]
pub struct ActiveEnvironment {
    path: PathBuf,
}

impl ActiveEnvironment {
    /// Activate the environment at `path`.
    ///
    /// Only one environment can be active per thread at a time.
    pub fn activate(path: &Path) -> Result<Self, StackError> {
        ACTIVE.with(|active| {
            let mut active = active.borrow_mut();
            if let Some(current) = active.as_ref() {
                return Err(StackError::AlreadyActive(current.display().to_string()));
            }
            *active = Some(path.to_path_buf());
            Ok(())
        })?;
        debug!("activated environment {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ActiveEnvironment {
    fn drop(&mut self) {
        ACTIVE.with(|active| active.borrow_mut().take());
        debug!("deactivated environment {}", self.path.display());
    }
}

/// The environment currently active on this thread.
pub fn active_environment() -> Option<PathBuf> {
    ACTIVE.with(|active| active.borrow().clone())
}
