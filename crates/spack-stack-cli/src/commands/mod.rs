pub mod create;
pub mod sites;
pub mod templates;

use spack_stack_core::{StackPaths, UserConfig};
use std::path::PathBuf;
use tracing::debug;

/// Load user config and resolve the checkout layout, reporting failures.
pub fn load(root: Option<PathBuf>) -> Option<(UserConfig, StackPaths)> {
    let config = UserConfig::load();
    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            eprintln!("error: cannot determine working directory: {e}");
            return None;
        }
    };

    match config.stack_paths(root, &cwd) {
        Ok(paths) => {
            debug!(
                root = %paths.root.display(),
                templates = %paths.templates.display(),
                "resolved stack checkout"
            );
            Some((config, paths))
        }
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("hint: pass --root or set SPACK_STACK_ROOT");
            None
        }
    }
}
