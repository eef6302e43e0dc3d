//! Sites command implementation.

use std::path::PathBuf;
use std::process::ExitCode;

pub fn run(root: Option<PathBuf>) -> ExitCode {
    let Some((_, paths)) = super::load(root) else {
        return ExitCode::FAILURE;
    };

    match paths.list_sites() {
        Ok(sites) if sites.is_empty() => {
            println!("no sites configured in {}", paths.sites.display());
            ExitCode::SUCCESS
        }
        Ok(sites) => {
            println!("Available sites:");
            for site in sites {
                println!("  {site}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to read {}: {e}", paths.sites.display());
            ExitCode::FAILURE
        }
    }
}
