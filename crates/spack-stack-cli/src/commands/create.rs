//! Create command implementations.

use spack_stack_core::{EnvOptions, GitRevision, StackContainer, StackEnv, StackError};
use spack_stack_template::TemplateResolver;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

pub fn env(root: Option<PathBuf>, flags: EnvOptions, from_file: Option<&Path>) -> ExitCode {
    let Some((config, paths)) = super::load(root) else {
        return ExitCode::FAILURE;
    };

    let from_file = match from_file.map(EnvOptions::from_path).transpose() {
        Ok(options) => options.unwrap_or_default(),
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let defaults = EnvOptions {
        dir: Some(config.defaults.dir.clone()),
        site: config.defaults.site.clone(),
        ..EnvOptions::default()
    };
    let options = flags.or(from_file).or(defaults);

    let env = match StackEnv::new(paths, options) {
        Ok(env) => env,
        Err(e) => {
            eprintln!("error: {e}");
            if matches!(e, StackError::InvalidTemplate(_)) {
                eprintln!("hint: run 'spack-stack templates' to list available templates");
            }
            return ExitCode::FAILURE;
        }
    };

    match env.write(&GitRevision) {
        Ok(file) => {
            println!("created environment '{}' at {}", env.name(), file.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub fn container(
    root: Option<PathBuf>,
    container: &str,
    template: &str,
    name: Option<String>,
    dir: Option<PathBuf>,
    packages: Option<PathBuf>,
) -> ExitCode {
    let Some((config, paths)) = super::load(root) else {
        return ExitCode::FAILURE;
    };

    let templates = TemplateResolver::new(&paths.templates);
    let dir = dir.unwrap_or(config.defaults.dir);
    let ctr = match StackContainer::new(
        &paths.containers,
        &templates,
        container,
        template,
        name,
        dir,
        packages,
    ) {
        Ok(ctr) => ctr,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match ctr.write() {
        Ok(file) => {
            println!("created container '{}' at {}", ctr.name(), file.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
