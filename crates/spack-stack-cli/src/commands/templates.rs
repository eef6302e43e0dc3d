//! Templates command implementation.

use spack_stack_template::TemplateResolver;
use std::path::PathBuf;
use std::process::ExitCode;

pub fn run(root: Option<PathBuf>) -> ExitCode {
    let Some((_, paths)) = super::load(root) else {
        return ExitCode::FAILURE;
    };
    let resolver = TemplateResolver::new(&paths.templates);

    match resolver.list() {
        Ok(templates) => {
            println!("Available templates:");
            for template in templates {
                let location = template
                    .manifest_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(built-in)".to_string());
                println!("  {:<25} {}", template.name, location);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
