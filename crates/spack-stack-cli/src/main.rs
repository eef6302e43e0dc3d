mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "spack-stack")]
#[command(about = "Compose Spack environments from templates, sites and common configs")]
struct Cli {
    /// spack-stack checkout root (default: $SPACK_STACK_ROOT, config, or discovery)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging
    #[arg(long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an environment or container manifest
    Create {
        #[command(subcommand)]
        target: CreateTarget,
    },

    /// List available templates
    Templates,

    /// List available site configurations
    Sites,
}

#[derive(Subcommand)]
enum CreateTarget {
    /// Create a Spack environment
    Env {
        /// Template name or absolute path (default: empty)
        #[arg(long)]
        template: Option<String>,

        /// Site configuration to include ("none" for no site)
        #[arg(long)]
        site: Option<String>,

        /// Environment name (default: <template>.<site>)
        #[arg(long)]
        name: Option<String>,

        /// Directory to create the environment in
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Compiler spec for packages:all:compiler
        #[arg(long)]
        compiler: Option<String>,

        /// MPI provider for packages:all:providers:mpi
        #[arg(long)]
        mpi: Option<String>,

        /// Install tree root; module files go under <prefix>/modulefiles
        #[arg(long)]
        prefix: Option<PathBuf>,

        /// packages.yaml replacing the common package pins
        #[arg(long)]
        packages: Option<PathBuf>,

        /// Don't include the common configs
        #[arg(long)]
        no_common: bool,

        /// Read options from a YAML file; flags take precedence
        #[arg(long, value_name = "FILE")]
        from_file: Option<PathBuf>,
    },

    /// Create a container manifest
    Ctr {
        /// Container name or absolute path to a definition
        container: String,

        /// Template name or absolute path
        #[arg(long)]
        template: String,

        /// Output name (default: <template>.<container>)
        #[arg(long)]
        name: Option<String>,

        /// Directory to create the manifest in
        #[arg(long)]
        dir: Option<PathBuf>,

        /// packages.yaml with version pins to merge
        #[arg(long)]
        packages: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("SPACK_STACK_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Create { target } => match target {
            CreateTarget::Env {
                template,
                site,
                name,
                dir,
                compiler,
                mpi,
                prefix,
                packages,
                no_common,
                from_file,
            } => {
                let flags = spack_stack_core::EnvOptions {
                    name,
                    dir,
                    template,
                    site,
                    compiler,
                    mpi,
                    install_prefix: prefix,
                    base_packages: packages,
                    no_common,
                    includes: Vec::new(),
                };
                commands::create::env(cli.root, flags, from_file.as_deref())
            }
            CreateTarget::Ctr {
                container,
                template,
                name,
                dir,
                packages,
            } => commands::create::container(cli.root, &container, &template, name, dir, packages),
        },
        Command::Templates => commands::templates::run(cli.root),
        Command::Sites => commands::sites::run(cli.root),
    }
}
