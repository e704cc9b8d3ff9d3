use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;
use unrpy::commands;

#[derive(Parser)]
#[command(name = "unrpy")]
#[command(about = "Reconstruct Ren'Py script source from AST dumps", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decompile a JSON AST dump into Ren'Py script
    Decompile {
        /// Path to the AST dump (.json)
        file: String,
        /// Configuration file (default: unrpy.toml when present)
        #[arg(long)]
        config: Option<String>,
        /// Write the script here instead of stdout
        #[arg(short, long)]
        output: Option<String>,
        /// Spaces per indent level (overrides the config file)
        #[arg(long)]
        indent: Option<usize>,
    },
    /// List recognized AST classes and their handlers
    Classes,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Decompile { file, config, output, indent } => {
            commands::decompile::execute(&file, config.as_deref(), output.as_deref(), indent)
        }
        Commands::Classes => commands::classes::execute(),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
