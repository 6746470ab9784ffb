//! Prodex CLI
//!
//! Command-line interface for validating, inspecting and copying product
//! models

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "prodex")]
#[command(about = "Prodex - Product model validation and structure tooling", long_about = None)]
struct Cli {
    /// Settings file
    #[arg(long, global = true, default_value = "prodex.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate types and product components of a model file
    Validate(commands::validate::ValidateArgs),
    /// Print the product structure below a component
    Structure(commands::structure::StructureArgs),
    /// Copy a component's whole structure into a component repository
    Copy(commands::copy::CopyArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = commands::load_settings(&cli.config).and_then(|settings| match cli.command {
        Commands::Validate(args) => commands::validate::execute(args, &settings),
        Commands::Structure(args) => commands::structure::execute(args, &settings),
        Commands::Copy(args) => commands::copy::execute(args, &settings),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
