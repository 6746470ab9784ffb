//! Structure command
//!
//! Usage: prodex structure <MODEL> <COMPONENT> [--date YYYY-MM-DD]

use super::CommandResult;
use chrono::NaiveDate;
use clap::Args;
use prodex_core::{ModelSettings, ProductStructure};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct StructureArgs {
    /// Path to the model YAML file
    pub model: PathBuf,

    /// Root product component
    pub component: String,

    /// Working date; defaults to the configured one, then today
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

/// Execute structure command
pub fn execute(args: StructureArgs, settings: &ModelSettings) -> CommandResult {
    let store = prodex_store::load_model_file(&args.model)?;
    let date = args
        .date
        .unwrap_or_else(|| settings.effective_working_date());

    let structure = ProductStructure::build(&store, &args.component, date)?;

    println!("Structure of {} on {}", args.component, date);
    for (_, node) in structure.iter() {
        let indent = "  ".repeat(node.depth);
        match &node.association {
            Some(association) => println!("{}{} -> {}", indent, association, node.component),
            None => println!("{}{}", indent, node.component),
        }
    }
    println!("{} nodes", structure.len());
    Ok(())
}
