//! Validate command
//!
//! Usage: prodex validate <MODEL> [--type NAME]... [--component NAME]...

use super::CommandResult;
use clap::Args;
use prodex_core::rules::{validate_component, validate_type};
use prodex_core::{MessageList, ModelSettings};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Path to the model YAML file
    pub model: PathBuf,

    /// Type to validate (repeatable); all types when neither filter is given
    #[arg(long = "type", value_name = "NAME")]
    pub types: Vec<String>,

    /// Product component to validate (repeatable)
    #[arg(long = "component", value_name = "NAME")]
    pub components: Vec<String>,
}

/// Execute validate command
pub fn execute(args: ValidateArgs, settings: &ModelSettings) -> CommandResult {
    let store = prodex_store::load_model_file(&args.model)?;

    let (types, components) = if args.types.is_empty() && args.components.is_empty() {
        (
            store
                .list_types()
                .iter()
                .map(|t| t.qualified_name.clone())
                .collect(),
            store
                .list_components()
                .iter()
                .map(|c| c.name.clone())
                .collect(),
        )
    } else {
        (args.types, args.components)
    };

    let mut errors = 0;
    let mut warnings = 0;
    let mut report = |label: &str, name: &str, messages: &MessageList| {
        for message in messages.iter() {
            println!("{} {}: {}", label, name, message);
        }
        errors += messages.error_count();
        warnings += messages.len() - messages.error_count();
    };

    for name in &types {
        let messages = validate_type(&store, name, settings)?;
        report("type", name, &messages);
    }
    // Formulas are not compiled from the CLI.
    for name in &components {
        let messages = validate_component(&store, name, None)?;
        report("component", name, &messages);
    }

    println!(
        "Validated {} types and {} components: {} errors, {} warnings",
        types.len(),
        components.len(),
        errors,
        warnings
    );

    if errors > 0 {
        return Err(format!("validation found {} errors", errors).into());
    }
    Ok(())
}
