//! Copy command
//!
//! Usage: prodex copy <MODEL> <COMPONENT> --db <PATH> [--suffix SUFFIX] [--date YYYY-MM-DD]
//!
//! Stores the model's components in the repository, then copies the whole
//! structure below COMPONENT into it under new handles.

use super::CommandResult;
use chrono::NaiveDate;
use clap::Args;
use prodex_core::{ChangeBroadcaster, CopyRequest, DeepCopyEngine, ModelSettings, ProductStructure};
use prodex_store::model_file::import_model_file;
use prodex_store::SqliteComponentRepo;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct CopyArgs {
    /// Path to the model YAML file
    pub model: PathBuf,

    /// Root product component of the structure to copy
    pub component: String,

    /// Component repository database
    #[arg(long)]
    pub db: PathBuf,

    /// Appended to each copied component's name
    #[arg(long, default_value = "-copy")]
    pub suffix: String,

    /// Working date; defaults to the configured one, then today
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

/// Execute copy command
pub fn execute(args: CopyArgs, settings: &ModelSettings) -> CommandResult {
    let mut settings = settings.clone();
    if let Some(date) = args.date {
        settings.working_date = Some(date);
    }
    let date = settings.effective_working_date();

    let mut repo = SqliteComponentRepo::open(&args.db)?;
    let (store, summary) = import_model_file(&args.model, &mut repo)?;
    tracing::info!(
        written = summary.written.len(),
        components = summary.components,
        "model components stored"
    );

    let structure = ProductStructure::build(&repo, &args.component, date)?;
    let request = CopyRequest::whole_structure(&structure, &args.suffix, &repo)?;
    let outcome = DeepCopyEngine::new(&settings).copy(
        &store,
        &mut repo,
        &structure,
        &request,
        &ChangeBroadcaster::new(),
    )?;

    for (handle, source) in &outcome.copies {
        println!("{} -> {}", source, handle);
    }
    println!("Copied {} components", outcome.len());
    Ok(())
}
