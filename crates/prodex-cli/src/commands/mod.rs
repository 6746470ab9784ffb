//! Subcommand implementations

pub mod copy;
pub mod structure;
pub mod validate;

use prodex_core::logging_facility;
use prodex_core::ModelSettings;
use std::path::Path;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Load settings and start logging with their profile
pub fn load_settings(path: &Path) -> Result<ModelSettings, Box<dyn std::error::Error>> {
    let settings = ModelSettings::load(path)?;
    logging_facility::init(settings.log_profile);
    Ok(settings)
}
