//! Model settings loaded from `prodex.toml`

use std::path::Path;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::errors::{ProdexError, Result};
use crate::logging_facility::Profile;

/// Which validity date a copied generation gets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationValidFrom {
    /// The working date of the copy
    #[default]
    WorkingDate,
    /// The source generation's own `valid_from`
    Source,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct CopySettings {
    pub generation_valid_from: GenerationValidFrom,
}

/// Settings that shape validation, structure building and copying
///
/// ```
/// use prodex_core::settings::ModelSettings;
///
/// let settings = ModelSettings::from_toml_str(r#"
///     working_date = "2024-01-01"
///     case_insensitive_property_names = false
/// "#).unwrap();
/// assert!(!settings.case_insensitive_property_names);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Date used to pick the effective generation; today (UTC) when unset
    pub working_date: Option<NaiveDate>,

    pub case_insensitive_property_names: bool,

    pub log_profile: Profile,

    pub copy: CopySettings,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            working_date: None,
            case_insensitive_property_names: true,
            log_profile: Profile::default(),
            copy: CopySettings::default(),
        }
    }
}

impl ModelSettings {
    /// Parse settings from TOML text
    ///
    /// # Errors
    ///
    /// Returns `InvalidSettings` if the text is not valid settings TOML.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ProdexError::InvalidSettings {
            reason: e.to_string(),
        })
    }

    /// Load settings from a file; a missing file yields the defaults
    ///
    /// # Errors
    ///
    /// Returns `InvalidSettings` if the file exists but cannot be read or
    /// parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|e| ProdexError::InvalidSettings {
            reason: format!("{}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&text)
    }

    /// The configured working date, or today
    pub fn effective_working_date(&self) -> NaiveDate {
        self.working_date.unwrap_or_else(|| Utc::now().date_naive())
    }

    pub fn with_working_date(mut self, date: NaiveDate) -> Self {
        self.working_date = Some(date);
        self
    }
}
