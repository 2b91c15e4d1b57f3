//! Localized preset display names.
//!
//! Names are a pure function of a [`Translator`] and the fixed preset list
//! (see [`preset_names`]). An application that wants
//! [`preset_display_name`](crate::quality::preset_display_name) to return
//! translated names installs the table once at startup with
//! [`install_preset_names`]; the table is immutable afterwards.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::quality::{PRESET_COUNT, Quality};

static PRESET_NAMES: OnceCell<[String; PRESET_COUNT]> = OnceCell::new();

/// Translates user-visible source strings.
pub trait Translator: Send + Sync {
    /// Returns the translation of `source`, or `None` to keep the source text.
    fn translate(&self, source: &str) -> Option<String>;
}

/// Translator that leaves every string untranslated.
#[derive(Debug, Clone, Copy, Default)]
pub struct Untranslated;

impl Translator for Untranslated {
    fn translate(&self, _source: &str) -> Option<String> {
        None
    }
}

/// A message catalog mapping source strings to translations.
///
/// Serialized as a flat YAML mapping:
///
/// ```yaml
/// "Medium Quality": "Mittlere Qualität"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: HashMap<String, String>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a translation.
    pub fn insert(&mut self, source: impl Into<String>, translation: impl Into<String>) {
        self.entries.insert(source.into(), translation.into());
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses a catalog from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::new());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Loads a catalog from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }
}

impl Translator for Catalog {
    fn translate(&self, source: &str) -> Option<String> {
        self.entries.get(source).cloned()
    }
}

/// Returns the display names of all presets, fastest first, as rendered by
/// `translator`. Untranslated entries keep their source text.
pub fn preset_names(translator: &dyn Translator) -> [String; PRESET_COUNT] {
    Quality::ALL.map(|q| {
        translator
            .translate(q.name())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| q.name().to_string())
    })
}

/// Installs the process-wide preset name table.
///
/// Only the first call takes effect; later calls return
/// [`Error::NamesInstalled`] and leave the table unchanged.
pub fn install_preset_names(translator: &dyn Translator) -> Result<()> {
    PRESET_NAMES
        .set(preset_names(translator))
        .map_err(|_| Error::NamesInstalled)?;
    tracing::debug!("installed localized preset names");
    Ok(())
}

/// Returns the installed preset name table, if any.
pub fn installed_preset_names() -> Option<&'static [String; PRESET_COUNT]> {
    PRESET_NAMES.get()
}
