//! Mapping Schema Types
//!
//! The extension to grammar mapping table and its validation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Grammar id used when no mapping matches an extension
pub const UNKNOWN_GRAMMAR: &str = "none";

/// Version written by this build
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// One row of the mapping table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageMapping {
    /// File extension without the leading dot
    pub extension: String,
    #[serde(rename = "prismLanguage", alias = "grammarId")]
    pub grammar_id: String,
    pub display_name: String,
}

impl LanguageMapping {
    pub fn new(extension: &str, grammar_id: &str, display_name: &str) -> Self {
        Self {
            extension: extension.to_string(),
            grammar_id: grammar_id.to_string(),
            display_name: display_name.to_string(),
        }
    }
}

/// Validated plugin configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginConfig {
    pub config_version: u32,
    pub mappings: Vec<LanguageMapping>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            config_version: CURRENT_CONFIG_VERSION,
            mappings: vec![
                LanguageMapping::new("py", "python", "Python"),
                LanguageMapping::new("shader", "glsl", "GLSL"),
            ],
        }
    }
}

impl PluginConfig {
    /// First mapping for `extension` (exact, case-sensitive)
    pub fn lookup(&self, extension: &str) -> Option<&LanguageMapping> {
        self.mappings.iter().find(|m| m.extension == extension)
    }

    /// Grammar for `extension`, or [`UNKNOWN_GRAMMAR`]
    pub fn grammar_for(&self, extension: &str) -> &str {
        self.lookup(extension)
            .map(|m| m.grammar_id.as_str())
            .unwrap_or(UNKNOWN_GRAMMAR)
    }

    /// Configured extensions in table order
    pub fn extensions(&self) -> Vec<&str> {
        self.mappings.iter().map(|m| m.extension.as_str()).collect()
    }
}

/// Mapping entry as found in untrusted data; every field optional
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMapping {
    #[serde(default)]
    extension: Option<String>,
    #[serde(default)]
    prism_language: Option<String>,
    #[serde(default)]
    grammar_id: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

/// Strip surrounding whitespace and one leading dot
pub fn normalize_extension(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed.strip_prefix('.').unwrap_or(trimmed).trim().to_string()
}

impl RawMapping {
    fn into_mapping(self) -> Option<LanguageMapping> {
        let extension = normalize_extension(&self.extension?);
        // The stored key wins when an entry carries both
        let grammar_id = self.prism_language.or(self.grammar_id)?.trim().to_string();
        let display_name = self.display_name?.trim().to_string();

        if extension.is_empty() || grammar_id.is_empty() || display_name.is_empty() {
            return None;
        }

        Some(LanguageMapping {
            extension,
            grammar_id,
            display_name,
        })
    }
}

/// Merge an untrusted, possibly partial value over the defaults.
///
/// Never fails. Absent or malformed `mappings` fall back to the default
/// table; a well-formed list is filtered entry by entry. Later duplicates of
/// an extension are dropped.
pub fn validate(partial: &Value) -> PluginConfig {
    let defaults = PluginConfig::default();

    let mappings = match partial.get("mappings") {
        Some(Value::Array(entries)) => {
            let mut mappings: Vec<LanguageMapping> = Vec::with_capacity(entries.len());
            for entry in entries {
                let raw = match serde_json::from_value::<RawMapping>(entry.clone()) {
                    Ok(raw) => raw,
                    Err(e) => {
                        log::warn!("Dropping malformed mapping entry {}: {}", entry, e);
                        continue;
                    }
                };
                let Some(mapping) = raw.into_mapping() else {
                    log::debug!("Dropping incomplete mapping entry: {}", entry);
                    continue;
                };
                if mappings.iter().any(|m| m.extension == mapping.extension) {
                    log::warn!(
                        "Duplicate mapping for extension '{}' ignored",
                        mapping.extension
                    );
                    continue;
                }
                mappings.push(mapping);
            }
            mappings
        }
        Some(other) if !other.is_null() => {
            log::warn!("Ignoring malformed mappings, using defaults");
            defaults.mappings
        }
        _ => defaults.mappings,
    };

    let version = partial
        .get("configVersion")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok());

    PluginConfig {
        mappings,
        config_version: migrate(version),
    }
}

/// Version the data is treated as after migration
fn migrate(version: Option<u32>) -> u32 {
    match version {
        Some(CURRENT_CONFIG_VERSION) | None => CURRENT_CONFIG_VERSION,
        Some(other) => {
            log::debug!(
                "No migration from config version {}, treating as current",
                other
            );
            CURRENT_CONFIG_VERSION
        }
    }
}
