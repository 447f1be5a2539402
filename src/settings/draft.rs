//! Settings Draft
//!
//! Editable copy of the mapping table. Edits happen on the draft; saving
//! hands a complete new [`PluginConfig`] to the plugin, which swaps it in.

use thiserror::Error;

use super::schema::{LanguageMapping, PluginConfig, normalize_extension};

/// Grammars offered as suggestions, with their display names
pub const LANGUAGE_OPTIONS: &[(&str, &str)] = &[
    ("", "None"),
    ("text", "Plain text"),
    ("python", "Python"),
    ("glsl", "GLSL"),
    ("javascript", "JavaScript"),
    ("typescript", "TypeScript"),
    ("css", "CSS"),
    ("html", "HTML"),
    ("rust", "Rust"),
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("duplicate extension: {0}")]
    DuplicateExtension(String),
    #[error("no mapping at index {0}")]
    NoSuchMapping(usize),
    #[error("no mapping for extension: {0}")]
    UnknownExtension(String),
    #[error("extension must not be empty")]
    EmptyExtension,
}

/// Display name for a grammar: the known option's name, else the id itself
pub fn display_name_for(grammar_id: &str) -> String {
    LANGUAGE_OPTIONS
        .iter()
        .find(|(value, _)| *value == grammar_id)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| grammar_id.to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettingsDraft {
    config: PluginConfig,
}

impl SettingsDraft {
    pub fn new(current: &PluginConfig) -> Self {
        Self {
            config: current.clone(),
        }
    }

    pub fn mappings(&self) -> &[LanguageMapping] {
        &self.config.mappings
    }

    /// Append the placeholder row `new -> text`
    pub fn add_mapping(&mut self) -> usize {
        self.config
            .mappings
            .push(LanguageMapping::new("new", "text", &display_name_for("text")));
        self.config.mappings.len() - 1
    }

    /// Append a filled-in row. The draft is unchanged on error.
    pub fn push_mapping(&mut self, extension: &str, grammar_id: &str) -> Result<usize, DraftError> {
        if normalize_extension(extension).is_empty() {
            return Err(DraftError::EmptyExtension);
        }
        let index = self.add_mapping();
        self.set_extension(index, extension)?;
        self.set_grammar(index, grammar_id)?;
        Ok(index)
    }

    pub fn remove_mapping(&mut self, index: usize) -> Result<LanguageMapping, DraftError> {
        if index >= self.config.mappings.len() {
            return Err(DraftError::NoSuchMapping(index));
        }
        Ok(self.config.mappings.remove(index))
    }

    pub fn remove_extension(&mut self, extension: &str) -> Result<LanguageMapping, DraftError> {
        let extension = normalize_extension(extension);
        let index = self
            .config
            .mappings
            .iter()
            .position(|m| m.extension == extension)
            .ok_or(DraftError::UnknownExtension(extension))?;
        self.remove_mapping(index)
    }

    /// Set the extension of a row. Empty input leaves the row unchanged.
    pub fn set_extension(&mut self, index: usize, value: &str) -> Result<(), DraftError> {
        let mapping = self
            .config
            .mappings
            .get_mut(index)
            .ok_or(DraftError::NoSuchMapping(index))?;
        let extension = normalize_extension(value);
        if !extension.is_empty() {
            mapping.extension = extension;
        }
        Ok(())
    }

    /// Set the grammar of a row and refresh its display name
    pub fn set_grammar(&mut self, index: usize, value: &str) -> Result<(), DraftError> {
        let mapping = self
            .config
            .mappings
            .get_mut(index)
            .ok_or(DraftError::NoSuchMapping(index))?;
        mapping.grammar_id = value.trim().to_string();
        mapping.display_name = display_name_for(&mapping.grammar_id);
        Ok(())
    }

    /// Check the draft can be saved
    pub fn validate(&self) -> Result<(), DraftError> {
        for (i, mapping) in self.config.mappings.iter().enumerate() {
            if self.config.mappings[..i]
                .iter()
                .any(|m| m.extension == mapping.extension)
            {
                return Err(DraftError::DuplicateExtension(mapping.extension.clone()));
            }
        }
        Ok(())
    }

    /// Throw away edits and start again from `current`
    pub fn reset(&mut self, current: &PluginConfig) {
        self.config = current.clone();
    }

    /// The configuration to save, if the draft is valid
    pub fn into_config(self) -> Result<PluginConfig, DraftError> {
        self.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_mapping_defaults() {
        let mut draft = SettingsDraft::new(&PluginConfig::default());
        let index = draft.add_mapping();
        assert_eq!(
            draft.mappings()[index],
            LanguageMapping::new("new", "text", "Plain text")
        );
    }

    #[test]
    fn test_set_extension_strips_dot_and_ignores_empty() {
        let mut draft = SettingsDraft::new(&PluginConfig::default());
        draft.set_extension(0, " .pyw").unwrap();
        assert_eq!(draft.mappings()[0].extension, "pyw");
        draft.set_extension(0, "  ").unwrap();
        assert_eq!(draft.mappings()[0].extension, "pyw");
        assert_eq!(
            draft.set_extension(9, "x"),
            Err(DraftError::NoSuchMapping(9))
        );
    }

    #[test]
    fn test_set_grammar_updates_display_name() {
        let mut draft = SettingsDraft::new(&PluginConfig::default());
        draft.set_grammar(1, "javascript").unwrap();
        assert_eq!(draft.mappings()[1].display_name, "JavaScript");
        draft.set_grammar(1, " kotlin ").unwrap();
        assert_eq!(draft.mappings()[1].grammar_id, "kotlin");
        assert_eq!(draft.mappings()[1].display_name, "kotlin");
    }

    #[test]
    fn test_duplicate_extensions_rejected() {
        let mut draft = SettingsDraft::new(&PluginConfig::default());
        draft.push_mapping(".py", "python").unwrap();
        assert_eq!(
            draft.clone().into_config(),
            Err(DraftError::DuplicateExtension("py".to_string()))
        );

        draft.remove_mapping(2).unwrap();
        let config = draft.into_config().unwrap();
        assert_eq!(config.extensions(), vec!["py", "shader"]);
    }

    #[test]
    fn test_push_mapping_rejects_empty_extension() {
        let mut draft = SettingsDraft::new(&PluginConfig::default());
        assert_eq!(draft.push_mapping("", "rust"), Err(DraftError::EmptyExtension));
        assert_eq!(draft.push_mapping(" . ", "rust"), Err(DraftError::EmptyExtension));
        assert_eq!(draft.mappings().len(), 2);
        assert!(draft.mappings().iter().all(|m| m.extension != "new"));
    }

    #[test]
    fn test_reset_discards_edits() {
        let current = PluginConfig::default();
        let mut draft = SettingsDraft::new(&current);
        draft.remove_extension("shader").unwrap();
        assert_eq!(draft.mappings().len(), 1);
        assert_eq!(
            draft.remove_extension("rs"),
            Err(DraftError::UnknownExtension("rs".to_string()))
        );
        draft.reset(&current);
        assert_eq!(draft.mappings(), current.mappings.as_slice());
    }
}
