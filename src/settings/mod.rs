//! Plugin Settings
//!
//! The extension to grammar mapping table: schema and validation, the
//! swappable store, persistence, and the editable draft used by the
//! settings surface.

pub mod draft;
pub mod persistence;
pub mod schema;
pub mod store;

pub use draft::{DraftError, SettingsDraft};
pub use persistence::{ConfigPersistence, ConfigWatcher, FileConfigPersistence};
pub use schema::{LanguageMapping, PluginConfig, UNKNOWN_GRAMMAR, validate};
pub use store::ConfigStore;
