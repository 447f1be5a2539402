//! Code Embed
//!
//! Turns embedded references to source files in rendered notes into
//! collapsible, syntax-highlighted code blocks.
//!
//! This library provides:
//! - A document tree the embed pipeline reads placeholders from and writes blocks into
//! - The extension to grammar mapping table and its persistence
//! - The embed pipeline and the click controls of converted blocks
//! - Markdown rendering and a syntect-backed highlighter for the command line host

pub mod cli;
pub mod config;
pub mod dom;
pub mod embed;
pub mod highlight;
pub mod host;
pub mod markdown;
pub mod plugin;
pub mod settings;

// Re-exports for a flat public API
pub use config::Config;
pub use dom::{Document, NodeId, SharedDocument};
pub use embed::{EmbedOutcome, EmbedProcessor, InteractionControls, PassHandle};
pub use host::FileRef;
pub use plugin::{CodeEmbedPlugin, Host};
pub use settings::{ConfigStore, LanguageMapping, PluginConfig};
