//! Code File Embeds
//!
//! The post-processing pipeline: select placeholders, resolve and read the
//! referenced files, and swap in collapsible highlighted blocks.

pub mod block;
pub mod controls;
pub mod processor;
pub mod resolver;
pub mod selector;

pub use controls::{ClickEvent, InteractionControls, Modifiers, ToggleState};
pub use processor::{EmbedError, EmbedOutcome, EmbedProcessor, PassHandle};
pub use selector::EmbedSelector;
