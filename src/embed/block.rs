//! Converted block assembly.
//!
//! Builds the nodes a placeholder turns into: the loading badge, the inline
//! error marker, the collapsible code block with its controls, and the
//! replacement element itself. Everything here is created detached; the
//! processor decides when to attach it.

use std::sync::Arc;

use crate::dom::{Behavior, Document, NodeId};
use crate::host::FileRef;

pub const EXPAND_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round" class="lucide lucide-chevron-down-icon lucide-chevron-down"><path d="m6 9 6 6 6-6"/></svg>"#;
pub const COLLAPSE_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round" class="lucide lucide-chevron-up-icon lucide-chevron-up"><path d="m18 15-6-6-6 6"/></svg>"#;
pub const COPY_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round" class="svg-icon lucide-copy"><rect x="8" y="8" width="14" height="14" rx="2" ry="2"></rect><path d="M4 16c-1.1 0-2-.9-2-2V4c0-1.1.9-2 2-2h10c1.1 0 2 .9 2 2"></path></svg>"#;
pub const SUCCESS_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round" class="svg-icon lucide-check"><path d="M20 6 9 17l-5-5"></path></svg>"#;

pub const BLOCK_CLASS: &str = "el-pre";
pub const TOGGLE_CLASS: &str = "code-toggle";
pub const COPY_CLASS: &str = "copy-code-button";
pub const ERROR_CLASS: &str = "code-embed-error";
pub const LOADING_CLASS: &str = "code-embed-loading";

pub const LOADING_TEXT: &str = "Loading code...";

/// Content of a block: highlighted markup, or text shown as is
#[derive(Debug, Clone, PartialEq)]
pub enum BlockContent {
    Highlighted(String),
    Plain(String),
}

/// Ids of a freshly assembled block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertedBlock {
    /// Collapsible container (`div.el-pre`)
    pub container: NodeId,
    /// Expand/collapse control, a sibling of the container
    pub toggle: NodeId,
    pub copy: NodeId,
    pub code: NodeId,
}

/// Loading badge shown while a placeholder is being fetched
pub fn loading_badge(doc: &mut Document) -> NodeId {
    let badge = doc.create_element("div");
    if let Some(el) = doc.element_mut(badge) {
        el.add_class(LOADING_CLASS);
        el.set_style("position", "absolute");
        el.set_style("background", "rgba(0,0,0,0.7)");
        el.set_style("color", "white");
        el.set_style("padding", "2px 8px");
        el.set_style("border-radius", "4px");
        el.set_style("font-size", "0.8em");
    }
    doc.set_text(badge, LOADING_TEXT);
    badge
}

/// Inline error marker carrying `message`
pub fn error_marker(doc: &mut Document, message: &str) -> NodeId {
    let marker = doc.create_element("div");
    if let Some(el) = doc.element_mut(marker) {
        el.add_class(ERROR_CLASS);
        el.set_style("color", "#ff4444");
    }
    doc.set_text(marker, format!("⚠️ {}", message));
    marker
}

/// Assemble the collapsed block for `source` highlighted as `grammar`
pub fn converted_block(
    doc: &mut Document,
    source: &str,
    grammar: &str,
    content: BlockContent,
) -> ConvertedBlock {
    let container = doc.create_element("div");
    if let Some(el) = doc.element_mut(container) {
        el.add_class(BLOCK_CLASS);
        el.set_style("cursor", "default");
        el.set_behavior(Behavior::StopPropagation);
    }

    let pre = doc.create_element("pre");
    if let Some(el) = doc.element_mut(pre) {
        el.add_class(&format!("language-{grammar}"));
        el.set_attr("tabindex", "0");
    }

    let code = doc.create_element("code");
    if let Some(el) = doc.element_mut(code) {
        el.set_attr("data-line", "0");
        el.add_class(&format!("language-{grammar}"));
        el.add_class("is-loaded");
    }
    match content {
        BlockContent::Highlighted(markup) => doc.set_markup(code, markup),
        BlockContent::Plain(text) => doc.set_text(code, text),
    }

    let copy = copy_button(doc, source);

    doc.append_child(pre, code);
    doc.append_child(pre, copy);
    doc.append_child(container, pre);

    let toggle = toggle_button(doc, container);

    ConvertedBlock {
        container,
        toggle,
        copy,
        code,
    }
}

fn copy_button(doc: &mut Document, source: &str) -> NodeId {
    let button = doc.create_element("button");
    if let Some(el) = doc.element_mut(button) {
        el.add_class(COPY_CLASS);
        el.set_behavior(Behavior::Copy {
            content: Arc::from(source),
            generation: 0,
        });
    }
    doc.set_markup(button, COPY_ICON);
    button
}

/// Toggle control for `block`; collapses the block
fn toggle_button(doc: &mut Document, block: NodeId) -> NodeId {
    let button = doc.create_element("div");
    if let Some(el) = doc.element_mut(button) {
        el.add_class(TOGGLE_CLASS);
        el.set_style("position", "absolute");
        el.set_style("top", "10px");
        el.set_style("right", "10px");
        el.set_style("cursor", "pointer");
        el.set_style("color", "var(--text-color)");
        el.set_behavior(Behavior::Toggle { block });
    }
    if let Some(el) = doc.element_mut(block) {
        el.set_style("display", "none");
    }
    doc.set_markup(button, EXPAND_ICON);
    button
}

/// New interactive element standing in for `placeholder`.
///
/// Built fresh from the placeholder's tag, attributes and static children,
/// with the toggle and block appended and the composed click behaviour.
pub fn replacement(
    doc: &mut Document,
    placeholder: NodeId,
    block: &ConvertedBlock,
    file: &FileRef,
) -> NodeId {
    let node = doc.clone_static(placeholder);
    doc.append_child(node, block.toggle);
    doc.append_child(node, block.container);
    if let Some(el) = doc.element_mut(node) {
        el.set_behavior(Behavior::OpenOrToggle {
            file: file.clone(),
            toggle: block.toggle,
        });
    }
    node
}
