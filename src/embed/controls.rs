//! Interaction Controls
//!
//! Click handling for converted blocks. A click starts at its target and
//! bubbles up through the ancestors, running each element's [`Behavior`]
//! until one of them stops propagation.

use std::sync::Arc;
use std::time::Duration;

use crate::dom::{Behavior, Document, NodeId, SharedDocument};
use crate::embed::block::{COLLAPSE_ICON, COPY_ICON, EXPAND_ICON, SUCCESS_ICON};
use crate::host::{Clipboard, Workspace};

/// How long the copy control shows its confirmation
pub const COPY_FEEDBACK: Duration = Duration::from_secs(2);

/// Modifier keys held during a click
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        meta: false,
        shift: false,
        alt: false,
    };

    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        meta: false,
        shift: false,
        alt: false,
    };

    /// Ctrl, or Cmd on macOS
    pub fn is_mod(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// What happened to a click after dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickEvent {
    pub modifiers: Modifiers,
    pub default_prevented: bool,
    pub propagation_stopped: bool,
}

impl ClickEvent {
    fn new(modifiers: Modifiers) -> Self {
        Self {
            modifiers,
            default_prevented: false,
            propagation_stopped: false,
        }
    }
}

/// Visibility of a converted block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleState {
    Collapsed,
    Expanded,
}

pub fn block_state(doc: &Document, block: NodeId) -> ToggleState {
    match doc.element(block).and_then(|el| el.style("display")) {
        Some("none") => ToggleState::Collapsed,
        _ => ToggleState::Expanded,
    }
}

/// Flip `block` and swap the glyph on `toggle`
fn flip(doc: &mut Document, toggle: NodeId, block: NodeId) -> ToggleState {
    let (next, display, icon) = match block_state(doc, block) {
        ToggleState::Collapsed => (ToggleState::Expanded, "block", COLLAPSE_ICON),
        ToggleState::Expanded => (ToggleState::Collapsed, "none", EXPAND_ICON),
    };
    if let Some(el) = doc.element_mut(block) {
        el.set_style("display", display);
    }
    doc.set_markup(toggle, icon);
    next
}

/// Put the copy control back to its default look, unless a later copy
/// has happened since `generation`
fn restore_copy_button(doc: &mut Document, button: NodeId, generation: u64) {
    let Some(el) = doc.element_mut(button) else {
        return;
    };
    match el.behavior() {
        Some(Behavior::Copy { generation: current, .. }) if *current == generation => {}
        _ => return,
    }
    el.remove_style("display");
    el.remove_style("color");
    doc.set_markup(button, COPY_ICON);
}

#[derive(Clone)]
pub struct InteractionControls {
    doc: SharedDocument,
    workspace: Arc<dyn Workspace>,
    clipboard: Arc<dyn Clipboard>,
}

impl InteractionControls {
    pub fn new(
        doc: SharedDocument,
        workspace: Arc<dyn Workspace>,
        clipboard: Arc<dyn Clipboard>,
    ) -> Self {
        Self {
            doc,
            workspace,
            clipboard,
        }
    }

    /// Dispatch a click on `target`
    pub async fn click(&self, target: NodeId, modifiers: Modifiers) -> ClickEvent {
        let mut event = ClickEvent::new(modifiers);
        let mut current = Some(target);

        while let Some(node) = current {
            let behavior = {
                let doc = self.doc.lock().await;
                doc.element(node).and_then(|el| el.behavior().cloned())
            };
            if let Some(behavior) = behavior {
                self.run(node, behavior, &mut event).await;
            }
            if event.propagation_stopped {
                break;
            }
            current = self.doc.lock().await.parent(node);
        }

        event
    }

    async fn run(&self, node: NodeId, behavior: Behavior, event: &mut ClickEvent) {
        match behavior {
            Behavior::Toggle { block } => {
                let state = flip(&mut *self.doc.lock().await, node, block);
                log::debug!("Block {:?} is now {:?}", block, state);
                event.propagation_stopped = true;
            }
            Behavior::Copy { content, .. } => {
                self.copy(node, content).await;
            }
            Behavior::OpenOrToggle { file, toggle } => {
                if event.modifiers.is_mod() {
                    self.workspace.open_file(&file).await;
                } else {
                    let mut doc = self.doc.lock().await;
                    let block = match doc.element(toggle).and_then(|el| el.behavior()) {
                        Some(Behavior::Toggle { block }) => Some(*block),
                        _ => None,
                    };
                    if let Some(block) = block {
                        flip(&mut doc, toggle, block);
                    }
                }
                event.default_prevented = true;
                event.propagation_stopped = true;
            }
            Behavior::StopPropagation => {
                event.propagation_stopped = true;
            }
        }
    }

    async fn copy(&self, button: NodeId, content: Arc<str>) {
        if let Err(e) = self.clipboard.write_text(&content).await {
            log::warn!("Copy to clipboard failed: {:#}", e);
            return;
        }
        log::debug!("Copied {} bytes to clipboard", content.len());

        let generation = {
            let mut doc = self.doc.lock().await;
            let Some(el) = doc.element_mut(button) else {
                return;
            };
            let generation = match el.behavior_mut() {
                Some(Behavior::Copy { generation, .. }) => {
                    *generation += 1;
                    *generation
                }
                _ => return,
            };
            el.set_style("display", "inline-flex");
            el.set_style("color", "var(--text-success)");
            doc.set_markup(button, SUCCESS_ICON);
            generation
        };

        let doc = self.doc.clone();
        tokio::spawn(async move {
            tokio::time::sleep(COPY_FEEDBACK).await;
            restore_copy_button(&mut *doc.lock().await, button, generation);
        });
    }

    /// Expand every collapsed block in the document; returns how many changed
    pub async fn expand_all(&self) -> usize {
        let mut doc = self.doc.lock().await;
        let root = doc.root();
        let toggles: Vec<(NodeId, NodeId)> = doc
            .descendants(root)
            .into_iter()
            .filter_map(|id| match doc.element(id).and_then(|el| el.behavior()) {
                Some(Behavior::Toggle { block }) => Some((id, *block)),
                _ => None,
            })
            .collect();

        let mut expanded = 0;
        for (toggle, block) in toggles {
            if block_state(&doc, block) == ToggleState::Collapsed {
                flip(&mut doc, toggle, block);
                expanded += 1;
            }
        }
        expanded
    }
}
