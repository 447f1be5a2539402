//! Integration tests for clicks on converted blocks
mod common;

use std::sync::Arc;
use std::time::Duration;

use code_embed::EmbedProcessor;
use code_embed::dom::{NodeId, SharedDocument};
use code_embed::embed::block::{
    BLOCK_CLASS, COLLAPSE_ICON, COPY_CLASS, COPY_ICON, EXPAND_ICON, SUCCESS_ICON, TOGGLE_CLASS,
};
use code_embed::embed::controls::{ToggleState, block_state};
use code_embed::embed::{EmbedOutcome, InteractionControls, Modifiers};
use code_embed::highlight::SyntectHighlighter;
use code_embed::host::{FileRef, MemoryClipboard, MemoryVault, RecordingWorkspace};
use code_embed::settings::{LanguageMapping, PluginConfig};

use common::{fragment, with_class};

struct Converted {
    doc: SharedDocument,
    node: NodeId,
    toggle: NodeId,
    block: NodeId,
    copy: NodeId,
    workspace: Arc<RecordingWorkspace>,
}

impl Converted {
    fn controls(&self, clipboard: Arc<MemoryClipboard>) -> InteractionControls {
        InteractionControls::new(self.doc.clone(), self.workspace.clone(), clipboard)
    }
}

/// Run one pass over a single `a.py` embed and return the converted block
async fn convert_one(source: &str) -> Converted {
    let frag = fragment(&["a.py"]);
    let config = PluginConfig {
        mappings: vec![LanguageMapping::new("py", "python", "Python")],
        ..PluginConfig::default()
    };
    let workspace = Arc::new(RecordingWorkspace::new(Some(FileRef::new("doc.md"))));
    let processor = EmbedProcessor::new(
        Arc::new(config),
        Arc::new(MemoryVault::new().with_file("a.py", source)),
        workspace.clone(),
        Arc::new(SyntectHighlighter::new()),
    );

    let outcomes = processor.process(&frag.doc, frag.root).await.settled().await;
    let EmbedOutcome::Converted { node, .. } = outcomes[0].clone() else {
        panic!("expected a converted block, got {:?}", outcomes[0]);
    };

    let (toggle, block, copy) = {
        let doc = frag.doc.lock().await;
        (
            with_class(&doc, node, TOGGLE_CLASS)[0],
            with_class(&doc, node, BLOCK_CLASS)[0],
            with_class(&doc, node, COPY_CLASS)[0],
        )
    };

    Converted {
        doc: frag.doc,
        node,
        toggle,
        block,
        copy,
        workspace,
    }
}

#[tokio::test]
async fn test_scenario_highlighted_block_with_copy() {
    let converted = convert_one("print(1)").await;
    let clipboard = Arc::new(MemoryClipboard::new());
    let controls = converted.controls(clipboard.clone());

    {
        let doc = converted.doc.lock().await;
        assert_eq!(block_state(&doc, converted.block), ToggleState::Collapsed);
        let code = doc.query_all(converted.block, &|el: &code_embed::dom::Element| {
            el.tag == "code"
        })[0];
        assert!(doc.inner_html(code).contains("<span class=\""));
        assert_eq!(doc.text_content(code), "print(1)");
    }

    controls.click(converted.toggle, Modifiers::NONE).await;
    assert_eq!(
        block_state(&*converted.doc.lock().await, converted.block),
        ToggleState::Expanded
    );

    controls.click(converted.copy, Modifiers::NONE).await;
    assert_eq!(clipboard.text().as_deref(), Some("print(1)"));
}

#[tokio::test]
async fn test_toggle_twice_restores_collapsed() {
    let converted = convert_one("x = 1").await;
    let controls = converted.controls(Arc::new(MemoryClipboard::new()));

    let event = controls.click(converted.toggle, Modifiers::NONE).await;
    assert!(event.propagation_stopped);
    {
        let doc = converted.doc.lock().await;
        assert_eq!(doc.element(converted.block).unwrap().style("display"), Some("block"));
        assert_eq!(doc.inner_html(converted.toggle), COLLAPSE_ICON);
    }

    controls.click(converted.toggle, Modifiers::NONE).await;
    let doc = converted.doc.lock().await;
    assert_eq!(block_state(&doc, converted.block), ToggleState::Collapsed);
    assert_eq!(doc.element(converted.block).unwrap().style("display"), Some("none"));
    assert_eq!(doc.inner_html(converted.toggle), EXPAND_ICON);
}

#[tokio::test]
async fn test_plain_click_on_embed_toggles() {
    let converted = convert_one("x = 1").await;
    let controls = converted.controls(Arc::new(MemoryClipboard::new()));

    let event = controls.click(converted.node, Modifiers::NONE).await;

    assert!(event.default_prevented);
    assert!(event.propagation_stopped);
    assert_eq!(
        block_state(&*converted.doc.lock().await, converted.block),
        ToggleState::Expanded
    );
    assert!(converted.workspace.opened().is_empty());
}

#[tokio::test]
async fn test_mod_click_opens_file() {
    let converted = convert_one("x = 1").await;
    let controls = converted.controls(Arc::new(MemoryClipboard::new()));

    let meta = Modifiers {
        meta: true,
        ..Modifiers::NONE
    };
    for modifiers in [Modifiers::CTRL, meta] {
        let event = controls.click(converted.node, modifiers).await;
        assert!(event.default_prevented);
    }

    assert_eq!(
        converted.workspace.opened(),
        vec![FileRef::new("a.py"), FileRef::new("a.py")]
    );
    assert_eq!(
        block_state(&*converted.doc.lock().await, converted.block),
        ToggleState::Collapsed
    );
}

#[tokio::test]
async fn test_click_inside_code_does_not_toggle() {
    let converted = convert_one("x = 1").await;
    let controls = converted.controls(Arc::new(MemoryClipboard::new()));
    controls.click(converted.toggle, Modifiers::NONE).await;

    let code = {
        let doc = converted.doc.lock().await;
        doc.query_all(converted.block, &|el: &code_embed::dom::Element| el.tag == "code")[0]
    };
    let event = controls.click(code, Modifiers::NONE).await;

    assert!(event.propagation_stopped);
    assert!(!event.default_prevented);
    assert_eq!(
        block_state(&*converted.doc.lock().await, converted.block),
        ToggleState::Expanded
    );
}

#[tokio::test(start_paused = true)]
async fn test_copy_feedback_reverts_after_last_click() {
    let converted = convert_one("x = 1").await;
    let clipboard = Arc::new(MemoryClipboard::new());
    let controls = converted.controls(clipboard.clone());

    controls.click(converted.copy, Modifiers::NONE).await;
    {
        let doc = converted.doc.lock().await;
        let button = doc.element(converted.copy).unwrap();
        assert_eq!(button.style("display"), Some("inline-flex"));
        assert_eq!(button.style("color"), Some("var(--text-success)"));
        assert_eq!(doc.inner_html(converted.copy), SUCCESS_ICON);
    }

    tokio::time::sleep(Duration::from_millis(1500)).await;
    controls.click(converted.copy, Modifiers::NONE).await;

    // The first click's timer has fired, the second one has not
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(
        converted.doc.lock().await.inner_html(converted.copy),
        SUCCESS_ICON
    );

    tokio::time::sleep(Duration::from_millis(1500)).await;
    let doc = converted.doc.lock().await;
    let button = doc.element(converted.copy).unwrap();
    assert_eq!(button.style("display"), None);
    assert_eq!(button.style("color"), None);
    assert_eq!(doc.inner_html(converted.copy), COPY_ICON);
    assert_eq!(clipboard.writes(), 2);
}

#[tokio::test]
async fn test_clipboard_failure_keeps_button() {
    let converted = convert_one("x = 1").await;
    let controls = converted.controls(Arc::new(MemoryClipboard::failing()));

    controls.click(converted.copy, Modifiers::NONE).await;

    let doc = converted.doc.lock().await;
    assert_eq!(doc.inner_html(converted.copy), COPY_ICON);
    assert_eq!(doc.element(converted.copy).unwrap().style("display"), None);
}

#[tokio::test]
async fn test_expand_all() {
    let converted = convert_one("x = 1").await;
    let controls = converted.controls(Arc::new(MemoryClipboard::new()));

    assert_eq!(controls.expand_all().await, 1);
    assert_eq!(controls.expand_all().await, 0);
    assert_eq!(
        block_state(&*converted.doc.lock().await, converted.block),
        ToggleState::Expanded
    );
}
