//! Markdown Rendering
//!
//! Turns Markdown into a [`Document`] subtree. Wiki embeds (`![[file.py]]`,
//! `![[file.py|alias]]`) become placeholder spans carrying the reference in
//! `src`, which is what the embed pipeline looks for.

use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use regex::Regex;

use crate::dom::{Document, NodeId};
use crate::embed::selector::{PLACEHOLDER_TAG, REFERENCE_ATTR};

pub const EMBED_CLASS: &str = "internal-embed";

static WIKI_EMBED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!\[\[([^\[\]|]+?)(?:\|([^\[\]]*))?\]\]").expect("valid wiki embed pattern")
});

/// Render `markdown` into a new document, under its root
pub fn render_document(markdown: &str) -> Document {
    let mut doc = Document::new();
    let root = doc.root();
    render_into(&mut doc, root, markdown);
    doc
}

/// Render `markdown` as children of `parent`
pub fn render_into(doc: &mut Document, parent: NodeId, markdown: &str) {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut builder = TreeBuilder::new(doc, parent);
    for event in Parser::new_ext(markdown, options) {
        builder.push(event);
    }
    builder.flush_text();
}

fn heading_tag(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 => "h1",
        HeadingLevel::H2 => "h2",
        HeadingLevel::H3 => "h3",
        HeadingLevel::H4 => "h4",
        HeadingLevel::H5 => "h5",
        HeadingLevel::H6 => "h6",
    }
}

struct TreeBuilder<'a> {
    doc: &'a mut Document,
    root: NodeId,
    /// Open elements, innermost last
    stack: Vec<NodeId>,
    /// How many stack entries each open tag pushed
    frames: Vec<usize>,
    pending_text: String,
    in_code_block: bool,
    in_table_head: bool,
    /// Image whose alt text is being collected
    image: Option<(NodeId, String)>,
}

impl<'a> TreeBuilder<'a> {
    fn new(doc: &'a mut Document, parent: NodeId) -> Self {
        Self {
            doc,
            root: parent,
            stack: Vec::new(),
            frames: Vec::new(),
            pending_text: String::new(),
            in_code_block: false,
            in_table_head: false,
            image: None,
        }
    }

    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(self.root)
    }

    fn open(&mut self, tag: &str) -> NodeId {
        let node = self.doc.create_element(tag);
        let parent = self.current();
        self.doc.append_child(parent, node);
        self.stack.push(node);
        node
    }

    fn open_frame(&mut self, tags: &[&str]) -> NodeId {
        let mut node = self.current();
        for tag in tags {
            node = self.open(tag);
        }
        self.frames.push(tags.len());
        node
    }

    fn close_frame(&mut self) {
        let depth = self.frames.pop().unwrap_or(0);
        for _ in 0..depth {
            self.stack.pop();
        }
    }

    fn leaf(&mut self, tag: &str) -> NodeId {
        let node = self.doc.create_element(tag);
        let parent = self.current();
        self.doc.append_child(parent, node);
        node
    }

    fn push(&mut self, event: Event<'_>) {
        if let Some((_, alt)) = self.image.as_mut() {
            match event {
                Event::Text(text) | Event::Code(text) => {
                    alt.push_str(&text);
                    return;
                }
                Event::End(TagEnd::Image) => {
                    if let Some((img, alt)) = self.image.take()
                        && let Some(el) = self.doc.element_mut(img)
                    {
                        el.set_attr("alt", alt);
                    }
                    return;
                }
                _ => return,
            }
        }

        if let Event::Text(text) = &event {
            self.pending_text.push_str(text);
            return;
        }
        self.flush_text();

        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(TagEnd::CodeBlock) => {
                self.in_code_block = false;
                self.close_frame();
            }
            Event::End(TagEnd::TableHead) => {
                self.in_table_head = false;
                self.close_frame();
            }
            Event::End(_) => self.close_frame(),
            Event::Code(code) => {
                let node = self.leaf("code");
                self.doc.set_text(node, code.to_string());
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                let markup = self.doc.create_markup(html.to_string());
                let parent = self.current();
                self.doc.append_child(parent, markup);
            }
            Event::SoftBreak => {
                let text = self.doc.create_text("\n");
                let parent = self.current();
                self.doc.append_child(parent, text);
            }
            Event::HardBreak => {
                self.leaf("br");
            }
            Event::Rule => {
                self.leaf("hr");
            }
            Event::TaskListMarker(checked) => {
                let input = self.leaf("input");
                if let Some(el) = self.doc.element_mut(input) {
                    el.set_attr("type", "checkbox");
                    el.set_attr("disabled", "");
                    if checked {
                        el.set_attr("checked", "");
                    }
                }
            }
            other => log::trace!("Skipping markdown event {:?}", other),
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                self.open_frame(&["p"]);
            }
            Tag::Heading { level, .. } => {
                self.open_frame(&[heading_tag(level)]);
            }
            Tag::BlockQuote(_) => {
                self.open_frame(&["blockquote"]);
            }
            Tag::CodeBlock(kind) => {
                let code = self.open_frame(&["pre", "code"]);
                if let CodeBlockKind::Fenced(info) = kind
                    && let Some(lang) = info.split_whitespace().next()
                    && let Some(el) = self.doc.element_mut(code)
                {
                    el.add_class(&format!("language-{lang}"));
                }
                self.in_code_block = true;
            }
            Tag::List(Some(start)) => {
                let list = self.open_frame(&["ol"]);
                if start != 1
                    && let Some(el) = self.doc.element_mut(list)
                {
                    el.set_attr("start", start.to_string());
                }
            }
            Tag::List(None) => {
                self.open_frame(&["ul"]);
            }
            Tag::Item => {
                self.open_frame(&["li"]);
            }
            Tag::Table(_) => {
                self.open_frame(&["table"]);
            }
            Tag::TableHead => {
                self.in_table_head = true;
                self.open_frame(&["thead", "tr"]);
            }
            Tag::TableRow => {
                self.open_frame(&["tr"]);
            }
            Tag::TableCell => {
                let cell = if self.in_table_head { "th" } else { "td" };
                self.open_frame(&[cell]);
            }
            Tag::Emphasis => {
                self.open_frame(&["em"]);
            }
            Tag::Strong => {
                self.open_frame(&["strong"]);
            }
            Tag::Strikethrough => {
                self.open_frame(&["del"]);
            }
            Tag::Link {
                dest_url, title, ..
            } => {
                let link = self.open_frame(&["a"]);
                if let Some(el) = self.doc.element_mut(link) {
                    el.set_attr("href", dest_url.to_string());
                    if !title.is_empty() {
                        el.set_attr("title", title.to_string());
                    }
                }
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                let img = self.leaf("img");
                if let Some(el) = self.doc.element_mut(img) {
                    el.set_attr("src", dest_url.to_string());
                    if !title.is_empty() {
                        el.set_attr("title", title.to_string());
                    }
                }
                self.image = Some((img, String::new()));
            }
            Tag::HtmlBlock => {
                // The block's content arrives as Html events
                self.frames.push(0);
            }
            other => {
                log::trace!("Rendering {:?} as a plain div", other);
                self.open_frame(&["div"]);
            }
        }
    }

    /// Emit buffered text, cutting wiki embeds out of it
    fn flush_text(&mut self) {
        if self.pending_text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.pending_text);
        let parent = self.current();

        if self.in_code_block {
            let node = self.doc.create_text(text);
            self.doc.append_child(parent, node);
            return;
        }

        let mut last = 0;
        for captures in WIKI_EMBED.captures_iter(&text) {
            let (Some(whole), Some(target)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            if whole.start() > last {
                let node = self.doc.create_text(&text[last..whole.start()]);
                self.doc.append_child(parent, node);
            }

            let target = target.as_str().trim();
            let alt = captures
                .get(2)
                .map(|alias| alias.as_str().trim())
                .filter(|alias| !alias.is_empty())
                .unwrap_or(target);
            let span = self.doc.create_element(PLACEHOLDER_TAG);
            if let Some(el) = self.doc.element_mut(span) {
                el.add_class(EMBED_CLASS);
                el.set_attr(REFERENCE_ATTR, target);
                el.set_attr("alt", alt);
            }
            self.doc.append_child(parent, span);
            last = whole.end();
        }

        if last < text.len() {
            let node = self.doc.create_text(&text[last..]);
            self.doc.append_child(parent, node);
        }
    }
}
