//! Placeholder selector built from the configured extensions.

use crate::dom::{Element, Matcher};

/// Element type the host renders embeds as
pub const PLACEHOLDER_TAG: &str = "span";

/// Attribute carrying the embedded file reference
pub const REFERENCE_ATTR: &str = "src";

/// Matches placeholders whose reference ends with `.{ext}` for any
/// configured extension. Built with no extensions it matches nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedSelector {
    extensions: Vec<String>,
}

impl EmbedSelector {
    pub fn build<S: AsRef<str>>(extensions: &[S]) -> Self {
        let extensions = extensions
            .iter()
            .map(|ext| ext.as_ref())
            .filter(|ext| !ext.is_empty())
            .map(str::to_string)
            .collect();
        Self { extensions }
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// True if `reference` ends with `.{ext}` for a configured extension
    pub fn matches_reference(&self, reference: &str) -> bool {
        self.extensions.iter().any(|ext| {
            reference
                .strip_suffix(ext.as_str())
                .is_some_and(|rest| rest.ends_with('.'))
        })
    }

    /// The same selector as a CSS selector list, e.g. `span[src$=".py"]`.
    /// Empty when there are no extensions.
    pub fn to_css(&self) -> String {
        self.extensions
            .iter()
            .map(|ext| {
                format!(
                    "{}[{}$=\".{}\"]",
                    PLACEHOLDER_TAG,
                    REFERENCE_ATTR,
                    css_escape(ext)
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Matcher for EmbedSelector {
    fn matches(&self, element: &Element) -> bool {
        element.tag == PLACEHOLDER_TAG
            && element
                .attr(REFERENCE_ATTR)
                .is_some_and(|reference| self.matches_reference(reference))
    }
}

/// Escape `value` the way CSSOM `CSS.escape` does
pub fn css_escape(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len());

    for (i, &c) in chars.iter().enumerate() {
        let code = c as u32;
        match c {
            '\0' => out.push('\u{FFFD}'),
            '\u{1}'..='\u{1f}' | '\u{7f}' => out.push_str(&format!("\\{:x} ", code)),
            '0'..='9' if i == 0 => out.push_str(&format!("\\{:x} ", code)),
            '0'..='9' if i == 1 && chars[0] == '-' => out.push_str(&format!("\\{:x} ", code)),
            '-' if i == 0 && chars.len() == 1 => out.push_str("\\-"),
            _ if code >= 0x80 || c == '-' || c == '_' || c.is_ascii_alphanumeric() => out.push(c),
            _ => {
                out.push('\\');
                out.push(c);
            }
        }
    }

    out
}
