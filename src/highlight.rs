//! Syntect-backed highlighter.
//!
//! Produces class-based HTML (`<span class="source python">...`) so the
//! host's stylesheet decides the colours.

use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::dom::html::escape_text;
use crate::host::Highlighter;

/// Grammar ids whose syntect definition goes by another token
const GRAMMAR_ALIASES: &[(&str, &str)] = &[
    ("rust", "rs"),
    ("python", "py"),
    ("javascript", "js"),
    ("c++", "cpp"),
    ("csharp", "cs"),
    ("shell", "sh"),
    ("bash", "sh"),
    ("markdown", "md"),
    ("ruby", "rb"),
    ("golang", "go"),
];

pub struct SyntectHighlighter {
    syntax_set: SyntaxSet,
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntectHighlighter {
    pub fn new() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
        }
    }

    fn find_syntax(&self, grammar: &str) -> Option<&SyntaxReference> {
        let grammar = grammar.trim().to_lowercase();
        if grammar.is_empty() {
            return None;
        }

        if let Some(syntax) = self.syntax_set.find_syntax_by_token(&grammar) {
            return Some(syntax);
        }

        let (_, alias) = GRAMMAR_ALIASES.iter().find(|(name, _)| *name == grammar)?;
        self.syntax_set.find_syntax_by_extension(alias)
    }
}

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, text: &str, grammar: &str) -> String {
        let Some(syntax) = self.find_syntax(grammar) else {
            return escape_text(text);
        };

        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntax_set, ClassStyle::Spaced);
        for line in LinesWithEndings::from(text) {
            if let Err(e) = generator.parse_html_for_line_which_includes_newline(line) {
                log::warn!("Highlighting as {} failed: {}", grammar, e);
                return escape_text(text);
            }
        }
        generator.finalize()
    }

    fn has_grammar(&self, grammar: &str) -> bool {
        self.find_syntax(grammar).is_some()
    }
}
