//! Code block syntax highlighting.
//!
//! The renderer only depends on the [`Highlighter`] trait. The default
//! implementation uses syntect's class-based HTML output so the page
//! stylesheet controls colors for both light and dark themes.

use std::sync::LazyLock;

use syntect::highlighting::ThemeSet;
use syntect::html::{ClassStyle, ClassedHTMLGenerator, css_for_theme_with_class_style};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use super::inline::escape_html;
use crate::config::Theme;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

/// Grammar used when the requested language is unknown.
const FALLBACK_GRAMMAR: &str = "c";

/// Maps `(code, language)` to HTML-safe markup.
///
/// Implementations receive raw code and are responsible for escaping it;
/// the returned string is inserted into the page verbatim. Unknown
/// languages must degrade to some fallback rather than fail.
pub trait Highlighter {
    fn highlight(&self, code: &str, lang: &str) -> String;
}

impl<H: Highlighter + ?Sized> Highlighter for &H {
    fn highlight(&self, code: &str, lang: &str) -> String {
        (**self).highlight(code, lang)
    }
}

/// Escapes code without adding any token markup.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn highlight(&self, code: &str, _lang: &str) -> String {
        escape_html(code).into_owned()
    }
}

/// syntect-backed highlighter using the bundled default grammars.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntectHighlighter;

impl SyntectHighlighter {
    pub fn new() -> Self {
        Self
    }

    fn resolve(lang: &str) -> &'static SyntaxReference {
        let syntaxes = &*SYNTAX_SET;
        let token = normalize_lang(lang);
        if token.is_empty() {
            return syntaxes.find_syntax_plain_text();
        }

        syntaxes
            .find_syntax_by_token(token)
            .or_else(|| {
                tracing::debug!(lang, "unknown grammar, using C-like fallback");
                syntaxes.find_syntax_by_token(FALLBACK_GRAMMAR)
            })
            .unwrap_or_else(|| syntaxes.find_syntax_plain_text())
    }
}

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, code: &str, lang: &str) -> String {
        let syntax = Self::resolve(lang);
        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAX_SET, ClassStyle::Spaced);

        for line in LinesWithEndings::from(code) {
            if let Err(err) = generator.parse_html_for_line_which_includes_newline(line) {
                tracing::debug!(lang, error = %err, "highlighting failed, emitting plain code");
                return escape_html(code).into_owned();
            }
        }

        generator.finalize()
    }
}

/// Stylesheet for the class names [`SyntectHighlighter`] emits.
///
/// Returns an empty string if the bundled theme is missing.
pub fn syntax_css(theme: Theme) -> String {
    static THEMES: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

    let name = match theme {
        Theme::Light => "InspiredGitHub",
        Theme::Dark => "base16-ocean.dark",
    };
    let Some(syntax_theme) = THEMES.themes.get(name) else {
        tracing::warn!(name, "bundled syntax theme missing");
        return String::new();
    };
    css_for_theme_with_class_style(syntax_theme, ClassStyle::Spaced).unwrap_or_else(|err| {
        tracing::warn!(name, error = %err, "failed to build syntax stylesheet");
        String::new()
    })
}

/// Maps common fence tags onto syntect grammar tokens.
///
/// Returns an empty token for plain-text tags.
fn normalize_lang(lang: &str) -> &str {
    match lang.trim() {
        "" | "plaintext" | "text" | "txt" | "plain" => "",
        "javascript" | "jsx" | "node" => "js",
        "c++" | "cxx" => "cpp",
        "csharp" | "c#" => "cs",
        "golang" => "go",
        "shell" | "zsh" | "console" => "sh",
        "python3" | "py3" => "py",
        "rs" => "rust",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_highlighter_escapes() {
        assert_eq!(
            PlainHighlighter.highlight("a < b && c > d", "any"),
            "a &lt; b &amp;&amp; c &gt; d"
        );
    }

    #[test]
    fn test_syntect_escapes_markup() {
        let html = SyntectHighlighter.highlight("const s = \"<script>\";", "js");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;"));
        assert!(html.contains("<span class="));
    }

    #[test]
    fn test_unknown_language_falls_back() {
        let html = SyntectHighlighter.highlight("int x = 1;", "definitely-not-a-language");
        assert!(html.contains("int"));
        assert!(html.contains("<span class="));
    }

    #[test]
    fn test_plaintext_has_no_keyword_tokens() {
        let html = SyntectHighlighter.highlight("fn main() {}", "plaintext");
        assert!(html.contains("fn main() {}"));
        assert!(!html.contains("keyword"));
    }

    #[test]
    fn test_syntax_css_for_both_themes() {
        let light = syntax_css(Theme::Light);
        let dark = syntax_css(Theme::Dark);
        assert!(light.contains(".comment"));
        assert!(dark.contains(".comment"));
        assert_ne!(light, dark);
    }

    #[test]
    fn test_highlighting_is_deterministic() {
        let code = "fn main() {\n    println!(\"hi\");\n}";
        assert_eq!(
            SyntectHighlighter.highlight(code, "rust"),
            SyntectHighlighter.highlight(code, "rust")
        );
    }
}
