//! Markdown → HTML rendering for streamed analysis responses.
//!
//! The renderer takes the whole accumulated buffer (never a delta) and
//! returns a complete replacement document. It is synchronous, performs no
//! I/O and never fails: malformed or partial markdown degrades to paragraph
//! text, and an unterminated code fence renders whatever arrived so far.
//!
//! Pipeline:
//! 1. [`blocks::parse_blocks`] scans lines into a block list with source spans.
//! 2. [`html::emit_document`] writes each block, calling the
//!    [`Highlighter`] for code blocks and [`inline::render_inline`] for prose.

pub mod blocks;
pub mod highlight;
pub mod html;
pub mod icons;
pub mod inline;
mod stream;

pub use blocks::{Block, CodeBlock, DEFAULT_CODE_LANG, Heading, Paragraph, SpannedBlock, parse_blocks};
pub use highlight::{Highlighter, PlainHighlighter, SyntectHighlighter, syntax_css};
pub use html::{render_error, render_loader};
pub use icons::Icon;
pub use stream::StreamRenderer;

/// Result of rendering a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    /// Complete HTML for the output container.
    pub html: String,
    /// Code blocks in document order; copy actions use their raw `code`.
    pub code_blocks: Vec<CodeBlock>,
}

impl RenderedDocument {
    /// Raw (unhighlighted) text of the code block at `index`.
    pub fn code_text(&self, index: usize) -> Option<&str> {
        self.code_blocks.get(index).map(|b| b.code.as_str())
    }
}

/// Renders the full markdown buffer into HTML.
pub fn render_markdown<H: Highlighter + ?Sized>(source: &str, highlighter: &H) -> RenderedDocument {
    let blocks = parse_blocks(source);
    let html = html::emit_document(&blocks, |code| highlighter.highlight(&code.code, &code.lang));
    let code_blocks = blocks
        .into_iter()
        .filter_map(|b| match b.block {
            Block::Code(code) => Some(code),
            _ => None,
        })
        .collect();

    RenderedDocument { html, code_blocks }
}
