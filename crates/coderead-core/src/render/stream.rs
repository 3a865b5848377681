//! Streaming wrapper that re-renders the growing response buffer.

use std::collections::HashMap;

use super::blocks::{Block, CodeBlock, parse_blocks};
use super::highlight::Highlighter;
use super::html::emit_document;
use super::RenderedDocument;

/// Owns the growing response buffer and re-renders it on every delta.
///
/// Every render parses the whole buffer, so output never depends on how the
/// text was chunked. Highlighted markup for closed code blocks is memoized.
#[derive(Debug)]
pub struct StreamRenderer<H> {
    buffer: String,
    highlighter: H,
    highlight_cache: HashMap<(String, String), String>,
}

impl<H: Highlighter> StreamRenderer<H> {
    pub fn new(highlighter: H) -> Self {
        Self {
            buffer: String::new(),
            highlighter,
            highlight_cache: HashMap::new(),
        }
    }

    /// Appends a delta and returns the full re-rendered document.
    pub fn push_delta(&mut self, delta: &str) -> RenderedDocument {
        self.buffer.push_str(delta);
        self.render()
    }

    pub fn render(&mut self) -> RenderedDocument {
        let Self {
            buffer,
            highlighter,
            highlight_cache,
        } = self;

        let blocks = parse_blocks(buffer);
        let html = emit_document(&blocks, |code: &CodeBlock| {
            if !code.closed {
                return highlighter.highlight(&code.code, &code.lang);
            }
            highlight_cache
                .entry((code.lang.clone(), code.code.clone()))
                .or_insert_with(|| highlighter.highlight(&code.code, &code.lang))
                .clone()
        });

        let code_blocks = blocks
            .into_iter()
            .filter_map(|b| match b.block {
                Block::Code(code) => Some(code),
                _ => None,
            })
            .collect();

        RenderedDocument { html, code_blocks }
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Drops the buffer, keeping memoized highlights (used when a request is retried).
    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::render::highlight::PlainHighlighter;
    use crate::render::render_markdown;

    struct CountingHighlighter<'a> {
        calls: &'a Cell<usize>,
    }

    impl Highlighter for CountingHighlighter<'_> {
        fn highlight(&self, code: &str, lang: &str) -> String {
            self.calls.set(self.calls.get() + 1);
            PlainHighlighter.highlight(code, lang)
        }
    }

    #[test]
    fn test_chunking_does_not_change_output() {
        let text = "### ICON:Logic Code\n\nSee below:\n\n```rust\nfn main() {}\n```\n\n- done\n- ok";
        let whole = render_markdown(text, &PlainHighlighter);

        let mut stream = StreamRenderer::new(PlainHighlighter);
        let mut last = None;
        for chunk in text.as_bytes().chunks(7) {
            let chunk = std::str::from_utf8(chunk).unwrap();
            last = Some(stream.push_delta(chunk));
        }

        assert_eq!(last.unwrap(), whole);
        assert_eq!(stream.buffer(), text);
    }

    #[test]
    fn test_growing_code_block_reflects_latest_content() {
        let mut stream = StreamRenderer::new(PlainHighlighter);
        let first = stream.push_delta("```js\nconst a");
        assert!(first.html.contains("const a"));
        assert!(!first.code_blocks[0].closed);

        let second = stream.push_delta(" = 1;\nconst b = 2;");
        assert_eq!(second.code_blocks[0].code, "const a = 1;\nconst b = 2;");
        assert!(second.html.contains("const b = 2;"));
    }

    #[test]
    fn test_closed_blocks_are_highlighted_once() {
        let calls = Cell::new(0);
        let mut stream = StreamRenderer::new(CountingHighlighter { calls: &calls });

        stream.push_delta("```c\nint a;\n```\n\n");
        assert_eq!(calls.get(), 1);

        stream.push_delta("More text");
        stream.push_delta(" and more.");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_reset_clears_buffer() {
        let mut stream = StreamRenderer::new(PlainHighlighter);
        stream.push_delta("partial answer");
        stream.reset();
        assert_eq!(stream.buffer(), "");
        assert!(stream.render().code_blocks.is_empty());
    }
}
