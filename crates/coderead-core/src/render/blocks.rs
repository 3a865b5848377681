//! Line-scanning block parser.
//!
//! Turns the accumulated markdown buffer into an ordered list of blocks,
//! each tagged with the byte span of the source it came from. Fenced code is
//! recognized first and may contain blank lines; everything else is split
//! into candidates on blank lines and classified as headings, bullet lists
//! or paragraphs.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use super::icons::Icon;

/// Language tag used when a fence has none.
pub const DEFAULT_CODE_LANG: &str = "plaintext";

const FENCE: &str = "```";

/// Prefix that marks the "analogy" opening paragraph of an explanation.
const ANALOGY_PREFIX: &str = "This code is like ";

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s{0,3}(#{1,6})\s+(?:ICON:(\w+)(?:\s+|$))?(.*)$").expect("valid heading regex")
});

/// A fenced code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Language tag from the opening fence (`plaintext` when absent).
    pub lang: String,
    /// Raw code between the fences, without the trailing newline.
    pub code: String,
    /// False while the closing fence has not arrived yet.
    pub closed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: u8,
    /// Icon requested via `ICON:<key>`; unknown keys resolve to `None`.
    pub icon: Option<Icon>,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    /// Trimmed source lines, rendered joined by line breaks.
    pub lines: Vec<String>,
    pub analogy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Code(CodeBlock),
    Heading(Heading),
    /// Bullet items in order, with embedded newlines flattened to spaces.
    List(Vec<String>),
    Paragraph(Paragraph),
}

/// A block plus the byte range of the source buffer it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpannedBlock {
    pub block: Block,
    pub span: Range<usize>,
}

/// Parses `source` into blocks in order of appearance.
///
/// Never fails: anything that is not a fence, heading or bullet becomes
/// paragraph text. An unterminated final fence yields an open code block
/// holding everything after the fence line.
pub fn parse_blocks(source: &str) -> Vec<SpannedBlock> {
    let lines = split_lines(source);
    let mut parser = BlockParser::default();
    let mut i = 0;

    while i < lines.len() {
        let line = &lines[i];
        i += 1;

        if let Some(lang) = opening_fence_lang(line.text) {
            parser.flush_candidate();

            let start = line.span.start;
            let mut end = line.span.end;
            let mut code_lines = Vec::new();
            let mut closed = false;
            while i < lines.len() {
                let inner = &lines[i];
                i += 1;
                end = inner.span.end;
                if is_fence(inner.text) {
                    closed = true;
                    break;
                }
                code_lines.push(inner.text);
            }

            parser.blocks.push(SpannedBlock {
                block: Block::Code(CodeBlock {
                    lang,
                    code: code_lines.join("\n"),
                    closed,
                }),
                span: start..end,
            });
            continue;
        }

        if line.text.trim().is_empty() {
            parser.flush_candidate();
        } else {
            parser.candidate.push(line.clone());
        }
    }

    parser.flush_candidate();
    parser.blocks
}

#[derive(Debug, Clone)]
struct Line<'a> {
    /// Line content without the line terminator.
    text: &'a str,
    span: Range<usize>,
}

fn split_lines(source: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut offset = 0;
    for raw in source.split_inclusive('\n') {
        let text = raw.trim_end_matches(['\n', '\r']);
        lines.push(Line {
            text,
            span: offset..offset + text.len(),
        });
        offset += raw.len();
    }
    lines
}

fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with(FENCE)
}

fn opening_fence_lang(line: &str) -> Option<String> {
    let rest = line.trim_start().strip_prefix(FENCE)?;
    let lang: String = rest
        .trim()
        .chars()
        .take_while(|c| c.is_alphanumeric() || matches!(c, '+' | '#' | '-' | '_' | '.'))
        .collect();
    if lang.is_empty() {
        Some(DEFAULT_CODE_LANG.to_string())
    } else {
        Some(lang)
    }
}

fn parse_heading(line: &str) -> Option<Heading> {
    let caps = HEADING_RE.captures(line)?;
    let level = caps.get(1).map_or(3, |m| m.as_str().len()) as u8;
    let icon = caps.get(2).and_then(|m| Icon::from_key(m.as_str()));
    let title = caps.get(3).map_or("", |m| m.as_str()).trim().to_string();
    Some(Heading { level, icon, title })
}

fn bullet_item(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix('-')?;
    if rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

/// Content collected from the current candidate that is not yet a block.
#[derive(Debug, Default)]
enum Pending {
    #[default]
    None,
    Paragraph {
        lines: Vec<String>,
        span: Range<usize>,
    },
    List {
        items: Vec<String>,
        span: Range<usize>,
    },
}

#[derive(Debug, Default)]
struct BlockParser<'a> {
    blocks: Vec<SpannedBlock>,
    candidate: Vec<Line<'a>>,
}

impl BlockParser<'_> {
    /// Classifies the lines of the current blank-line-delimited candidate.
    fn flush_candidate(&mut self) {
        let candidate = std::mem::take(&mut self.candidate);
        let mut pending = Pending::None;

        for line in candidate {
            if let Some(heading) = parse_heading(line.text) {
                self.push_pending(std::mem::take(&mut pending));
                self.blocks.push(SpannedBlock {
                    block: Block::Heading(heading),
                    span: line.span,
                });
                continue;
            }

            if let Some(item) = bullet_item(line.text) {
                pending = match pending {
                    Pending::List { mut items, span } => {
                        items.push(item.to_string());
                        Pending::List {
                            items,
                            span: span.start..line.span.end,
                        }
                    }
                    other => {
                        self.push_pending(other);
                        Pending::List {
                            items: vec![item.to_string()],
                            span: line.span,
                        }
                    }
                };
                continue;
            }

            let text = line.text.trim();
            pending = match pending {
                Pending::List { mut items, span } => {
                    if let Some(last) = items.last_mut() {
                        if !last.is_empty() {
                            last.push(' ');
                        }
                        last.push_str(text);
                    }
                    Pending::List {
                        items,
                        span: span.start..line.span.end,
                    }
                }
                Pending::Paragraph { mut lines, span } => {
                    lines.push(text.to_string());
                    Pending::Paragraph {
                        lines,
                        span: span.start..line.span.end,
                    }
                }
                Pending::None => Pending::Paragraph {
                    lines: vec![text.to_string()],
                    span: line.span,
                },
            };
        }

        self.push_pending(pending);
    }

    fn push_pending(&mut self, pending: Pending) {
        match pending {
            Pending::None => {}
            Pending::Paragraph { lines, span } => {
                let analogy = lines.first().is_some_and(|l| l.starts_with(ANALOGY_PREFIX))
                    && lines.last().is_some_and(|l| l.ends_with('.'));
                self.blocks.push(SpannedBlock {
                    block: Block::Paragraph(Paragraph { lines, analogy }),
                    span,
                });
            }
            Pending::List { items, span } => {
                self.blocks.push(SpannedBlock {
                    block: Block::List(items),
                    span,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(blocks: &[SpannedBlock]) -> Vec<&'static str> {
        blocks
            .iter()
            .map(|b| match b.block {
                Block::Code(_) => "code",
                Block::Heading(_) => "heading",
                Block::List(_) => "list",
                Block::Paragraph(_) => "paragraph",
            })
            .collect()
    }

    #[test]
    fn test_paragraph_code_paragraph() {
        let src = "Intro.\n\n```js\nconst x = 1;\n```\n\nDone.";
        let blocks = parse_blocks(src);
        assert_eq!(kinds(&blocks), vec!["paragraph", "code", "paragraph"]);

        let Block::Code(code) = &blocks[1].block else {
            panic!("expected code block");
        };
        assert_eq!(code.lang, "js");
        assert_eq!(code.code, "const x = 1;");
        assert!(code.closed);
    }

    #[test]
    fn test_code_block_keeps_blank_lines() {
        let src = "```python\ndef f():\n\n    return 1\n```";
        let blocks = parse_blocks(src);
        assert_eq!(blocks.len(), 1);
        let Block::Code(code) = &blocks[0].block else {
            panic!("expected code block");
        };
        assert_eq!(code.code, "def f():\n\n    return 1");
    }

    #[test]
    fn test_fence_without_lang_defaults_to_plaintext() {
        let blocks = parse_blocks("```\nhello\n```");
        let Block::Code(code) = &blocks[0].block else {
            panic!("expected code block");
        };
        assert_eq!(code.lang, DEFAULT_CODE_LANG);
    }

    #[test]
    fn test_unterminated_fence_captures_rest_of_buffer() {
        let src = "Before\n\n```rust\nfn main() {\n\n    println!(\"hi\");";
        let blocks = parse_blocks(src);
        assert_eq!(kinds(&blocks), vec!["paragraph", "code"]);
        let Block::Code(code) = &blocks[1].block else {
            panic!("expected code block");
        };
        assert!(!code.closed);
        assert_eq!(code.code, "fn main() {\n\n    println!(\"hi\");");
        assert_eq!(blocks[1].span.end, src.len());
    }

    #[test]
    fn test_bullet_run_is_single_list() {
        let blocks = parse_blocks("- a\n- b\n- c");
        assert_eq!(blocks.len(), 1);
        assert_eq!(
            blocks[0].block,
            Block::List(vec!["a".into(), "b".into(), "c".into()])
        );
    }

    #[test]
    fn test_bullet_continuation_lines_are_flattened() {
        let blocks = parse_blocks("- first line\n  continues here\n- second");
        assert_eq!(
            blocks[0].block,
            Block::List(vec!["first line continues here".into(), "second".into()])
        );
    }

    #[test]
    fn test_paragraph_then_list_in_same_candidate() {
        let blocks = parse_blocks("Steps:\n- one\n- two");
        assert_eq!(kinds(&blocks), vec!["paragraph", "list"]);
    }

    #[test]
    fn test_icon_heading() {
        let blocks = parse_blocks("### ICON:Story The Story of this Code\nThis code is like a map.");
        assert_eq!(kinds(&blocks), vec!["heading", "paragraph"]);
        assert_eq!(
            blocks[0].block,
            Block::Heading(Heading {
                level: 3,
                icon: Some(Icon::Story),
                title: "The Story of this Code".into(),
            })
        );
        let Block::Paragraph(p) = &blocks[1].block else {
            panic!("expected paragraph");
        };
        assert!(p.analogy);
    }

    #[test]
    fn test_unknown_icon_key_has_no_icon() {
        let blocks = parse_blocks("## ICON:Rocket Launch");
        assert_eq!(
            blocks[0].block,
            Block::Heading(Heading {
                level: 2,
                icon: None,
                title: "Launch".into(),
            })
        );
    }

    #[test]
    fn test_whitespace_only_candidates_produce_nothing() {
        assert!(parse_blocks("\n\n   \n\t\n").is_empty());
        assert!(parse_blocks("").is_empty());
    }

    #[test]
    fn test_spans_are_ordered_disjoint_and_cover_content() {
        let src = "# Title\n\nPara one\nline two\n\n- x\n- y\n\n```c\nint a;\n```\n\nTail";
        let blocks = parse_blocks(src);
        assert_eq!(kinds(&blocks), vec!["heading", "paragraph", "list", "code", "paragraph"]);

        for pair in blocks.windows(2) {
            assert!(pair[0].span.end <= pair[1].span.start);
        }

        assert_eq!(&src[blocks[0].span.clone()], "# Title");
        assert_eq!(&src[blocks[1].span.clone()], "Para one\nline two");
        assert_eq!(&src[blocks[2].span.clone()], "- x\n- y");
        assert_eq!(&src[blocks[3].span.clone()], "```c\nint a;\n```");
        assert_eq!(&src[blocks[4].span.clone()], "Tail");
    }

    #[test]
    fn test_crlf_line_endings() {
        let blocks = parse_blocks("Hello\r\n\r\n```js\r\nlet a;\r\n```\r\n");
        assert_eq!(kinds(&blocks), vec!["paragraph", "code"]);
        let Block::Code(code) = &blocks[1].block else {
            panic!("expected code block");
        };
        assert_eq!(code.code, "let a;");
    }
}
