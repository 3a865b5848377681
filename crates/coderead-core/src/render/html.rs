//! HTML emission for parsed blocks and status panels.

use std::fmt::Write;

use super::blocks::{Block, CodeBlock, Heading, Paragraph, SpannedBlock};
use super::icons::{COPY_SVG, ERROR_SVG};
use super::inline::{escape_html, render_inline};

/// Emits the document body for `blocks`.
///
/// `highlight` is called once per code block, in order, and must return
/// HTML-safe markup for the block's code.
pub fn emit_document(
    blocks: &[SpannedBlock],
    mut highlight: impl FnMut(&CodeBlock) -> String,
) -> String {
    let mut out = String::from(r#"<div class="analysis-content">"#);
    let mut code_index = 0;

    for spanned in blocks {
        out.push('\n');
        match &spanned.block {
            Block::Code(code) => {
                let highlighted = highlight(code);
                write_code_block(&mut out, code_index, code, &highlighted);
                code_index += 1;
            }
            Block::Heading(heading) => write_heading(&mut out, heading),
            Block::List(items) => write_list(&mut out, items),
            Block::Paragraph(paragraph) => write_paragraph(&mut out, paragraph),
        }
    }

    out.push_str("\n</div>");
    out
}

fn write_code_block(out: &mut String, index: usize, code: &CodeBlock, highlighted: &str) {
    let lang = escape_html(&code.lang);
    let state = if code.closed { "" } else { " streaming" };
    let _ = write!(
        out,
        concat!(
            r#"<div class="code-wrapper{state}" data-code-index="{index}">"#,
            r#"<div class="code-header"><span class="lang">{lang}</span>"#,
            r#"<button class="copy-btn" type="button" data-code-index="{index}">{copy} Copy</button>"#,
            r#"</div><pre class="language-{lang}"><code class="language-{lang}">{code}</code></pre></div>"#,
        ),
        state = state,
        index = index,
        lang = lang,
        copy = COPY_SVG,
        code = highlighted,
    );
}

fn write_heading(out: &mut String, heading: &Heading) {
    let icon = heading.icon.map_or("", |icon| icon.svg());
    let _ = write!(
        out,
        "<h{level}>{icon}<span>{title}</span></h{level}>",
        level = heading.level,
        title = render_inline(&heading.title),
    );
}

fn write_list(out: &mut String, items: &[String]) {
    out.push_str(r#"<ul class="enhanced-list">"#);
    for item in items {
        let _ = write!(out, "<li>{}</li>", render_inline(item));
    }
    out.push_str("</ul>");
}

fn write_paragraph(out: &mut String, paragraph: &Paragraph) {
    let class = if paragraph.analogy {
        "analogy"
    } else {
        "enhanced-paragraph"
    };
    let body = paragraph
        .lines
        .iter()
        .map(|line| render_inline(line))
        .collect::<Vec<_>>()
        .join("<br>");
    let _ = write!(out, r#"<p class="{class}">{body}</p>"#);
}

/// Panel shown while waiting for the first chunk.
pub fn render_loader(message: &str) -> String {
    format!(
        concat!(
            r#"<div class="loader"><div class="spinner"></div>"#,
            r"<p><strong>{}</strong></p>",
            r#"<p class="loader-subtext">This usually takes 10-15 seconds</p></div>"#,
        ),
        escape_html(message)
    )
}

/// Panel shown when an analysis fails for good.
pub fn render_error(message: &str) -> String {
    format!(
        concat!(
            r#"<div class="error-message">{}"#,
            r"<p><strong>Oops!</strong> {}</p>",
            r#"<button class="retry-btn" type="button" onclick="location.reload()">Try Again</button></div>"#,
        ),
        ERROR_SVG,
        escape_html(message)
    )
}
