//! Offline render command handler.

use std::path::Path;

use anyhow::{Context, Result};
use coderead_core::config::Theme;
use coderead_core::input;
use coderead_core::render::{SyntectHighlighter, render_markdown};
use coderead_core::sink::RenderSink;

use super::open_sink;

pub fn run(source: &str, output: Option<&Path>, theme: Theme) -> Result<()> {
    let markdown = input::read_code(Some(source)).context("read markdown")?;
    let document = render_markdown(&markdown, &SyntectHighlighter::new());

    let mut sink = open_sink(output, theme, "coderead")?;
    sink.replace(&document.html)?;
    sink.finish()?;

    tracing::info!(
        bytes = markdown.len(),
        code_blocks = document.code_blocks.len(),
        "rendered markdown"
    );
    if let Some(path) = output {
        println!("Wrote {}", path.display());
    }
    Ok(())
}
