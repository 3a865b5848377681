//! CLI command handlers.

pub mod analyze;
pub mod config;
pub mod render;

use std::path::Path;

use anyhow::Result;
use coderead_core::config::Theme;
use coderead_core::sink::{HtmlFileSink, PageTemplate, PageWriterSink, RenderSink};

/// File sink when `output` is given, otherwise the final page goes to stdout.
fn open_sink(output: Option<&Path>, theme: Theme, title: &str) -> Result<Box<dyn RenderSink>> {
    let page = PageTemplate::new(theme, title)?;
    Ok(match output {
        Some(path) => Box::new(HtmlFileSink::new(path, page)),
        None => Box::new(PageWriterSink::stdout(page)),
    })
}
