//! Render sinks: where each re-rendered document goes.
//!
//! A sink is told to *replace* its content wholesale on every chunk. The
//! HTML file sink rewrites a standalone page atomically so a browser
//! pointed at it never sees a torn write; the writer sink keeps only the
//! latest document and emits it once the stream is finished.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use minijinja::{Environment, context};

use crate::config::Theme;
use crate::render::syntax_css;

const PAGE_TEMPLATE: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/page.html"));

/// Seconds between reloads of a page that is still streaming.
const LIVE_REFRESH_SECS: u32 = 1;

/// Receives the complete rendered output after every update.
pub trait RenderSink {
    /// Replaces the visible content with `html`.
    ///
    /// # Errors
    /// Returns an error if the output cannot be written.
    fn replace(&mut self, html: &str) -> Result<()>;

    /// Marks the output as final.
    ///
    /// # Errors
    /// Returns an error if the output cannot be written.
    fn finish(&mut self) -> Result<()>;
}

impl<S: RenderSink + ?Sized> RenderSink for &mut S {
    fn replace(&mut self, html: &str) -> Result<()> {
        (**self).replace(html)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

impl<S: RenderSink + ?Sized> RenderSink for Box<S> {
    fn replace(&mut self, html: &str) -> Result<()> {
        (**self).replace(html)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

/// Wraps rendered fragments in the standalone page.
pub struct PageTemplate {
    env: Environment<'static>,
    theme: Theme,
    title: String,
    syntax_css: String,
}

impl PageTemplate {
    /// # Errors
    /// Returns an error if the embedded page template fails to parse.
    pub fn new(theme: Theme, title: impl Into<String>) -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("page.html", PAGE_TEMPLATE)
            .context("load page template")?;
        Ok(Self {
            env,
            theme,
            title: title.into(),
            syntax_css: syntax_css(theme),
        })
    }

    /// Renders a full page around `body`; `live` pages reload themselves.
    ///
    /// # Errors
    /// Returns an error if the template fails to render.
    pub fn render(&self, body: &str, live: bool) -> Result<String> {
        self.env
            .get_template("page.html")
            .context("load page template")?
            .render(context! {
                theme => self.theme.as_str(),
                title => self.title,
                version => env!("CARGO_PKG_VERSION"),
                refresh => live.then_some(LIVE_REFRESH_SECS),
                syntax_css => self.syntax_css,
                body => body,
            })
            .context("render page")
    }
}

/// Rewrites an HTML file on every update.
pub struct HtmlFileSink {
    path: PathBuf,
    page: PageTemplate,
    latest: String,
}

impl HtmlFileSink {
    pub fn new(path: impl Into<PathBuf>, page: PageTemplate) -> Self {
        Self {
            path: path.into(),
            page,
            latest: String::new(),
        }
    }

    fn write_page(&self, live: bool) -> Result<()> {
        let content = self.page.render(&self.latest, live)?;
        write_atomic(&self.path, &content)
    }
}

impl RenderSink for HtmlFileSink {
    fn replace(&mut self, html: &str) -> Result<()> {
        html.clone_into(&mut self.latest);
        self.write_page(true)
    }

    fn finish(&mut self) -> Result<()> {
        self.write_page(false)?;
        tracing::info!(path = %self.path.display(), "wrote rendered page");
        Ok(())
    }
}

/// Keeps the latest document and writes the full page once, on finish.
pub struct PageWriterSink<W> {
    writer: W,
    page: PageTemplate,
    latest: String,
}

impl<W: Write> PageWriterSink<W> {
    pub fn new(writer: W, page: PageTemplate) -> Self {
        Self {
            writer,
            page,
            latest: String::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl PageWriterSink<std::io::Stdout> {
    pub fn stdout(page: PageTemplate) -> Self {
        Self::new(std::io::stdout(), page)
    }
}

impl<W: Write> RenderSink for PageWriterSink<W> {
    fn replace(&mut self, html: &str) -> Result<()> {
        html.clone_into(&mut self.latest);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let content = self.page.render(&self.latest, false)?;
        self.writer
            .write_all(content.as_bytes())
            .context("write rendered page")?;
        self.writer.flush().context("flush rendered page")
    }
}

/// Writes via a sibling temp file and rename so readers never see partial content.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let tmp_path = path.with_extension("html.tmp");
    fs::write(&tmp_path, content)
        .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| {
        format!(
            "Failed to rename {} to {}",
            tmp_path.display(),
            path.display()
        )
    })
}
