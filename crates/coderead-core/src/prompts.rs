//! Prompt templates and the analysis request built from them.

use anyhow::{Context, Result};
use minijinja::{Environment, UndefinedBehavior, context};

use crate::input::CodeInput;

/// Storytelling explanation with Story/Logic/Issues/Improvements sections.
pub const EXPLAIN_PROMPT: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts/explain.md"));

/// Unit test generation.
pub const TESTS_PROMPT: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts/tests.md"));

/// Conversion to another language (`MiniJinja`, expects `target_language`).
pub const CONVERT_PROMPT_TEMPLATE: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts/convert.md"));

/// The kind of analysis requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisMode {
    Explain,
    Tests,
    Convert { target: String },
}

impl AnalysisMode {
    /// Renders the prompt text for this mode.
    ///
    /// # Errors
    /// Returns an error if the conversion template fails to render.
    pub fn prompt(&self) -> Result<String> {
        match self {
            AnalysisMode::Explain => Ok(EXPLAIN_PROMPT.trim_end().to_string()),
            AnalysisMode::Tests => Ok(TESTS_PROMPT.trim_end().to_string()),
            AnalysisMode::Convert { target } => {
                let mut env = Environment::new();
                env.set_undefined_behavior(UndefinedBehavior::Strict);
                env.add_template("convert", CONVERT_PROMPT_TEMPLATE)
                    .context("load conversion prompt")?;
                let rendered = env
                    .get_template("convert")
                    .context("load conversion prompt")?
                    .render(context! { target_language => target })
                    .context("render conversion prompt")?;
                Ok(rendered.trim_end().to_string())
            }
        }
    }

    /// Text shown in the loader while the first chunk is pending.
    pub fn loading_message(&self) -> String {
        match self {
            AnalysisMode::Explain => "Unraveling the story...".to_string(),
            AnalysisMode::Tests => "Generating unit tests...".to_string(),
            AnalysisMode::Convert { target } => format!("Converting to {target}..."),
        }
    }
}

/// A fully assembled request: prompt text plus the code or image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub prompt: String,
    pub input: CodeInput,
}

impl AnalysisRequest {
    /// # Errors
    /// Returns an error if the prompt template fails to render.
    pub fn new(mode: &AnalysisMode, input: CodeInput) -> Result<Self> {
        Ok(Self {
            prompt: mode.prompt()?,
            input,
        })
    }

    /// The text part of the request.
    ///
    /// Pasted code is appended to the prompt in a bare fence; image requests
    /// send the prompt alone and attach the image as a separate part.
    pub fn text(&self) -> String {
        match &self.input {
            CodeInput::Text(code) => {
                format!("{}\n\nHere is the code:\n```\n{}\n```", self.prompt, code.trim())
            }
            CodeInput::Image(_) => self.prompt.clone(),
        }
    }
}
