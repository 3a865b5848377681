//! Explain / tests / convert command handler.

use anyhow::{Context, Result, bail};
use coderead_core::analysis::{AnalysisOutcome, Analyzer, CompletedAnalysis};
use coderead_core::config::Config;
use coderead_core::input;
use coderead_core::prompts::AnalysisMode;
use coderead_core::providers::gemini::{GeminiClient, GeminiConfig};
use coderead_core::render::SyntectHighlighter;
use coderead_core::retry::RetryPolicy;
use coderead_core::state::Action;

use super::open_sink;
use crate::cli::AnalyzeArgs;

pub async fn run(mode: AnalysisMode, args: &AnalyzeArgs, config: &Config) -> Result<()> {
    let model = args.model.clone().unwrap_or_else(|| config.model.clone());
    let gemini = GeminiConfig::from_env(
        model,
        config.max_output_tokens,
        config.providers.gemini.effective_base_url(),
        config.providers.gemini.effective_api_key(),
    )?;

    let input_action = match &args.image {
        Some(path) => Action::ImageAttached(input::load_image(path)?),
        None => Action::CodeChanged(input::read_code(args.file.as_deref())?),
    };

    let theme = args.theme.unwrap_or(config.theme);
    let sink = open_sink(args.output.as_deref(), theme, "coderead")?;
    let client = GeminiClient::new(gemini);
    tracing::info!(model = client.model(), ?mode, "starting analysis");

    let mut analyzer = Analyzer::new(
        client,
        SyntectHighlighter::new(),
        sink,
        RetryPolicy::from(&config.retry),
    );
    analyzer.dispatch(input_action).await?;

    match analyzer.dispatch(Action::Submit(mode)).await? {
        Some(AnalysisOutcome::Completed(done)) => {
            report(args, &done)?;
            Ok(())
        }
        Some(AnalysisOutcome::Failed { message }) => bail!(message),
        None => bail!("analysis did not start"),
    }
}

fn report(args: &AnalyzeArgs, done: &CompletedAnalysis) -> Result<()> {
    if let Some(path) = &args.output {
        println!("Wrote {}", path.display());
    }
    if let Some(usage) = &done.usage {
        tracing::info!(
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "token usage"
        );
    }

    if let Some(n) = args.copy_code {
        let code = n
            .checked_sub(1)
            .and_then(|index| done.document.code_text(index))
            .with_context(|| {
                format!(
                    "No code block {n} (the answer has {})",
                    done.document.code_blocks.len()
                )
            })?;
        copy_to_clipboard(code)?;
        eprintln!("Copied code block {n} to the clipboard");
    }

    Ok(())
}

fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new().context("open clipboard")?;
    clipboard
        .set_text(text.to_string())
        .context("copy code to clipboard")
}
