//! Drives one analysis: transport → buffer → renderer → sink.
//!
//! The loop is sequential. Each stream event is appended to the buffer,
//! the whole buffer is re-rendered, and the sink content is replaced before
//! the next event is awaited, so renders never overlap.

use std::fmt;

use anyhow::Result;
use futures_util::StreamExt;
use tracing::Instrument;
use uuid::Uuid;

use crate::prompts::AnalysisRequest;
use crate::providers::{
    CompletionTransport, ProviderError, ProviderErrorKind, StreamEvent, Usage,
};
use crate::render::{Highlighter, RenderedDocument, StreamRenderer, render_error, render_loader};
use crate::retry::{RetryPolicy, Retryable, run_with_retry};
use crate::sink::RenderSink;
use crate::state::{Action, AppState, Effect, reduce};

/// How a finished analysis ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Completed(CompletedAnalysis),
    /// The error panel was shown with `message`.
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedAnalysis {
    pub document: RenderedDocument,
    pub markdown: String,
    pub finish_reason: Option<String>,
    pub usage: Option<Usage>,
    pub attempts: u32,
}

struct StreamSummary {
    finish_reason: Option<String>,
    usage: Option<Usage>,
    attempts: u32,
}

/// Owns the session state and executes reducer effects.
pub struct Analyzer<T, H, S> {
    transport: T,
    policy: RetryPolicy,
    renderer: StreamRenderer<H>,
    sink: S,
    state: AppState,
}

impl<T, H, S> Analyzer<T, H, S>
where
    T: CompletionTransport,
    H: Highlighter,
    S: RenderSink,
{
    pub fn new(transport: T, highlighter: H, sink: S, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            renderer: StreamRenderer::new(highlighter),
            sink,
            state: AppState::default(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Applies `action` and runs the effects it produces.
    ///
    /// Returns an outcome when the action ran (or refused to run) an
    /// analysis, `None` for plain state updates.
    ///
    /// # Errors
    /// Returns an error only when the sink cannot be written.
    pub async fn dispatch(&mut self, action: Action) -> Result<Option<AnalysisOutcome>> {
        let effects = reduce(&mut self.state, action);
        let mut outcome = None;

        for effect in effects {
            match effect {
                Effect::ShowLoader(message) => self.sink.replace(&render_loader(&message))?,
                Effect::ShowError(message) => {
                    self.show_error(&message)?;
                    outcome = Some(AnalysisOutcome::Failed { message });
                }
                Effect::StartAnalysis(request) => {
                    outcome = Some(self.run(&request).await?);
                }
            }
        }

        Ok(outcome)
    }

    async fn run(&mut self, request: &AnalysisRequest) -> Result<AnalysisOutcome> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("analysis", %request_id);

        async {
            tracing::info!(max_attempts = self.policy.max_attempts, "analysis started");
            match self.stream_with_retry(request).await {
                Ok(summary) => {
                    let document = self.renderer.render();
                    self.sink.replace(&document.html)?;
                    self.sink.finish()?;
                    reduce(&mut self.state, Action::Completed);
                    tracing::info!(
                        attempts = summary.attempts,
                        finish_reason = summary.finish_reason.as_deref().unwrap_or("none"),
                        code_blocks = document.code_blocks.len(),
                        "analysis completed"
                    );
                    Ok(AnalysisOutcome::Completed(CompletedAnalysis {
                        document,
                        markdown: self.renderer.buffer().to_string(),
                        finish_reason: summary.finish_reason,
                        usage: summary.usage,
                        attempts: summary.attempts,
                    }))
                }
                Err(AttemptError::Output(err)) => Err(err),
                Err(AttemptError::Provider(err)) => {
                    tracing::error!(kind = %err.kind, error = %err, "analysis failed");
                    let message = err.to_string();
                    for effect in reduce(&mut self.state, Action::Failed(message.clone())) {
                        if let Effect::ShowError(message) = effect {
                            self.show_error(&message)?;
                        }
                    }
                    Ok(AnalysisOutcome::Failed { message })
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn stream_with_retry(
        &mut self,
        request: &AnalysisRequest,
    ) -> AttemptResult<StreamSummary> {
        let Self {
            transport,
            policy,
            renderer,
            sink,
            state,
        } = self;

        run_with_retry(policy, async |attempt| -> AttemptResult<StreamSummary> {
            renderer.reset();
            if attempt > 1 {
                for effect in reduce(state, Action::AttemptStarted { attempt }) {
                    if let Effect::ShowLoader(message) = effect {
                        sink.replace(&render_loader(&message)).map_err(AttemptError::Output)?;
                    }
                }
            }

            let mut stream = transport.open_stream(request).await?;
            let mut summary = StreamSummary {
                finish_reason: None,
                usage: None,
                attempts: attempt,
            };

            while let Some(event) = stream.next().await {
                match event? {
                    StreamEvent::TextDelta(delta) => {
                        let document = renderer.push_delta(&delta);
                        sink.replace(&document.html).map_err(AttemptError::Output)?;
                        reduce(state, Action::ChunkReceived);
                    }
                    StreamEvent::Finished { reason, usage } => {
                        summary.finish_reason = Some(reason);
                        summary.usage = usage;
                    }
                }
            }

            if renderer.buffer().trim().is_empty() {
                let reason = summary.finish_reason.as_deref().unwrap_or("No content");
                return Err(ProviderError::new(
                    ProviderErrorKind::ApiError,
                    format!("Analysis failed. Reason: {reason}."),
                )
                .into());
            }
            Ok(summary)
        })
        .await
    }

    fn show_error(&mut self, message: &str) -> Result<()> {
        self.sink.replace(&render_error(message))?;
        self.sink.finish()
    }
}

type AttemptResult<T> = std::result::Result<T, AttemptError>;

/// Why a single attempt stopped.
#[derive(Debug)]
enum AttemptError {
    Provider(ProviderError),
    /// The sink could not be written; retrying cannot help.
    Output(anyhow::Error),
}

impl From<ProviderError> for AttemptError {
    fn from(err: ProviderError) -> Self {
        AttemptError::Provider(err)
    }
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::Provider(err) => write!(f, "{err}"),
            AttemptError::Output(err) => write!(f, "{err:#}"),
        }
    }
}

impl Retryable for AttemptError {
    fn is_retryable(&self) -> bool {
        match self {
            AttemptError::Provider(err) => err.is_retryable(),
            AttemptError::Output(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use futures_util::stream;

    use super::*;
    use crate::prompts::AnalysisMode;
    use crate::providers::{ProviderResult, ProviderStream};
    use crate::render::PlainHighlighter;
    use crate::state::Status;

    /// Records every replace, and whether finish was called.
    #[derive(Default)]
    struct RecordingSink {
        frames: Vec<String>,
        finished: bool,
    }

    impl RenderSink for RecordingSink {
        fn replace(&mut self, html: &str) -> Result<()> {
            self.frames.push(html.to_string());
            Ok(())
        }

        fn finish(&mut self) -> Result<()> {
            self.finished = true;
            Ok(())
        }
    }

    struct ScriptedTransport {
        attempts: Mutex<VecDeque<Vec<ProviderResult<StreamEvent>>>>,
    }

    impl ScriptedTransport {
        fn new(attempts: Vec<Vec<ProviderResult<StreamEvent>>>) -> Self {
            Self {
                attempts: Mutex::new(attempts.into()),
            }
        }
    }

    impl CompletionTransport for ScriptedTransport {
        async fn open_stream(&self, _request: &AnalysisRequest) -> ProviderResult<ProviderStream> {
            let events = self
                .attempts
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected extra attempt");
            Ok(stream::iter(events).boxed())
        }
    }

    fn delta(text: &str) -> ProviderResult<StreamEvent> {
        Ok(StreamEvent::TextDelta(text.to_string()))
    }

    fn finished(reason: &str) -> ProviderResult<StreamEvent> {
        Ok(StreamEvent::Finished {
            reason: reason.to_string(),
            usage: None,
        })
    }

    fn analyzer(
        attempts: Vec<Vec<ProviderResult<StreamEvent>>>,
    ) -> Analyzer<ScriptedTransport, PlainHighlighter, RecordingSink> {
        Analyzer::new(
            ScriptedTransport::new(attempts),
            PlainHighlighter,
            RecordingSink::default(),
            RetryPolicy::default(),
        )
    }

    async fn submit(
        analyzer: &mut Analyzer<ScriptedTransport, PlainHighlighter, RecordingSink>,
        code: &str,
    ) -> AnalysisOutcome {
        analyzer
            .dispatch(Action::CodeChanged(code.to_string()))
            .await
            .unwrap();
        analyzer
            .dispatch(Action::Submit(AnalysisMode::Explain))
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_streams_each_chunk_to_sink() {
        let mut analyzer = analyzer(vec![vec![
            delta("Intro.\n\n```js\nconst x"),
            delta(" = 1;\n```\n\nDone."),
            finished("STOP"),
        ]]);

        let AnalysisOutcome::Completed(done) = submit(&mut analyzer, "let a;").await else {
            panic!("expected completion");
        };
        assert_eq!(done.markdown, "Intro.\n\n```js\nconst x = 1;\n```\n\nDone.");
        assert_eq!(done.document.code_text(0), Some("const x = 1;"));
        assert_eq!(done.finish_reason.as_deref(), Some("STOP"));
        assert_eq!(done.attempts, 1);
        assert_eq!(analyzer.state().status, Status::Done);

        let sink = analyzer.into_sink();
        assert!(sink.frames[0].contains("Unraveling the story..."));
        assert!(sink.frames[1].contains("const x"));
        assert!(!sink.frames[1].contains("Done."));
        assert!(sink.frames.last().unwrap().contains("Done."));
        assert!(sink.finished);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_discards_partial_output() {
        let mut analyzer = analyzer(vec![
            vec![
                delta("half an ans"),
                Err(ProviderError::new(ProviderErrorKind::Network, "reset")),
            ],
            vec![delta("Full answer."), finished("STOP")],
        ]);

        let AnalysisOutcome::Completed(done) = submit(&mut analyzer, "x").await else {
            panic!("expected completion");
        };
        assert_eq!(done.markdown, "Full answer.");
        assert_eq!(done.attempts, 2);

        let sink = analyzer.into_sink();
        let loaders = sink
            .frames
            .iter()
            .filter(|f| f.contains("Unraveling the story..."))
            .count();
        assert_eq!(loaders, 2);
        assert!(!sink.frames.last().unwrap().contains("half an ans"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_stream_fails_with_finish_reason() {
        let mut analyzer = analyzer(vec![
            vec![finished("SAFETY")],
            vec![finished("SAFETY")],
            vec![finished("SAFETY")],
        ]);

        let outcome = submit(&mut analyzer, "x").await;
        assert_eq!(
            outcome,
            AnalysisOutcome::Failed {
                message: "Analysis failed. Reason: SAFETY.".to_string()
            }
        );

        let sink = analyzer.into_sink();
        let last = sink.frames.last().unwrap();
        assert!(last.contains("Oops!"));
        assert!(last.contains("Analysis failed. Reason: SAFETY."));
        assert!(sink.finished);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_is_not_retried() {
        let mut analyzer = analyzer(vec![vec![Err(ProviderError::http_status(
            400,
            r#"{"error":{"message":"API key not valid"}}"#,
        ))]]);

        let outcome = submit(&mut analyzer, "x").await;
        assert_eq!(
            outcome,
            AnalysisOutcome::Failed {
                message: "API Error: 400: API key not valid".to_string()
            }
        );
        assert!(matches!(analyzer.state().status, Status::Failed { .. }));
    }

    #[tokio::test]
    async fn test_empty_code_never_opens_stream() {
        let mut analyzer = analyzer(vec![]);

        let outcome = submit(&mut analyzer, "  ").await;
        assert_eq!(
            outcome,
            AnalysisOutcome::Failed {
                message: "Please provide some code to analyze.".to_string()
            }
        );
        assert!(analyzer.into_sink().frames[0].contains("Please provide some code to analyze."));
    }

    #[tokio::test]
    async fn test_image_input_is_forwarded() {
        let mut analyzer = analyzer(vec![vec![delta("Looks like Rust."), finished("STOP")]]);
        analyzer
            .dispatch(Action::ImageAttached(crate::input::ImageInput {
                path: "shot.png".into(),
                mime_type: "image/png".to_string(),
                data: "AQID".to_string(),
            }))
            .await
            .unwrap();

        let outcome = analyzer
            .dispatch(Action::Submit(AnalysisMode::Explain))
            .await
            .unwrap();
        assert!(matches!(outcome, Some(AnalysisOutcome::Completed(_))));
        assert_eq!(analyzer.state().status, Status::Done);
    }
}
