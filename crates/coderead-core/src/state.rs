//! Analysis session state and its reducer.
//!
//! `reduce` is pure: it mutates [`AppState`] and returns [`Effect`]s for the
//! runner to execute. It never renders or performs I/O itself.

use crate::input::{CodeInput, ImageInput};
use crate::prompts::{AnalysisMode, AnalysisRequest};

pub const EMPTY_CODE_MESSAGE: &str = "Please provide some code to analyze.";

/// Where the current analysis stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Idle,
    /// Waiting for the first chunk of an attempt.
    Loading { message: String, attempt: u32 },
    /// Chunks are arriving.
    Streaming { chunks: usize },
    Done,
    Failed { message: String },
}

/// Inputs and progress of one analysis session.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub code: String,
    pub image: Option<ImageInput>,
    pub status: Status,
    /// Loader text of the analysis in flight.
    loading_message: String,
}

impl AppState {
    pub fn is_loading(&self) -> bool {
        matches!(self.status, Status::Loading { .. } | Status::Streaming { .. })
    }

    /// The input that a submit would send: an attached image wins over text.
    fn pending_input(&self) -> Option<CodeInput> {
        if let Some(image) = &self.image {
            return Some(CodeInput::Image(image.clone()));
        }
        let code = self.code.trim();
        (!code.is_empty()).then(|| CodeInput::Text(code.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    CodeChanged(String),
    ImageAttached(ImageInput),
    Submit(AnalysisMode),
    /// A (re)try is about to open the stream; `attempt` is 1-based.
    AttemptStarted { attempt: u32 },
    ChunkReceived,
    Completed,
    Failed(String),
}

/// Commands for the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ShowLoader(String),
    ShowError(String),
    StartAnalysis(AnalysisRequest),
}

pub fn reduce(state: &mut AppState, action: Action) -> Vec<Effect> {
    match action {
        Action::CodeChanged(code) => {
            state.code = code;
            vec![]
        }
        Action::ImageAttached(image) => {
            state.image = Some(image);
            vec![]
        }
        Action::Submit(mode) => submit(state, &mode),
        Action::AttemptStarted { attempt } => {
            if !state.is_loading() {
                return vec![];
            }
            let message = state.loading_message.clone();
            state.status = Status::Loading {
                message: message.clone(),
                attempt,
            };
            vec![Effect::ShowLoader(message)]
        }
        Action::ChunkReceived => {
            match &mut state.status {
                Status::Streaming { chunks } => *chunks += 1,
                Status::Loading { .. } => state.status = Status::Streaming { chunks: 1 },
                _ => {}
            }
            vec![]
        }
        Action::Completed => {
            if state.is_loading() {
                state.status = Status::Done;
            }
            vec![]
        }
        Action::Failed(message) => {
            state.status = Status::Failed {
                message: message.clone(),
            };
            vec![Effect::ShowError(message)]
        }
    }
}

fn submit(state: &mut AppState, mode: &AnalysisMode) -> Vec<Effect> {
    if state.is_loading() {
        return vec![];
    }

    let Some(input) = state.pending_input() else {
        return fail(state, EMPTY_CODE_MESSAGE.to_string());
    };

    let request = match AnalysisRequest::new(mode, input) {
        Ok(request) => request,
        Err(err) => return fail(state, format!("{err:#}")),
    };

    let message = mode.loading_message();
    state.loading_message.clone_from(&message);
    state.status = Status::Loading {
        message: message.clone(),
        attempt: 1,
    };
    vec![Effect::ShowLoader(message), Effect::StartAnalysis(request)]
}

fn fail(state: &mut AppState, message: String) -> Vec<Effect> {
    state.status = Status::Failed {
        message: message.clone(),
    };
    vec![Effect::ShowError(message)]
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn image() -> ImageInput {
        ImageInput {
            path: PathBuf::from("shot.png"),
            mime_type: "image/png".to_string(),
            data: "AQID".to_string(),
        }
    }

    #[test]
    fn test_submit_empty_code_shows_error() {
        let mut state = AppState::default();
        reduce(&mut state, Action::CodeChanged("   \n ".to_string()));

        let effects = reduce(&mut state, Action::Submit(AnalysisMode::Explain));
        assert_eq!(effects, vec![Effect::ShowError(EMPTY_CODE_MESSAGE.to_string())]);
        assert!(matches!(state.status, Status::Failed { .. }));
    }

    #[test]
    fn test_submit_starts_loading() {
        let mut state = AppState::default();
        reduce(&mut state, Action::CodeChanged("print(1)".to_string()));

        let effects = reduce(&mut state, Action::Submit(AnalysisMode::Tests));
        assert_eq!(effects.len(), 2);
        assert_eq!(
            effects[0],
            Effect::ShowLoader("Generating unit tests...".to_string())
        );
        let Effect::StartAnalysis(request) = &effects[1] else {
            panic!("expected StartAnalysis, got {:?}", effects[1]);
        };
        assert_eq!(request.input, CodeInput::Text("print(1)".to_string()));
        assert!(state.is_loading());
    }

    #[test]
    fn test_submit_while_loading_is_ignored() {
        let mut state = AppState::default();
        reduce(&mut state, Action::CodeChanged("x".to_string()));
        reduce(&mut state, Action::Submit(AnalysisMode::Explain));

        let effects = reduce(&mut state, Action::Submit(AnalysisMode::Tests));
        assert!(effects.is_empty());
    }

    #[test]
    fn test_attached_image_wins_over_text() {
        let mut state = AppState::default();
        reduce(&mut state, Action::CodeChanged("ignored".to_string()));
        reduce(&mut state, Action::ImageAttached(image()));

        let effects = reduce(&mut state, Action::Submit(AnalysisMode::Explain));
        assert!(matches!(
            &effects[1],
            Effect::StartAnalysis(req) if matches!(req.input, CodeInput::Image(_))
        ));
    }

    #[test]
    fn test_retry_shows_loader_again() {
        let mut state = AppState::default();
        reduce(&mut state, Action::CodeChanged("x".to_string()));
        reduce(
            &mut state,
            Action::Submit(AnalysisMode::Convert {
                target: "Go".to_string(),
            }),
        );
        reduce(&mut state, Action::ChunkReceived);
        reduce(&mut state, Action::ChunkReceived);
        assert_eq!(state.status, Status::Streaming { chunks: 2 });

        let effects = reduce(&mut state, Action::AttemptStarted { attempt: 2 });
        assert_eq!(effects, vec![Effect::ShowLoader("Converting to Go...".to_string())]);
        assert_eq!(
            state.status,
            Status::Loading {
                message: "Converting to Go...".to_string(),
                attempt: 2
            }
        );
    }

    #[test]
    fn test_completion_and_failure() {
        let mut state = AppState::default();
        reduce(&mut state, Action::CodeChanged("x".to_string()));
        reduce(&mut state, Action::Submit(AnalysisMode::Explain));
        reduce(&mut state, Action::Completed);
        assert_eq!(state.status, Status::Done);
        assert!(!state.is_loading());

        reduce(&mut state, Action::Submit(AnalysisMode::Explain));
        let effects = reduce(&mut state, Action::Failed("API Error: 500".to_string()));
        assert_eq!(effects, vec![Effect::ShowError("API Error: 500".to_string())]);
        assert!(!state.is_loading());
    }
}
