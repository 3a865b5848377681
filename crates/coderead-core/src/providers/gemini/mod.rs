//! Gemini provider: request building and the streaming client.

pub mod api;
mod sse;

pub use api::{DEFAULT_BASE_URL, GeminiClient, GeminiConfig, build_request};
pub use sse::GeminiSseParser;
