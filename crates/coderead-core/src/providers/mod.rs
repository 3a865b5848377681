//! Streaming text sources.

pub mod gemini;
pub mod shared;

use std::future::Future;

pub use shared::{
    ProviderError, ProviderErrorKind, ProviderResult, ProviderStream, StreamEvent, Usage,
};

use crate::prompts::AnalysisRequest;

/// Opens one streaming attempt for a request.
///
/// The retry policy calls this once per attempt, so implementations must
/// not retry on their own.
pub trait CompletionTransport {
    fn open_stream(
        &self,
        request: &AnalysisRequest,
    ) -> impl Future<Output = ProviderResult<ProviderStream>> + Send;
}
