//! Optional natural-language explanations from a generative text service
//!
//! [`GenerativeText`] is the seam: [`OpenAiClient`] talks to an
//! OpenAI-compatible endpoint, tests substitute a mock. Streaming responses are
//! a finite [`ChunkStream`]; [`complete_streaming`] drains one into a string
//! while handing every chunk to a sink in arrival order.

pub mod client;
pub mod error;
pub mod prompt;
pub mod sse;

use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt};

use crate::config::AiConfig;

pub use client::OpenAiClient;
pub use error::AiError;
pub use prompt::{build_prompt, source_excerpt, strip_code_fences};

/// Text chunks of one streamed completion, ending when the response does
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String, AiError>> + Send>>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerativeText: Send + Sync {
    /// Configured and allowed to make requests
    fn is_enabled(&self) -> bool;

    fn reconfigure(&mut self, config: AiConfig);

    /// Whole response, code fences removed
    async fn complete(&self, prompt: &str) -> Result<String, AiError>;

    /// Response as it is generated, verbatim
    async fn stream(&self, prompt: &str) -> Result<ChunkStream, AiError>;
}

/// Drain a streamed completion, calling `on_chunk` for each chunk in order.
///
/// A failure mid-stream discards the partial text.
pub async fn complete_streaming<F>(
    model: &dyn GenerativeText,
    prompt: &str,
    mut on_chunk: F,
) -> Result<String, AiError>
where
    F: FnMut(&str),
{
    let mut chunks = model.stream(prompt).await?;
    let mut full = String::new();
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        on_chunk(&chunk);
        full.push_str(&chunk);
    }
    if full.is_empty() {
        return Err(AiError::EmptyResponse);
    }
    Ok(full)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(items: Vec<Result<String, AiError>>) -> ChunkStream {
        Box::pin(futures::stream::iter(items))
    }

    #[tokio::test]
    async fn test_complete_streaming_accumulates_in_order() {
        let mut model = MockGenerativeText::new();
        model.expect_stream().returning(|_| {
            Ok(chunks(vec![
                Ok("one ".to_string()),
                Ok("two ".to_string()),
                Ok("three".to_string()),
            ]))
        });

        let mut seen = Vec::new();
        let full = complete_streaming(&model, "p", |c| seen.push(c.to_string()))
            .await
            .unwrap();
        assert_eq!(seen, vec!["one ", "two ", "three"]);
        assert_eq!(full, "one two three");
    }

    #[tokio::test]
    async fn test_complete_streaming_propagates_failures() {
        let mut model = MockGenerativeText::new();
        model
            .expect_stream()
            .returning(|_| Ok(chunks(vec![Ok("partial".to_string()), Err(AiError::EmptyResponse)])));
        let result = complete_streaming(&model, "p", |_| {}).await;
        assert!(matches!(result, Err(AiError::EmptyResponse)));

        let mut silent = MockGenerativeText::new();
        silent.expect_stream().returning(|_| Ok(chunks(Vec::new())));
        assert!(matches!(
            complete_streaming(&silent, "p", |_| {}).await,
            Err(AiError::EmptyResponse)
        ));
    }
}
