//! Remote language model access.

mod gemini;

pub use gemini::{GeminiClient, parse_generate_response};

use std::future::Future;

use crate::error::LlmError;

/// Result type for model calls.
pub type Result<T> = std::result::Result<T, LlmError>;

/// A text-in, text-out chat model.
pub trait ChatModel {
    /// Identifier of the model serving requests.
    fn model_name(&self) -> &str;

    /// Send a single user prompt and return the generated text.
    fn invoke(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}
