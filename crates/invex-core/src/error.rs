//! Error types for the invex-core library.

use thiserror::Error;

/// Main error type for the invex library.
#[derive(Error, Debug)]
pub enum InvexError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Prompt rendering error.
    #[error("prompt error: {0}")]
    Prompt(#[from] PromptError),

    /// Remote model error.
    #[error("model error: {0}")]
    Llm(#[from] LlmError),

    /// Invoice extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// CSV export error.
    #[error("export error: {0}")]
    Export(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors raised while rendering a prompt template.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PromptError {
    /// A declared input variable was not supplied.
    #[error("missing prompt variable: {0}")]
    MissingVariable(String),

    /// The template references a variable it never declared.
    #[error("undeclared prompt variable: {0}")]
    UndeclaredVariable(String),

    /// Unbalanced or empty brace in the template.
    #[error("malformed template at byte {0}")]
    Malformed(usize),
}

/// Errors from the remote model endpoint.
#[derive(Error, Debug)]
pub enum LlmError {
    /// No API key in the configured environment variable.
    #[error("API key not set (expected in ${0})")]
    MissingApiKey(String),

    /// The endpoint rejected the credentials.
    #[error("provider rejected the API key")]
    Auth,

    /// The endpoint is throttling requests.
    #[error("provider rate limited")]
    RateLimited,

    /// The request timed out.
    #[error("provider timeout")]
    Timeout,

    /// Connection or transport failure.
    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP status.
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The reply did not carry any generated text.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

/// Errors related to turning a model reply into an invoice record.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// No text to send to the model.
    #[error("no text could be extracted from the document")]
    EmptyText,

    /// The reply contained no parseable JSON.
    #[error("model output is not valid JSON: {0}")]
    MalformedOutput(String),

    /// The reply was JSON but not an object.
    #[error("model output is JSON but not an object (got {0})")]
    NotAnObject(&'static str),
}

/// Result type for the invex library.
pub type Result<T> = std::result::Result<T, InvexError>;
