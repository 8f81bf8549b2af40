//! Core library for LLM-backed invoice extraction.
//!
//! This crate provides:
//! - PDF text loading (lopdf, with a pdf-extract fallback)
//! - The invoice prompt and a small prompt template engine
//! - A Gemini client behind the [`ChatModel`] trait
//! - Parsing of model replies into invoice records and flat table rows
//! - An in-memory session table with CSV/JSON export

pub mod error;
pub mod extractor;
pub mod llm;
pub mod models;
pub mod output;
pub mod pdf;
pub mod prompt;
pub mod session;

pub use error::{InvexError, Result};
pub use extractor::{ExtractionResult, InvoiceExtractor};
pub use llm::{ChatModel, GeminiClient};
pub use models::config::InvexConfig;
pub use models::invoice::{INVOICE_FIELDS, InvoiceRecord, InvoiceRow, NESTED_FIELDS};
pub use output::JsonOutputParser;
pub use pdf::{PdfContent, PdfExtractor, PdfProcessor};
pub use prompt::{PromptTemplate, invoice_prompt};
pub use session::{InvoiceTable, SessionEntry};
