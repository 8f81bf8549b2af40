//! Invoice extraction pipeline: PDF text -> prompt -> model -> JSON -> record.

use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{ExtractionError, Result};
use crate::llm::ChatModel;
use crate::models::config::PdfConfig;
use crate::models::invoice::InvoiceRecord;
use crate::output::JsonOutputParser;
use crate::pdf::{PdfExtractor, PdfProcessor};
use crate::prompt::{INVOICE_TEXT_VAR, PromptTemplate, invoice_prompt};

/// Result of invoice extraction.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// The extracted record.
    pub record: InvoiceRecord,
    /// The parsed model reply, exactly as returned.
    pub raw: Value,
    /// Text that was sent to the model.
    pub source_text: String,
    /// Model that produced the reply.
    pub model: String,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Extracts invoice fields by delegating to a chat model.
pub struct InvoiceExtractor<M> {
    model: M,
    prompt: PromptTemplate,
    parser: JsonOutputParser,
    pdf: PdfConfig,
}

impl<M: ChatModel> InvoiceExtractor<M> {
    /// Create an extractor using the standard invoice prompt.
    pub fn new(model: M) -> Self {
        Self {
            model,
            prompt: invoice_prompt(),
            parser: JsonOutputParser::new(),
            pdf: PdfConfig::default(),
        }
    }

    /// Replace the prompt; it must accept an `invoice_text` variable.
    pub fn with_prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = prompt;
        self
    }

    /// Set PDF reading options.
    pub fn with_pdf_config(mut self, pdf: PdfConfig) -> Self {
        self.pdf = pdf;
        self
    }

    /// The underlying model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Extract an invoice from plain text.
    pub async fn extract_from_text(&self, text: &str) -> Result<ExtractionResult> {
        let start = Instant::now();

        if text.trim().is_empty() {
            return Err(ExtractionError::EmptyText.into());
        }

        let prompt = self.prompt.format(INVOICE_TEXT_VAR, text)?;
        debug!("Rendered prompt ({} chars)", prompt.len());

        let reply = self.model.invoke(&prompt).await?;
        let raw = self.parser.parse(&reply)?;
        let record = InvoiceRecord::from_value(raw.clone())?;

        for key in record.unknown_keys() {
            warn!("Model returned unexpected key: {}", key);
        }

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Extracted invoice {} with {} in {}ms",
            record.invoice_number.as_str().unwrap_or("(no number)"),
            self.model.model_name(),
            processing_time_ms
        );

        Ok(ExtractionResult {
            record,
            raw,
            source_text: text.to_string(),
            model: self.model.model_name().to_string(),
            processing_time_ms,
        })
    }

    /// Extract an invoice from PDF bytes.
    pub async fn extract_from_pdf(&self, data: &[u8]) -> Result<ExtractionResult> {
        let text = self.read_pdf(data)?;
        self.extract_from_text(&text).await
    }

    /// Load a PDF and return its joined page text.
    pub fn read_pdf(&self, data: &[u8]) -> Result<String> {
        let mut extractor = PdfExtractor::new()
            .with_page_separator(self.pdf.page_separator.clone())
            .with_max_pages(self.pdf.max_pages);
        extractor.load(data)?;

        let content = extractor.extract_all()?;
        debug!(
            "PDF text: {} pages, {} chars, fallback={}",
            extractor.page_count(),
            content.text.len(),
            content.used_fallback
        );
        Ok(content.text)
    }
}
