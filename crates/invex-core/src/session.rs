//! In-memory table of invoices extracted during one session.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::extractor::ExtractionResult;
use crate::models::invoice::{INVOICE_FIELDS, InvoiceRecord, InvoiceRow};

/// One extracted invoice in the session table.
#[derive(Debug, Clone, Serialize)]
pub struct SessionEntry {
    /// File name the invoice came from.
    pub source: String,
    /// When the extraction finished.
    pub extracted_at: DateTime<Utc>,
    /// The JSON object exactly as the model returned it.
    pub raw: Value,
    /// Typed view of `raw`.
    #[serde(skip)]
    pub record: InvoiceRecord,
    /// Flattened row for display and CSV.
    #[serde(skip)]
    pub row: InvoiceRow,
}

impl SessionEntry {
    /// Build an entry from a parsed model reply.
    pub fn new(source: impl Into<String>, raw: Value) -> Result<Self> {
        let record = InvoiceRecord::from_value(raw.clone())?;
        Ok(Self::from_parts(source.into(), raw, record))
    }

    fn from_parts(source: String, raw: Value, record: InvoiceRecord) -> Self {
        let row = record.to_row();
        Self {
            source,
            extracted_at: Utc::now(),
            raw,
            record,
            row,
        }
    }
}

/// Append-only accumulation of extracted invoices.
#[derive(Debug, Clone, Default)]
pub struct InvoiceTable {
    entries: Vec<SessionEntry>,
}

impl InvoiceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parsed model reply; returns its 0-based row index.
    pub fn push(&mut self, source: impl Into<String>, raw: Value) -> Result<usize> {
        self.entries.push(SessionEntry::new(source, raw)?);
        Ok(self.entries.len() - 1)
    }

    /// Append the reply of a finished extraction.
    pub fn push_result(&mut self, source: impl Into<String>, result: &ExtractionResult) -> usize {
        self.entries.push(SessionEntry::from_parts(
            source.into(),
            result.raw.clone(),
            result.record.clone(),
        ));
        self.entries.len() - 1
    }

    /// The most recently added entry.
    pub fn last(&self) -> Option<&SessionEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SessionEntry] {
        &self.entries
    }

    /// Flattened rows in insertion order.
    pub fn rows(&self) -> impl Iterator<Item = &InvoiceRow> {
        self.entries.iter().map(|e| &e.row)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// CSV with a header row and one line per invoice, no index column.
    pub fn to_csv(&self) -> Result<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);

        wtr.write_record(INVOICE_FIELDS)?;
        for row in self.rows() {
            wtr.write_record(row.values())?;
        }

        let data = wtr
            .into_inner()
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    /// Pretty JSON array of the replies as the model returned them.
    pub fn to_json(&self) -> Result<String> {
        let replies: Vec<&Value> = self.entries.iter().map(|e| &e.raw).collect();
        Ok(to_json_pretty(&replies)?)
    }
}

/// Serialize with a 4-space indent.
pub fn to_json_pretty<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
