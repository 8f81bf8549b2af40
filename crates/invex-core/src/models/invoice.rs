//! Invoice record as returned by the model, and its flattened tabular row.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::ExtractionError;

/// The fixed key set, in column order.
pub const INVOICE_FIELDS: [&str; 11] = [
    "invoice_number",
    "invoice_date",
    "vendor",
    "bill_to",
    "total_amount",
    "balance_due",
    "line_items",
    "sub_total",
    "tax_summary",
    "bank_details",
    "business_address",
];

/// Fields holding nested structures, serialized to JSON text in a row.
pub const NESTED_FIELDS: [&str; 3] = ["line_items", "tax_summary", "bank_details"];

/// One invoice as extracted by the model.
///
/// Values are kept as raw JSON; nothing here checks that a total is a number
/// or that line items have the requested shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceRecord {
    pub invoice_number: Value,
    pub invoice_date: Value,
    pub vendor: Value,
    pub bill_to: Value,
    pub total_amount: Value,
    pub balance_due: Value,
    pub line_items: Value,
    pub sub_total: Value,
    pub tax_summary: Value,
    pub bank_details: Value,
    pub business_address: Value,

    /// Keys the model returned outside the fixed set.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InvoiceRecord {
    /// Build a record from a parsed model reply.
    pub fn from_value(value: Value) -> Result<Self, ExtractionError> {
        if !value.is_object() {
            return Err(ExtractionError::NotAnObject(json_type_name(&value)));
        }
        serde_json::from_value(value).map_err(|e| ExtractionError::MalformedOutput(e.to_string()))
    }

    /// Look up a field by key, including keys outside the fixed set.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let value = match key {
            "invoice_number" => &self.invoice_number,
            "invoice_date" => &self.invoice_date,
            "vendor" => &self.vendor,
            "bill_to" => &self.bill_to,
            "total_amount" => &self.total_amount,
            "balance_due" => &self.balance_due,
            "line_items" => &self.line_items,
            "sub_total" => &self.sub_total,
            "tax_summary" => &self.tax_summary,
            "bank_details" => &self.bank_details,
            "business_address" => &self.business_address,
            other => return self.extra.get(other),
        };
        Some(value)
    }

    /// Keys present in the reply but not in [`INVOICE_FIELDS`].
    pub fn unknown_keys(&self) -> impl Iterator<Item = &str> {
        self.extra.keys().map(String::as_str)
    }

    /// Flatten into a row of display strings.
    pub fn to_row(&self) -> InvoiceRow {
        let cells = INVOICE_FIELDS
            .iter()
            .map(|key| {
                let value = self.get(key).unwrap_or(&Value::Null);
                if NESTED_FIELDS.contains(key) {
                    nested_cell(key, value)
                } else {
                    cell_text(value)
                }
            })
            .collect();

        InvoiceRow { cells }
    }
}

/// A flattened invoice: exactly the [`INVOICE_FIELDS`] keys, all strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceRow {
    cells: Vec<String>,
}

impl InvoiceRow {
    /// Get a cell by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        INVOICE_FIELDS
            .iter()
            .position(|k| *k == key)
            .map(|i| self.cells[i].as_str())
    }

    /// Cell values in column order.
    pub fn values(&self) -> &[String] {
        &self.cells
    }

    /// `(key, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        INVOICE_FIELDS
            .iter()
            .copied()
            .zip(self.cells.iter().map(String::as_str))
    }
}

impl Serialize for InvoiceRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Render a scalar-ish value for a table cell.
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Nested fields are always JSON-encoded, with an empty default when absent.
fn nested_cell(key: &str, value: &Value) -> String {
    match value {
        Value::Null if key == "bank_details" => "{}".to_string(),
        Value::Null => "[]".to_string(),
        other => other.to_string(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
