//! Prompt templates with `{name}` placeholders.
//!
//! `{{` and `}}` render as literal braces. Partial variables are bound once at
//! construction; input variables must be supplied on every render.

use std::collections::HashMap;

use crate::error::PromptError;
use crate::output::JsonOutputParser;

/// Result type for prompt operations.
pub type Result<T> = std::result::Result<T, PromptError>;

/// The invoice extraction prompt.
const INVOICE_TEMPLATE: &str = "\
You are an expert at reading invoices.

Extract the following information from the text below:

- Invoice Number
- Invoice Date
- Vendor / Supplier Name
- Vendor TRN / VAT
- Bill To (Customer Name, Address, TRN)
- Total Amount
- Balance Due
- Line Items (Item Name, Quantity, Rate, Taxable Amount, Tax Amount, Total)
- Sub Total
- Tax Summary (Taxable Amount, Tax Amount, Total, Tax Rate)
- Bank Details (Account Holder, Account Number, IBAN, BIC)
- Business Address

Invoice Text:
{invoice_text}

Provide the output in **JSON format only** with keys exactly like:
invoice_number, invoice_date, vendor, bill_to, total_amount, balance_due, line_items, sub_total, tax_summary, bank_details, business_address
";

/// Name of the variable the invoice prompt expects.
pub const INVOICE_TEXT_VAR: &str = "invoice_text";

/// Build the invoice extraction prompt.
pub fn invoice_prompt() -> PromptTemplate {
    PromptTemplate::new(INVOICE_TEMPLATE, [INVOICE_TEXT_VAR])
        .with_partial("format_instructions", JsonOutputParser::format_instructions())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
}

/// A text template rendered by substituting named variables.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    input_variables: Vec<String>,
    partial_variables: HashMap<String, String>,
}

impl PromptTemplate {
    /// Create a template with the given input variables.
    pub fn new<I, S>(template: impl Into<String>, input_variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            template: template.into(),
            input_variables: input_variables.into_iter().map(Into::into).collect(),
            partial_variables: HashMap::new(),
        }
    }

    /// Bind a variable once for every render.
    pub fn with_partial(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.partial_variables.insert(name.into(), value.into());
        self
    }

    /// Variables the caller must supply.
    pub fn input_variables(&self) -> &[String] {
        &self.input_variables
    }

    /// Variables bound at construction.
    pub fn partial_variables(&self) -> &HashMap<String, String> {
        &self.partial_variables
    }

    /// The raw template text.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Render with a single input variable.
    pub fn format(&self, name: &str, value: &str) -> Result<String> {
        self.render(&HashMap::from([(name, value)]))
    }

    /// Render the template, substituting every placeholder.
    pub fn render(&self, vars: &HashMap<&str, &str>) -> Result<String> {
        if let Some(missing) = self
            .input_variables
            .iter()
            .find(|name| !vars.contains_key(name.as_str()))
        {
            return Err(PromptError::MissingVariable(missing.clone()));
        }

        let mut out = String::with_capacity(self.template.len());
        for segment in parse_template(&self.template)? {
            match segment {
                Segment::Literal(text) => out.push_str(&text),
                Segment::Variable(name) => {
                    let value = vars
                        .get(name.as_str())
                        .copied()
                        .or_else(|| self.partial_variables.get(&name).map(String::as_str))
                        .ok_or(PromptError::UndeclaredVariable(name))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

fn parse_template(template: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                literal.push('{');
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, '{')) | None => return Err(PromptError::Malformed(pos)),
                        Some((_, ch)) => name.push(ch),
                    }
                }
                let name = name.trim();
                if name.is_empty() {
                    return Err(PromptError::Malformed(pos));
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Variable(name.to_string()));
            }
            '}' => return Err(PromptError::Malformed(pos)),
            other => literal.push(other),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_invoice_prompt_embeds_text_verbatim() {
        let text = "TAX INVOICE\nInvoice No: INV-7 {draft}\nTotal: AED 105.00";
        let prompt = invoice_prompt().format(INVOICE_TEXT_VAR, text).unwrap();

        assert!(prompt.starts_with("You are an expert at reading invoices."));
        assert!(prompt.contains(&format!("Invoice Text:\n{}\n", text)));
        assert!(prompt.contains("bank_details, business_address"));
        assert!(!prompt.contains("{invoice_text}"));
    }

    #[test]
    fn test_invoice_prompt_variables() {
        let prompt = invoice_prompt();
        assert_eq!(prompt.input_variables(), &["invoice_text".to_string()]);
        assert!(prompt.partial_variables().contains_key("format_instructions"));
    }

    #[test]
    fn test_missing_variable() {
        let err = invoice_prompt().render(&HashMap::new()).unwrap_err();
        assert_eq!(err, PromptError::MissingVariable("invoice_text".to_string()));
    }

    #[test]
    fn test_escaped_braces_and_partials() {
        let template = PromptTemplate::new("{{\"doc\": \"{doc}\"}} {fmt}", ["doc"])
            .with_partial("fmt", "Return a JSON object.");
        assert_eq!(
            template.format("doc", "abc").unwrap(),
            "{\"doc\": \"abc\"} Return a JSON object."
        );
    }

    #[test]
    fn test_undeclared_variable() {
        let template = PromptTemplate::new("{a} {b}", ["a"]);
        assert_eq!(
            template.format("a", "1").unwrap_err(),
            PromptError::UndeclaredVariable("b".to_string())
        );
    }

    #[test]
    fn test_malformed_templates() {
        assert_eq!(
            PromptTemplate::new("oops }", Vec::<String>::new())
                .render(&HashMap::new())
                .unwrap_err(),
            PromptError::Malformed(5)
        );
        assert_eq!(
            PromptTemplate::new("open {name", Vec::<String>::new())
                .render(&HashMap::new())
                .unwrap_err(),
            PromptError::Malformed(5)
        );
        assert_eq!(
            PromptTemplate::new("empty {}", Vec::<String>::new())
                .render(&HashMap::new())
                .unwrap_err(),
            PromptError::Malformed(6)
        );
    }
}
