//! Session command - extract invoices one at a time and accumulate them in a table.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::Args;
use console::{Alignment, measure_text_width, pad_str, style, truncate_str};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use invex_core::models::config::InvexConfig;
use invex_core::session::to_json_pretty;
use invex_core::{GeminiClient, INVOICE_FIELDS, InvoiceExtractor, InvoiceTable};

use super::{build_extractor, check_pdf_path, load_config, spinner};

/// Widest a table cell is allowed to get before truncation.
const MAX_CELL_WIDTH: usize = 24;

/// Arguments for the session command.
#[derive(Args)]
pub struct SessionArgs {
    /// Model identifier (overrides config)
    #[arg(short, long)]
    model: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Extractor,
    Dashboard,
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Page::Extractor => write!(f, "extractor"),
            Page::Dashboard => write!(f, "dashboard"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExportFormat {
    Csv,
    Json,
}

/// A line typed at the session prompt.
#[derive(Debug, PartialEq, Eq)]
enum SessionCommand {
    Open(PathBuf),
    Goto(Page),
    Table,
    Export {
        format: ExportFormat,
        path: Option<PathBuf>,
    },
    Save(Option<PathBuf>),
    Clear,
    Help,
    Quit,
}

impl FromStr for SessionCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_lowercase().as_str() {
            "open" | "o" => {
                if rest.is_empty() {
                    Err("usage: open <file.pdf>".to_string())
                } else {
                    Ok(SessionCommand::Open(unquote(rest).into()))
                }
            }
            "extractor" => Ok(SessionCommand::Goto(Page::Extractor)),
            "dashboard" => Ok(SessionCommand::Goto(Page::Dashboard)),
            "table" | "ls" => Ok(SessionCommand::Table),
            "export" => {
                let (format, path) = match rest.split_once(char::is_whitespace) {
                    Some((format, path)) => (format, Some(unquote(path.trim()).into())),
                    None => (rest, None),
                };
                let format = match format.to_lowercase().as_str() {
                    "csv" => ExportFormat::Csv,
                    "json" => ExportFormat::Json,
                    _ => return Err("usage: export csv|json [path]".to_string()),
                };
                Ok(SessionCommand::Export { format, path })
            }
            "save" => Ok(SessionCommand::Save(
                (!rest.is_empty()).then(|| unquote(rest).into()),
            )),
            "clear" => Ok(SessionCommand::Clear),
            "help" | "?" => Ok(SessionCommand::Help),
            "quit" | "exit" | "q" => Ok(SessionCommand::Quit),
            _ if line.to_lowercase().ends_with(".pdf") => {
                Ok(SessionCommand::Open(unquote(line).into()))
            }
            _ => Err(format!("unknown command: {word} (type 'help')")),
        }
    }
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| s.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(s)
}

struct Session {
    config: InvexConfig,
    model: Option<String>,
    extractor: Option<InvoiceExtractor<GeminiClient>>,
    table: InvoiceTable,
    page: Page,
}

impl Session {
    fn new(config: InvexConfig, model: Option<String>) -> Self {
        Self {
            config,
            model,
            extractor: None,
            table: InvoiceTable::new(),
            page: Page::Extractor,
        }
    }

    /// Build the model client on first use so browsing needs no credentials.
    fn extractor(&mut self) -> anyhow::Result<&InvoiceExtractor<GeminiClient>> {
        if self.extractor.is_none() {
            self.extractor = Some(build_extractor(&self.config, self.model.as_deref())?);
        }
        self.extractor
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("model client unavailable"))
    }

    async fn open(&mut self, path: &Path) -> anyhow::Result<()> {
        self.page = Page::Extractor;
        check_pdf_path(path)?;
        let data = fs::read(path)?;
        println!("{} File uploaded successfully!", style("✓").green());

        let extractor = self.extractor()?;
        let pb = spinner("Extracting invoice data...");
        let result = extractor.extract_from_pdf(&data).await;
        pb.finish_and_clear();
        let result = result?;

        println!("{} Extraction complete!", style("✓").green());
        println!();
        println!("{}", style("Extracted Invoice Data (JSON)").bold());
        println!("{}", to_json_pretty(&result.raw)?);

        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let index = self.table.push_result(source, &result);
        debug!("Appended row {} to session table", index);
        Ok(())
    }

    fn show_dashboard(&self) {
        println!("{}", style("Invoice Dashboard").bold());
        if self.table.is_empty() {
            println!("No invoices uploaded yet.");
        } else {
            print!("{}", render_table(&self.table));
            println!("{} invoice(s)", self.table.len());
        }
    }

    /// Write the most recent reply on its own.
    fn save(&self, path: Option<PathBuf>) -> anyhow::Result<()> {
        let Some(entry) = self.table.last() else {
            println!("No invoices uploaded yet.");
            return Ok(());
        };

        let path =
            path.unwrap_or_else(|| PathBuf::from(&self.config.export.invoice_file_name));
        fs::write(&path, to_json_pretty(&entry.raw)?)?;

        println!(
            "{} Saved {} to {}",
            style("✓").green(),
            entry.source,
            path.display()
        );
        Ok(())
    }

    fn export(&self, format: ExportFormat, path: Option<PathBuf>) -> anyhow::Result<()> {
        if self.table.is_empty() {
            println!("No invoices uploaded yet.");
            return Ok(());
        }

        let (content, default_name) = match format {
            ExportFormat::Csv => (self.table.to_csv()?, &self.config.export.csv_file_name),
            ExportFormat::Json => (self.table.to_json()?, &self.config.export.json_file_name),
        };
        let path = path.unwrap_or_else(|| PathBuf::from(default_name));
        fs::write(&path, content)?;

        println!(
            "{} Wrote {} invoice(s) to {}",
            style("✓").green(),
            self.table.len(),
            path.display()
        );
        Ok(())
    }
}

pub async fn run(args: SessionArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let mut session = Session::new(config, args.model);

    println!("{}", style("Invoice Extractor").bold());
    println!("Open a PDF invoice to get structured data. Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}> ", session.page);
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<SessionCommand>() {
            Ok(command) => command,
            Err(msg) => {
                eprintln!("{}", style(msg).yellow());
                continue;
            }
        };

        match command {
            SessionCommand::Open(path) => {
                if let Err(e) = session.open(&path).await {
                    debug!("Extraction failed for {}: {:?}", path.display(), e);
                    eprintln!("{} {:#}", style("✗").red(), e);
                }
            }
            SessionCommand::Goto(page) => {
                session.page = page;
                if page == Page::Dashboard {
                    session.show_dashboard();
                } else {
                    println!("{}", style("Invoice Extractor").bold());
                }
            }
            SessionCommand::Table => session.show_dashboard(),
            SessionCommand::Export { format, path } => {
                if let Err(e) = session.export(format, path) {
                    eprintln!("{} {:#}", style("✗").red(), e);
                }
            }
            SessionCommand::Save(path) => {
                if let Err(e) = session.save(path) {
                    eprintln!("{} {:#}", style("✗").red(), e);
                }
            }
            SessionCommand::Clear => {
                session.table.clear();
                println!("Session table cleared.");
            }
            SessionCommand::Help => print_help(),
            SessionCommand::Quit => break,
        }
    }

    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  open <file.pdf>        extract an invoice and add it to the table");
    println!("  extractor | dashboard  switch view");
    println!("  table                  show accumulated invoices");
    println!("  export csv|json [path] write the table to a file");
    println!("  save [path]            write the last invoice as JSON");
    println!("  clear                  drop all rows");
    println!("  quit                   leave the session");
}

/// Render the session table as fixed-width text.
fn render_table(table: &InvoiceTable) -> String {
    let mut headers = vec!["#", "source"];
    headers.extend(INVOICE_FIELDS);

    let rows: Vec<Vec<String>> = table
        .entries()
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let mut cells = vec![(i + 1).to_string(), entry.source.clone()];
            cells.extend(entry.row.values().iter().map(|v| v.replace(['\n', '\r'], " ")));
            cells
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(col, header)| {
            rows.iter()
                .map(|row| measure_text_width(&row[col]))
                .chain(std::iter::once(header.len()))
                .max()
                .unwrap_or(0)
                .min(MAX_CELL_WIDTH)
        })
        .collect();

    let format_line = |cells: &[&str]| -> String {
        let line = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| {
                if measure_text_width(cell) > width {
                    pad_str(&truncate_str(cell, width, "…"), width, Alignment::Left, None)
                        .into_owned()
                } else {
                    pad_str(cell, width, Alignment::Left, None).into_owned()
                }
            })
            .collect::<Vec<_>>()
            .join(" | ");
        format!("{}\n", line.trim_end())
    };

    let mut out = format_line(&headers[..]);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("{}\n", rule.join("-+-")));
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push_str(&format_line(&cells[..]));
    }
    out
}
