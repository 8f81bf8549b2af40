//! Extract command - pull data out of a single PDF invoice.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use invex_core::session::to_json_pretty;
use invex_core::{ExtractionResult, InvoiceTable, PdfExtractor, PdfProcessor};

use super::{build_extractor, check_pdf_path, load_config, spinner};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Model identifier (overrides config)
    #[arg(short, long)]
    model: Option<String>,

    /// Print the text sent to the model instead of calling it
    #[arg(long)]
    dump_text: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON object as returned by the model
    Json,
    /// Single-row CSV with the fixed columns
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    check_pdf_path(&args.input)?;

    info!("Processing file: {}", args.input.display());
    let data = fs::read(&args.input)?;

    if args.dump_text {
        let mut pdf = PdfExtractor::new()
            .with_page_separator(config.pdf.page_separator.clone())
            .with_max_pages(config.pdf.max_pages);
        pdf.load(&data)?;
        println!("{}", pdf.extract_all()?.text);
        return Ok(());
    }

    let extractor = build_extractor(&config, args.model.as_deref())?;

    let pb = spinner("Extracting invoice data...");
    let result = extractor.extract_from_pdf(&data).await;
    pb.finish_and_clear();
    let result = result?;

    eprintln!("{} Extraction complete!", style("✓").green());

    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(to_json_pretty(&result.raw)?),
        OutputFormat::Csv => {
            let mut table = InvoiceTable::new();
            table.push_result("", result);
            Ok(table.to_csv()?)
        }
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn format_text(result: &ExtractionResult) -> String {
    let row = result.record.to_row();
    let width = row.iter().map(|(key, _)| key.len()).max().unwrap_or(0);

    let mut output = String::new();
    for (key, value) in row.iter() {
        output.push_str(&format!("{:width$}  {}\n", key, value, width = width));
    }

    let extra: Vec<&str> = result.record.unknown_keys().collect();
    if !extra.is_empty() {
        output.push_str(&format!("\nOther keys: {}\n", extra.join(", ")));
    }

    output.push_str(&format!(
        "\nModel: {} ({}ms)\n",
        result.model, result.processing_time_ms
    ));
    output
}
