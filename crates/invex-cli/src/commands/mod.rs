//! Subcommand implementations.

pub mod config;
pub mod extract;
pub mod session;

use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use invex_core::models::config::InvexConfig;
use invex_core::{GeminiClient, InvoiceExtractor};

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("invex")
        .join("config.json")
}

/// Load configuration from an explicit path, the default path, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<InvexConfig> {
    if let Some(path) = config_path {
        return Ok(InvexConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        Ok(InvexConfig::from_file(&default_path)?)
    } else {
        Ok(InvexConfig::default())
    }
}

/// Build an extractor backed by Gemini, honoring a `--model` override.
pub fn build_extractor(
    config: &InvexConfig,
    model: Option<&str>,
) -> anyhow::Result<InvoiceExtractor<GeminiClient>> {
    let mut client = GeminiClient::from_env(&config.llm)?;
    if let Some(model) = model {
        client = client.with_model(model);
    }
    Ok(InvoiceExtractor::new(client).with_pdf_config(config.pdf.clone()))
}

/// Spinner shown while waiting on the model.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Ensure the input is an existing PDF file.
pub fn check_pdf_path(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if extension != "pdf" {
        anyhow::bail!("Unsupported file format: {} (expected a PDF)", extension);
    }
    Ok(())
}
