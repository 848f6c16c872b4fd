//! Generate command - turn cart screenshots into a bill and summary exports.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use cartbill_core::export::{to_csv, to_xlsx};
use cartbill_core::models::config::ExportConfig;
use cartbill_core::{
    Backend, BillOutcome, BillSession, ImageInput, ImageStatus, Store,
    SummaryTable,
};

/// File types accepted as screenshots.
const SUPPORTED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Arguments for the generate command.
#[derive(Args)]
pub struct GenerateArgs {
    /// Cart screenshots (file paths or glob patterns)
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Store the cart belongs to (default from config)
    #[arg(short, long, value_enum)]
    store: Option<StoreArg>,

    /// API key, overriding config and environment
    #[arg(long)]
    api_key: Option<String>,

    /// Model backend (default from config)
    #[arg(short, long, value_enum)]
    backend: Option<BackendArg>,

    /// Model name override
    #[arg(short, long)]
    model: Option<String>,

    /// Output format for the bill
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Write the bill to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for CSV/XLSX exports (default: current directory)
    #[arg(short = 'd', long)]
    output_dir: Option<PathBuf>,

    /// Export the summary table as CSV
    #[arg(long)]
    csv: bool,

    /// Export the summary table as an XLSX spreadsheet
    #[arg(long)]
    xlsx: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum StoreArg {
    Temu,
    Shein,
    Noon,
}

impl From<StoreArg> for Store {
    fn from(arg: StoreArg) -> Self {
        match arg {
            StoreArg::Temu => Store::Temu,
            StoreArg::Shein => Store::Shein,
            StoreArg::Noon => Store::Noon,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum BackendArg {
    /// Google Gemini
    Gemini,
    /// OpenAI-compatible chat completions server
    Openai,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Gemini => Backend::Gemini,
            BackendArg::Openai => Backend::OpenAi,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Bill text, ready to paste
    Text,
    /// Full run outcome as JSON
    Json,
}

pub async fn run(args: GenerateArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = super::load_config(config_path)?;
    if let Some(backend) = args.backend {
        config.inference.backend = backend.into();
    }
    if let Some(model) = &args.model {
        match config.inference.backend {
            Backend::Gemini => config.inference.gemini.model = model.clone(),
            Backend::OpenAi => config.inference.openai.model = model.clone(),
        }
    }

    let files = collect_inputs(&args.inputs)?;
    let store = args.store.map(Store::from).unwrap_or(config.bill.default_store);

    eprintln!(
        "{} Found {} screenshots for {}",
        style("ℹ").blue(),
        files.len(),
        store
    );

    let images = files
        .iter()
        .map(|path| ImageInput::from_path(path))
        .collect::<Result<Vec<_>, _>>()?;

    let session = BillSession::from_config(&config, args.api_key.as_deref())?;
    let model = config.inference.endpoint().model.clone();

    let pb = ProgressBar::new(images.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let result = session
        .run_with_progress(&images, store.label(), |index, name| {
            pb.set_position(index as u64);
            pb.set_message(format!("Analyzing {name} with {model}..."));
        })
        .await;

    let outcome = match result {
        Ok(outcome) => {
            pb.finish_with_message("Complete");
            outcome
        }
        Err(e) => {
            pb.abandon_with_message("Failed");
            return Err(e.into());
        }
    };

    print_reports(&outcome);

    let rendered = match args.format {
        OutputFormat::Text => outcome.bill.text.clone(),
        OutputFormat::Json => serde_json::to_string_pretty(&outcome)?,
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &rendered)?;
        eprintln!(
            "{} Bill written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        print!("{rendered}");
        if matches!(args.format, OutputFormat::Json) {
            println!();
        }
    }

    if matches!(args.format, OutputFormat::Text) {
        print_summary(&outcome.summary, &config.bill.currency);
    }

    if args.csv || args.xlsx {
        let dir = args.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&dir)?;
        write_exports(&outcome.summary, &dir, &config.export, &config.bill.currency, &args)?;
    }

    debug!("Total processing time: {:?}", start.elapsed());
    info!(
        subtotal = %outcome.bill.subtotal,
        total = %outcome.bill.rounded_total,
        "Run finished"
    );

    Ok(())
}

/// Expand paths and glob patterns into the list of screenshots to process.
///
/// Glob matches with other extensions are skipped; an explicitly named file
/// with an unsupported extension is an error.
fn collect_inputs(inputs: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if is_glob(input) {
            let matched = glob(input)?
                .filter_map(|r| r.ok())
                .filter(|p| p.is_file() && is_supported(p));
            files.extend(matched);
            continue;
        }

        let path = PathBuf::from(input);
        if !path.exists() {
            anyhow::bail!("Input file not found: {}", path.display());
        }
        if !is_supported(&path) {
            anyhow::bail!(
                "Unsupported file format: {} (expected one of: {})",
                path.display(),
                SUPPORTED_EXTENSIONS.join(", ")
            );
        }
        files.push(path);
    }

    if files.is_empty() {
        anyhow::bail!("No matching screenshots found for: {}", inputs.join(" "));
    }

    Ok(files)
}

fn is_glob(input: &str) -> bool {
    input.contains(['*', '?', '['])
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn print_reports(outcome: &BillOutcome) {
    for report in &outcome.reports {
        match &report.status {
            ImageStatus::Extracted => eprintln!(
                "  {} {}: {} items",
                style("✓").green(),
                report.name,
                report.items
            ),
            ImageStatus::NoItems => eprintln!(
                "  {} {}: no items extracted",
                style("!").yellow(),
                report.name
            ),
            ImageStatus::DecodeFailed(reason) => eprintln!(
                "  {} {}: not a readable image ({})",
                style("✗").red(),
                report.name,
                reason
            ),
        }
    }
}

fn print_summary(table: &SummaryTable, currency: &str) {
    let [item, price, qty] = SummaryTable::headers(currency);

    println!();
    println!("{}", style("Summary Table").bold());
    println!("{:<48} {:>18} {:>5}", item, price, qty);
    for row in &table.rows {
        let label = row.item.replace('\n', " · ");
        println!("{:<48} {:>18} {:>5}", label, row.unit_price, row.quantity);
    }
}

fn write_exports(
    table: &SummaryTable,
    dir: &Path,
    export: &ExportConfig,
    currency: &str,
    args: &GenerateArgs,
) -> anyhow::Result<()> {
    if args.csv {
        let path = dir.join(&export.csv_file_name);
        fs::write(&path, to_csv(table, currency)?)?;
        eprintln!("{} CSV written to {}", style("✓").green(), path.display());
    }

    if args.xlsx {
        let path = dir.join(&export.xlsx_file_name);
        fs::write(&path, to_xlsx(table, currency, &export.sheet_name)?)?;
        eprintln!(
            "{} Spreadsheet written to {}",
            style("✓").green(),
            path.display()
        );
    }

    Ok(())
}
