//! datawash - Upload, clean and convert tabular data

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use datawash::capability::Capabilities;
use datawash::config::{Config, ExportFormat};
use datawash::output::{export_filename, render_preview, ExportFactory};
use datawash::parser::{ingest, UploadedFile};
use datawash::transform::{self, TransformOptions};
use datawash::Table;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliExportFormat {
    Csv,
    #[value(alias = "xlsx")]
    Excel,
    Pdf,
}

impl From<CliExportFormat> for ExportFormat {
    fn from(f: CliExportFormat) -> Self {
        match f {
            CliExportFormat::Csv => ExportFormat::Csv,
            CliExportFormat::Excel => ExportFormat::Excel,
            CliExportFormat::Pdf => ExportFormat::Pdf,
        }
    }
}

/// Upload, clean and convert tabular data (CSV, Excel)
#[derive(Parser, Debug)]
#[command(name = "datawash")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the browser application
    Serve(ServeArgs),
    /// Clean a file and write it in another format
    Convert(ConvertArgs),
    /// Print the first rows of a file
    Preview(PreviewArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to bind to
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8501)]
    port: u16,

    /// Largest accepted upload, in megabytes
    #[arg(long, default_value_t = 200)]
    max_upload_mb: usize,

    /// Sessions kept in memory before the oldest is dropped
    #[arg(long, default_value_t = 64)]
    max_sessions: usize,

    /// Disable charts even when compiled in
    #[arg(long)]
    no_charts: bool,

    /// Disable Excel export even when compiled in
    #[arg(long)]
    no_xlsx: bool,
}

/// Transform steps shared by `convert` and `preview`
#[derive(Args, Debug)]
struct TransformArgs {
    /// Replace missing numeric values with the column mean
    #[arg(long)]
    fill_missing: bool,

    /// Column(s) to keep, in output order (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    columns: Vec<String>,
}

impl TransformArgs {
    fn options(&self) -> TransformOptions {
        let options = TransformOptions::default().with_fill_missing(self.fill_missing);
        if self.columns.is_empty() {
            options
        } else {
            options.with_columns(self.columns.clone())
        }
    }
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// CSV or Excel file to convert
    file: PathBuf,

    /// Output format
    #[arg(short, long, value_enum)]
    format: CliExportFormat,

    /// Output path (default: input name with the format's extension, beside the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    transform: TransformArgs,
}

#[derive(Args, Debug)]
struct PreviewArgs {
    /// CSV or Excel file to preview
    file: PathBuf,

    /// Number of rows to show
    #[arg(short, long, default_value_t = 5)]
    rows: usize,

    #[command(flatten)]
    transform: TransformArgs,
}

fn main() -> ExitCode {
    init_tracing();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => serve(args),
        Command::Convert(args) => convert(args),
        Command::Preview(args) => preview(args),
    }
}

fn serve(args: ServeArgs) -> Result<()> {
    let config = Config::default()
        .with_bind(args.host, args.port)
        .with_max_upload_mb(args.max_upload_mb)
        .with_max_sessions(args.max_sessions)
        .with_disable_charts(args.no_charts)
        .with_disable_xlsx(args.no_xlsx);

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(datawash::http::serve(config))
}

fn load(path: &Path, transform: &TransformArgs) -> Result<(UploadedFile, Table)> {
    let file = UploadedFile::from_path(path)?;
    let mut table =
        ingest(&file).with_context(|| format!("Failed to read {}", path.display()))?;
    transform::apply(&mut table, &transform.options())
        .with_context(|| format!("Failed to transform {}", path.display()))?;
    Ok((file, table))
}

fn convert(args: ConvertArgs) -> Result<()> {
    let format: ExportFormat = args.format.into();
    let (file, table) = load(&args.file, &args.transform)?;

    let output = match args.output {
        Some(path) => path,
        None => {
            let path = args.file.with_file_name(export_filename(&file.name, format));
            if path == args.file {
                anyhow::bail!(
                    "Output would overwrite {}; pass --output to choose another path",
                    args.file.display()
                );
            }
            path
        }
    };

    let config = Config::default();
    let artifact = ExportFactory::new(Capabilities::from_config(&config))
        .with_pdf_row_limit(config.pdf_row_limit)
        .export(&table, &file.name, format)?;
    std::fs::write(&output, &artifact.bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Wrote {} ({} rows, {} columns)",
        output.display(),
        table.row_count(),
        table.column_count()
    );
    Ok(())
}

fn preview(args: PreviewArgs) -> Result<()> {
    let (_, table) = load(&args.file, &args.transform)?;
    print!("{}", render_preview(&table, args.rows));
    Ok(())
}
