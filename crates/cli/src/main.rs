// cashflow-ods - render a cash-flow statement job as an OpenDocument spreadsheet
//
// Reads a job payload (JSON) from a file or stdin, builds the statement from
// the data source it names, and either prints `filename|base64` to stdout or
// writes the document into a directory.

mod exit_codes;
mod logger;

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use base64::Engine as _;
use clap::Parser;

use cashflow_config::{ConfigError, JobPayload, ResourceManager};
use cashflow_io::{export_cash_statement, DataSource, ExportError};

use exit_codes::{config_exit_code, export_exit_code, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "cashflow-ods")]
#[command(about = "Render a cash-flow statement job as an .ods document")]
#[command(long_version = long_version())]
#[command(version)]
#[command(after_help = "\
Examples:
  cashflow-ods job.json -o out/
  cat job.json | cashflow-ods > result.txt
  cashflow-ods job.json --locales ./locales -v")]
struct Cli {
    /// Job payload file (omit or '-' to read from stdin)
    payload: Option<PathBuf>,

    /// Write the document into this directory instead of printing it
    #[arg(long, short = 'o', value_name = "DIR")]
    output: Option<PathBuf>,

    /// Directory of <locale>.json translation files
    #[arg(long, value_name = "DIR", env = "CASHFLOW_LOCALES_DIR")]
    locales: Option<PathBuf>,

    /// Log progress to stderr
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Do not print diagnostics
    #[arg(long, short = 'q')]
    quiet: bool,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  cashflow-engine ", env!("CARGO_PKG_VERSION"),
        "\nformat:  OpenDocument spreadsheet 1.2",
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let job = read_payload(cli.payload.as_ref())?;
    let locale = job.locale();
    let translator = ResourceManager::load(&locale, cli.locales.as_deref())?;
    let options = job.report_options(chrono::Utc::now());

    let source = DataSource::resolve(job.db_kind(), job.connection()?)?;
    let repo = source.open()?;
    let report = export_cash_statement(repo.as_ref(), &translator, &options, &locale)?;

    if !cli.quiet {
        for diagnostic in report.diagnostics.iter() {
            eprintln!("warning: {}", diagnostic);
        }
    }

    match cli.output {
        Some(dir) => {
            let path = report.write_to(&dir)?;
            println!("{}", path.display());
        }
        None => {
            let encoded = base64::engine::general_purpose::STANDARD.encode(&report.bytes);
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}|{}", report.filename, encoded)
                .map_err(|e| CliError::new(EXIT_ERROR, format!("cannot write to stdout: {e}")))?;
        }
    }
    Ok(())
}

fn read_payload(path: Option<&PathBuf>) -> Result<JobPayload, CliError> {
    match path.filter(|p| p.as_os_str() != "-") {
        Some(path) => JobPayload::load(path).map_err(CliError::from),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| CliError::new(EXIT_USAGE, format!("cannot read payload from stdin: {e}")))?;
            if text.trim().is_empty() {
                return Err(CliError::new(EXIT_USAGE, "no job payload given")
                    .with_hint("pass a payload file or pipe JSON on stdin"));
            }
            JobPayload::from_json(&text).map_err(CliError::from)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        let code = config_exit_code(&err);
        let hint = match &err {
            ConfigError::MissingConnection => Some("set SqlConnection to a .db file or a JSON fixture path"),
            ConfigError::Resource { .. } => Some("check the files under --locales or CASHFLOW_LOCALES_DIR"),
            _ => None,
        };
        let cli = CliError::new(code, err.to_string());
        match hint {
            Some(hint) => cli.with_hint(hint),
            None => cli,
        }
    }
}

impl From<ExportError> for CliError {
    fn from(err: ExportError) -> Self {
        let code = export_exit_code(&err);
        let cli = CliError::new(code, err.to_string());
        match err {
            ExportError::UnsupportedDataSource(_) => cli.with_hint("set params.dbKind to sqlite or fixture"),
            _ => cli,
        }
    }
}
