//! hacknet-hints CLI

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use hacknet_hints::diagnostics::{FindingsStore, Severity};
use hacknet_hints::{DiagnoseOptions, FileReport, HintEngine};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "hacknet-hints")]
#[command(about = "Completion, hover and diagnostics for Hacknet extension XML files")]
#[command(version)]
struct Cli {
    /// Extension folder containing the hint definition file
    #[arg(short, long, default_value = ".", global = true)]
    workspace: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain", global = true)]
    format: OutputFormat,

    /// Log level, overrides RUST_LOG and the config file
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Suggestions at a cursor position
    Complete(CursorArgs),
    /// Description of the item under the cursor
    Hover(CursorArgs),
    /// Files the value under the cursor refers to
    Definition(CursorArgs),
    /// Diagnose files (default: every XML file in the workspace)
    Diagnose {
        files: Vec<PathBuf>,

        /// Also diagnose files depending on the given ones
        #[arg(long)]
        dependents: bool,

        /// Run on the background worker thread
        #[arg(long)]
        worker: bool,
    },
    /// Show the loaded hint model
    Hints,
}

#[derive(clap::Args)]
struct CursorArgs {
    file: PathBuf,

    /// Byte offset, or 1-based `line:column`
    position: String,

    /// Read the document text from stdin instead of the file
    #[arg(long)]
    stdin: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Plain,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// `--log-level` wins over `RUST_LOG`, which wins over the config file
fn init_logging(cli_level: Option<&str>, config_level: &str) {
    let filter = match cli_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config_level)),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Returns `false` when diagnostics found errors
fn run(cli: Cli) -> Result<bool> {
    let root = fs::canonicalize(&cli.workspace)
        .with_context(|| format!("workspace {} not found", cli.workspace.display()))?;
    let config = hacknet_hints::Config::load_default(&root);
    init_logging(cli.log_level.as_deref(), &config.log_level);

    let mut engine = HintEngine::open(&root);
    let format = cli.format;

    match cli.command {
        Command::Complete(args) => {
            let (path, text, offset) = cursor(&mut engine, &args)?;
            let items = engine.complete(Some(&path), &text, offset);
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&items)?),
                OutputFormat::Plain => {
                    for item in &items {
                        let detail = item.detail.as_deref().unwrap_or("");
                        println!("{:<30} {:<10?} {}", item.label, item.kind, detail);
                    }
                }
            }
        }
        Command::Hover(args) => {
            let (path, text, offset) = cursor(&mut engine, &args)?;
            let description = engine.hover(Some(&path), &text, offset);
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&description)?),
                OutputFormat::Plain => println!("{}", description.unwrap_or_default()),
            }
        }
        Command::Definition(args) => {
            let (path, text, offset) = cursor(&mut engine, &args)?;
            let targets = engine.definition(Some(&path), &text, offset);
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&targets)?),
                OutputFormat::Plain => {
                    for target in &targets {
                        println!("{}", target.file_path.display());
                    }
                }
            }
        }
        Command::Diagnose {
            files,
            dependents,
            worker,
        } => {
            let paths = if files.is_empty() {
                engine.document_paths()
            } else {
                files
                    .iter()
                    .map(|f| absolute(&root, f))
                    .collect::<Result<Vec<_>>>()?
            };
            let options = DiagnoseOptions {
                scan_dependents: dependents,
                reset_dependency_table: false,
            };
            let reports = if worker {
                diagnose_on_worker(&engine, paths, options)?
            } else {
                engine.diagnose(&paths, options)
            };
            return print_reports(&root, &reports, format);
        }
        Command::Hints => {
            let model = engine.model();
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(model)?),
                OutputFormat::Plain => {
                    for def in &model.definitions {
                        println!(
                            "{:<40} {} attributes{}",
                            def.node_path,
                            def.attribute_hints.len(),
                            if def.content_hint.is_some() { ", content" } else { "" }
                        );
                    }
                    for warning in &model.warnings {
                        eprintln!("warning: {}", warning);
                    }
                }
            }
        }
    }
    Ok(true)
}

fn absolute(root: &Path, file: &Path) -> Result<PathBuf> {
    let path = if file.is_absolute() {
        file.to_path_buf()
    } else {
        std::env::current_dir()?.join(file)
    };
    // Deleted files cannot be canonicalized; keep them under the root as given
    Ok(fs::canonicalize(&path).unwrap_or_else(|_| root.join(file)))
}

/// Resolve the document, its text and the cursor offset
fn cursor(engine: &mut HintEngine, args: &CursorArgs) -> Result<(PathBuf, String, usize)> {
    let root = engine
        .workspace()
        .root()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let path = absolute(&root, &args.file)?;
    let text = if args.stdin {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        engine.update_file(&path, &buf);
        buf
    } else {
        fs::read_to_string(&path).with_context(|| format!("cannot read {}", path.display()))?
    };
    let offset = parse_position(&text, &args.position)?;
    Ok((path, text, offset))
}

/// `123` is a byte offset; `3:14` is a 1-based line and character column
fn parse_position(text: &str, position: &str) -> Result<usize> {
    let Some((line, column)) = position.split_once(':') else {
        let offset: usize = position.parse().context("invalid offset")?;
        if offset > text.len() || !text.is_char_boundary(offset) {
            bail!("offset {} is outside the document", offset);
        }
        return Ok(offset);
    };
    let line: usize = line.parse().context("invalid line")?;
    let column: usize = column.parse().context("invalid column")?;
    if line == 0 || column == 0 {
        bail!("line and column are 1-based");
    }

    let mut line_start = 0;
    for _ in 1..line {
        match text[line_start..].find('\n') {
            Some(index) => line_start += index + 1,
            None => bail!("line {} is past the end of the document", line),
        }
    }
    let line_text = text[line_start..].split('\n').next().unwrap_or_default();
    let within = line_text
        .char_indices()
        .map(|(index, _)| index)
        .chain(std::iter::once(line_text.len()))
        .nth(column - 1)
        .with_context(|| format!("column {} is past the end of line {}", column, line))?;
    Ok(line_start + within)
}

fn diagnose_on_worker(
    engine: &HintEngine,
    paths: Vec<PathBuf>,
    options: DiagnoseOptions,
) -> Result<Vec<FileReport>> {
    let worker = engine.spawn_worker()?;
    let mut request = engine.request(paths);
    request.scan_dependents = options.scan_dependents;
    worker.submit(request)?;

    let mut store = FindingsStore::new();
    if worker
        .pump(engine.file_query(), &mut store, Duration::from_secs(120))?
        .is_none()
    {
        bail!("diagnostic worker timed out");
    }
    worker.shutdown()?;
    Ok(store
        .iter()
        .map(|(path, findings)| FileReport {
            path: path.to_path_buf(),
            findings: findings.to_vec(),
        })
        .collect())
}

fn print_reports(root: &Path, reports: &[FileReport], format: OutputFormat) -> Result<bool> {
    let errors: usize = reports.iter().map(FileReport::error_count).sum();
    match format {
        OutputFormat::Json => {
            let findings: Vec<&FileReport> = reports.iter().filter(|r| !r.is_clean()).collect();
            println!("{}", serde_json::to_string_pretty(&findings)?);
        }
        OutputFormat::Plain => {
            for report in reports {
                let shown = report.path.strip_prefix(root).unwrap_or(&report.path);
                for finding in &report.findings {
                    println!(
                        "{}:{}:{}: {}: {}{}",
                        shown.display(),
                        finding.range.start.line + 1,
                        finding.range.start.character + 1,
                        finding.severity.as_str(),
                        finding.message,
                        finding
                            .code
                            .as_deref()
                            .map(|c| format!(" [{}]", c))
                            .unwrap_or_default()
                    );
                }
            }
            let warnings: usize = reports.iter().map(FileReport::warning_count).sum();
            let hints: usize = reports.iter().map(|r| r.count(Severity::Hint)).sum();
            eprintln!(
                "{} files with findings: {} errors, {} warnings, {} hints",
                reports.iter().filter(|r| !r.is_clean()).count(),
                errors,
                warnings,
                hints
            );
        }
    }
    Ok(errors == 0)
}
