use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tabled::{settings::Style, Table, Tabled};

use myflow::analysis::{AnalysisReport, ContributionRow, FlowAnalyzer};
use myflow::config::AnalysisConfig;
use myflow::error::{ErrorSeverity, MyFlowError};
use myflow::export::{self, json, ExportFormat};
use myflow::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use myflow::pacing::PacingState;

/// MyFlow - Symptom and Load Analysis CLI
///
/// Reads a JSON export of daily wellness logs and reports pacing
/// guidance, sleep correlation and the protective factors that work best.
#[derive(Parser)]
#[command(name = "myflow")]
#[command(version)]
#[command(about = "Daily load, sleep and symptom analysis", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format (pretty, json, compact)
    #[arg(long, default_value = "pretty", global = true)]
    log_format: LogFormat,

    /// Also write JSON logs to this file, rolled daily
    #[arg(long, value_name = "FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis and print the JSON report
    Analyze {
        /// Daily log files (JSON arrays); several files are analyzed in parallel
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Write the report here; a directory when several files are given
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show today's pacing verdict
    Pacing {
        file: PathBuf,
    },

    /// Show the sleep and symptom correlation
    Sleep {
        file: PathBuf,
    },

    /// Rank protective factors
    Factors {
        file: PathBuf,
    },

    /// Display the daily contribution table in the terminal
    Table {
        file: PathBuf,

        /// Number of most recent days to show
        #[arg(short, long, default_value = "14")]
        limit: usize,
    },

    /// Write a report file
    Report {
        file: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Report format (html, json, csv, text); defaults to the output extension
        #[arg(short = 'f', long)]
        format: Option<ExportFormat>,
    },

    /// Show or initialize the configuration
    Config {
        /// Print the effective configuration
        #[arg(short, long)]
        list: bool,

        /// Write the default configuration to the config path
        #[arg(short, long)]
        init: bool,
    },
}

#[derive(Tabled)]
struct TableRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Tics")]
    tics: u32,
    #[tabled(rename = "TNL")]
    tnl: String,
    #[tabled(rename = "Stress")]
    stress: String,
    #[tabled(rename = "Study")]
    study: String,
    #[tabled(rename = "Worse")]
    aggravating: String,
    #[tabled(rename = "Helping")]
    protective: String,
    #[tabled(rename = "Sleep penalty")]
    sleep_penalty: String,
}

impl From<&ContributionRow> for TableRow {
    fn from(row: &ContributionRow) -> Self {
        TableRow {
            date: row.date.format("%a %b %d").to_string(),
            tics: row.tic_count,
            tnl: format!("{:.1}", row.tnl),
            stress: format!("{:.1}", row.stress),
            study: format!("{:.1}", row.study),
            aggravating: format!("{:.1}", row.positive_custom),
            protective: format!("{:.1}", row.negative_custom),
            sleep_penalty: format!("{:.1}", row.sleep_penalty),
        }
    }
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    init_logging(&LogConfig {
        level: LogLevel::from_verbosity(cli.verbose),
        format: cli.log_format,
        file_path: cli.log_file.clone(),
        include_spans: cli.verbose > 2,
    })?;

    // Initializing must not require the target file to exist yet
    if let Commands::Config { list, init: true } = &cli.command {
        return init_config(cli.config.as_deref(), *list);
    }

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze { files, output } => run_analyze(config, &files, output.as_deref()),
        Commands::Pacing { file } => {
            let report = analyze_one(config, &file)?;
            print_pacing_banner(report.pacing.state);
            println!("{}", json::render(&report.pacing)?);
            Ok(())
        }
        Commands::Sleep { file } => {
            let report = analyze_one(config, &file)?;
            println!("{}", json::render(&report.sleep)?);
            Ok(())
        }
        Commands::Factors { file } => {
            let report = analyze_one(config, &file)?;
            println!("{}", json::render(&report.protective_factors)?);
            Ok(())
        }
        Commands::Table { file, limit } => {
            let report = analyze_one(config, &file)?;
            print_table(&report, limit);
            Ok(())
        }
        Commands::Report {
            file,
            output,
            format,
        } => {
            let format = format
                .or_else(|| ExportFormat::from_path(&output))
                .unwrap_or(ExportFormat::Html);
            let report = analyze_one(config, &file)?;
            export::export_report(&report, format, &output)
                .with_context(|| format!("Failed to write report to {}", output.display()))?;
            eprintln!(
                "{} {}",
                "✓ Report written:".green().bold(),
                output.display()
            );
            Ok(())
        }
        Commands::Config { .. } => {
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

/// Print a failure once, labelled by how serious it is
fn report_error(err: &anyhow::Error) {
    tracing::debug!(error = ?err, "Command failed");

    match err.downcast_ref::<MyFlowError>() {
        Some(e) => {
            let severity = e.severity();
            let label = match severity {
                ErrorSeverity::Error => "Error:".red().bold(),
                ErrorSeverity::Warning => "Warning:".yellow().bold(),
                ErrorSeverity::Info => "Note:".cyan().bold(),
            };
            tracing::debug!(level = %severity.to_tracing_level(), "Classified failure");
            eprintln!("{} {}", label, e.user_message());
        }
        None => eprintln!("{} {:#}", "Error:".red().bold(), err),
    }
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(AnalysisConfig::load_or_default()),
    }
}

fn analyze_one(config: AnalysisConfig, file: &Path) -> Result<AnalysisReport> {
    let analyzer = FlowAnalyzer::try_from(config)?;
    analyzer
        .analyze_file(file)
        .with_context(|| format!("Failed to analyze {}", file.display()))
}

fn run_analyze(config: AnalysisConfig, files: &[PathBuf], output: Option<&Path>) -> Result<()> {
    let analyzer = FlowAnalyzer::try_from(config)?;

    if let [file] = files {
        let report = analyzer
            .analyze_file(file)
            .with_context(|| format!("Failed to analyze {}", file.display()))?;
        return match output {
            Some(path) => {
                export::export_report(&report, ExportFormat::Json, path)?;
                eprintln!("{} {}", "✓ Report written:".green().bold(), path.display());
                Ok(())
            }
            None => {
                println!("{}", json::render_report(&report)?);
                Ok(())
            }
        };
    }

    if let Some(dir) = output {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    let mut failures = 0;
    for result in analyzer.analyze_files(files) {
        match result.outcome {
            Ok(report) => {
                let stem = result
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("report");
                match output {
                    Some(dir) => {
                        let path = dir.join(format!("{}.json", stem));
                        export::export_report(&report, ExportFormat::Json, &path)?;
                        eprintln!(
                            "{} {} → {} ({} ms)",
                            "✓".green(),
                            result.path.display(),
                            path.display(),
                            result.duration_ms
                        );
                    }
                    None => println!("{}", json::render_report(&report)?),
                }
            }
            Err(e) => {
                failures += 1;
                eprintln!("{} {}: {}", "✗".red(), result.path.display(), e.user_message());
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} files failed to analyze", failures, files.len());
    }
    Ok(())
}

fn print_pacing_banner(state: PacingState) {
    let label = state.label();
    let banner = match state {
        PacingState::GreenLight => label.green().bold(),
        PacingState::UnusualSpike => label.yellow().bold(),
        PacingState::HighLoadWarning => label.truecolor(255, 152, 0).bold(),
        PacingState::AdaptivePacingAlert => label.red().bold(),
        PacingState::InsufficientData => label.dimmed(),
    };
    eprintln!("{}", banner);
}

fn print_table(report: &AnalysisReport, limit: usize) {
    let start = report.contributions.len().saturating_sub(limit);
    let rows: Vec<TableRow> = report.contributions[start..]
        .iter()
        .map(TableRow::from)
        .collect();

    if rows.is_empty() {
        println!("{}", "No days logged yet.".yellow());
        return;
    }

    println!(
        "{}",
        format!("Daily contributions (last {} days)", rows.len())
            .cyan()
            .bold()
    );
    println!("{}", Table::new(rows).with(Style::rounded()));

    print_pacing_banner(report.pacing.state);
    let message = export::strip_emphasis(&report.pacing.message);
    if report.pacing.state.needs_attention() {
        println!("{}", message.bold());
    } else {
        println!("{}", message);
    }
    if report.vulnerability.is_vulnerable {
        println!("{}", "Sleep deficit is counted in your load.".yellow());
    }
}

fn init_config(path: Option<&Path>, list: bool) -> Result<()> {
    let target = path
        .map(Path::to_path_buf)
        .unwrap_or_else(AnalysisConfig::default_config_path);
    let config = AnalysisConfig::init_file(&target)?;
    println!("{} {}", "✓ Config written:".green().bold(), target.display());

    if list {
        println!("{}", toml::to_string_pretty(&config)?);
    }
    Ok(())
}
