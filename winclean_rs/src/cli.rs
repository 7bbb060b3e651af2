//! Command-line front end: argument parsing, config merge, dispatch.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::debug;

use crate::colors::Painter;
use crate::config::WincleanConfig;
use crate::driver::{self, Analysis};
use crate::dynamic::{DynamicOptions, DynamicOutcome, DynamicReport, RuntimeKind, VenvStatus};
use crate::output::{render_dynamic_json, render_human, render_json};
use crate::types::{ColorMode, Mode, OutputMode, ValidationContext};

#[derive(Parser, Debug)]
#[command(name = "winclean")]
#[command(about = "Find paths that will break on Windows, in a Python script or a cd-style command")]
#[command(version)]
pub struct Cli {
    /// Python script OR a path command (e.g. "cd C:\Users")
    #[arg(conflicts_with_all = ["script_path", "path_command"])]
    pub input: Option<String>,

    /// Python script to analyze (a missing file is an error)
    #[arg(long, conflicts_with = "path_command")]
    pub script_path: Option<PathBuf>,

    /// Command whose path argument is validated
    #[arg(long, allow_hyphen_values = true)]
    pub path_command: Option<String>,

    #[arg(long, value_enum, default_value_t = Mode::Static)]
    pub mode: Mode,

    /// Filesystem root for resolving relative paths
    #[arg(long)]
    pub root: Option<String>,

    /// Virtual environment path (dynamic mode)
    #[arg(long)]
    pub venv: Option<PathBuf>,

    /// Machine-readable output
    #[arg(long)]
    pub json: bool,

    #[arg(long, value_enum)]
    pub color: Option<ColorMode>,

    /// Exit with status 1 when issues are found
    #[arg(long)]
    pub fail_on_issues: bool,

    /// Config file (default: .winclean/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Shorthand for --log-level debug
    #[arg(short, long)]
    pub verbose: bool,
}

enum Target {
    Auto(String),
    Script(PathBuf),
    Command(String),
}

impl Cli {
    fn target(&self) -> Result<Target> {
        if let Some(path) = &self.script_path {
            return Ok(Target::Script(path.clone()));
        }
        if let Some(cmd) = &self.path_command {
            return Ok(Target::Command(cmd.clone()));
        }
        match &self.input {
            Some(input) => Ok(Target::Auto(input.clone())),
            None => bail!("an INPUT, --script-path or --path-command is required"),
        }
    }

    fn load_config(&self) -> Result<WincleanConfig> {
        match &self.config {
            Some(path) => Ok(WincleanConfig::load_explicit(path)?),
            None => {
                let cwd = std::env::current_dir().context("cannot read working directory")?;
                Ok(WincleanConfig::load(&cwd))
            }
        }
    }
}

/// Logs go to stderr; stdout is reserved for the report.
pub fn init_logging(cli: &Cli) {
    let level = if cli.verbose { "debug" } else { cli.log_level.as_str() };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("WINCLEAN_LOG")
                .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| level.parse().unwrap_or_default()),
        )
        .init();
}

pub fn run(cli: &Cli) -> Result<ExitCode> {
    let config = cli.load_config()?;
    let target = cli.target()?;
    let root = cli.root.clone().or_else(|| config.root.clone());
    let ctx = ValidationContext::new(root.as_deref());
    let painter = Painter::new(cli.color.or(config.color).unwrap_or_default());
    let output = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };
    debug!(?root, mode = ?cli.mode, "starting");

    let found_issues = match cli.mode {
        Mode::Static => {
            if output == OutputMode::Human {
                println!("Running static analysis...");
            }
            let analysis = match target {
                Target::Auto(input) => driver::analyze(&input, &ctx)?,
                Target::Script(path) => driver::analyze_source_file(&path, &ctx)?,
                Target::Command(cmd) => driver::analyze_command(&cmd, &ctx),
            };
            print_analysis(&analysis, output, &painter, ctx.declared_root())?;
            !analysis.is_clean()
        }
        Mode::Dynamic => {
            let script = match target {
                Target::Auto(input) | Target::Command(input) => PathBuf::from(input),
                Target::Script(path) => path,
            };
            let Some(venv) = cli.venv.clone().or_else(|| config.dynamic.venv.clone()) else {
                bail!("--venv required for dynamic mode");
            };
            let opts = DynamicOptions {
                script,
                venv,
                python: config.dynamic.python.clone(),
                timeout: Duration::from_secs(config.dynamic.timeout_secs),
            };
            if output == OutputMode::Human {
                println!("Running dynamic analysis...");
            }
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("failed to start async runtime")?;
            let report = runtime.block_on(crate::dynamic::run_dynamic(&opts, &ctx))?;
            match output {
                OutputMode::Human => print_dynamic(&report, &opts, &painter),
                OutputMode::Json => println!(
                    "{}",
                    render_dynamic_json(&report, &opts, ctx.declared_root())?
                ),
            }
            !matches!(report.outcome, DynamicOutcome::Clean(_))
        }
    };

    if found_issues && (cli.fail_on_issues || config.fail_on_issues) {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn print_analysis(
    analysis: &Analysis,
    output: OutputMode,
    painter: &Painter,
    root: Option<&str>,
) -> Result<()> {
    let text = match output {
        OutputMode::Human => render_human(analysis, painter),
        OutputMode::Json => format!("{}\n", render_json(analysis, root)?),
    };
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn print_dynamic(report: &DynamicReport, opts: &DynamicOptions, painter: &Painter) {
    let venv = painter.path(&opts.venv.display().to_string());
    match report.venv {
        VenvStatus::Created => println!("Successfully created virtual environment at {venv}"),
        VenvStatus::Existing => println!("Using existing virtual environment at {venv}"),
    }
    println!(
        "Running command: {} {}",
        report.interpreter.display(),
        opts.script.display()
    );

    match &report.outcome {
        DynamicOutcome::Clean(run) => {
            println!("STANDARD OUTPUT: {}", run.stdout);
            println!("STANDARD ERRORS: {}", run.stderr);
        }
        DynamicOutcome::Failed {
            run,
            findings,
            fallback,
        } => {
            match run.code {
                Some(code) => println!("Process failed with return code {code}"),
                None => println!("Process was terminated by a signal"),
            }
            println!("STANDARD OUTPUT: {}", run.stdout);
            println!("STANDARD ERRORS: {}", run.stderr);
            println!("Analyzing script in real-time...");

            if findings.is_empty() {
                println!("{}", painter.ok("No runtime errors detected."));
            } else {
                println!("{}", painter.header("Runtime errors found:"));
                for finding in findings {
                    let label = match &finding.kind {
                        RuntimeKind::Other(name) => format!("Exception: {name}"),
                        kind => kind.name().to_string(),
                    };
                    println!(" - {}", painter.error(&format!("{label}: {}", finding.message)));
                }
            }

            if let Some(diagnostics) = fallback {
                println!("Analyzing paths in file despite Unicode escape errors...");
                if diagnostics.is_empty() {
                    println!("No path issues detected despite syntax error.");
                } else {
                    println!("Path issues found in file:");
                    for diag in diagnostics {
                        println!(" - {}", painter.rule(diag.rule, &diag.to_string()));
                    }
                }
            }
        }
    }
}
