//! Rendering of analysis results.

use std::path::Path;

use serde::Serialize;

use crate::colors::Painter;
use crate::driver::Analysis;
use crate::dynamic::{DynamicOptions, DynamicOutcome, DynamicReport, ProcessOutput, VenvStatus};
use crate::types::{Diagnostic, InputSource, RuleKind, Strategy};

/// Human report. Issues are listed in discovery order; a clean run is a
/// single "no issues" line whose wording depends on the input kind.
pub fn render_human(analysis: &Analysis, painter: &Painter) -> String {
    if analysis.is_clean() {
        let line = match analysis.source {
            InputSource::File => "No folder path issues detected.",
            InputSource::Command => "No path issues detected.",
        };
        return format!("{}\n", painter.ok(line));
    }

    let mut out = format!("\n{}\n", painter.header("Issues found:"));
    for diag in &analysis.diagnostics {
        out.push_str(" - ");
        out.push_str(&painter.rule(diag.rule, &diag.to_string()));
        out.push('\n');
    }
    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    input: &'a str,
    source: InputSource,
    strategy: Strategy,
    root: Option<&'a str>,
    diagnostics: Vec<JsonDiagnostic<'a>>,
}

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    line: Option<usize>,
    rule: RuleKind,
    path: &'a str,
    message: String,
}

fn json_diagnostics(diagnostics: &[Diagnostic]) -> Vec<JsonDiagnostic<'_>> {
    diagnostics
        .iter()
        .map(|d| JsonDiagnostic {
            line: d.origin.line(),
            rule: d.rule,
            path: &d.path,
            message: d.to_string(),
        })
        .collect()
}

pub fn render_json(analysis: &Analysis, root: Option<&str>) -> serde_json::Result<String> {
    let report = JsonReport {
        input: &analysis.input,
        source: analysis.source,
        strategy: analysis.strategy,
        root,
        diagnostics: json_diagnostics(&analysis.diagnostics),
    };
    serde_json::to_string_pretty(&report)
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum RunStatus {
    Clean,
    Failed,
}

#[derive(Serialize)]
struct JsonDynamicReport<'a> {
    script: &'a Path,
    venv: &'a Path,
    venv_status: VenvStatus,
    interpreter: &'a Path,
    root: Option<&'a str>,
    status: RunStatus,
    exit_code: Option<i32>,
    stdout: &'a str,
    stderr: &'a str,
    runtime_errors: Vec<JsonRuntimeError<'a>>,
    /// Literal-scan diagnostics; present only when the script did not compile.
    fallback: Option<Vec<JsonDiagnostic<'a>>>,
}

#[derive(Serialize)]
struct JsonRuntimeError<'a> {
    kind: &'a str,
    message: &'a str,
}

pub fn render_dynamic_json(
    report: &DynamicReport,
    opts: &DynamicOptions,
    root: Option<&str>,
) -> serde_json::Result<String> {
    let (status, run, findings, fallback): (_, &ProcessOutput, _, _) = match &report.outcome {
        DynamicOutcome::Clean(run) => (RunStatus::Clean, run, Vec::new(), None),
        DynamicOutcome::Failed {
            run,
            findings,
            fallback,
        } => (
            RunStatus::Failed,
            run,
            findings
                .iter()
                .map(|f| JsonRuntimeError {
                    kind: f.kind.name(),
                    message: &f.message,
                })
                .collect(),
            fallback.as_deref().map(json_diagnostics),
        ),
    };
    let json = JsonDynamicReport {
        script: &opts.script,
        venv: &opts.venv,
        venv_status: report.venv,
        interpreter: &report.interpreter,
        root,
        status,
        exit_code: run.code,
        stdout: &run.stdout,
        stderr: &run.stderr,
        runtime_errors: findings,
        fallback,
    };
    serde_json::to_string_pretty(&json)
}
