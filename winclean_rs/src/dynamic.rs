//! Dynamic analysis: run a script inside an isolated virtual environment and
//! classify the filesystem errors it raises.
//!
//! User code only ever runs in a child interpreter. The flow:
//! 1. create the venv if it is missing,
//! 2. locate its interpreter,
//! 3. run the script and capture output,
//! 4. on a non-zero exit, rerun it under a wrapper that prints the error
//!    category,
//! 5. if the wrapper reports a `unicodeescape` syntax error, scan the script's
//!    string literals for path problems instead.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Result, WincleanError};
use crate::extract::extract_lines;
use crate::rules::evaluate_all;
use crate::types::{Diagnostic, ValidationContext};

#[derive(Clone, Debug)]
pub struct DynamicOptions {
    pub script: PathBuf,
    pub venv: PathBuf,
    /// Interpreter that creates the venv.
    pub python: String,
    pub timeout: Duration,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VenvStatus {
    Created,
    Existing,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuntimeKind {
    FileNotFound,
    NotADirectory,
    Permission,
    Os,
    Value,
    /// Any other exception, by type name.
    Other(String),
}

impl RuntimeKind {
    /// Python exception type name.
    pub fn name(&self) -> &str {
        match self {
            RuntimeKind::FileNotFound => "FileNotFoundError",
            RuntimeKind::NotADirectory => "NotADirectoryError",
            RuntimeKind::Permission => "PermissionError",
            RuntimeKind::Os => "OSError",
            RuntimeKind::Value => "ValueError",
            RuntimeKind::Other(name) => name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeFinding {
    pub kind: RuntimeKind,
    pub message: String,
}

impl RuntimeFinding {
    fn is_unicode_escape(&self) -> bool {
        self.kind == RuntimeKind::Other("SyntaxError".to_string())
            && self.message.contains("unicodeescape")
    }
}

#[derive(Clone, Debug)]
pub enum DynamicOutcome {
    /// The script exited with status 0.
    Clean(ProcessOutput),
    Failed {
        run: ProcessOutput,
        findings: Vec<RuntimeFinding>,
        /// Path diagnostics from the literal scan, when the script could not compile.
        fallback: Option<Vec<Diagnostic>>,
    },
}

#[derive(Clone, Debug)]
pub struct DynamicReport {
    pub venv: VenvStatus,
    pub interpreter: PathBuf,
    pub outcome: DynamicOutcome,
}

pub async fn run_dynamic(opts: &DynamicOptions, ctx: &ValidationContext) -> Result<DynamicReport> {
    if opts.script.is_dir() {
        return Err(WincleanError::NotAFile(opts.script.clone()));
    }
    if !opts.script.exists() {
        return Err(WincleanError::InputNotFound(opts.script.clone()));
    }

    let venv = ensure_venv(opts).await?;
    let interpreter = interpreter_path(&opts.venv);
    if !interpreter.exists() {
        return Err(WincleanError::InterpreterMissing(interpreter));
    }

    let script = opts.script.to_string_lossy().to_string();
    info!("running {} with {}", script, interpreter.display());
    let run = run_captured(&interpreter, &[script.as_str()], opts.timeout).await?;
    if run.success() {
        return Ok(DynamicReport {
            venv,
            interpreter,
            outcome: DynamicOutcome::Clean(run),
        });
    }

    debug!("script exited with {:?}, rerunning under wrapper", run.code);
    let wrapper = wrapper_program(&opts.script);
    let wrapped = run_captured(&interpreter, &["-c", wrapper.as_str()], opts.timeout).await?;
    let findings = parse_findings(&wrapped.stdout);

    let fallback = if findings.iter().any(RuntimeFinding::is_unicode_escape) {
        let code = std::fs::read_to_string(&opts.script).map_err(|source| WincleanError::Read {
            path: opts.script.clone(),
            source,
        })?;
        Some(evaluate_all(&extract_lines(&code), ctx))
    } else {
        None
    };

    Ok(DynamicReport {
        venv,
        interpreter,
        outcome: DynamicOutcome::Failed {
            run,
            findings,
            fallback,
        },
    })
}

async fn ensure_venv(opts: &DynamicOptions) -> Result<VenvStatus> {
    if opts.venv.exists() {
        return Ok(VenvStatus::Existing);
    }
    info!("creating virtual environment at {}", opts.venv.display());
    let venv = opts.venv.to_string_lossy().to_string();
    let out = run_captured(
        Path::new(&opts.python),
        &["-m", "venv", venv.as_str()],
        opts.timeout,
    )
    .await?;
    if !out.success() {
        return Err(WincleanError::Venv(out.stderr.trim().to_string()));
    }
    Ok(VenvStatus::Created)
}

/// Interpreter inside a venv: `Scripts\python.exe` on Windows, `bin/python` elsewhere.
pub fn interpreter_path(venv: &Path) -> PathBuf {
    if cfg!(windows) {
        venv.join("Scripts").join("python.exe")
    } else {
        venv.join("bin").join("python")
    }
}

const WRAPPER_TEMPLATE: &str = r#"import sys
sys.path.insert(0, __SCRIPT_DIR__)
try:
    with open(__SCRIPT__, "r", encoding="utf-8") as f:
        code = f.read()
    exec(compile(code, __SCRIPT__, "exec"), {"__name__": "__main__", "__file__": __SCRIPT__})
except FileNotFoundError as e:
    print(f"FileNotFoundError: {e}")
except NotADirectoryError as e:
    print(f"NotADirectoryError: {e}")
except PermissionError as e:
    print(f"PermissionError: {e}")
except OSError as e:
    print(f"OSError: {e}")
except ValueError as e:
    print(f"ValueError: {e}")
except Exception as e:
    print(f"Exception: {type(e).__name__}: {e}")
"#;

/// Python program that executes `script` and prints one classified line for
/// the exception it raises.
pub fn wrapper_program(script: &Path) -> String {
    let dir = script.parent().unwrap_or_else(|| Path::new(""));
    WRAPPER_TEMPLATE
        .replace("__SCRIPT_DIR__", &python_literal(&dir.to_string_lossy()))
        .replace("__SCRIPT__", &python_literal(&script.to_string_lossy()))
}

/// A JSON string is also a valid Python string literal.
fn python_literal(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// Parse wrapper output. Lines the wrapper did not produce (the script's own
/// prints) are skipped.
pub fn parse_findings(stdout: &str) -> Vec<RuntimeFinding> {
    stdout
        .lines()
        .filter_map(|line| {
            let (label, message) = line.trim().split_once(": ")?;
            let kind = match label {
                "FileNotFoundError" => RuntimeKind::FileNotFound,
                "NotADirectoryError" => RuntimeKind::NotADirectory,
                "PermissionError" => RuntimeKind::Permission,
                "OSError" => RuntimeKind::Os,
                "ValueError" => RuntimeKind::Value,
                "Exception" => {
                    let (type_name, message) =
                        message.split_once(": ").unwrap_or((message, ""));
                    return Some(RuntimeFinding {
                        kind: RuntimeKind::Other(type_name.to_string()),
                        message: message.to_string(),
                    });
                }
                _ => return None,
            };
            Some(RuntimeFinding {
                kind,
                message: message.to_string(),
            })
        })
        .collect()
}

async fn run_captured(program: &Path, args: &[&str], timeout: Duration) -> Result<ProcessOutput> {
    debug!("exec {} {:?}", program.display(), args);
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output();

    let output = tokio::time::timeout(timeout, child)
        .await
        .map_err(|_| WincleanError::Timeout {
            seconds: timeout.as_secs(),
        })?
        .map_err(|source| WincleanError::Launch {
            program: program.display().to_string(),
            source,
        })?;

    Ok(ProcessOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        code: output.status.code(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn interpreter_layout() {
        let path = interpreter_path(Path::new("env"));
        if cfg!(windows) {
            assert!(path.ends_with("Scripts/python.exe"));
        } else {
            assert_eq!(path, PathBuf::from("env/bin/python"));
        }
    }

    #[test]
    fn wrapper_embeds_escaped_script_path() {
        let program = wrapper_program(Path::new("/work/dir/my \"odd\" script.py"));
        assert!(program.contains(r#"sys.path.insert(0, "/work/dir")"#));
        assert!(program.contains(r#"open("/work/dir/my \"odd\" script.py", "r""#));
        assert!(!program.contains("__SCRIPT"));
    }

    #[test]
    fn wrapper_escapes_backslashes() {
        let program = wrapper_program(Path::new(r"C:\scripts\run.py"));
        assert!(program.contains(r#""C:\\scripts\\run.py""#));
    }

    #[test]
    fn findings_are_classified() {
        let stdout = "hello from the script\n\
FileNotFoundError: [Errno 2] No such file or directory: 'C:\\\\nope'\n\
NotADirectoryError: [Errno 20] Not a directory: 'f.txt'\n\
PermissionError: [Errno 13] Permission denied: '/root'\n\
OSError: [Errno 22] Invalid argument: 'a|b'\n\
ValueError: embedded null byte\n\
Exception: KeyError: 'HOME'\n";
        let findings = parse_findings(stdout);
        let kinds: Vec<RuntimeKind> = findings.iter().map(|f| f.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                RuntimeKind::FileNotFound,
                RuntimeKind::NotADirectory,
                RuntimeKind::Permission,
                RuntimeKind::Os,
                RuntimeKind::Value,
                RuntimeKind::Other("KeyError".to_string()),
            ]
        );
        assert_eq!(findings[4].message, "embedded null byte");
        assert_eq!(findings[5].message, "'HOME'");
    }

    #[test]
    fn unicode_escape_syntax_error_is_recognised() {
        let findings = parse_findings(
            "Exception: SyntaxError: (unicode error) 'unicodeescape' codec can't decode bytes\n",
        );
        assert_eq!(findings.len(), 1);
        assert!(findings[0].is_unicode_escape());
    }

    #[tokio::test]
    async fn missing_script_is_rejected_before_any_process() {
        let tmp = TempDir::new().expect("temp dir");
        let opts = DynamicOptions {
            script: tmp.path().join("absent.py"),
            venv: tmp.path().join("venv"),
            python: "python3".to_string(),
            timeout: Duration::from_secs(1),
        };
        let err = run_dynamic(&opts, &ValidationContext::new(None))
            .await
            .expect_err("missing script");
        assert!(matches!(err, WincleanError::InputNotFound(_)));
        assert!(!tmp.path().join("venv").exists());
    }

    #[tokio::test]
    async fn existing_venv_without_interpreter_is_reported() {
        let tmp = TempDir::new().expect("temp dir");
        let script = tmp.path().join("job.py");
        std::fs::write(&script, "print('hi')\n").expect("write script");
        let venv = tmp.path().join("venv");
        std::fs::create_dir(&venv).expect("mkdir venv");

        let opts = DynamicOptions {
            script,
            venv,
            python: "python3".to_string(),
            timeout: Duration::from_secs(1),
        };
        let err = run_dynamic(&opts, &ValidationContext::new(None))
            .await
            .expect_err("no interpreter");
        assert!(matches!(err, WincleanError::InterpreterMissing(_)));
    }
}
