//! Analysis driver: route the input to an extractor and collect diagnostics.
//!
//! An input naming an existing regular file is Python source (structural scan,
//! lexical fallback on parse failure, never both). Anything else is a single
//! command line.

use std::path::Path;

use tracing::{debug, info};

use crate::error::{Result, WincleanError};
use crate::extract::{extract_command, extract_lines, extract_structural};
use crate::rules::evaluate_all;
use crate::types::{Diagnostic, InputSource, Strategy, ValidationContext};

/// Outcome of one static run, diagnostics in discovery order.
#[derive(Clone, Debug)]
pub struct Analysis {
    pub input: String,
    pub source: InputSource,
    pub strategy: Strategy,
    pub diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Analyze `input` as a script path if it names a file, else as a command.
pub fn analyze(input: &str, ctx: &ValidationContext) -> Result<Analysis> {
    if Path::new(input).is_file() {
        analyze_source_file(Path::new(input), ctx)
    } else {
        Ok(analyze_command(input, ctx))
    }
}

/// Analyze a Python file. A missing file is an error, not a command.
pub fn analyze_source_file(path: &Path, ctx: &ValidationContext) -> Result<Analysis> {
    if path.is_dir() {
        return Err(WincleanError::NotAFile(path.to_path_buf()));
    }
    if !path.exists() {
        return Err(WincleanError::InputNotFound(path.to_path_buf()));
    }
    let code = std::fs::read_to_string(path).map_err(|source| WincleanError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    info!("analyzing {} as python source", path.display());
    let (strategy, diagnostics) = analyze_source(&code, ctx);
    Ok(Analysis {
        input: path.display().to_string(),
        source: InputSource::File,
        strategy,
        diagnostics,
    })
}

/// Analyze source text already in memory.
pub fn analyze_source(code: &str, ctx: &ValidationContext) -> (Strategy, Vec<Diagnostic>) {
    match extract_structural(code) {
        Ok(candidates) => (Strategy::Structural, evaluate_all(&candidates, ctx)),
        Err(failure) => {
            debug!("structural parse failed ({failure}), falling back to lexical scan");
            let candidates = extract_lines(code);
            (Strategy::Lexical, evaluate_all(&candidates, ctx))
        }
    }
}

/// Analyze a single command line such as `cd C:\Users`.
pub fn analyze_command(cmd: &str, ctx: &ValidationContext) -> Analysis {
    let candidate = extract_command(cmd);
    debug!("command path candidate: {:?}", candidate.raw);
    Analysis {
        input: cmd.to_string(),
        source: InputSource::Command,
        strategy: Strategy::Command,
        diagnostics: evaluate_all(std::slice::from_ref(&candidate), ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Origin, RuleKind};
    use tempfile::TempDir;

    fn messages(diags: &[Diagnostic]) -> Vec<String> {
        diags.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn command_input_is_evaluated_once() {
        let ctx = ValidationContext::new(None);
        let analysis = analyze(r"cd \\server\share", &ctx).expect("analysis");
        assert_eq!(analysis.source, InputSource::Command);
        assert_eq!(analysis.strategy, Strategy::Command);
        assert_eq!(
            messages(&analysis.diagnostics),
            vec![r"UNC path '\\server\share' cannot be used as a current directory in Windows CMD"]
        );
    }

    #[test]
    fn empty_command_misses_drive_letter() {
        let ctx = ValidationContext::new(None);
        let analysis = analyze_command("", &ctx);
        assert_eq!(
            messages(&analysis.diagnostics),
            vec!["Path '' is missing a drive letter"]
        );
    }

    #[test]
    fn command_relative_to_declared_root() {
        let tmp = TempDir::new().expect("temp dir");
        std::fs::create_dir(tmp.path().join("logs")).expect("mkdir");
        let root = tmp.path().to_string_lossy().to_string();
        let ctx = ValidationContext::new(Some(root.as_str()));

        assert!(analyze_command("cd logs", &ctx).is_clean());
        let analysis = analyze_command("cd missing", &ctx);
        assert_eq!(analysis.diagnostics[0].rule, RuleKind::MissingFolder);
    }

    #[test]
    fn source_file_uses_structural_scan() {
        let tmp = TempDir::new().expect("temp dir");
        let script = tmp.path().join("scan.py");
        std::fs::write(
            &script,
            "import os\nfrom pathlib import Path\nos.listdir(\"\\\\\\\\server\\\\share\")\nPath(\"C:\\\\Temp\\\\CON\").iterdir()\nlabel = 'not-a-path'\n",
        )
        .expect("write script");
        let ctx = ValidationContext::new(None);

        let analysis = analyze(&script.to_string_lossy(), &ctx).expect("analysis");
        assert_eq!(analysis.source, InputSource::File);
        assert_eq!(analysis.strategy, Strategy::Structural);
        assert_eq!(
            messages(&analysis.diagnostics),
            vec![
                r"Line 3: UNC path '\\server\share' cannot be used as a current directory in Windows CMD",
                r"Line 4: Path 'C:\Temp\CON' uses reserved Windows device name 'CON'",
            ]
        );
    }

    #[test]
    fn malformed_source_falls_back_to_lexical() {
        let tmp = TempDir::new().expect("temp dir");
        let script = tmp.path().join("broken.py");
        std::fs::write(
            &script,
            "import os\n\ndef broken(:\n    os.listdir(\"\\\\\\\\srv\\\\x\")\n    os.listdir('a|b')\n",
        )
        .expect("write script");
        let ctx = ValidationContext::new(None);

        let analysis = analyze_source_file(&script, &ctx).expect("analysis");
        assert_eq!(analysis.strategy, Strategy::Lexical);
        let diags = &analysis.diagnostics;
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].origin, Origin::SourceLine(4));
        assert_eq!(diags[0].rule, RuleKind::UncWorkingDirectory);
        assert_eq!(
            diags[1].to_string(),
            "Line 5: Path 'a|b' contains illegal Windows characters"
        );
    }

    #[test]
    fn unicode_escape_in_source_triggers_fallback() {
        let ctx = ValidationContext::new(None);
        let code = "import os\nos.listdir(\"C:\\Users\\me\")\n";

        let (strategy, diags) = analyze_source(code, &ctx);
        assert_eq!(strategy, Strategy::Lexical);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].origin, Origin::SourceLine(2));
        assert_eq!(diags[0].rule, RuleKind::MissingFolder);
    }

    #[test]
    fn stray_indent_takes_lexical_path() {
        let ctx = ValidationContext::new(None);
        let code = "import os\n  target = \"\\\\\\\\server\\\\share\"\nos.listdir(target)\n";

        let (strategy, diags) = analyze_source(code, &ctx);
        assert_eq!(strategy, Strategy::Lexical);
        assert_eq!(
            messages(&diags),
            vec![r"Line 2: UNC path '\\\\server\\share' cannot be used as a current directory in Windows CMD"]
        );
    }

    #[test]
    fn python2_source_takes_lexical_path() {
        let ctx = ValidationContext::new(None);
        let code = "import os\n\ntry:\n    os.listdir(CONFIG)\n    os.listdir('a|b')\nexcept OSError, e:\n    pass\n";

        let (strategy, diags) = analyze_source(code, &ctx);
        assert_eq!(strategy, Strategy::Lexical);
        assert_eq!(
            messages(&diags),
            vec!["Line 5: Path 'a|b' contains illegal Windows characters"]
        );
    }

    #[test]
    fn clean_source_has_no_diagnostics() {
        let tmp = TempDir::new().expect("temp dir");
        let root = tmp.path().to_string_lossy().to_string();
        let ctx = ValidationContext::new(None);
        let code = format!("import os\nos.listdir({root:?})\nprint('hello')\n");

        let (strategy, diags) = analyze_source(&code, &ctx);
        assert_eq!(strategy, Strategy::Structural);
        assert!(diags.is_empty());
    }

    #[test]
    fn missing_script_is_an_error() {
        let tmp = TempDir::new().expect("temp dir");
        let ctx = ValidationContext::new(None);
        let err = analyze_source_file(&tmp.path().join("nope.py"), &ctx).expect_err("missing");
        assert!(matches!(err, WincleanError::InputNotFound(_)));

        let err = analyze_source_file(tmp.path(), &ctx).expect_err("directory");
        assert!(matches!(err, WincleanError::NotAFile(_)));
    }

    #[test]
    fn missing_path_without_file_is_treated_as_command() {
        let ctx = ValidationContext::new(None);
        let analysis = analyze("no_such_script.py", &ctx).expect("analysis");
        assert_eq!(analysis.source, InputSource::Command);
        assert_eq!(analysis.diagnostics[0].rule, RuleKind::MissingDriveLetter);
    }
}
