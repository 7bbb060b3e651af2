//! Structural extraction from Python source.
//!
//! Parses with tree-sitter and walks every call in document order, picking up
//! the two directory-enumeration shapes:
//!
//! - `<anything>.listdir("<literal>")`
//! - `Path("<literal>").iterdir()`
//!
//! Only compile-time string literals are extracted; names, f-strings and other
//! computed arguments cannot be validated statically and are skipped. A source
//! CPython 3 would refuse to compile is a [`ParseFailure`], even when
//! tree-sitter recovers a clean tree for it.

use std::fmt;

use tracing::debug;
use tree_sitter::{Node, Parser};

use super::compat;
use super::literal::{LiteralKind, parse_string_literal};
use crate::types::{Origin, PathCandidate};

/// The source could not be read as valid Python. Triggers the lexical fallback.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ParseFailure {
    pub line: Option<usize>,
    pub reason: String,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {line}: {}", self.reason),
            None => f.write_str(&self.reason),
        }
    }
}

impl std::error::Error for ParseFailure {}

/// The node kinds the walk cares about; everything else is `Other`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum NodeKind {
    Call,
    Attribute,
    Identifier,
    String,
    ConcatenatedString,
    Parenthesized,
    Comment,
    Other,
}

impl NodeKind {
    fn of(node: Node<'_>) -> Self {
        match node.kind() {
            "call" => NodeKind::Call,
            "attribute" => NodeKind::Attribute,
            "identifier" => NodeKind::Identifier,
            "string" => NodeKind::String,
            "concatenated_string" => NodeKind::ConcatenatedString,
            "parenthesized_expression" => NodeKind::Parenthesized,
            "comment" => NodeKind::Comment,
            _ => NodeKind::Other,
        }
    }
}

/// Extract directory-listing path literals from Python source.
pub fn extract_structural(source: &str) -> Result<Vec<PathCandidate>, ParseFailure> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| ParseFailure {
            line: None,
            reason: format!("python grammar unavailable: {e}"),
        })?;
    let tree = parser.parse(source, None).ok_or_else(|| ParseFailure {
        line: None,
        reason: "parser produced no tree".to_string(),
    })?;

    let root = tree.root_node();
    if root.has_error() {
        return Err(ParseFailure {
            line: first_error_line(root),
            reason: "invalid syntax".to_string(),
        });
    }
    compat::check(root, source)?;

    let mut candidates = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if NodeKind::of(node) == NodeKind::Call
            && let Some(raw) = match_call(node, source)?
            && !raw.is_empty()
        {
            candidates.push(PathCandidate::new(raw, Origin::SourceLine(line_of(node))));
        }
        for i in (0..node.child_count()).rev() {
            if let Some(child) = node.child(i) {
                stack.push(child);
            }
        }
    }

    debug!("structural scan found {} candidate(s)", candidates.len());
    Ok(candidates)
}

/// Returns the literal path argument when `call` has one of the two shapes.
fn match_call(call: Node<'_>, src: &str) -> Result<Option<String>, ParseFailure> {
    let Some(function) = call.child_by_field_name("function") else {
        return Ok(None);
    };
    if NodeKind::of(function) != NodeKind::Attribute {
        return Ok(None);
    }
    let member = function
        .child_by_field_name("attribute")
        .map(|n| node_text(n, src))
        .unwrap_or_default();

    let target = match member {
        "listdir" => Some(call),
        "iterdir" => function
            .child_by_field_name("object")
            .filter(|object| is_path_constructor(*object, src)),
        _ => None,
    };

    match target.and_then(first_positional) {
        Some(arg) => literal_value(arg, src),
        None => Ok(None),
    }
}

fn is_path_constructor(node: Node<'_>, src: &str) -> bool {
    NodeKind::of(node) == NodeKind::Call
        && node.child_by_field_name("function").is_some_and(|f| {
            NodeKind::of(f) == NodeKind::Identifier && node_text(f, src) == "Path"
        })
}

fn first_positional(call: Node<'_>) -> Option<Node<'_>> {
    let args = call.child_by_field_name("arguments")?;
    if args.kind() != "argument_list" {
        return None;
    }
    (0..args.named_child_count())
        .filter_map(|i| args.named_child(i))
        .find(|arg| NodeKind::of(*arg) != NodeKind::Comment)
}

/// Value of a plain `str` literal, `None` for anything computed.
fn literal_value(node: Node<'_>, src: &str) -> Result<Option<String>, ParseFailure> {
    match NodeKind::of(node) {
        NodeKind::String => {
            let (kind, value) = decode(node, src)?;
            Ok((kind == LiteralKind::Text).then_some(value))
        }
        NodeKind::ConcatenatedString => {
            let mut joined = String::new();
            for part in (0..node.named_child_count()).filter_map(|i| node.named_child(i)) {
                if NodeKind::of(part) != NodeKind::String {
                    continue;
                }
                let (kind, value) = decode(part, src)?;
                if kind != LiteralKind::Text {
                    return Ok(None);
                }
                joined.push_str(&value);
            }
            Ok(Some(joined))
        }
        NodeKind::Parenthesized => match node.named_child(0) {
            Some(inner) if node.named_child_count() == 1 => literal_value(inner, src),
            _ => Ok(None),
        },
        _ => Ok(None),
    }
}

pub(super) fn decode(node: Node<'_>, src: &str) -> Result<(LiteralKind, String), ParseFailure> {
    parse_string_literal(node_text(node, src))
        .map(|lit| (lit.kind, lit.value))
        .map_err(|e| ParseFailure {
            line: Some(line_of(node)),
            reason: format!("(unicode error) 'unicodeescape' codec: {}", e.message),
        })
}

fn first_error_line(root: Node<'_>) -> Option<usize> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(line_of(node));
        }
        for i in (0..node.child_count()).rev() {
            if let Some(child) = node.child(i)
                && child.has_error()
            {
                stack.push(child);
            }
        }
    }
    None
}

pub(super) fn node_text<'a>(node: Node<'_>, src: &'a str) -> &'a str {
    node.utf8_text(src.as_bytes()).unwrap_or("")
}

pub(super) fn line_of(node: Node<'_>) -> usize {
    node.start_position().row + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raws(source: &str) -> Vec<(String, usize)> {
        extract_structural(source)
            .expect("parses")
            .into_iter()
            .map(|c| match c.origin {
                Origin::SourceLine(line) => (c.raw, line),
                Origin::CommandLine => panic!("structural origin must carry a line"),
            })
            .collect()
    }

    #[test]
    fn listdir_literal_with_line() {
        let source = "import os\n\nos.listdir(\"\\\\\\\\server\\\\share\")\n";
        assert_eq!(raws(source), vec![(r"\\server\share".to_string(), 3)]);
    }

    #[test]
    fn path_iterdir_literal() {
        let source = "from pathlib import Path\nfor p in Path(r\"C:\\data\").iterdir():\n    print(p)\n";
        assert_eq!(raws(source), vec![(r"C:\data".to_string(), 2)]);
    }

    #[test]
    fn computed_arguments_are_ignored() {
        let source = r#"
import os
base = "C:\\x"
os.listdir(base)
os.listdir(f"{base}\\y")
os.listdir(base + "z")
os.listdir()
os.listdir(path="C:\\kw")
"#;
        assert!(raws(source).is_empty());
    }

    #[test]
    fn other_calls_and_shapes_are_ignored() {
        let source = r#"
import os, pathlib
os.scandir("C:\\a")
open("C:\\b")
pathlib.Path("C:\\c").iterdir()
Path(base).iterdir()
listdir("C:\\d")
"#;
        assert!(raws(source).is_empty());
    }

    #[test]
    fn empty_literal_is_skipped() {
        assert!(raws("import os\nos.listdir('')\n").is_empty());
    }

    #[test]
    fn document_order_and_multiline_calls() {
        let source = r#"import os
from pathlib import Path

def walk():
    for name in os.listdir(
        "C:\\first"
    ):
        print(name)
    return list(Path("D:\\second").iterdir())
"#;
        assert_eq!(
            raws(source),
            vec![
                (r"C:\first".to_string(), 5),
                (r"D:\second".to_string(), 9),
            ]
        );
    }

    #[test]
    fn concatenated_and_parenthesized_literals() {
        let source = "import os\nos.listdir(\"C:\\\\a\" \"\\\\b\")\nos.listdir((\"C:\\\\c\"))\n";
        assert_eq!(
            raws(source),
            vec![(r"C:\a\b".to_string(), 2), (r"C:\c".to_string(), 3)]
        );
    }

    #[test]
    fn any_receiver_named_listdir_matches() {
        let source = "import os\nfs = os\nfs.listdir('/srv')\n";
        assert_eq!(raws(source), vec![("/srv".to_string(), 3)]);
    }

    #[test]
    fn syntax_error_is_a_parse_failure() {
        let err = extract_structural("import os\ndef broken(:\n    os.listdir('x')\n")
            .expect_err("invalid syntax");
        assert_eq!(err.reason, "invalid syntax");
        assert!(err.line.is_some());
    }

    #[test]
    fn bad_unicode_escape_is_a_parse_failure() {
        let err = extract_structural("import os\nos.listdir(\"C:\\Users\\me\")\n")
            .expect_err("unicodeescape");
        assert_eq!(err.line, Some(2));
        assert!(err.reason.contains("unicodeescape"));
    }

    #[test]
    fn bad_escape_outside_matched_calls_still_fails() {
        let source = "import os\nos.listdir('/tmp')\nNOTE = \"C:\\Users\"\n";
        assert!(extract_structural(source).is_err());
    }

    #[test]
    fn python2_print_statement_is_a_parse_failure() {
        assert!(extract_structural("print \"hello\"\n").is_err());
    }

    #[test]
    fn python2_except_clause_is_a_parse_failure() {
        let source = "import os\ntry:\n    os.listdir('/tmp')\nexcept OSError, e:\n    os.listdir('a|b')\n";
        let err = extract_structural(source).expect_err("python 2 except");
        assert_eq!(err.line, Some(4));
    }

    #[test]
    fn stray_indent_is_a_parse_failure() {
        let source = "import os\n  target = \"\\\\\\\\server\\\\share\"\nos.listdir(target)\n";
        let err = extract_structural(source).expect_err("unexpected indent");
        assert_eq!(err.line, Some(2));
    }

    #[test]
    fn python3_print_call_parses() {
        assert!(extract_structural("print(\"hello\")\n").is_ok());
    }
}
