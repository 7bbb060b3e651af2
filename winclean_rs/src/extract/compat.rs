//! Python 3 compile checks the tree-sitter grammar leaves out.
//!
//! The grammar is permissive: it keeps Python 2 productions (`print x`,
//! `except E, e`, `<>`, `0777`) and does not check that a block's statements
//! line up. CPython refuses such files, so they must fail here too and take
//! the lexical fallback.

use tree_sitter::Node;

use super::literal::{LiteralKind, is_python3_prefix};
use super::structural::{ParseFailure, decode, line_of, node_text};

/// Reject anything CPython 3 would not compile. The tree must be error-free.
pub(super) fn check(root: Node<'_>, src: &str) -> Result<(), ParseFailure> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        match node.kind() {
            "module" => check_suite(node, Some(0))?,
            "block" => check_suite(node, None)?,
            "print_statement" | "exec_statement" => {
                return Err(fail(node, format!("python 2 `{}` statement", node.kind())));
            }
            "except_clause" if has_token(node, ",") => {
                return Err(fail(node, "multiple exception types must be parenthesized"));
            }
            "raise_statement" if named_children(node).any(|n| n.kind() == "expression_list") => {
                return Err(fail(node, "invalid syntax"));
            }
            "for_in_clause" if has_token(node, ",") => {
                return Err(fail(node, "invalid syntax"));
            }
            "comparison_operator" if has_token(node, "<>") => {
                return Err(fail(node, "invalid syntax"));
            }
            "argument_list" => check_argument_order(node)?,
            "integer" => check_integer(node, src)?,
            "concatenated_string" => check_concatenation(node, src)?,
            "string" => check_string(node, src)?,
            _ => {}
        }
        for i in (0..node.child_count()).rev() {
            if let Some(child) = node.child(i) {
                stack.push(child);
            }
        }
    }
    Ok(())
}

/// Statements of one suite must start in the same column; module level is column 0.
fn check_suite(suite: Node<'_>, expected: Option<usize>) -> Result<(), ParseFailure> {
    let mut column = expected;
    let mut last_row = None;
    for stmt in named_children(suite).filter(|n| !n.is_extra()) {
        let start = stmt.start_position();
        let shares_line = last_row == Some(start.row);
        last_row = Some(stmt.end_position().row);
        // `a = 1; b = 2`
        if shares_line {
            continue;
        }
        match column {
            None => column = Some(start.column),
            Some(col) if start.column > col => return Err(fail(stmt, "unexpected indent")),
            Some(col) if start.column < col => {
                return Err(fail(
                    stmt,
                    "unindent does not match any outer indentation level",
                ));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn check_argument_order(args: Node<'_>) -> Result<(), ParseFailure> {
    let mut seen_keyword = false;
    let mut seen_mapping_unpack = false;
    for arg in named_children(args).filter(|n| !n.is_extra()) {
        match arg.kind() {
            "keyword_argument" => seen_keyword = true,
            "dictionary_splat" => seen_mapping_unpack = true,
            "list_splat" if seen_mapping_unpack => {
                return Err(fail(
                    arg,
                    "iterable argument unpacking follows keyword argument unpacking",
                ));
            }
            "list_splat" => {}
            _ if seen_mapping_unpack => {
                return Err(fail(
                    arg,
                    "positional argument follows keyword argument unpacking",
                ));
            }
            _ if seen_keyword => {
                return Err(fail(arg, "positional argument follows keyword argument"));
            }
            _ => {}
        }
    }
    Ok(())
}

/// `10L` and `0777` are Python 2 only. `00`, `0x1F` and `07j` are fine.
fn check_integer(node: Node<'_>, src: &str) -> Result<(), ParseFailure> {
    let text = node_text(node, src).to_ascii_lowercase();
    if text.ends_with('l') {
        return Err(fail(node, "invalid decimal literal"));
    }
    if text.ends_with('j') || ["0x", "0o", "0b"].iter().any(|p| text.starts_with(p)) {
        return Ok(());
    }
    let digits: Vec<char> = text.chars().filter(|c| *c != '_').collect();
    if digits.len() > 1 && digits[0] == '0' && digits.iter().any(|c| *c != '0') {
        return Err(fail(
            node,
            "leading zeros in decimal integer literals are not permitted",
        ));
    }
    Ok(())
}

fn check_concatenation(node: Node<'_>, src: &str) -> Result<(), ParseFailure> {
    let mut bytes = false;
    let mut text = false;
    for part in named_children(node).filter(|n| n.kind() == "string") {
        match decode(part, src)?.0 {
            LiteralKind::Bytes => bytes = true,
            LiteralKind::Text | LiteralKind::Formatted => text = true,
        }
    }
    if bytes && text {
        return Err(fail(node, "cannot mix bytes and nonbytes literals"));
    }
    Ok(())
}

fn check_string(node: Node<'_>, src: &str) -> Result<(), ParseFailure> {
    let token = node_text(node, src);
    let quote_at = token.find(['"', '\'', '`']).unwrap_or(0);
    let prefix = &token[..quote_at];
    // The grammar lexes Python 2 `repr` backticks as a string.
    if token[quote_at..].starts_with('`') {
        return Err(fail(node, "invalid syntax"));
    }
    if !is_python3_prefix(prefix) {
        return Err(fail(node, format!("invalid string prefix `{prefix}`")));
    }
    // A bad escape anywhere rejects the whole file.
    decode(node, src).map(|_| ())
}

fn has_token(node: Node<'_>, token: &str) -> bool {
    (0..node.child_count())
        .filter_map(|i| node.child(i))
        .any(|child| !child.is_named() && child.kind() == token)
}

fn named_children<'t>(node: Node<'t>) -> impl Iterator<Item = Node<'t>> {
    (0..node.named_child_count()).filter_map(move |i| node.named_child(i))
}

fn fail(node: Node<'_>, reason: impl Into<String>) -> ParseFailure {
    ParseFailure {
        line: Some(line_of(node)),
        reason: reason.into(),
    }
}
