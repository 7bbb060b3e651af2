//! Line-oriented fallback for sources that do not parse.
//!
//! Every non-empty quoted literal on every line becomes a candidate, with no
//! escape processing and no idea whether the string is a path at all. Noisy,
//! but it still surfaces the `"C:\Users"` style literals that broke the parse.

use tracing::debug;

use super::regexes::{regex_double_quoted, regex_single_quoted};
use crate::types::{Origin, PathCandidate};

/// Scan `source` line by line. Per line, double-quoted literals come first,
/// then single-quoted ones, each group left to right.
pub fn extract_lines(source: &str) -> Vec<PathCandidate> {
    let mut candidates = Vec::new();

    for (idx, line) in source.split('\n').enumerate() {
        let line_num = idx + 1;
        let quoted = regex_double_quoted()
            .captures_iter(line)
            .chain(regex_single_quoted().captures_iter(line))
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|literal| !literal.is_empty());

        for literal in quoted {
            candidates.push(PathCandidate::new(literal, Origin::SourceLine(line_num)));
        }
    }

    debug!("lexical scan found {} candidate(s)", candidates.len());
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(source: &str) -> Vec<(String, usize)> {
        extract_lines(source)
            .into_iter()
            .map(|c| (c.raw, c.origin.line().expect("line")))
            .collect()
    }

    #[test]
    fn literals_keep_their_line_numbers() {
        let source = "x = \"C:\\Users\"\n\ny = 'D:\\data'\n";
        assert_eq!(
            pairs(source),
            vec![
                (r"C:\Users".to_string(), 1),
                (r"D:\data".to_string(), 3),
            ]
        );
    }

    #[test]
    fn double_quotes_before_single_quotes_on_a_line() {
        let source = r#"f('one', "two", 'three', "four")"#;
        assert_eq!(
            pairs(source),
            vec![
                ("two".to_string(), 1),
                ("four".to_string(), 1),
                ("one".to_string(), 1),
                ("three".to_string(), 1),
            ]
        );
    }

    #[test]
    fn empty_literals_are_dropped() {
        assert!(pairs("a = ''\nb = \"\"\n").is_empty());
    }

    #[test]
    fn no_escape_processing() {
        let source = r#"os.listdir("\\\\server\\share")"#;
        assert_eq!(pairs(source), vec![(r"\\\\server\\share".to_string(), 1)]);
    }

    #[test]
    fn unterminated_quote_yields_nothing() {
        assert!(pairs("print(\"oops)\n").is_empty());
    }
}
