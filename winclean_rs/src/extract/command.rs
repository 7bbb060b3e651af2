//! Path extraction from a single `cd`-style command line.

use crate::types::{Origin, PathCandidate};

/// Pick the path out of a command: the token after the verb when there are
/// two or more tokens, the lone token otherwise, `""` for an empty command.
pub fn extract_path_from_command(cmd: &str) -> String {
    let parts: Vec<&str> = cmd.split_whitespace().collect();
    match parts.as_slice() {
        [] => String::new(),
        [only] => (*only).to_string(),
        [_, path, ..] => (*path).to_string(),
    }
}

pub fn extract_command(cmd: &str) -> PathCandidate {
    PathCandidate::new(extract_path_from_command(cmd), Origin::CommandLine)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verb_and_path() {
        assert_eq!(extract_path_from_command(r"cd C:\Users"), r"C:\Users");
        assert_eq!(extract_path_from_command(r"  chdir   D:\x  extra "), r"D:\x");
    }

    #[test]
    fn lone_path() {
        assert_eq!(extract_path_from_command(r"C:\Users"), r"C:\Users");
    }

    #[test]
    fn empty_command() {
        assert_eq!(extract_path_from_command(""), "");
        assert_eq!(extract_path_from_command("   \t "), "");
    }

    #[test]
    fn candidate_has_command_origin() {
        let candidate = extract_command(r"cd \\srv\share");
        assert_eq!(candidate.raw, r"\\srv\share");
        assert_eq!(candidate.origin, Origin::CommandLine);
    }
}
