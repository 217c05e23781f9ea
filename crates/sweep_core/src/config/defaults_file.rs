//! Reader for shell-style defaults files (`key=value` per line).
//!
//! Only plain assignments are understood. Lines that are not assignments at
//! all (other shell commands) are skipped with a warning.

use std::path::Path;

use tracing::warn;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub line: usize,
    pub key: String,
    pub value: String,
}

pub fn parse_defaults(text: &str, path: &Path) -> Result<Vec<Assignment>, ConfigError> {
    let mut assignments = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let body = match line.strip_prefix("export") {
            Some(rest) if rest.starts_with(char::is_whitespace) => rest.trim_start(),
            _ => line,
        };
        let Some((key, rest)) = body.split_once('=') else {
            warn!(path = %path.display(), line = line_no, "skipping non-assignment line");
            continue;
        };

        let malformed = || ConfigError::MalformedLine {
            path: path.to_path_buf(),
            line: line_no,
            content: raw.to_string(),
        };

        if !is_identifier(key) {
            return Err(malformed());
        }
        let value = parse_value(rest).ok_or_else(malformed)?;

        assignments.push(Assignment {
            line: line_no,
            key: key.to_string(),
            value,
        });
    }

    Ok(assignments)
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_value(rest: &str) -> Option<String> {
    let mut chars = rest.chars();
    match chars.next() {
        None => Some(String::new()),
        Some(quote @ ('"' | '\'')) => {
            let inner = &rest[1..];
            let close = inner.find(quote)?;
            let trailing = inner[close + 1..].trim();
            if !trailing.is_empty() && !trailing.starts_with('#') {
                return None;
            }
            Some(inner[..close].to_string())
        }
        Some(_) => {
            let value = strip_trailing_comment(rest).trim_end();
            if value.chars().any(char::is_whitespace) {
                return None;
            }
            Some(value.to_string())
        }
    }
}

/// Cut at the first `#` that follows whitespace, as the shell does.
fn strip_trailing_comment(value: &str) -> &str {
    let mut after_space = false;
    for (pos, c) in value.char_indices() {
        if c == '#' && after_space {
            return &value[..pos];
        }
        after_space = c.is_whitespace();
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Vec<Assignment>, ConfigError> {
        parse_defaults(text, Path::new("defaults.sh"))
    }

    #[test]
    fn reads_plain_exported_and_quoted_assignments() {
        let text = "\
#!/bin/bash
# shared defaults
num_workers=4
export component_type=\"planar\"
z_size='2'   # latent size
batch_size=128 # trailing comment

cd ..
";
        let assignments = parse(text).unwrap();
        let pairs: Vec<(&str, &str, usize)> = assignments
            .iter()
            .map(|a| (a.key.as_str(), a.value.as_str(), a.line))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("num_workers", "4", 3),
                ("component_type", "planar", 4),
                ("z_size", "2", 5),
                ("batch_size", "128", 6),
            ]
        );
    }

    #[test]
    fn tab_separated_comments_and_export() {
        let text = "seed=42\t# note\nexport\tbatch_size=16\nexp_name=run#1\n";
        let assignments = parse(text).unwrap();
        let pairs: Vec<(&str, &str)> = assignments
            .iter()
            .map(|a| (a.key.as_str(), a.value.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![("seed", "42"), ("batch_size", "16"), ("exp_name", "run#1")]
        );
    }

    #[test]
    fn exported_prefix_needs_whitespace() {
        let assignments = parse("exported_seed=1").unwrap();
        assert_eq!(assignments[0].key, "exported_seed");
    }

    #[test]
    fn empty_value_is_allowed() {
        let assignments = parse("iters_per_component=").unwrap();
        assert_eq!(assignments[0].value, "");
    }

    #[test]
    fn rejects_unterminated_quote() {
        let error = parse("seed=\"42").unwrap_err();
        match error {
            ConfigError::MalformedLine { line, .. } => assert_eq!(line, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_bad_key_and_unquoted_spaces() {
        assert!(parse("1seed=42").is_err());
        assert!(parse("seed=4 2").is_err());
        assert!(parse("seed = 42").is_err());
    }
}
