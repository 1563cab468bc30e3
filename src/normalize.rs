use crate::config::NormalizationOptions;
use serde_json::Value;

/// Program output in a form that can be compared
#[derive(Debug, Clone, PartialEq)]
pub enum Comparable {
    /// A JSON array or object
    Structured(Value),
    /// Anything else, trimmed
    Text(String),
}

/// Canonicalize raw output.
///
/// Text that parses as a JSON array or object becomes `Structured`, so
/// `[1, 2]` and `[1,2]` compare equal. Scalars stay textual: `2` and `2.0`
/// are different answers.
pub fn normalize(raw: &str, opts: &NormalizationOptions) -> Comparable {
    let text = clean_text(raw, opts);
    match serde_json::from_str::<Value>(&text) {
        Ok(value @ (Value::Array(_) | Value::Object(_))) => Comparable::Structured(value),
        _ => Comparable::Text(text),
    }
}

/// Two-tier comparison: structural when both sides are structured,
/// trimmed text otherwise
pub fn outputs_match(actual: &str, expected: &str, opts: &NormalizationOptions) -> bool {
    match (normalize(actual, opts), normalize(expected, opts)) {
        (Comparable::Structured(a), Comparable::Structured(b)) => a == b,
        _ => clean_text(actual, opts) == clean_text(expected, opts),
    }
}

fn clean_text(output: &str, opts: &NormalizationOptions) -> String {
    let mut s = output.to_string();
    if opts.normalize_crlf {
        s = s.replace("\r\n", "\n");
    }
    if opts.ignore_extra_whitespace {
        s = s
            .lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .collect::<Vec<_>>()
            .join("\n");
    }
    s.trim().to_string()
}
