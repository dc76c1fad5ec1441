//! Heuristic extraction of JSON objects embedded in script text.
//!
//! [`ScanMode::Flat`] only ever matches objects without nested braces:
//! for `{"outer": {"inner": 1}}` it yields `{"inner": 1}` and nothing else.
//! [`ScanMode::Balanced`] tracks brace depth and string literals so nested
//! objects come out whole.

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::trace;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Shortest `{...}` spans that contain no `{`
    #[default]
    Flat,
    /// Brace-depth scan that captures nested objects
    Balanced,
}

/// Returns every JSON value found in `text`, in order of appearance.
/// Candidates that do not parse are dropped.
pub fn extract_fragments(text: &str, mode: ScanMode) -> Vec<Value> {
    match mode {
        ScanMode::Flat => extract_flat(text),
        ScanMode::Balanced => extract_balanced(text),
    }
}

fn flat_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{[^{]*?\}").unwrap())
}

fn extract_flat(text: &str) -> Vec<Value> {
    flat_pattern()
        .find_iter(text)
        .filter_map(|m| parse_candidate(m.as_str()))
        .collect()
}

fn extract_balanced(text: &str) -> Vec<Value> {
    let mut fragments = Vec::new();
    let mut pos = 0;

    while let Some(offset) = text[pos..].find('{') {
        let start = pos + offset;

        if let Some(len) = balanced_len(&text.as_bytes()[start..]) {
            if let Some(value) = parse_candidate(&text[start..start + len]) {
                fragments.push(value);
                pos = start + len;
                continue;
            }
        }

        // Retry from the next byte so objects nested in a bad span survive.
        pos = start + 1;
    }

    fragments
}

/// Length of the brace-balanced span starting at `bytes[0] == b'{'`,
/// ignoring braces inside single- or double-quoted strings. A `;` outside
/// a string can never occur in JSON, so it ends the search.
fn balanced_len(bytes: &[u8]) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if let Some(q) = quote {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                _ if b == q => quote = None,
                _ => {}
            }
            continue;
        }

        match b {
            b'"' | b'\'' => quote = Some(b),
            b';' => return None,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}

fn parse_candidate(candidate: &str) -> Option<Value> {
    match serde_json::from_str(candidate) {
        Ok(value) => Some(value),
        Err(e) => {
            trace!(error = %e, len = candidate.len(), "discarding candidate");
            None
        }
    }
}
