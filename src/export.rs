use regex::Regex;
use serde_json::{Map, Number, Value};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O Error: {0}")]
    IO(#[from] std::io::Error),
    #[error("Timestamp format error: {0}")]
    TimeFormatError(#[from] time::error::Format),
}

pub type Result<T> = std::result::Result<T, ExportError>;

/// Words a YAML 1.1 resolver reads as booleans or null.
const RESERVED_WORDS: &[&str] = &[
    "y", "Y", "yes", "Yes", "YES", "n", "N", "no", "No", "NO", "true", "True", "TRUE", "false",
    "False", "FALSE", "on", "On", "ON", "off", "Off", "OFF", "null", "Null", "NULL",
];

/// Renders the collection as a block-style YAML sequence. Key order and
/// non-ASCII text are kept as-is, and any string a YAML 1.1 or 1.2 reader
/// could retype (`on`, `1_000`, `2024-01-01`, ...) is double-quoted.
/// An empty collection renders as `[]`.
pub fn to_yaml(fragments: &[Value]) -> String {
    if fragments.is_empty() {
        return "[]\n".to_string();
    }

    let mut out = String::new();
    emit_seq(&mut out, fragments, 0, false);
    out
}

fn emit_seq(out: &mut String, items: &[Value], indent: usize, inline_first: bool) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 || !inline_first {
            pad(out, indent);
        }
        out.push_str("- ");
        emit_inline(out, item, indent + 2);
    }
}

fn emit_map(out: &mut String, map: &Map<String, Value>, indent: usize, inline_first: bool) {
    for (i, (key, value)) in map.iter().enumerate() {
        if i > 0 || !inline_first {
            pad(out, indent);
        }
        out.push_str(&string_scalar(key));
        out.push(':');

        match value {
            Value::Object(inner) if !inner.is_empty() => {
                out.push('\n');
                emit_map(out, inner, indent + 2, false);
            }
            // Sequences under a key sit at the key's own indent.
            Value::Array(items) if !items.is_empty() => {
                out.push('\n');
                emit_seq(out, items, indent, false);
            }
            scalar => {
                out.push(' ');
                out.push_str(&scalar_text(scalar));
                out.push('\n');
            }
        }
    }
}

/// Emits a value that continues the current line after `- `.
fn emit_inline(out: &mut String, value: &Value, indent: usize) {
    match value {
        Value::Object(map) if !map.is_empty() => emit_map(out, map, indent, true),
        Value::Array(items) if !items.is_empty() => emit_seq(out, items, indent, true),
        scalar => {
            out.push_str(&scalar_text(scalar));
            out.push('\n');
        }
    }
}

fn pad(out: &mut String, indent: usize) {
    out.extend(std::iter::repeat_n(' ', indent));
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_scalar(n),
        Value::String(s) => string_scalar(s),
        Value::Array(_) => "[]".to_string(),
        Value::Object(_) => "{}".to_string(),
    }
}

/// Integers are written verbatim. Floats get a `.` in the mantissa and a
/// signed exponent, the only shape YAML 1.1 resolves as a float.
fn number_scalar(n: &Number) -> String {
    let text = n.to_string();
    if !text.contains(['.', 'e', 'E']) {
        return text;
    }

    let (mantissa, exponent) = match text.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => (mantissa, Some(exponent)),
        None => (text.as_str(), None),
    };

    let mut out = mantissa.to_string();
    if !mantissa.contains('.') {
        out.push_str(".0");
    }
    if let Some(exponent) = exponent {
        out.push('e');
        if !exponent.starts_with(['+', '-']) {
            out.push('+');
        }
        out.push_str(exponent);
    }
    out
}

fn plain_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\p{L}_][\p{L}\p{N}_ ./()@-]*$").unwrap())
}

fn string_scalar(s: &str) -> String {
    let plain = plain_pattern().is_match(s) && !s.ends_with(' ') && !RESERVED_WORDS.contains(&s);
    if plain { s.to_string() } else { double_quoted(s) }
}

fn double_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');

    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if is_printable(c) => out.push(c),
            c => {
                let code = c as u32;
                let escaped = match code {
                    0..=0xFF => format!("\\x{code:02X}"),
                    0x100..=0xFFFF => format!("\\u{code:04X}"),
                    _ => format!("\\U{code:08X}"),
                };
                out.push_str(&escaped);
            }
        }
    }

    out.push('"');
    out
}

// YAML 1.1 printable set, minus the characters it folds as line breaks.
fn is_printable(c: char) -> bool {
    matches!(c,
        '\u{20}'..='\u{7E}'
        | '\u{A0}'..='\u{2027}'
        | '\u{202A}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

/// `<label>_api_data_<YYYY-MM-DD_HH-MM-SS>`, without extension.
pub fn file_stem(domain_label: &str, timestamp: OffsetDateTime) -> Result<String> {
    let format = format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");
    Ok(format!("{}_api_data_{}", domain_label, timestamp.format(format)?))
}

/// Writes the collection to a new timestamped file in `output_dir` and
/// returns its absolute path. An existing file of the same name is never
/// overwritten: `_2`, `_3`, ... is appended to the stem instead.
pub fn write_yaml(
    fragments: &[Value],
    output_dir: &Path,
    domain_label: &str,
    timestamp: OffsetDateTime,
) -> Result<PathBuf> {
    let yaml = to_yaml(fragments);
    let stem = file_stem(domain_label, timestamp)?;

    let mut suffix = 1;
    let (path, mut file) = loop {
        let name = match suffix {
            1 => format!("{stem}.yaml"),
            n => format!("{stem}_{n}.yaml"),
        };
        let path = output_dir.join(name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => break (path, file),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "output file exists, trying next suffix");
                suffix += 1;
            }
            Err(e) => return Err(e.into()),
        }
    };

    file.write_all(yaml.as_bytes())?;
    file.flush()?;

    let path = std::fs::canonicalize(&path)?;
    info!(path = %path.display(), fragments = fragments.len(), "wrote YAML");

    Ok(path)
}
