//! Classification of single INI lines.

use crate::format::IniFormat;

/// What one line of an INI file means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Line<'a> {
    /// Blank line or comment.
    Ignored,
    /// `[Name]`, with the name trimmed.
    Section(&'a str),
    /// Anything else.
    Value(ValueLine<'a>),
}

/// A value line split around the separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ValueLine<'a> {
    /// Trimmed name before the separator; `None` for a positional line.
    pub name: Option<&'a str>,
    /// Trimmed literal after the separator, or the whole trimmed line when
    /// positional.
    pub literal: &'a str,
}

/// Classifies `raw`, a line without its terminator.
pub(crate) fn classify<'a>(raw: &'a str, format: &IniFormat) -> Line<'a> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || format.is_comment(trimmed) {
        return Line::Ignored;
    }

    if let Some(inner) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        let name = inner.trim();
        if !name.is_empty() {
            return Line::Section(name);
        }
    }

    let value = match trimmed.split_once(format.separator) {
        Some((name, literal)) if !name.trim().is_empty() => ValueLine {
            name: Some(name.trim()),
            literal: literal.trim(),
        },
        _ => ValueLine {
            name: None,
            literal: trimmed,
        },
    };
    Line::Value(value)
}

/// Leading whitespace of `raw`.
pub(crate) fn indentation(raw: &str) -> &str {
    &raw[..raw.len() - raw.trim_start().len()]
}

/// Splits a line read with its terminator into content and terminator.
pub(crate) fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(content) = line.strip_suffix("\r\n") {
        (content, "\r\n")
    } else if let Some(content) = line.strip_suffix('\n') {
        (content, "\n")
    } else {
        (line, "")
    }
}
