//! Markup extraction from raw model output
//!
//! Models wrap the SVG in prose, Markdown fences, or occasionally emit the
//! document twice. Extraction keeps exactly the first root `<svg>` element.

use super::ValidationError;
use regex::Regex;
use std::sync::LazyLock;

/// Markup constructs whose content is not scanned for tags
const OPAQUE: [(&str, &str); 3] = [("<!--", "-->"), ("<![cdata[", "]]>"), ("<?", "?>")];

static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_+-]*[ \t]*\r?\n?(.*?)```").expect("valid fence regex")
});

/// Reduce a raw model response to its first root `<svg>` element
///
/// A Markdown fence containing `<svg` narrows the search to its body, and a
/// `<svg>` mentioned inside an inline code span is not a root. An
/// unterminated root is returned up to the end of the text so that
/// validation reports it instead of this step silently dropping it.
pub fn extract_markup(raw: &str) -> Result<&str, ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::Empty);
    }

    let scope = fenced_block(raw).unwrap_or(raw);
    // ASCII lowercasing keeps byte offsets aligned with `scope`.
    let lower = scope.to_ascii_lowercase();

    let start = find_svg_open(&lower, 0).ok_or(ValidationError::NoMarkup)?;
    let end = matching_close(&lower, start).unwrap_or(scope.len());

    Ok(scope[start..end].trim_end())
}

/// Body of the first fenced code block mentioning `<svg`
fn fenced_block(raw: &str) -> Option<&str> {
    FENCE
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1))
        .map(|body| body.as_str())
        .find(|body| body.to_ascii_lowercase().contains("<svg"))
}

/// Offset of the next `<svg` open tag at or after `from`
fn find_svg_open(lower: &str, from: usize) -> Option<usize> {
    let mut cursor = from;
    while let Some(found) = lower[cursor..].find("<svg") {
        let at = cursor + found;
        if is_name_boundary(lower, at + "<svg".len()) && !in_inline_code(lower, at) {
            return Some(at);
        }
        cursor = at + 1;
    }
    None
}

/// Offset just past the `</svg>` matching the open tag at `start`
fn matching_close(lower: &str, start: usize) -> Option<usize> {
    let bytes = lower.as_bytes();
    let mut depth = 0usize;
    let mut cursor = start;

    while let Some(found) = lower[cursor..].find('<') {
        let at = cursor + found;
        let rest = &lower[at..];

        if let Some((_, terminator)) = OPAQUE.iter().find(|(open, _)| rest.starts_with(*open)) {
            cursor = at + rest.find(terminator)? + terminator.len();
            continue;
        }

        let end = tag_end(bytes, at)?;

        if lower[at..].starts_with("</svg") && is_name_boundary(lower, at + "</svg".len()) {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(end + 1);
            }
        } else if lower[at..].starts_with("<svg") && is_name_boundary(lower, at + "<svg".len()) {
            if bytes[end - 1] != b'/' {
                depth += 1;
            } else if depth == 0 {
                // Self-closing root
                return Some(end + 1);
            }
        }
        cursor = end + 1;
    }
    None
}

/// Whether `at` sits inside a single-backtick code span on its line
fn in_inline_code(lower: &str, at: usize) -> bool {
    let line_start = lower[..at].rfind('\n').map_or(0, |n| n + 1);
    lower[line_start..at].bytes().filter(|&b| b == b'`').count() % 2 == 1
}

/// Offset of the `>` closing the tag opened at `at`, skipping quoted values
pub(super) fn tag_end(bytes: &[u8], at: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (offset, &b) in bytes[at..].iter().enumerate() {
        match (quote, b) {
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'>') => return Some(at + offset),
            _ => {}
        }
    }
    None
}

fn is_name_boundary(lower: &str, at: usize) -> bool {
    match lower.as_bytes().get(at) {
        None => true,
        Some(b) => b.is_ascii_whitespace() || *b == b'>' || *b == b'/',
    }
}
