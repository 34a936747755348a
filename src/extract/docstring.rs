//! Documentation literal normalization and removal

use crate::extract::wrap::fill;
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

/// Indent applied to every wrapped documentation line after the first
pub const CONTINUATION_INDENT: &str = "        ";

/// Characters allowed in a string prefix (`r"..."`, `u'...'`)
const TEXT_PREFIXES: &[char] = &['r', 'R', 'u', 'U'];

fn triple_quoted() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?s)""".*?"""|'''.*?'''"#).expect("triple-quote pattern is valid")
    })
}

/// Normalizes a raw documentation literal into title text
///
/// Steps, in order:
/// 1. split on line breaks and trim each line
/// 2. rejoin with `\n` and trim the whole
/// 3. drop a text prefix, then strip wrapping `"` and `'` characters
/// 4. fill to `wrap_width` columns with an 8-space continuation indent
///
/// Returns an empty string for whitespace-only literals.
pub fn normalize_documentation(raw_literal: &str, wrap_width: usize) -> String {
    let joined = raw_literal
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");

    let unprefixed = strip_text_prefix(joined.trim());
    let unquoted = unprefixed.trim_matches('"').trim_matches('\'');

    fill(unquoted, wrap_width, CONTINUATION_INDENT)
        .trim()
        .to_string()
}

/// Removes documentation literals from a definition's source
///
/// Every triple-quoted literal in `source` is removed, not only the leading
/// one. The leading literal is removed by its byte range `leading`, so text
/// that merely repeats it elsewhere stays. A literal that sat alone on its
/// line takes that whole line with it.
pub fn strip_documentation(source: &str, leading: Range<usize>) -> String {
    let mut spans: Vec<(usize, usize)> = triple_quoted()
        .find_iter(source)
        .map(|m| (m.start(), m.end()))
        .collect();

    let (start, end) = (leading.start, leading.end.min(source.len()));
    if start < end && !spans.iter().any(|(s, e)| start < *e && *s < end) {
        spans.push((start, end));
        spans.sort_unstable();
    }

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;

    for (start, end) in spans {
        let start = extend_over_prefix(source, start);
        let (start, end) = extend_over_line(source, start, end);
        if start < cursor {
            continue;
        }
        out.push_str(&source[cursor..start]);
        cursor = end;
    }

    out.push_str(&source[cursor..]);
    out
}

fn strip_text_prefix(text: &str) -> &str {
    let prefix_len = text
        .chars()
        .take_while(|c| TEXT_PREFIXES.contains(c))
        .count();
    let rest = &text[prefix_len..];
    if prefix_len <= 2 && (rest.starts_with('"') || rest.starts_with('\'')) {
        rest
    } else {
        text
    }
}

/// Widens a match to include a string prefix directly in front of it
fn extend_over_prefix(source: &str, start: usize) -> usize {
    let before = &source[..start];
    let prefix_len = before
        .chars()
        .rev()
        .take_while(|c| TEXT_PREFIXES.contains(c))
        .count();

    if prefix_len == 0 || prefix_len > 2 {
        return start;
    }

    let prefix_start = start - prefix_len;
    let preceded_by_ident = source[..prefix_start]
        .chars()
        .next_back()
        .map(|c| c.is_alphanumeric() || c == '_')
        .unwrap_or(false);

    if preceded_by_ident {
        start
    } else {
        prefix_start
    }
}

/// Widens a match to its whole line when nothing else shares that line
fn extend_over_line(source: &str, start: usize, end: usize) -> (usize, usize) {
    let line_start = source[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let leading = &source[line_start..start];
    if !leading.chars().all(|c| c == ' ' || c == '\t') {
        return (start, end);
    }

    let rest = &source[end..];
    let line_end_rel = rest.find('\n');
    let trailing = match line_end_rel {
        Some(i) => &rest[..i],
        None => rest,
    };
    if !trailing.chars().all(|c| c == ' ' || c == '\t' || c == '\r') {
        return (start, end);
    }

    match line_end_rel {
        Some(i) => (line_start, end + i + 1),
        // Last line: remove the line break in front of it instead.
        None if line_start > 0 => (line_start - 1, source.len()),
        None => (line_start, source.len()),
    }
}
