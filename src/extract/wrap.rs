//! Greedy paragraph filling
//!
//! Mirrors the classic "fill" algorithm: every whitespace character becomes a
//! space, the text is split into alternating word and whitespace chunks, and
//! chunks are packed greedily into lines of at most `width` characters.
//! Whitespace chunks are dropped at line boundaries, compound words may break
//! after a hyphen, and words longer than a full line are broken. Widths are
//! counted in characters, not bytes.

const TAB_SIZE: usize = 8;

/// Fills `text` to `width` columns
///
/// The first line has no indent; every following line starts with
/// `subsequent_indent`. Lines are joined with `\n`. Whitespace-only input
/// yields an empty string.
pub fn fill(text: &str, width: usize, subsequent_indent: &str) -> String {
    wrap(text, width, subsequent_indent).join("\n")
}

/// Wraps `text` into lines, see [`fill`]
pub fn wrap(text: &str, width: usize, subsequent_indent: &str) -> Vec<String> {
    let mut chunks: Vec<Vec<char>> = split_chunks(&munge_whitespace(text));
    chunks.reverse();

    let indent_len = subsequent_indent.chars().count();
    let mut lines: Vec<String> = Vec::new();

    while !chunks.is_empty() {
        let mut cur_line: Vec<Vec<char>> = Vec::new();
        let mut cur_len = 0usize;

        let (indent, indent_width) = if lines.is_empty() {
            ("", 0)
        } else {
            (subsequent_indent, indent_len)
        };
        let line_width = width.saturating_sub(indent_width);

        // Leading whitespace is kept on the very first line only.
        if !lines.is_empty() && chunks.last().map(|c| is_blank(c)).unwrap_or(false) {
            chunks.pop();
        }

        while let Some(chunk) = chunks.last() {
            let len = chunk.len();
            if cur_len + len <= line_width {
                cur_len += len;
                if let Some(chunk) = chunks.pop() {
                    cur_line.push(chunk);
                }
            } else {
                break;
            }
        }

        if let Some(chunk) = chunks.last() {
            if chunk.len() > line_width {
                handle_long_word(&mut chunks, &mut cur_line, cur_len, line_width);
                cur_len = cur_line.iter().map(Vec::len).sum();
            }
        }

        if cur_line.last().map(|c| is_blank(c)).unwrap_or(false) {
            if let Some(dropped) = cur_line.pop() {
                cur_len -= dropped.len();
            }
        }

        if !cur_line.is_empty() && cur_len > 0 {
            let mut line = String::from(indent);
            for chunk in &cur_line {
                line.extend(chunk.iter());
            }
            lines.push(line);
        }
    }

    lines
}

fn handle_long_word(
    chunks: &mut Vec<Vec<char>>,
    cur_line: &mut Vec<Vec<char>>,
    cur_len: usize,
    width: usize,
) {
    let space_left = if width < 1 {
        1
    } else {
        width.saturating_sub(cur_len)
    };

    if let Some(chunk) = chunks.last_mut() {
        let split_at = space_left.min(chunk.len());
        let rest = chunk.split_off(split_at);
        let head = std::mem::replace(chunk, rest);
        if !head.is_empty() {
            cur_line.push(head);
        }
        if chunk.is_empty() {
            chunks.pop();
        }
    }
}

fn munge_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut column = 0usize;
    for c in text.chars() {
        match c {
            '\t' => {
                let pad = TAB_SIZE - (column % TAB_SIZE);
                out.extend(std::iter::repeat(' ').take(pad));
                column += pad;
            }
            '\n' | '\r' => {
                out.push(' ');
                column = 0;
            }
            '\x0b' | '\x0c' => {
                out.push(' ');
                column += 1;
            }
            other => {
                out.push(other);
                column += 1;
            }
        }
    }
    out
}

fn split_chunks(text: &str) -> Vec<Vec<char>> {
    let mut chunks: Vec<Vec<char>> = Vec::new();
    let mut current: Vec<char> = Vec::new();
    let mut current_blank = false;

    for c in text.chars() {
        let blank = c == ' ';
        if !current.is_empty() && blank != current_blank {
            chunks.push(std::mem::take(&mut current));
        }
        current_blank = blank;
        current.push(c);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks.into_iter().flat_map(split_hyphenated).collect()
}

/// Splits compound words after their hyphens ("well-known" -> "well-", "known")
fn split_hyphenated(word: Vec<char>) -> Vec<Vec<char>> {
    let mut parts = Vec::new();
    let mut current = Vec::new();

    for (i, c) in word.iter().enumerate() {
        current.push(*c);
        let breakable = *c == '-'
            && i > 0
            && word[i - 1].is_alphanumeric()
            && word.get(i + 1).map(|n| n.is_alphabetic()).unwrap_or(false);
        if breakable {
            parts.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        parts.push(current);
    }

    parts
}

fn is_blank(chunk: &[char]) -> bool {
    chunk.iter().all(|c| *c == ' ')
}
