//! A1 to R1C1 formula notation
//!
//! Cell references are rewritten relative to the cell holding the formula:
//! `B2` seen from `C3` is `R[-1]C[-1]`, `$A$1` is `R1C1` wherever it is.
//! String literals and quoted sheet names are copied untouched.

use super::range::{column_name_to_index, MAX_COLUMNS, MAX_ROWS};
use regex::Regex;
use std::sync::OnceLock;

fn cell_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\$?)([A-Za-z]{1,3})(\$?)([0-9]+)").expect("hardcoded regex"))
}

fn column_span_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\$?)([A-Za-z]{1,3}):(\$?)([A-Za-z]{1,3})").expect("hardcoded regex"))
}

fn row_span_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\$?)([0-9]+):(\$?)([0-9]+)").expect("hardcoded regex"))
}

/// Rewrite an A1 formula as seen from the cell at (`column`, `row`), both 1-based.
///
/// Tokens that only look like references (function names such as `LOG10`,
/// sheet prefixes, addresses past `XFD1048576`) are left as they are.
pub fn a1_to_r1c1(formula: &str, column: u32, row: u32) -> String {
    let mut out = String::with_capacity(formula.len() + 8);
    let mut rest = formula;
    let mut prev: Option<char> = None;

    while let Some(ch) = rest.chars().next() {
        let at_boundary = !prev.is_some_and(is_name_char);
        let (len, rendered) = if ch == '"' || ch == '\'' {
            (quoted_len(rest, ch), None)
        } else if let Some((len, r1c1)) = at_boundary.then(|| reference_at(rest, column, row)).flatten() {
            (len, Some(r1c1))
        } else if is_name_char(ch) {
            (rest.find(|c: char| !is_name_char(c)).unwrap_or(rest.len()), None)
        } else {
            (ch.len_utf8(), None)
        };

        let (token, tail) = rest.split_at(len);
        out.push_str(rendered.as_deref().unwrap_or(token));
        prev = token.chars().last();
        rest = tail;
    }
    out
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

/// A reference must not run into a name, a call or a sheet separator
fn ends_reference(tail: &str) -> bool {
    tail.chars()
        .next()
        .map_or(true, |c| !(is_name_char(c) || c == '(' || c == '!' || c == '$'))
}

/// Byte length of a quoted run, closing quote included; doubled quotes are escapes
fn quoted_len(text: &str, quote: char) -> usize {
    let mut chars = text.char_indices().skip(1).peekable();
    while let Some((i, c)) = chars.next() {
        if c == quote {
            if chars.peek().is_some_and(|&(_, next)| next == quote) {
                chars.next();
                continue;
            }
            return i + c.len_utf8();
        }
    }
    text.len()
}

fn reference_at(text: &str, column: u32, row: u32) -> Option<(usize, String)> {
    if let Some(caps) = cell_pattern().captures(text) {
        let len = caps[0].len();
        if !ends_reference(&text[len..]) {
            return None;
        }
        let target_column = column_in_bounds(&caps[2])?;
        let target_row = row_in_bounds(&caps[4])?;
        let rendered = format!(
            "{}{}",
            axis('R', target_row, row, !caps[3].is_empty()),
            axis('C', target_column, column, !caps[1].is_empty())
        );
        return Some((len, rendered));
    }

    if let Some(caps) = column_span_pattern().captures(text) {
        let len = caps[0].len();
        if !ends_reference(&text[len..]) {
            return None;
        }
        let first = column_in_bounds(&caps[2])?;
        let last = column_in_bounds(&caps[4])?;
        let rendered = format!(
            "{}:{}",
            axis('C', first, column, !caps[1].is_empty()),
            axis('C', last, column, !caps[3].is_empty())
        );
        return Some((len, rendered));
    }

    let caps = row_span_pattern().captures(text)?;
    let len = caps[0].len();
    if !ends_reference(&text[len..]) {
        return None;
    }
    let first = row_in_bounds(&caps[2])?;
    let last = row_in_bounds(&caps[4])?;
    let rendered = format!(
        "{}:{}",
        axis('R', first, row, !caps[1].is_empty()),
        axis('R', last, row, !caps[3].is_empty())
    );
    Some((len, rendered))
}

fn column_in_bounds(letters: &str) -> Option<u32> {
    column_name_to_index(letters).filter(|&c| c <= MAX_COLUMNS)
}

fn row_in_bounds(digits: &str) -> Option<u32> {
    digits.parse::<u32>().ok().filter(|r| (1..=MAX_ROWS).contains(r))
}

fn axis(label: char, target: u32, origin: u32, absolute: bool) -> String {
    if absolute {
        format!("{}{}", label, target)
    } else if target == origin {
        label.to_string()
    } else {
        format!("{}[{}]", label, i64::from(target) - i64::from(origin))
    }
}
