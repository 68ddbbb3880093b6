//! `global.py`: the default library, written as a Python assignment.
//!
//! ```text
//! library_path = u'/home/reader/Calibre Library'
//! ```

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

const KEY: &str = "library_path";

static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^library_path\s*=\s*(?:(?P<prefix>[uUrR]{0,2})(?:'(?P<single>(?:[^'\\]|\\.)*)'|"(?P<double>(?:[^"\\]|\\.)*)")|(?P<none>None))\s*(?:#.*)?$"#)
        .unwrap()
});

pub(crate) fn read(path: &Path) -> Result<Vec<PathBuf>> {
    let text = std::fs::read_to_string(path).or_raise(|| ErrorKind::ConfigUnavailable(path.to_path_buf()))?;
    match parse(&text) {
        Some(library) => Ok(library.into_iter().collect()),
        None => exn::bail!(ErrorKind::ConfigUnavailable(path.to_path_buf())),
    }
}

/// `None` when the assignment is malformed; `Some(None)` when there is no
/// default library (no assignment, or `= None`).
fn parse(text: &str) -> Option<Option<PathBuf>> {
    let Some(line) = text.lines().map(str::trim).find(|line| is_assignment(line)) else {
        return Some(None);
    };
    let captures = ASSIGNMENT.captures(line)?;
    if captures.name("none").is_some() {
        return Some(None);
    }
    let raw = captures.name("prefix").is_some_and(|p| p.as_str().contains(['r', 'R']));
    let literal = captures.name("single").or_else(|| captures.name("double"))?.as_str();
    let value = if raw { literal.to_string() } else { unescape(literal) };
    Some((!value.is_empty()).then(|| PathBuf::from(value)))
}

fn is_assignment(line: &str) -> bool {
    line.strip_prefix(KEY).is_some_and(|rest| rest.trim_start().starts_with('='))
}

/// Python string escapes that can appear in a path.
fn unescape(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    let mut chars = literal.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('x') => push_code(&mut out, &mut chars, 2),
            Some('u') => push_code(&mut out, &mut chars, 4),
            Some('U') => push_code(&mut out, &mut chars, 8),
            Some(other) => {
                out.push('\\');
                out.push(other);
            },
            None => out.push('\\'),
        }
    }
    out
}

fn push_code(out: &mut String, chars: &mut std::str::Chars<'_>, digits: usize) {
    let code: String = chars.by_ref().take(digits).collect();
    match u32::from_str_radix(&code, 16).ok().and_then(char::from_u32) {
        Some(c) if code.len() == digits => out.push(c),
        _ => out.push_str(&code),
    }
}
