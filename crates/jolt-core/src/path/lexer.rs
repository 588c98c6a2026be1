//! Escape-aware scanning of spec keys and dot-notation paths.
//!
//! A backslash makes the following character literal: `a\.b` is the single
//! key `a.b`, `\*` is a literal star. Everything downstream works on
//! [`Lexeme`]s so "is this `*` special?" is a field check rather than a
//! look-behind.

use super::GrammarError;

/// Characters that carry meaning somewhere in the path grammar.
const SPECIAL: &[char] = &['\\', '.', '*', '&', '@', '$', '#', '[', ']', '|', '(', ')', ','];

/// Characters that must be re-escaped when a literal is written back out in
/// canonical form.
const CANONICAL_ESCAPES: &[char] = &['\\', '.', '*', '&', '@', '$', '#', '[', ']', '|'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Lexeme {
    pub ch: char,
    pub escaped: bool,
}

impl Lexeme {
    /// True when this is an unescaped `ch`.
    pub fn is(&self, ch: char) -> bool {
        !self.escaped && self.ch == ch
    }
}

/// Splits `key` into lexemes. A trailing lone backslash is kept as a literal
/// backslash.
pub(crate) fn lex(key: &str) -> Vec<Lexeme> {
    let mut out = Vec::with_capacity(key.len());
    let mut chars = key.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some(next) => out.push(Lexeme {
                    ch: next,
                    escaped: true,
                }),
                None => out.push(Lexeme {
                    ch: '\\',
                    escaped: true,
                }),
            }
        } else {
            out.push(Lexeme { ch, escaped: false });
        }
    }
    out
}

pub(crate) fn count_special(lexemes: &[Lexeme], ch: char) -> usize {
    lexemes.iter().filter(|l| l.is(ch)).count()
}

pub(crate) fn contains_special(lexemes: &[Lexeme], ch: char) -> bool {
    lexemes.iter().any(|l| l.is(ch))
}

pub(crate) fn starts_with_special(lexemes: &[Lexeme], ch: char) -> bool {
    lexemes.first().is_some_and(|l| l.is(ch))
}

pub(crate) fn ends_with_special(lexemes: &[Lexeme], ch: char) -> bool {
    lexemes.last().is_some_and(|l| l.is(ch))
}

/// The plain text of `lexemes` with escapes removed.
pub(crate) fn unescape(lexemes: &[Lexeme]) -> String {
    lexemes.iter().map(|l| l.ch).collect()
}

/// Writes `lexemes` back out, keeping escapes on anything that could be
/// mistaken for grammar.
pub(crate) fn reescape(lexemes: &[Lexeme]) -> String {
    let mut out = String::with_capacity(lexemes.len());
    for l in lexemes {
        if l.escaped && SPECIAL.contains(&l.ch) {
            out.push('\\');
        }
        out.push(l.ch);
    }
    out
}

/// Canonical text of a literal: every grammar character is escaped.
pub(crate) fn escape_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if CANONICAL_ESCAPES.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Splits a key at unescaped `|` outside parentheses (`a|b` → `a`, `b`).
///
/// Alternatives keep their escapes; each is parsed on its own afterwards.
pub(crate) fn split_or(key: &str) -> Vec<String> {
    let lexemes = lex(key);
    let mut parts = Vec::new();
    let mut current: Vec<Lexeme> = Vec::new();
    let mut depth = 0usize;
    for l in lexemes {
        if l.is('(') {
            depth += 1;
        } else if l.is(')') {
            depth = depth.saturating_sub(1);
        } else if l.is('|') && depth == 0 {
            parts.push(reescape(&current));
            current.clear();
            continue;
        }
        current.push(l);
    }
    parts.push(reescape(&current));
    parts
}

/// Splits a dot-notation path into its segments.
///
/// - unescaped `.` separates segments; empty segments are dropped
/// - `a[0]` is sugar for `a.[0]`
/// - `@(...)` forms are kept whole, dots and all
/// - `@abc.def` is sugar for `@(abc).def`
///
/// Segments keep their escapes so the element parser still sees them.
pub fn split_dot_notation(path: &str) -> Result<Vec<String>, GrammarError> {
    let lexemes = insert_bracket_dots(lex(path));
    let mut segments = Vec::new();
    let mut current: Vec<Lexeme> = Vec::new();
    let mut i = 0;

    while i < lexemes.len() {
        let l = lexemes[i];
        if l.is('.') {
            flush(&mut segments, &mut current);
            i += 1;
        } else if l.is('@') {
            current.push(l);
            i += 1;
            if lexemes.get(i).is_some_and(|n| n.is('(')) {
                let close = matching_paren(&lexemes, i).ok_or_else(|| {
                    GrammarError::new(path, "unbalanced parentheses in '@(...)'")
                })?;
                current.extend_from_slice(&lexemes[i..=close]);
                i = close + 1;
            } else {
                let start = i;
                while i < lexemes.len() && !lexemes[i].is('.') && !lexemes[i].is(']') {
                    i += 1;
                }
                if i > start {
                    current.push(Lexeme {
                        ch: '(',
                        escaped: false,
                    });
                    current.extend_from_slice(&lexemes[start..i]);
                    current.push(Lexeme {
                        ch: ')',
                        escaped: false,
                    });
                } else if lexemes.get(i).is_some_and(|n| n.is('.')) {
                    return Err(GrammarError::new(path, "'@' may not be followed by '.'"));
                }
            }
        } else {
            current.push(l);
            i += 1;
        }
    }
    flush(&mut segments, &mut current);
    Ok(segments)
}

fn flush(segments: &mut Vec<String>, current: &mut Vec<Lexeme>) {
    if !current.is_empty() {
        segments.push(reescape(current));
        current.clear();
    }
}

/// `a[0][1]` → `a.[0].[1]`; a bracket that already follows `.` or `@` or
/// starts the path is left alone.
fn insert_bracket_dots(lexemes: Vec<Lexeme>) -> Vec<Lexeme> {
    let mut out: Vec<Lexeme> = Vec::with_capacity(lexemes.len() + 2);
    let mut depth = 0usize;
    for l in lexemes {
        if l.is('(') {
            depth += 1;
        } else if l.is(')') {
            depth = depth.saturating_sub(1);
        } else if l.is('[') && depth == 0 {
            if let Some(prev) = out.last() {
                if !prev.is('.') && !prev.is('@') {
                    out.push(Lexeme {
                        ch: '.',
                        escaped: false,
                    });
                }
            }
        }
        out.push(l);
    }
    out
}

/// Index of the `)` closing the `(` at `open`, counting only unescaped parens.
pub(crate) fn matching_paren(lexemes: &[Lexeme], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, l) in lexemes.iter().enumerate().skip(open) {
        if l.is('(') {
            depth += 1;
        } else if l.is(')') {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}
