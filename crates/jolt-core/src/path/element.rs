use std::cmp::Ordering;

use crate::error::JoltError;
use crate::walked_path::{MatchedElement, WalkedPath};

use super::lexer::{
    self, contains_special, count_special, ends_with_special, escape_literal, matching_paren,
    starts_with_special, unescape, Lexeme,
};
use super::reference::{PathAndGroupReference, PathReference};
use super::star::{StarDouble, StarRegex, StarSingle};
use super::transpose::TransposeElement;
use super::GrammarError;

/// One parsed segment of a spec key or output path.
#[derive(Debug, Clone)]
pub enum PathElement {
    /// Matches exactly this key.
    Literal(String),
    /// `*`
    StarAll,
    /// `pre*post`
    StarSingle(StarSingle),
    /// `pre*mid*post`
    StarDouble(StarDouble),
    /// Three or more stars, or adjacent stars.
    StarRegex(StarRegex),
    /// Literal text with embedded `&` references, e.g. `photos-&(1,1)-bob`.
    Amp(AmpElement),
    /// `#value`: always matches and supplies `value` as the matched key.
    Hash(String),
    /// `$(n,k)`: supplies a captured key from `n` levels up as the matched key.
    Dollar(PathAndGroupReference),
    /// `@`: the current input node itself.
    At,
    /// `@(n,path)`: data found elsewhere in the input.
    Transpose(Box<TransposeElement>),
    /// `[...]` in an output path.
    ArrayIndex(ArrayIndex),
}

/// The flavours of `[...]`.
#[derive(Debug, Clone)]
pub enum ArrayIndex {
    /// `[]`: append.
    AutoExpand,
    /// `[3]`
    Explicit(usize),
    /// `[#2]`: the match counter of the frame two levels up.
    HashCount(PathReference),
    /// `[&(1,0)]`
    Reference(PathAndGroupReference),
    /// `[@(1,index)]`
    Transpose(Box<TransposeElement>),
}

#[derive(Debug, Clone)]
enum AmpToken {
    Literal(String),
    Reference(PathAndGroupReference),
}

#[derive(Debug, Clone)]
pub struct AmpElement {
    tokens: Vec<AmpToken>,
}

/// How a spec node's children get partitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ElementClass {
    Literal,
    Computed,
    Special,
    Index,
}

/// Parses one spec key into a [`PathElement`].
///
/// Classification is by marker characters in a fixed order: the `@` and
/// `*` singletons, `[...]`, `@...`, `$`, `&`, `*`, `#`, else literal.
pub fn parse_key(key: &str) -> Result<PathElement, GrammarError> {
    let lexemes = lexer::lex(key);
    let err = |message: &str| GrammarError::new(key, message);

    if lexemes.len() == 1 && lexemes[0].is('@') {
        return Ok(PathElement::At);
    }
    if lexemes.len() == 1 && lexemes[0].is('*') {
        return Ok(PathElement::StarAll);
    }
    if starts_with_special(&lexemes, '[') {
        return ArrayIndex::parse(key, &lexemes).map(PathElement::ArrayIndex);
    }
    if starts_with_special(&lexemes, '@') {
        return TransposeElement::parse(key).map(|t| PathElement::Transpose(Box::new(t)));
    }
    if contains_special(&lexemes, '@') {
        return Err(err("'@' is only valid at the start of a key"));
    }
    if contains_special(&lexemes, '$') {
        if !starts_with_special(&lexemes, '$') {
            return Err(err("'$' is only valid at the start of a key"));
        }
        return PathAndGroupReference::parse('$', &unescape(&lexemes))
            .map(PathElement::Dollar)
            .map_err(|m| GrammarError::new(key, m));
    }
    if contains_special(&lexemes, '[') || contains_special(&lexemes, ']') {
        return Err(err("'[' and ']' are only valid around a whole segment"));
    }
    if contains_special(&lexemes, '&') {
        if contains_special(&lexemes, '*') {
            return Err(err("'&' and '*' can not be mixed in one key"));
        }
        return AmpElement::parse(key, &lexemes).map(PathElement::Amp);
    }
    if contains_special(&lexemes, '*') {
        return parse_star(key, &lexemes);
    }
    if contains_special(&lexemes, '#') {
        if !starts_with_special(&lexemes, '#') {
            return Err(err("'#' is only valid at the start of a key"));
        }
        return parse_hash(key, &lexemes);
    }
    Ok(PathElement::Literal(unescape(&lexemes)))
}

fn parse_star(key: &str, lexemes: &[Lexeme]) -> Result<PathElement, GrammarError> {
    let parts: Vec<String> = lexemes
        .split(|l| l.is('*'))
        .map(unescape)
        .collect();
    match parts.len() {
        2 => {
            let mut parts = parts.into_iter();
            let prefix = parts.next().unwrap_or_default();
            let suffix = parts.next().unwrap_or_default();
            Ok(PathElement::StarSingle(StarSingle::new(prefix, suffix)))
        }
        3 if !parts[1].is_empty() => {
            let mut parts = parts.into_iter();
            let prefix = parts.next().unwrap_or_default();
            let mid = parts.next().unwrap_or_default();
            let suffix = parts.next().unwrap_or_default();
            Ok(PathElement::StarDouble(StarDouble::new(prefix, mid, suffix)))
        }
        _ => StarRegex::new(key, parts).map(PathElement::StarRegex),
    }
}

fn parse_hash(key: &str, lexemes: &[Lexeme]) -> Result<PathElement, GrammarError> {
    let body = &lexemes[1..];
    let body = if starts_with_special(body, '(') && ends_with_special(body, ')') && body.len() >= 2 {
        &body[1..body.len() - 1]
    } else {
        body
    };
    if body.is_empty() {
        return Err(GrammarError::new(key, "'#' needs a value, e.g. '#yes'"));
    }
    Ok(PathElement::Hash(unescape(body)))
}

impl ArrayIndex {
    fn parse(key: &str, lexemes: &[Lexeme]) -> Result<Self, GrammarError> {
        if count_special(lexemes, '[') != 1
            || count_special(lexemes, ']') != 1
            || !ends_with_special(lexemes, ']')
        {
            return Err(GrammarError::new(key, "array index must be a single '[...]'"));
        }
        let meat = &lexemes[1..lexemes.len() - 1];
        let text = unescape(meat);
        let map_err = |m: String| GrammarError::new(key, m);

        if meat.is_empty() {
            Ok(ArrayIndex::AutoExpand)
        } else if starts_with_special(meat, '&') {
            PathAndGroupReference::parse('&', &text)
                .map(ArrayIndex::Reference)
                .map_err(map_err)
        } else if starts_with_special(meat, '#') {
            PathReference::parse('#', &text)
                .map(ArrayIndex::HashCount)
                .map_err(map_err)
        } else if starts_with_special(meat, '@') {
            TransposeElement::parse(&lexer::reescape(meat))
                .map(|t| ArrayIndex::Transpose(Box::new(t)))
        } else if text.starts_with('-') {
            Err(GrammarError::new(key, "negative array index"))
        } else {
            text.parse::<usize>()
                .map(ArrayIndex::Explicit)
                .map_err(|_| GrammarError::new(key, format!("bad array index '{text}'")))
        }
    }

    pub fn canonical_form(&self) -> String {
        match self {
            ArrayIndex::AutoExpand => "[]".to_string(),
            ArrayIndex::Explicit(index) => format!("[{index}]"),
            ArrayIndex::HashCount(r) => format!("[{}]", r.canonical('#')),
            ArrayIndex::Reference(r) => format!("[{}]", r.canonical('&')),
            ArrayIndex::Transpose(t) => format!("[{}]", t.canonical_form()),
        }
    }

    fn evaluate(&self, walked: &WalkedPath<'_>) -> Result<Option<String>, JoltError> {
        let raw = match self {
            ArrayIndex::AutoExpand => return Ok(Some("[]".to_string())),
            ArrayIndex::Explicit(index) => return Ok(Some(index.to_string())),
            ArrayIndex::HashCount(r) => return Ok(Some(walked.hash_count(r)?.to_string())),
            ArrayIndex::Reference(r) => Some(walked.resolve(r, '&')?.to_string()),
            ArrayIndex::Transpose(t) => t.evaluate(walked)?,
        };
        // A key that is not an index is a data mismatch: no write.
        Ok(raw.filter(|k| k.parse::<usize>().is_ok()))
    }
}

impl AmpElement {
    fn parse(key: &str, lexemes: &[Lexeme]) -> Result<Self, GrammarError> {
        let mut tokens = Vec::new();
        let mut literal: Vec<Lexeme> = Vec::new();
        let mut i = 0;
        while i < lexemes.len() {
            if !lexemes[i].is('&') {
                literal.push(lexemes[i]);
                i += 1;
                continue;
            }
            if !literal.is_empty() {
                tokens.push(AmpToken::Literal(unescape(&literal)));
                literal.clear();
            }
            let start = i;
            i += 1;
            if lexemes.get(i).is_some_and(|l| l.is('(')) {
                let close = matching_paren(lexemes, i)
                    .ok_or_else(|| GrammarError::new(key, "unbalanced '&(' reference"))?;
                i = close + 1;
            } else {
                while i < lexemes.len() && !lexemes[i].escaped && lexemes[i].ch.is_ascii_digit() {
                    i += 1;
                }
            }
            let reference = PathAndGroupReference::parse('&', &unescape(&lexemes[start..i]))
                .map_err(|m| GrammarError::new(key, m))?;
            tokens.push(AmpToken::Reference(reference));
        }
        if !literal.is_empty() {
            tokens.push(AmpToken::Literal(unescape(&literal)));
        }
        Ok(Self { tokens })
    }

    /// Concatenates the literal text and the resolved references.
    pub fn evaluate(&self, walked: &WalkedPath<'_>) -> Result<String, JoltError> {
        let mut out = String::new();
        for token in &self.tokens {
            match token {
                AmpToken::Literal(text) => out.push_str(text),
                AmpToken::Reference(r) => out.push_str(walked.resolve(r, '&')?),
            }
        }
        Ok(out)
    }

    pub fn canonical_form(&self) -> String {
        self.tokens
            .iter()
            .map(|token| match token {
                AmpToken::Literal(text) => escape_literal(text),
                AmpToken::Reference(r) => r.canonical('&'),
            })
            .collect()
    }
}

impl PathElement {
    /// The sugar-free form; parsing it yields an equal element.
    pub fn canonical_form(&self) -> String {
        match self {
            PathElement::Literal(raw) => escape_literal(raw),
            PathElement::StarAll => "*".to_string(),
            PathElement::StarSingle(s) => s.canonical_form(),
            PathElement::StarDouble(s) => s.canonical_form(),
            PathElement::StarRegex(s) => s.canonical_form(),
            PathElement::Amp(a) => a.canonical_form(),
            PathElement::Hash(value) => format!("#({})", escape_literal(value)),
            PathElement::Dollar(r) => r.canonical('$'),
            PathElement::At => "@".to_string(),
            PathElement::Transpose(t) => t.canonical_form(),
            PathElement::ArrayIndex(a) => a.canonical_form(),
        }
    }

    pub(crate) fn class(&self) -> ElementClass {
        match self {
            PathElement::Literal(_) => ElementClass::Literal,
            PathElement::StarAll
            | PathElement::StarSingle(_)
            | PathElement::StarDouble(_)
            | PathElement::StarRegex(_)
            | PathElement::Amp(_) => ElementClass::Computed,
            PathElement::Hash(_)
            | PathElement::Dollar(_)
            | PathElement::At
            | PathElement::Transpose(_) => ElementClass::Special,
            PathElement::ArrayIndex(_) => ElementClass::Index,
        }
    }

    /// Whether this element can produce a concrete key in an output path.
    pub fn is_evaluatable(&self) -> bool {
        matches!(
            self,
            PathElement::Literal(_)
                | PathElement::Amp(_)
                | PathElement::Transpose(_)
                | PathElement::ArrayIndex(_)
        )
    }

    /// Whether this is one of the plain `*` forms whose match set is known
    /// without a walked path.
    pub fn is_simple_star(&self) -> bool {
        matches!(
            self,
            PathElement::StarAll | PathElement::StarSingle(_) | PathElement::StarDouble(_)
        )
    }

    /// Matches `key` without consulting a walked path. References and
    /// specials never match statically.
    pub fn string_matches(&self, key: &str) -> bool {
        match self {
            PathElement::Literal(raw) => raw == key,
            PathElement::StarAll => true,
            PathElement::StarSingle(s) => s.capture(key).is_some(),
            PathElement::StarDouble(s) => s.captures(key).is_some(),
            PathElement::StarRegex(s) => s.captures(key).is_some(),
            _ => false,
        }
    }

    /// Matches an input key, producing the captured sub-keys.
    pub fn matches(
        &self,
        key: &str,
        walked: &WalkedPath<'_>,
    ) -> Result<Option<MatchedElement>, JoltError> {
        Ok(match self {
            PathElement::Literal(raw) => (raw == key).then(|| MatchedElement::new(key)),
            PathElement::StarAll => Some(MatchedElement::new(key)),
            PathElement::StarSingle(s) => s
                .capture(key)
                .map(|c| MatchedElement::with_captures(key, vec![c.to_string()])),
            PathElement::StarDouble(s) => s.captures(key).map(|(a, b)| {
                MatchedElement::with_captures(key, vec![a.to_string(), b.to_string()])
            }),
            PathElement::StarRegex(s) => s
                .captures(key)
                .map(|caps| MatchedElement::with_captures(key, caps)),
            PathElement::Amp(a) => {
                let evaluated = a.evaluate(walked)?;
                (evaluated == key).then(|| MatchedElement::new(key))
            }
            PathElement::Hash(value) => Some(MatchedElement::new(value.as_str())),
            PathElement::Dollar(r) => Some(MatchedElement::new(walked.resolve(r, '$')?)),
            PathElement::At | PathElement::Transpose(_) => {
                walked.last().map(|step| step.matched().clone())
            }
            PathElement::ArrayIndex(_) => None,
        })
    }

    /// Evaluates an output-path element to a concrete key. `None` means the
    /// data needed is absent and nothing should be written.
    pub fn evaluate(&self, walked: &WalkedPath<'_>) -> Result<Option<String>, JoltError> {
        match self {
            PathElement::Literal(raw) => Ok(Some(raw.clone())),
            PathElement::Amp(a) => a.evaluate(walked).map(Some),
            PathElement::Transpose(t) => t.evaluate(walked),
            PathElement::ArrayIndex(a) => a.evaluate(walked),
            _ => Ok(None),
        }
    }

    /// Priority among computed siblings, lower first.
    fn computed_rank(&self) -> u8 {
        match self {
            PathElement::Amp(_) => 0,
            PathElement::StarDouble(_) | PathElement::StarRegex(_) => 1,
            PathElement::StarSingle(_) => 2,
            PathElement::StarAll => 3,
            _ => 4,
        }
    }
}

/// Orders computed siblings most specific first: by kind, then longer
/// canonical form, then alphabetically.
pub(crate) fn compare_computed(a: &PathElement, b: &PathElement) -> Ordering {
    let (ca, cb) = (a.canonical_form(), b.canonical_form());
    a.computed_rank()
        .cmp(&b.computed_rank())
        .then_with(|| cb.len().cmp(&ca.len()))
        .then_with(|| ca.cmp(&cb))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(key: &str) -> PathElement {
        parse_key(key).unwrap()
    }

    fn walked_with(keys: &[MatchedElement]) -> WalkedPath<'static> {
        let mut walked = WalkedPath::new(16);
        for key in keys {
            walked.push(None, key.clone()).unwrap();
        }
        walked
    }

    #[test]
    fn test_classification() {
        assert!(matches!(parse("@"), PathElement::At));
        assert!(matches!(parse("*"), PathElement::StarAll));
        assert!(matches!(parse("tuna-*"), PathElement::StarSingle(_)));
        assert!(matches!(parse("a*b*c"), PathElement::StarDouble(_)));
        assert!(matches!(parse("a**"), PathElement::StarRegex(_)));
        assert!(matches!(parse("*a*b*"), PathElement::StarRegex(_)));
        assert!(matches!(parse("photo-&1"), PathElement::Amp(_)));
        assert!(matches!(parse("#yes"), PathElement::Hash(ref v) if v == "yes"));
        assert!(matches!(parse("$1"), PathElement::Dollar(_)));
        assert!(matches!(parse("@(1,a)"), PathElement::Transpose(_)));
        assert!(matches!(parse("[]"), PathElement::ArrayIndex(ArrayIndex::AutoExpand)));
        assert!(matches!(parse("[#2]"), PathElement::ArrayIndex(ArrayIndex::HashCount(_))));
        assert!(matches!(parse("[&1]"), PathElement::ArrayIndex(ArrayIndex::Reference(_))));
        assert!(matches!(parse("[7]"), PathElement::ArrayIndex(ArrayIndex::Explicit(7))));
        assert!(matches!(parse("rating"), PathElement::Literal(ref r) if r == "rating"));
    }

    #[test]
    fn test_escapes_make_literals() {
        assert!(matches!(parse(r"a\*b"), PathElement::Literal(ref r) if r == "a*b"));
        assert!(matches!(parse(r"\@"), PathElement::Literal(ref r) if r == "@"));
        assert!(matches!(parse(r"\$price"), PathElement::Literal(ref r) if r == "$price"));
        assert!(matches!(parse(r"x\.y"), PathElement::Literal(ref r) if r == "x.y"));
    }

    #[test]
    fn test_invalid_keys() {
        for key in ["a&*", "a@b", "a$1", "a[0]", "[0][1]", "[-1]", "[x]", "a#b", "#", "&(-1)", "@(1,@a)"] {
            assert!(parse_key(key).is_err(), "expected '{key}' to be rejected");
        }
    }

    #[test]
    fn test_canonical_forms() {
        assert_eq!(parse("&").canonical_form(), "&(0,0)");
        assert_eq!(parse("photos-&1-bob").canonical_form(), "photos-&(1,0)-bob");
        assert_eq!(parse("$").canonical_form(), "$(0,0)");
        assert_eq!(parse("#yes").canonical_form(), "#(yes)");
        assert_eq!(parse("[#1]").canonical_form(), "[#(1)]");
        assert_eq!(parse("[&]").canonical_form(), "[&(0,0)]");
        assert_eq!(parse("@1").canonical_form(), "@(1,)");
        assert_eq!(parse("@(2,a.b)").canonical_form(), "@(2,a.b)");
        assert_eq!(parse(r"a\.b").canonical_form(), r"a\.b");
    }

    #[test]
    fn test_canonical_round_trip() {
        for key in [
            "&(1,2)", "a-&(0,1)-b", "$(2,1)", "#(x)", "@", "*", "a*", "*b", "a*b*c", "**",
            "@(1,)", "@(0,a.&(1,0))", "[]", "[3]", "[#(2)]", "[&(1,1)]", r"lit\*eral", r"\#x",
        ] {
            let canonical = parse(key).canonical_form();
            assert_eq!(canonical, key);
            assert_eq!(parse(&canonical).canonical_form(), canonical);
        }
    }

    #[test]
    fn test_amp_matches_evaluated_key() {
        let walked = walked_with(&[
            MatchedElement::new("root"),
            MatchedElement::with_captures("tuna-A", vec!["A".into()]),
        ]);
        let amp = parse("tag-&(0,1)");
        assert!(amp.matches("tag-A", &walked).unwrap().is_some());
        assert!(amp.matches("tag-B", &walked).unwrap().is_none());
        assert!(parse("&(0,2)").matches("x", &walked).is_err());
    }

    #[test]
    fn test_star_double_captures() {
        let walked = walked_with(&[]);
        let matched = parse("tuna-*-marlin-*")
            .matches("tuna-A-marlin-AAA", &walked)
            .unwrap()
            .unwrap();
        assert_eq!(matched.sub_key(0), Some("tuna-A-marlin-AAA"));
        assert_eq!(matched.sub_key(1), Some("A"));
        assert_eq!(matched.sub_key(2), Some("AAA"));
    }

    #[test]
    fn test_array_index_evaluates_only_indices() {
        let walked = walked_with(&[MatchedElement::new("photos"), MatchedElement::new("3")]);
        assert_eq!(parse("[&0]").evaluate(&walked).unwrap(), Some("3".to_string()));
        assert_eq!(parse("[&1]").evaluate(&walked).unwrap(), None);
        assert_eq!(parse("[#1]").evaluate(&walked).unwrap(), Some("0".to_string()));
    }

    #[test]
    fn test_computed_priority() {
        let mut elements = vec![parse("*"), parse("a*"), parse("&1"), parse("a*b*c"), parse("ab*")];
        elements.sort_by(compare_computed);
        let order: Vec<String> = elements.iter().map(|e| e.canonical_form()).collect();
        assert_eq!(order, vec!["&(1,0)", "a*b*c", "ab*", "a*", "*"]);
    }
}
