//! Wildcard matchers, from the cheap prefix/suffix check to the regex
//! fallback.
//!
//! Every `*` must capture at least one character.

use regex::Regex;

use super::lexer::escape_literal;
use super::GrammarError;

/// `pre*post`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarSingle {
    prefix: String,
    suffix: String,
}

/// `pre*mid*post`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarDouble {
    prefix: String,
    mid: String,
    suffix: String,
}

/// Three or more stars, or two adjacent ones.
#[derive(Debug, Clone)]
pub struct StarRegex {
    parts: Vec<String>,
    regex: Regex,
}

impl StarSingle {
    pub(crate) fn new(prefix: String, suffix: String) -> Self {
        Self { prefix, suffix }
    }

    /// The single capture, when `key` fits.
    pub fn capture<'k>(&self, key: &'k str) -> Option<&'k str> {
        if key.len() > self.prefix.len() + self.suffix.len()
            && key.starts_with(&self.prefix)
            && key.ends_with(&self.suffix)
        {
            Some(&key[self.prefix.len()..key.len() - self.suffix.len()])
        } else {
            None
        }
    }

    pub fn canonical_form(&self) -> String {
        format!(
            "{}*{}",
            escape_literal(&self.prefix),
            escape_literal(&self.suffix)
        )
    }
}

impl StarDouble {
    pub(crate) fn new(prefix: String, mid: String, suffix: String) -> Self {
        Self { prefix, mid, suffix }
    }

    /// Both captures, splitting at the leftmost `mid` that leaves each star
    /// at least one character.
    pub fn captures<'k>(&self, key: &'k str) -> Option<(&'k str, &'k str)> {
        if key.len() < self.prefix.len() + self.mid.len() + self.suffix.len() + 2
            || !key.starts_with(&self.prefix)
            || !key.ends_with(&self.suffix)
        {
            return None;
        }
        let middle = &key[self.prefix.len()..key.len() - self.suffix.len()];
        middle
            .char_indices()
            .skip(1)
            .map(|(i, _)| i)
            .find(|&i| {
                middle[i..].starts_with(&self.mid) && i + self.mid.len() < middle.len()
            })
            .map(|i| (&middle[..i], &middle[i + self.mid.len()..]))
    }

    pub fn canonical_form(&self) -> String {
        format!(
            "{}*{}*{}",
            escape_literal(&self.prefix),
            escape_literal(&self.mid),
            escape_literal(&self.suffix)
        )
    }
}

impl StarRegex {
    pub(crate) fn new(key: &str, parts: Vec<String>) -> Result<Self, GrammarError> {
        let mut pattern = String::from("^");
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                pattern.push_str("(.+?)");
            }
            pattern.push_str(&regex::escape(part));
        }
        pattern.push('$');
        let regex = Regex::new(&pattern)
            .map_err(|e| GrammarError::new(key, format!("wildcard does not compile: {e}")))?;
        Ok(Self { parts, regex })
    }

    pub fn captures(&self, key: &str) -> Option<Vec<String>> {
        let caps = self.regex.captures(key)?;
        Some(
            caps.iter()
                .skip(1)
                .map(|m| m.map_or_else(String::new, |m| m.as_str().to_string()))
                .collect(),
        )
    }

    pub fn canonical_form(&self) -> String {
        self.parts
            .iter()
            .map(|p| escape_literal(p))
            .collect::<Vec<_>>()
            .join("*")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_requires_one_char() {
        let star = StarSingle::new("tuna-".into(), "".into());
        assert_eq!(star.capture("tuna-A"), Some("A"));
        assert_eq!(star.capture("tuna-"), None);
        assert_eq!(star.capture("marlin-A"), None);

        let star = StarSingle::new("a".into(), "a".into());
        assert_eq!(star.capture("aa"), None);
        assert_eq!(star.capture("aba"), Some("b"));
    }

    #[test]
    fn test_double_leftmost_split() {
        let star = StarDouble::new("tuna-".into(), "-marlin-".into(), "".into());
        assert_eq!(star.captures("tuna-A-marlin-AAA"), Some(("A", "AAA")));
        assert_eq!(star.captures("tuna--marlin-AAA"), None);
        assert_eq!(star.captures("tuna-A-marlin-"), None);

        let star = StarDouble::new("".into(), "-".into(), "".into());
        assert_eq!(star.captures("a-b-c"), Some(("a", "b-c")));
        assert_eq!(star.captures("-a-b"), Some(("-a", "b")));
    }

    #[test]
    fn test_double_overlapping_mid() {
        let star = StarDouble::new("".into(), "aa".into(), "".into());
        assert_eq!(star.captures("xaaay"), Some(("x", "ay")));
        assert_eq!(star.captures("aaaX"), Some(("a", "X")));
    }

    #[test]
    fn test_regex_three_stars() {
        let star = StarRegex::new(
            "a*b*c*",
            vec!["a".into(), "b".into(), "c".into(), "".into()],
        )
        .unwrap();
        assert_eq!(
            star.captures("a1b2c3"),
            Some(vec!["1".to_string(), "2".to_string(), "3".to_string()])
        );
        assert_eq!(star.captures("abc3"), None);
        assert_eq!(star.canonical_form(), "a*b*c*");
    }

    #[test]
    fn test_regex_escapes_literal_parts() {
        let star = StarRegex::new("x.**", vec!["x.".into(), "".into(), "".into()]).unwrap();
        assert!(star.captures("x.ab").is_some());
        assert!(star.captures("xyab").is_none());
        assert_eq!(star.canonical_form(), r"x\.**");
    }
}
