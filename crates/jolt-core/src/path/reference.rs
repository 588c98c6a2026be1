//! Back-reference grammar shared by `&`, `$` and `#` tokens.
//!
//! `&`, `&3`, `&(3)` and `&(3,2)` all normalize to a
//! `(path_index, key_group)` pair: walk `path_index` frames up the walked
//! path, then take captured sub-key `key_group` (0 = the whole match).

/// A `(path_index, key_group)` reference, e.g. `&(1,2)` or `$(0,1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PathAndGroupReference {
    pub path_index: usize,
    pub key_group: usize,
}

/// A reference to a walked-path frame only, as used by `[#2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PathReference {
    pub path_index: usize,
}

impl PathAndGroupReference {
    /// Parses `token` followed by an optional `n`, `(n)` or `(n,k)`.
    pub(crate) fn parse(token: char, text: &str) -> Result<Self, String> {
        let body = strip_token(token, text)?;
        if body.is_empty() {
            return Ok(Self::default());
        }
        if let Some(inner) = body.strip_prefix('(').and_then(|b| b.strip_suffix(')')) {
            let parts: Vec<&str> = inner.split(',').collect();
            return match parts.as_slice() {
                [p] => Ok(Self {
                    path_index: parse_index(p)?,
                    key_group: 0,
                }),
                [p, k] => Ok(Self {
                    path_index: parse_index(p)?,
                    key_group: parse_index(k)?,
                }),
                _ => Err(format!(
                    "reference '{text}' takes at most two numbers: ({token}path,group)"
                )),
            };
        }
        Ok(Self {
            path_index: parse_index(body)?,
            key_group: 0,
        })
    }

    /// Canonical text with the given leading token, e.g. `&(1,2)`.
    pub fn canonical(&self, token: char) -> String {
        format!("{token}({},{})", self.path_index, self.key_group)
    }
}

impl PathReference {
    pub(crate) fn parse(token: char, text: &str) -> Result<Self, String> {
        let body = strip_token(token, text)?;
        if body.is_empty() {
            return Ok(Self::default());
        }
        let body = body
            .strip_prefix('(')
            .and_then(|b| b.strip_suffix(')'))
            .unwrap_or(body);
        Ok(Self {
            path_index: parse_index(body)?,
        })
    }

    pub fn canonical(&self, token: char) -> String {
        format!("{token}({})", self.path_index)
    }
}

fn strip_token(token: char, text: &str) -> Result<&str, String> {
    text.strip_prefix(token)
        .ok_or_else(|| format!("reference '{text}' must start with '{token}'"))
}

fn parse_index(raw: &str) -> Result<usize, String> {
    let raw = raw.trim();
    if raw.starts_with('-') {
        return Err(format!("negative reference index '{raw}'"));
    }
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("reference index '{raw}' is not a non-negative integer"));
    }
    raw.parse()
        .map_err(|_| format!("reference index '{raw}' is too large"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amp(text: &str) -> PathAndGroupReference {
        PathAndGroupReference::parse('&', text).unwrap()
    }

    #[test]
    fn test_sugar_forms_normalize() {
        let zero = PathAndGroupReference::default();
        assert_eq!(amp("&"), zero);
        assert_eq!(amp("&0"), zero);
        assert_eq!(amp("&(0)"), zero);
        assert_eq!(amp("&(0,0)"), zero);
        assert_eq!(
            amp("&(3,2)"),
            PathAndGroupReference {
                path_index: 3,
                key_group: 2
            }
        );
        assert_eq!(amp("&12").path_index, 12);
    }

    #[test]
    fn test_negative_and_malformed_rejected() {
        assert!(PathAndGroupReference::parse('&', "&(-1)").is_err());
        assert!(PathAndGroupReference::parse('&', "&(1,-2)").is_err());
        assert!(PathAndGroupReference::parse('&', "&-1").is_err());
        assert!(PathAndGroupReference::parse('&', "&(1,2,3)").is_err());
        assert!(PathAndGroupReference::parse('&', "&(a)").is_err());
        assert!(PathAndGroupReference::parse('$', "&1").is_err());
    }

    #[test]
    fn test_canonical() {
        assert_eq!(amp("&2").canonical('&'), "&(2,0)");
        assert_eq!(amp("&(1,1)").canonical('$'), "$(1,1)");
        let hash = PathReference::parse('#', "#3").unwrap();
        assert_eq!(hash.canonical('#'), "#(3)");
        assert_eq!(PathReference::parse('#', "#(2)").unwrap().path_index, 2);
        assert_eq!(PathReference::parse('#', "#").unwrap().path_index, 0);
    }
}
