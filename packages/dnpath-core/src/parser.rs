//! Distinguished-name parser
//!
//! Grammar: `TYPE=value` tokens separated by `,`. Leading `OU`/`CN` tokens
//! form the hierarchy; every remaining token belongs to the root. Type codes
//! are matched case-sensitively. A backslash escapes the next character, so
//! `OU=Sales\, EMEA` is a single token.

use crate::domain::{ParsedPath, PathSegment, SegmentKind};
use crate::error::FormatError;

/// Parse `path` into its root and hierarchy segments
///
/// # Examples
///
/// ```rust
/// use dnpath_core::parser::parse;
///
/// let parsed = parse("OU=a,OU=b,DC=x,DC=y").unwrap();
/// assert_eq!(parsed.root, "DC=x,DC=y");
/// assert_eq!(parsed.segments[0].name, "a");
/// assert_eq!(parsed.segments[1].name, "b");
/// ```
pub fn parse(path: &str) -> Result<ParsedPath, FormatError> {
    if path.trim().is_empty() {
        return Err(FormatError::Empty);
    }

    let mut segments = Vec::new();
    let mut root: Vec<String> = Vec::new();

    for (position, token) in split_tokens(path).into_iter().enumerate() {
        if has_dangling_escape(&token) {
            return Err(FormatError::MalformedToken { token, position });
        }

        let (code, value) = split_type(&token).ok_or_else(|| FormatError::MalformedToken {
            token: token.clone(),
            position,
        })?;

        if value.is_empty() {
            return Err(FormatError::EmptyValue { token });
        }

        match SegmentKind::from_type_code(code) {
            Some(kind) => {
                if !root.is_empty() {
                    return Err(FormatError::MisplacedSegment { token });
                }
                let name = value.to_string();
                segments.push(PathSegment::new(kind, name, token));
            }
            None => root.push(token),
        }
    }

    if root.is_empty() {
        return Err(FormatError::MissingRoot {
            path: path.to_string(),
        });
    }

    Ok(ParsedPath {
        root: root.join(","),
        segments,
    })
}

/// Split on unescaped commas, trimming unescaped whitespace around each token
///
/// Escape sequences are kept verbatim in the returned tokens, so `OU=a\ `
/// keeps its escaped trailing space.
pub fn split_tokens(path: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    // bytes of `current` up to and including the last escaped character
    let mut escaped_len = 0;
    let mut chars = path.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                    escaped_len = current.len();
                }
            }
            ',' => {
                tokens.push(trim_unescaped(&current, escaped_len));
                current.clear();
                escaped_len = 0;
            }
            _ => current.push(c),
        }
    }
    tokens.push(trim_unescaped(&current, escaped_len));

    tokens
}

fn trim_unescaped(token: &str, escaped_len: usize) -> String {
    let end = token.trim_end().len().max(escaped_len);
    token[..end].trim_start().to_string()
}

/// A trailing backslash with nothing left to escape
fn has_dangling_escape(token: &str) -> bool {
    token.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// `TYPE=value` → (`TYPE`, `value`)
fn split_type(token: &str) -> Option<(&str, &str)> {
    let (code, value) = token.split_once('=')?;
    let valid_code = !code.is_empty()
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    valid_code.then_some((code, value))
}

/// DNS-style domain name from the `DC` components of a root
///
/// `DC=corp,DC=example` → `corp.example`. `None` when the root carries no
/// `DC` component.
pub fn domain_hint(root: &str) -> Option<String> {
    let labels: Vec<String> = split_tokens(root)
        .iter()
        .filter_map(|t| split_type(t))
        .filter(|(code, _)| code.eq_ignore_ascii_case("DC"))
        .map(|(_, value)| value.to_string())
        .collect();

    if labels.is_empty() {
        None
    } else {
        Some(labels.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_two_ous() {
        let parsed = parse("OU=a,OU=b,DC=x,DC=y").unwrap();

        assert_eq!(parsed.root, "DC=x,DC=y");
        assert_eq!(
            parsed.segments,
            vec![
                PathSegment::new(SegmentKind::Container, "a", "OU=a"),
                PathSegment::new(SegmentKind::Container, "b", "OU=b"),
            ]
        );
    }

    #[test]
    fn test_parse_cn_is_non_container() {
        let parsed = parse("CN=svc,OU=b,DC=x,DC=y").unwrap();

        assert_eq!(parsed.segments[0].kind, SegmentKind::NonContainer);
        assert_eq!(parsed.segments[0].name, "svc");
        assert_eq!(parsed.segments[0].raw, "CN=svc");
        assert_eq!(parsed.segments[1].kind, SegmentKind::Container);
    }

    #[test]
    fn test_parse_root_only() {
        let parsed = parse("DC=x,DC=y").unwrap();
        assert_eq!(parsed.root, "DC=x,DC=y");
        assert!(parsed.is_root_only());
    }

    #[test]
    fn test_parse_non_dc_root_tokens() {
        let parsed = parse("OU=Eng,O=Acme,C=US").unwrap();
        assert_eq!(parsed.root, "O=Acme,C=US");
        assert_eq!(parsed.segments.len(), 1);
    }

    #[test]
    fn test_parse_type_codes_case_sensitive() {
        // lowercase `ou` is not a hierarchy code, so it lands in the root
        let parsed = parse("ou=a,DC=x").unwrap();
        assert!(parsed.segments.is_empty());
        assert_eq!(parsed.root, "ou=a,DC=x");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let parsed = parse("OU=a, OU=b , DC=x").unwrap();
        assert_eq!(parsed.to_dn(), "OU=a,OU=b,DC=x");
    }

    #[test]
    fn test_parse_escaped_comma() {
        let parsed = parse(r"OU=Sales\, EMEA,DC=x,DC=y").unwrap();

        assert_eq!(parsed.segments.len(), 1);
        assert_eq!(parsed.segments[0].name, r"Sales\, EMEA");
        assert_eq!(parsed.segments[0].raw, r"OU=Sales\, EMEA");
        assert_eq!(parsed.root, "DC=x,DC=y");
    }

    #[test]
    fn test_parse_escaped_trailing_space() {
        let parsed = parse(r"OU=a\ ,DC=x,DC=y").unwrap();

        assert_eq!(parsed.segments[0].raw, r"OU=a\ ");
        assert_eq!(parsed.segments[0].name, r"a\ ");
        assert_eq!(parsed.to_dn(), r"OU=a\ ,DC=x,DC=y");
        assert_eq!(parse(&parsed.to_dn()).unwrap(), parsed);
    }

    #[test]
    fn test_parse_escaped_backslash_then_space() {
        // `\\` escapes the backslash, the space after it is unescaped
        let parsed = parse(r"OU=a\\ ,DC=x").unwrap();
        assert_eq!(parsed.segments[0].raw, r"OU=a\\");
    }

    #[test]
    fn test_parse_dangling_escape() {
        assert_eq!(
            parse(r"OU=a,DC=x\"),
            Err(FormatError::MalformedToken {
                token: r"DC=x\".to_string(),
                position: 1,
            })
        );
        assert!(matches!(
            parse(r"OU=a\"),
            Err(FormatError::MalformedToken { position: 0, .. })
        ));
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse(""), Err(FormatError::Empty));
        assert_eq!(parse("   "), Err(FormatError::Empty));
    }

    #[test]
    fn test_parse_malformed_token() {
        assert_eq!(
            parse("OU=a,garbage,DC=x"),
            Err(FormatError::MalformedToken {
                token: "garbage".to_string(),
                position: 1,
            })
        );
        assert!(matches!(
            parse("OU=a,,DC=x"),
            Err(FormatError::MalformedToken { position: 1, .. })
        ));
        assert!(matches!(
            parse("OU=a,DC=x,"),
            Err(FormatError::MalformedToken { position: 2, .. })
        ));
        assert!(matches!(
            parse("=a,DC=x"),
            Err(FormatError::MalformedToken { position: 0, .. })
        ));
    }

    #[test]
    fn test_parse_empty_value() {
        assert_eq!(
            parse("OU=,DC=x"),
            Err(FormatError::EmptyValue {
                token: "OU=".to_string()
            })
        );
    }

    #[test]
    fn test_parse_misplaced_segment() {
        assert_eq!(
            parse("OU=a,DC=x,OU=b"),
            Err(FormatError::MisplacedSegment {
                token: "OU=b".to_string()
            })
        );
    }

    #[test]
    fn test_parse_missing_root() {
        assert!(matches!(
            parse("OU=a,OU=b"),
            Err(FormatError::MissingRoot { .. })
        ));
    }

    #[test]
    fn test_from_str() {
        let parsed: ParsedPath = "OU=a,DC=x".parse().unwrap();
        assert_eq!(parsed.root, "DC=x");
    }

    #[test]
    fn test_split_tokens_keeps_escapes() {
        assert_eq!(
            split_tokens(r"CN=a\,b,DC=x"),
            vec![r"CN=a\,b".to_string(), "DC=x".to_string()]
        );
    }

    #[test]
    fn test_split_tokens_keeps_escaped_whitespace() {
        assert_eq!(
            split_tokens(r" OU=a\  , DC=x "),
            vec![r"OU=a\ ".to_string(), "DC=x".to_string()]
        );
    }

    #[test]
    fn test_domain_hint() {
        assert_eq!(
            domain_hint("DC=corp,DC=example").as_deref(),
            Some("corp.example")
        );
        assert_eq!(domain_hint("O=Acme,C=US"), None);
    }
}
