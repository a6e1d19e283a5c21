//! Route pattern parsing.
//!
//! A pattern such as `/assets/:kind/*file` is split on `/` into segments. Empty
//! segments are dropped, so `//a/` and `/a` are the same. A segment starting with
//! `*` ends the pattern: everything after it is ignored.

use std::fmt;

/// One `/`-delimited component of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Matches exactly this text.
    Literal(String),
    /// `:name`, matches exactly one path segment.
    Param(String),
    /// `*name` or a bare `*`, matches the rest of the path.
    Wildcard(Option<String>),
}

impl Segment {
    /// Classifies a raw token by its first character.
    pub fn parse(token: &str) -> Self {
        if let Some(name) = token.strip_prefix(':') {
            Segment::Param(name.to_string())
        } else if let Some(name) = token.strip_prefix('*') {
            Segment::Wildcard((!name.is_empty()).then(|| name.to_string()))
        } else {
            Segment::Literal(token.to_string())
        }
    }

    /// Param and wildcard segments match any path segment.
    #[inline]
    pub fn is_wild(&self) -> bool {
        !matches!(self, Segment::Literal(_))
    }

    #[inline]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Segment::Wildcard(_))
    }

    /// Whether this segment accepts `part` from a request path.
    #[inline]
    pub fn matches(&self, part: &str) -> bool {
        match self {
            Segment::Literal(literal) => literal == part,
            Segment::Param(_) | Segment::Wildcard(_) => true,
        }
    }

    /// Whether `other` occupies the same trie slot as `self`.
    ///
    /// Params share one slot whatever their names, so do wildcards.
    #[inline]
    pub(crate) fn same_slot(&self, other: &Segment) -> bool {
        match (self, other) {
            (Segment::Literal(a), Segment::Literal(b)) => a == b,
            (Segment::Param(_), Segment::Param(_)) | (Segment::Wildcard(_), Segment::Wildcard(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(literal) => f.write_str(literal),
            Segment::Param(name) => write!(f, ":{name}"),
            Segment::Wildcard(Some(name)) => write!(f, "*{name}"),
            Segment::Wildcard(None) => f.write_str("*"),
        }
    }
}

/// Splits on `/`, dropping empty tokens and stopping after the first token that
/// starts with `*`.
///
/// Request paths go through the same splitter, so a path segment starting with
/// `*` also ends the path.
pub fn split_segments(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    for part in s.split('/').filter(|part| !part.is_empty()) {
        parts.push(part);
        if part.starts_with('*') {
            break;
        }
    }
    parts
}

/// Parses a route pattern into its segments.
pub fn parse_pattern(pattern: &str) -> Vec<Segment> {
    split_segments(pattern).into_iter().map(Segment::parse).collect()
}

/// Whether the pattern has tokens after its wildcard, which [`parse_pattern`] ignores.
pub(crate) fn has_ignored_tail(pattern: &str) -> bool {
    let total = pattern.split('/').filter(|part| !part.is_empty()).count();
    total != split_segments(pattern).len()
}

#[cfg(test)]
mod tests {
    use super::{Segment, has_ignored_tail, parse_pattern, split_segments};

    fn literal(s: &str) -> Segment {
        Segment::Literal(s.into())
    }

    #[test]
    fn test_split_collapses_slashes() {
        assert_eq!(split_segments("/"), Vec::<&str>::new());
        assert_eq!(split_segments(""), Vec::<&str>::new());
        assert_eq!(split_segments("//p///go/"), vec!["p", "go"]);
    }

    #[test]
    fn test_split_stops_at_wildcard() {
        assert_eq!(split_segments("/assets/*file/ignored/too"), vec!["assets", "*file"]);
        assert_eq!(split_segments("/static/*"), vec!["static", "*"]);
    }

    #[test]
    fn test_parse_segments() {
        assert_eq!(
            parse_pattern("/p/:lang/doc"),
            vec![literal("p"), Segment::Param("lang".into()), literal("doc")]
        );
        assert_eq!(parse_pattern("/assets/*file"), vec![literal("assets"), Segment::Wildcard(Some("file".into()))]);
        assert_eq!(parse_pattern("/*"), vec![Segment::Wildcard(None)]);
        assert_eq!(parse_pattern("/:"), vec![Segment::Param(String::new())]);
    }

    #[test]
    fn test_segment_matches() {
        assert!(literal("doc").matches("doc"));
        assert!(!literal("doc").matches("docs"));
        assert!(Segment::Param("lang".into()).matches("go"));
        assert!(Segment::Wildcard(None).matches("anything"));
    }

    #[test]
    fn test_same_slot() {
        assert!(Segment::Param("a".into()).same_slot(&Segment::Param("b".into())));
        assert!(Segment::Wildcard(None).same_slot(&Segment::Wildcard(Some("f".into()))));
        assert!(!Segment::Param("a".into()).same_slot(&Segment::Wildcard(Some("a".into()))));
        assert!(!literal(":a").same_slot(&Segment::Param("a".into())));
    }

    #[test]
    fn test_display_round_trips_token() {
        for token in ["doc", ":lang", "*file", "*"] {
            assert_eq!(Segment::parse(token).to_string(), token);
        }
    }

    #[test]
    fn test_ignored_tail() {
        assert!(has_ignored_tail("/a/*b/c"));
        assert!(!has_ignored_tail("/a/*b"));
        assert!(!has_ignored_tail("/a//b/"));
    }
}
