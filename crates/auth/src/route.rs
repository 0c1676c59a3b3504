//! Parameterized route patterns.
//!
//! A pattern such as `/students/:id` is compiled once into a list of segments.
//! Literal segments are kept verbatim and compared by equality, so text that
//! would be syntax in a regex or glob (`.`, `*`, `(`, `\`) is never treated as
//! anything but itself. Matching is fixed-arity: no wildcard or greedy segments.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const PARAM_PREFIX: char = ':';

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("route pattern is empty")]
    Empty,

    #[error("route pattern '{pattern}' has a parameter segment without a name")]
    UnnamedParameter { pattern: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    source: String,
    segments: Vec<Segment>,
}

/// Values captured by the `:name` segments of a matched pattern.
pub type RouteParams = BTreeMap<String, String>;

impl RoutePattern {
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }

        let segments = pattern
            .split('/')
            .map(|seg| match seg.strip_prefix(PARAM_PREFIX) {
                Some("") => Err(PatternError::UnnamedParameter {
                    pattern: pattern.to_string(),
                }),
                Some(name) => Ok(Segment::Param(name.to_string())),
                None => Ok(Segment::Literal(seg.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Names of the parameter segments, in order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        let mut parts = path.split('/');
        for segment in &self.segments {
            let Some(part) = parts.next() else {
                return false;
            };
            if !segment_matches(segment, part) {
                return false;
            }
        }
        parts.next().is_none()
    }

    /// Like [`matches`](Self::matches), returning the captured parameters.
    pub fn captures(&self, path: &str) -> Option<RouteParams> {
        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = RouteParams::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            if !segment_matches(segment, part) {
                return None;
            }
            if let Segment::Param(name) = segment {
                params.insert(name.clone(), part.to_string());
            }
        }
        Some(params)
    }
}

fn segment_matches(segment: &Segment, part: &str) -> bool {
    match segment {
        Segment::Literal(lit) => lit == part,
        Segment::Param(_) => !part.is_empty(),
    }
}

/// Match an uncompiled pattern against a concrete path.
///
/// A pattern that fails to compile matches nothing.
pub fn matches(pattern: &str, path: &str) -> bool {
    RoutePattern::parse(pattern).is_ok_and(|p| p.matches(path))
}

impl core::fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.source)
    }
}

impl core::str::FromStr for RoutePattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for RoutePattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for RoutePattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(s: &str) -> RoutePattern {
        RoutePattern::parse(s).unwrap()
    }

    #[test]
    fn literal_pattern_matches_identical_path() {
        assert!(pattern("/students").matches("/students"));
        assert!(!pattern("/students").matches("/Students"));
        assert!(!pattern("/students").matches("/student"));
    }

    #[test]
    fn param_segment_matches_one_non_empty_segment() {
        let p = pattern("/students/:id");
        assert!(p.matches("/students/42"));
        assert!(!p.matches("/students/"));
        assert!(!p.matches("/students/42/grades"));
        assert!(!p.matches("/students"));
    }

    #[test]
    fn trailing_slash_is_not_normalized() {
        assert!(!pattern("/courses").matches("/courses/"));
    }

    #[test]
    fn root_pattern_matches_only_root() {
        let p = pattern("/");
        assert!(p.matches("/"));
        assert!(!p.matches("/x"));
        assert!(!p.matches(""));
    }

    #[test]
    fn metacharacters_in_literals_are_not_syntax() {
        let p = pattern("/files/a.b/(x)*");
        assert!(p.matches("/files/a.b/(x)*"));
        assert!(!p.matches("/files/aXb/(x)*"));
        assert!(!p.matches("/files/a.b/xxx"));

        for meta in [".", "*", ".*", "+", "?", "[", "\\", "$", "^", "|", "("] {
            let lit = format!("/q/{meta}");
            assert!(pattern(&lit).matches(&lit), "{meta} should match itself");
            assert!(!pattern(&lit).matches("/q/anything"), "{meta} should not be a wildcard");
        }
    }

    #[test]
    fn captures_named_segments() {
        let p = pattern("/companies/:company/teams/:team");
        let params = p.captures("/companies/acme/teams/7").unwrap();
        assert_eq!(params.get("company").map(String::as_str), Some("acme"));
        assert_eq!(params.get("team").map(String::as_str), Some("7"));
        assert!(p.captures("/companies/acme/teams").is_none());
        assert_eq!(p.param_names().collect::<Vec<_>>(), vec!["company", "team"]);
    }

    #[test]
    fn rejects_empty_and_unnamed_patterns() {
        assert_eq!(RoutePattern::parse(""), Err(PatternError::Empty));
        assert!(matches!(
            RoutePattern::parse("/students/:"),
            Err(PatternError::UnnamedParameter { .. })
        ));
        assert!(!matches("/students/:", "/students/1"));
    }

    #[test]
    fn free_function_matches_like_compiled_pattern() {
        assert!(matches("/students/:id", "/students/42"));
        assert!(!matches("/students/:id", "/students/42/grades"));
    }

    #[test]
    fn deserialize_rejects_invalid_pattern() {
        let ok: RoutePattern = serde_json::from_str("\"/a/:b\"").unwrap();
        assert_eq!(ok.as_str(), "/a/:b");
        assert!(serde_json::from_str::<RoutePattern>("\"/a/:\"").is_err());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn literal() -> impl Strategy<Value = String> {
            "[a-z0-9.*+?()\\[\\]$^|-]{1,8}"
        }

        fn template() -> impl Strategy<Value = Vec<Option<String>>> {
            prop::collection::vec(prop::option::of(literal()), 1..6)
        }

        fn render(parts: &[Option<String>]) -> String {
            parts
                .iter()
                .enumerate()
                .map(|(i, p)| match p {
                    Some(lit) => format!("/{lit}"),
                    None => format!("/:p{i}"),
                })
                .collect()
        }

        proptest! {
            /// Property: substituting any non-empty, slash-free value for each
            /// parameter yields a matching path.
            #[test]
            fn substituted_paths_match(
                parts in template(),
                values in prop::collection::vec("[^/]{1,10}", 6)
            ) {
                let p = RoutePattern::parse(&render(&parts)).unwrap();
                let path: String = parts
                    .iter()
                    .zip(values.iter())
                    .map(|(part, value)| match part {
                        Some(lit) => format!("/{lit}"),
                        None => format!("/{value}"),
                    })
                    .collect();
                prop_assert!(p.matches(&path));
                prop_assert!(p.captures(&path).is_some());
            }

            /// Property: a different segment count never matches.
            #[test]
            fn arity_mismatch_never_matches(
                parts in template(),
                extra in "[^/]{1,10}"
            ) {
                let rendered = render(&parts);
                let p = RoutePattern::parse(&rendered).unwrap();
                let longer = format!("{rendered}/{extra}");
                prop_assert!(!p.matches(&longer));
            }
        }
    }
}
