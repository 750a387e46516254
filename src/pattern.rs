//! Compiled path patterns.
//!
//! A pattern is the registered path split on `/`. Segments starting with `:`
//! are named parameters, everything else must match literally.

use std::collections::HashMap;

/// Marks a segment as a named parameter: `/users/:id`.
pub const PARAM_PREFIX: char = ':';

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Segment {
    Static(String),
    Param(String),
}

/// A path template compiled once at registration time.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Pattern {
    segments: Vec<Segment>,
}

impl Pattern {
    /// Never fails. Empty segments are literals, so `//a` and `/a/` are
    /// valid (if unusual) patterns.
    pub(crate) fn compile(path: &str) -> Self {
        let segments = split(path)
            .map(|seg| match seg.strip_prefix(PARAM_PREFIX) {
                Some(name) => Segment::Param(name.to_owned()),
                None => Segment::Static(seg.to_owned()),
            })
            .collect();
        Self { segments }
    }

    /// Returns the extracted parameters when `path` has the same segment
    /// count and every static segment is equal.
    ///
    /// Values are the raw path segments. Repeated names keep the last value.
    pub(crate) fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let parts: Vec<&str> = split(path).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Static(lit) if lit != part => return None,
                Segment::Static(_) => {}
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_owned());
                }
            }
        }
        Some(params)
    }
}

fn split(path: &str) -> std::str::Split<'_, char> {
    path.split('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_static_and_param_segments() {
        let p = Pattern::compile("/users/:id");
        assert_eq!(
            p.segments,
            vec![
                Segment::Static(String::new()),
                Segment::Static("users".into()),
                Segment::Param("id".into()),
            ]
        );
    }

    #[test]
    fn extracts_params_verbatim() {
        let p = Pattern::compile("/users/:id/posts/:post");
        let params = p.matches("/users/a%20b/posts/007").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params["id"], "a%20b");
        assert_eq!(params["post"], "007");
    }

    #[test]
    fn segment_count_must_be_equal() {
        let p = Pattern::compile("/users/:id");
        assert!(p.matches("/users").is_none());
        assert!(p.matches("/users/1/2").is_none());
        assert!(p.matches("/users/1/").is_none());
    }

    #[test]
    fn static_segments_are_case_sensitive() {
        let p = Pattern::compile("/Users/:id");
        assert!(p.matches("/users/1").is_none());
        assert!(p.matches("/Users/1").is_some());
    }

    #[test]
    fn query_string_is_part_of_the_literal_path() {
        let p = Pattern::compile("/search");
        assert!(p.matches("/search?q=x").is_none());

        let p = Pattern::compile("/items/:id");
        assert_eq!(p.matches("/items/3?full=1").unwrap()["id"], "3?full=1");
    }

    #[test]
    fn repeated_param_name_keeps_last_value() {
        let p = Pattern::compile("/:x/:x");
        assert_eq!(p.matches("/first/second").unwrap()["x"], "second");
    }

    #[test]
    fn irregular_patterns_still_compile() {
        let p = Pattern::compile("//a/");
        assert!(p.matches("//a/").is_some());
        assert!(p.matches("/a").is_none());

        let p = Pattern::compile("/:");
        assert_eq!(p.matches("/v").unwrap()[""], "v");
    }

    #[test]
    fn root_pattern() {
        let p = Pattern::compile("/");
        assert!(p.matches("/").unwrap().is_empty());
        assert!(p.matches("").is_none());
    }
}
