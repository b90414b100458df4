//! Resolved XML names and path-segment parsing.

use std::fmt;

/// A resolved XML name: optional namespace URI plus local part.
///
/// Names compare by resolved namespace, not by prefix, so the same element
/// matches regardless of which prefix the server happened to bind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct XmlName {
    namespace: Option<String>,
    local: String,
}

impl XmlName {
    /// A name with no namespace.
    pub fn local(local: impl Into<String>) -> Self {
        XmlName {
            namespace: None,
            local: local.into(),
        }
    }

    /// A name in the given namespace.
    pub fn namespaced(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        XmlName {
            namespace: Some(namespace.into()),
            local: local.into(),
        }
    }

    /// Parses a single path segment in Clark notation: `{uri}local` or a
    /// plain local name.
    ///
    /// # Panics
    ///
    /// Panics on a malformed segment (unclosed brace, empty local part).
    /// Path expressions are compile-time constants on entity types, so a
    /// malformed segment is a programming error.
    pub fn parse(segment: &str) -> Self {
        if let Some(rest) = segment.strip_prefix('{') {
            let close = rest
                .find('}')
                .unwrap_or_else(|| panic!("malformed XML name `{segment}`: unclosed `{{`"));
            let (ns, local) = rest.split_at(close);
            let local = &local[1..];
            if local.is_empty() {
                panic!("malformed XML name `{segment}`: empty local part");
            }
            XmlName::namespaced(ns, local)
        } else {
            if segment.is_empty() {
                panic!("malformed XML name: empty segment");
            }
            XmlName::local(segment)
        }
    }

    /// The namespace URI, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The local part of the name.
    pub fn local_name(&self) -> &str {
        &self.local
    }
}

impl fmt::Display for XmlName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{ns}}}{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// Compile-time root-tag constant for an entity type.
///
/// The root tag must exactly match the wire format for a fetched document to
/// be recognized as that entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XmlTag {
    /// Namespace URI of the root element, if namespaced.
    pub namespace: Option<&'static str>,
    /// Local name of the root element.
    pub local: &'static str,
}

impl XmlTag {
    /// A namespaced tag.
    pub const fn namespaced(namespace: &'static str, local: &'static str) -> Self {
        XmlTag {
            namespace: Some(namespace),
            local,
        }
    }

    /// A tag with no namespace.
    pub const fn local(local: &'static str) -> Self {
        XmlTag {
            namespace: None,
            local,
        }
    }

    /// Whether `name` resolves to this tag.
    pub fn matches(&self, name: &XmlName) -> bool {
        self.local == name.local_name() && self.namespace == name.namespace()
    }

    /// The owned [`XmlName`] form of this tag.
    pub fn to_name(&self) -> XmlName {
        XmlName {
            namespace: self.namespace.map(str::to_owned),
            local: self.local.to_owned(),
        }
    }
}

impl fmt::Display for XmlTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.namespace {
            Some(ns) => write!(f, "{{{ns}}}{}", self.local),
            None => f.write_str(self.local),
        }
    }
}

/// Splits a path expression into parsed segments.
///
/// `.` segments are dropped (`.` alone addresses the current node). Splitting
/// is brace-aware: a `/` inside a `{uri}` namespace does not separate
/// segments.
///
/// # Panics
///
/// Panics on malformed paths (empty segment, `..`). Paths are compile-time
/// constants, so this is a programming error rather than a recoverable
/// condition.
pub(crate) fn parse_path(path: &str) -> Vec<XmlName> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for ch in path.chars() {
        match ch {
            '{' => {
                depth += 1;
                current.push(ch);
            }
            '}' => {
                depth = depth
                    .checked_sub(1)
                    .unwrap_or_else(|| panic!("malformed XML path `{path}`: unbalanced `}}`"));
                current.push(ch);
            }
            '/' if depth == 0 => {
                push_segment(path, &mut segments, &mut current);
            }
            _ => current.push(ch),
        }
    }
    push_segment(path, &mut segments, &mut current);
    segments
}

fn push_segment(path: &str, segments: &mut Vec<XmlName>, current: &mut String) {
    let segment = std::mem::take(current);
    match segment.as_str() {
        "." => {}
        "" => panic!("malformed XML path `{path}`: empty segment"),
        ".." => panic!("malformed XML path `{path}`: parent traversal is not supported"),
        _ => segments.push(XmlName::parse(&segment)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_and_clark_segments() {
        let segs = parse_path("location/value");
        assert_eq!(segs, vec![XmlName::local("location"), XmlName::local("value")]);

        let segs = parse_path("./{http://genologics.com/ri/file}file");
        assert_eq!(
            segs,
            vec![XmlName::namespaced("http://genologics.com/ri/file", "file")]
        );
    }

    #[test]
    fn dot_is_current_node() {
        assert!(parse_path(".").is_empty());
        assert_eq!(parse_path("./qc-flag"), vec![XmlName::local("qc-flag")]);
    }

    #[test]
    fn namespace_uri_slashes_do_not_split() {
        let segs = parse_path("{http://a/b/c}x/y");
        assert_eq!(
            segs,
            vec![XmlName::namespaced("http://a/b/c", "x"), XmlName::local("y")]
        );
    }

    #[test]
    #[should_panic(expected = "empty segment")]
    fn empty_segment_panics() {
        parse_path("a//b");
    }

    #[test]
    #[should_panic(expected = "parent traversal")]
    fn parent_traversal_panics() {
        parse_path("../sample");
    }

    #[test]
    fn display_is_clark_notation() {
        let name = XmlName::namespaced("http://genologics.com/ri/artifact", "artifact");
        assert_eq!(
            name.to_string(),
            "{http://genologics.com/ri/artifact}artifact"
        );
        assert_eq!(XmlName::local("type").to_string(), "type");
    }

    #[test]
    fn tag_matches_resolved_name() {
        const TAG: XmlTag = XmlTag::namespaced("http://genologics.com/ri/artifact", "artifact");
        assert!(TAG.matches(&XmlName::namespaced(
            "http://genologics.com/ri/artifact",
            "artifact"
        )));
        assert!(!TAG.matches(&XmlName::local("artifact")));
    }
}
