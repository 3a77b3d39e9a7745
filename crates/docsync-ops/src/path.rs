//! Path tracking for the delta walk.
//!
//! A [`PathStack`] mirrors the walker's position in the *old* tree. Rendered
//! paths are the base pointer followed by `/`-separated segments; keys are
//! escaped as in RFC 6901 (`~` as `~0`, `/` as `~1`) so that a rendered path
//! splits back into the same segments.

use std::borrow::Cow;
use std::fmt;

use crate::error::{TranslateError, TranslateResult};

/// One step below the base pointer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => f.write_str(&escape_key(key)),
            Segment::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::Key(key.to_string())
    }
}

impl From<String> for Segment {
    fn from(key: String) -> Self {
        Segment::Key(key)
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Segment::Index(index)
    }
}

/// Stack of segments below a fixed base pointer.
#[derive(Clone, Debug)]
pub struct PathStack {
    base: String,
    segments: Vec<Segment>,
}

impl PathStack {
    /// Create an empty stack rooted at `base`.
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            segments: Vec::new(),
        }
    }

    /// Descend into a keyed or indexed child.
    pub fn enter_child(&mut self, segment: impl Into<Segment>) {
        self.segments.push(segment.into());
    }

    /// Return from the most recently entered child.
    pub fn leave_child(&mut self) -> TranslateResult<Segment> {
        self.segments.pop().ok_or(TranslateError::StackUnderflow)
    }

    /// The address of the current position.
    pub fn current_path(&self) -> String {
        let mut path = self.base.clone();
        for segment in &self.segments {
            path.push('/');
            path.push_str(&segment.to_string());
        }
        path
    }

    /// Number of segments currently pushed.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// The base pointer this stack is rooted at.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

/// Escape a key for use as a path segment.
pub fn escape_key(key: &str) -> Cow<'_, str> {
    if key.contains(|c: char| c == '~' || c == '/') {
        Cow::Owned(key.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(key)
    }
}

/// Undo [`escape_key`].
pub fn unescape_segment(raw: &str) -> Cow<'_, str> {
    if raw.contains('~') {
        Cow::Owned(raw.replace("~1", "/").replace("~0", "~"))
    } else {
        Cow::Borrowed(raw)
    }
}

/// Split a rendered path into its unescaped segments below `base`.
///
/// Returns `None` if `path` does not start with `base` on a segment boundary.
/// The base pointer itself yields an empty list.
pub fn split_path(path: &str, base: &str) -> Option<Vec<String>> {
    let rest = path.strip_prefix(base)?;
    if rest.is_empty() {
        return Some(Vec::new());
    }
    let rest = rest.strip_prefix('/')?;
    Some(
        rest.split('/')
            .map(|raw| unescape_segment(raw).into_owned())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_path_joins_segments() {
        let mut stack = PathStack::new("doc");
        assert_eq!(stack.current_path(), "doc");
        stack.enter_child("content");
        stack.enter_child(3usize);
        stack.enter_child("text");
        assert_eq!(stack.current_path(), "doc/content/3/text");
        assert_eq!(stack.depth(), 3);
    }

    #[test]
    fn leave_child_pops_in_order() {
        let mut stack = PathStack::new("doc");
        stack.enter_child("a");
        stack.enter_child(0usize);
        assert_eq!(stack.leave_child().unwrap(), Segment::Index(0));
        assert_eq!(stack.current_path(), "doc/a");
        assert_eq!(stack.leave_child().unwrap(), Segment::Key("a".into()));
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn leave_child_on_empty_stack_underflows() {
        let mut stack = PathStack::new("doc");
        assert!(matches!(
            stack.leave_child(),
            Err(TranslateError::StackUnderflow)
        ));
    }

    #[test]
    fn keys_are_escaped() {
        let mut stack = PathStack::new("doc");
        stack.enter_child("a/b");
        stack.enter_child("c~d");
        assert_eq!(stack.current_path(), "doc/a~1b/c~0d");
    }

    #[test]
    fn split_path_round_trips_escaping() {
        let segments = split_path("doc/a~1b/c~0d/2", "doc").unwrap();
        assert_eq!(segments, vec!["a/b", "c~d", "2"]);
        assert_eq!(unescape_segment("~01"), "~1");
    }

    #[test]
    fn split_path_requires_segment_boundary() {
        assert_eq!(split_path("doc", "doc").unwrap(), Vec::<String>::new());
        assert!(split_path("document/a", "doc").is_none());
        assert!(split_path("other/a", "doc").is_none());
    }

    #[test]
    fn empty_base_renders_leading_separator() {
        let mut stack = PathStack::new("");
        stack.enter_child("a");
        assert_eq!(stack.current_path(), "/a");
        assert_eq!(split_path("/a", "").unwrap(), vec!["a"]);
    }
}
