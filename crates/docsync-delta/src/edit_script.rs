//! Character-level edit scripts.
//!
//! An [`EditScript`] is the ordered list of equal/insert/delete spans that
//! turns an old string into a new one when scanned left to right. Lengths are
//! counted in `char`s throughout.

use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};

use crate::error::{DiffError, DiffResult};

/// A single span of an edit script.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum EditStep {
    /// Text present in both strings.
    Equal(String),
    /// Text present only in the new string.
    Insert(String),
    /// Text present only in the old string.
    Delete(String),
}

impl EditStep {
    /// The text carried by this step.
    pub fn text(&self) -> &str {
        match self {
            EditStep::Equal(t) | EditStep::Insert(t) | EditStep::Delete(t) => t,
        }
    }

    /// Length of the step's text in characters.
    pub fn char_len(&self) -> usize {
        self.text().chars().count()
    }

    fn same_kind(&self, other: &EditStep) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    fn text_mut(&mut self) -> &mut String {
        match self {
            EditStep::Equal(t) | EditStep::Insert(t) | EditStep::Delete(t) => t,
        }
    }
}

/// An ordered sequence of [`EditStep`]s.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditScript {
    steps: Vec<EditStep>,
}

impl EditScript {
    /// Create an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a script from raw steps, keeping them exactly as given.
    pub fn from_steps(steps: Vec<EditStep>) -> Self {
        Self { steps }
    }

    /// Compute the character-level script turning `old` into `new`.
    pub fn between(old: &str, new: &str) -> Self {
        let diff = TextDiff::from_chars(old, new);
        let mut script = Self::new();
        for change in diff.iter_all_changes() {
            let text = change.value().to_string();
            script.push(match change.tag() {
                ChangeTag::Equal => EditStep::Equal(text),
                ChangeTag::Insert => EditStep::Insert(text),
                ChangeTag::Delete => EditStep::Delete(text),
            });
        }
        script
    }

    /// Append a step, coalescing it with the previous step of the same kind.
    /// Empty steps are dropped.
    pub fn push(&mut self, step: EditStep) {
        if step.text().is_empty() {
            return;
        }
        match self.steps.last_mut() {
            Some(last) if last.same_kind(&step) => last.text_mut().push_str(step.text()),
            _ => self.steps.push(step),
        }
    }

    /// The steps in scan order.
    pub fn steps(&self) -> &[EditStep] {
        &self.steps
    }

    /// Returns `true` if the script has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if the script changes anything.
    pub fn has_changes(&self) -> bool {
        self.steps
            .iter()
            .any(|s| !matches!(s, EditStep::Equal(_)) && !s.text().is_empty())
    }

    /// The old string described by the script (equal + deleted spans).
    pub fn old_text(&self) -> String {
        self.steps
            .iter()
            .filter(|s| !matches!(s, EditStep::Insert(_)))
            .map(EditStep::text)
            .collect()
    }

    /// The new string described by the script (equal + inserted spans).
    pub fn new_text(&self) -> String {
        self.steps
            .iter()
            .filter(|s| !matches!(s, EditStep::Delete(_)))
            .map(EditStep::text)
            .collect()
    }

    /// Apply the script to `old`, returning `None` if the script's equal and
    /// deleted spans do not match `old` exactly.
    pub fn apply(&self, old: &str) -> Option<String> {
        let mut pos = 0usize;
        let mut out = String::with_capacity(old.len());
        for step in &self.steps {
            match step {
                EditStep::Equal(t) | EditStep::Delete(t) => {
                    if !old[pos..].starts_with(t.as_str()) {
                        return None;
                    }
                    pos += t.len();
                    if let EditStep::Equal(t) = step {
                        out.push_str(t);
                    }
                }
                EditStep::Insert(t) => out.push_str(t),
            }
        }
        (pos == old.len()).then_some(out)
    }

    /// Parse diff-match-patch patch text (as embedded in jsondiffpatch text
    /// deltas) into a complete script over `old`.
    ///
    /// Hunk coordinates count UTF-16 code units, and hunk starts after the
    /// first are expressed against the text with the earlier hunks already
    /// applied. Both are mapped back onto `old`'s characters here; the
    /// resulting script is in characters like every other script.
    pub fn from_patch_text(patch: &str, old: &str) -> DiffResult<Self> {
        let old_chars: Vec<char> = old.chars().collect();
        // utf16_offsets[i] is the UTF-16 offset of char i.
        let mut utf16_offsets = Vec::with_capacity(old_chars.len() + 1);
        let mut offset = 0usize;
        utf16_offsets.push(offset);
        for c in &old_chars {
            offset += c.len_utf16();
            utf16_offsets.push(offset);
        }

        let mut script = Self::new();
        let mut cursor = 0usize;
        let mut shift = 0isize;
        let mut lines = patch.lines().peekable();

        while let Some(header) = lines.next() {
            if header.is_empty() {
                continue;
            }
            let start = parse_hunk_start(header).ok_or_else(|| {
                DiffError::malformed("", format!("invalid patch hunk header: {header:?}"))
            })?;
            let start = usize::try_from(start as isize - shift)
                .ok()
                .and_then(|unit| utf16_offsets.binary_search(&unit).ok())
                .filter(|&start| start >= cursor)
                .ok_or_else(|| {
                    DiffError::malformed(
                        "",
                        format!("patch hunk {header:?} does not fit the original text"),
                    )
                })?;
            script.push(EditStep::Equal(old_chars[cursor..start].iter().collect()));
            cursor = start;

            let mut consumed = 0usize;
            let mut produced = 0usize;
            while let Some(body) = lines.next_if(|l| !l.starts_with("@@")) {
                let mut chars = body.chars();
                let Some(sign) = chars.next() else {
                    continue;
                };
                let text = decode_uri(chars.as_str()).ok_or_else(|| {
                    DiffError::malformed("", format!("invalid escape in patch line {body:?}"))
                })?;
                let len = text.chars().count();
                let units = text.encode_utf16().count();
                match sign {
                    ' ' | '-' => {
                        let matches = old_chars
                            .get(cursor..cursor + len)
                            .is_some_and(|span| span.iter().copied().eq(text.chars()));
                        if !matches {
                            return Err(DiffError::malformed(
                                "",
                                format!("patch context {text:?} does not match the original text"),
                            ));
                        }
                        cursor += len;
                        consumed += units;
                        if sign == ' ' {
                            produced += units;
                            script.push(EditStep::Equal(text));
                        } else {
                            script.push(EditStep::Delete(text));
                        }
                    }
                    '+' => {
                        produced += units;
                        script.push(EditStep::Insert(text));
                    }
                    other => {
                        return Err(DiffError::malformed(
                            "",
                            format!("unknown patch line prefix {other:?}"),
                        ));
                    }
                }
            }
            shift += produced as isize - consumed as isize;
        }

        script.push(EditStep::Equal(old_chars[cursor..].iter().collect()));
        Ok(script)
    }
}

impl IntoIterator for EditScript {
    type Item = EditStep;
    type IntoIter = std::vec::IntoIter<EditStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}

impl<'a> IntoIterator for &'a EditScript {
    type Item = &'a EditStep;
    type IntoIter = std::slice::Iter<'a, EditStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

/// Zero-based start of a hunk in the (partially patched) old text.
///
/// `@@ -s,l +s2,l2 @@` is one-based, except that a zero-length range names
/// the position directly.
fn parse_hunk_start(header: &str) -> Option<usize> {
    let coords = header.strip_prefix("@@ -")?.strip_suffix(" @@")?;
    let (old_coords, _) = coords.split_once(" +")?;
    match old_coords.split_once(',') {
        Some((start, "0")) => start.parse().ok(),
        Some((start, len)) => {
            len.parse::<usize>().ok()?;
            start.parse::<usize>().ok()?.checked_sub(1)
        }
        None => old_coords.parse::<usize>().ok()?.checked_sub(1),
    }
}

/// Undo the `encodeURI` escaping diff-match-patch applies to patch lines.
fn decode_uri(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = raw.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eq(t: &str) -> EditStep {
        EditStep::Equal(t.into())
    }
    fn ins(t: &str) -> EditStep {
        EditStep::Insert(t.into())
    }
    fn del(t: &str) -> EditStep {
        EditStep::Delete(t.into())
    }

    #[test]
    fn identical_strings_only_equal() {
        let script = EditScript::between("same", "same");
        assert_eq!(script.steps(), &[eq("same")]);
        assert!(!script.has_changes());
    }

    #[test]
    fn between_reconstructs_both_sides() {
        let script = EditScript::between("hello world", "help, world!");
        assert_eq!(script.old_text(), "hello world");
        assert_eq!(script.new_text(), "help, world!");
        assert_eq!(script.apply("hello world").as_deref(), Some("help, world!"));
    }

    #[test]
    fn between_coalesces_adjacent_steps() {
        let script = EditScript::between("abc", "xyz");
        assert_eq!(script.steps(), &[del("abc"), ins("xyz")]);
    }

    #[test]
    fn push_drops_empty_and_merges() {
        let mut script = EditScript::new();
        script.push(eq(""));
        script.push(eq("ab"));
        script.push(eq("c"));
        script.push(ins("x"));
        assert_eq!(script.steps(), &[eq("abc"), ins("x")]);
    }

    #[test]
    fn char_len_counts_characters() {
        assert_eq!(del("héllo").char_len(), 5);
        assert_eq!(ins("").char_len(), 0);
    }

    #[test]
    fn apply_rejects_mismatched_old() {
        let script = EditScript::from_steps(vec![eq("hel"), del("lo"), ins("p")]);
        assert_eq!(script.apply("hello").as_deref(), Some("help"));
        assert!(script.apply("jello").is_none());
        assert!(script.apply("hello!").is_none());
    }

    #[test]
    fn patch_text_single_hunk() {
        let patch = "@@ -1,5 +1,4 @@\n hel\n-lo\n+p\n";
        let script = EditScript::from_patch_text(patch, "hello").unwrap();
        assert_eq!(script.steps(), &[eq("hel"), del("lo"), ins("p")]);
    }

    #[test]
    fn patch_text_adds_leading_and_trailing_context() {
        let old = "the quick brown fox jumps";
        let patch = "@@ -10,7 +10,7 @@\n k \n-brown\n+red\n  f\n";
        let script = EditScript::from_patch_text(patch, old);
        // Hunk context must line up with the original text.
        assert!(script.is_err());

        let patch = "@@ -8,9 +8,7 @@\n ck \n-brown\n+red\n  f\n";
        let script = EditScript::from_patch_text(patch, old).unwrap();
        assert_eq!(script.old_text(), old);
        assert_eq!(script.new_text(), "the quick red fox jumps");
    }

    #[test]
    fn patch_text_later_hunks_are_shifted() {
        let old = "abcdefghijklmnopqrstuvwxyz";
        let patch = "@@ -1,2 +1,4 @@\n a\n+XY\n b\n@@ -26,3 +26,3 @@\n x\n-y\n+Y\n z\n";
        let script = EditScript::from_patch_text(patch, old).unwrap();
        assert_eq!(script.old_text(), old);
        assert_eq!(script.new_text(), "aXYbcdefghijklmnopqrstuvwxYz");
    }

    #[test]
    fn patch_text_decodes_escapes() {
        let patch = "@@ -1,3 +1,5 @@\n a\n+%25%0A\n bc\n";
        let script = EditScript::from_patch_text(patch, "abc").unwrap();
        assert_eq!(script.new_text(), "a%\nbc");
    }

    #[test]
    fn patch_text_hunk_after_astral_char() {
        // The emoji is two UTF-16 units, so the hunk starts at unit 2 (char 1).
        let patch = "@@ -3,6 +3,5 @@\n  hel\n-lo\n+p\n";
        let script = EditScript::from_patch_text(patch, "😀 hello").unwrap();
        assert_eq!(script.steps(), &[eq("😀 hel"), del("lo"), ins("p")]);
        assert_eq!(script.new_text(), "😀 help");
    }

    #[test]
    fn patch_text_astral_insert_shifts_later_hunks() {
        let old = "abcdefghij";
        let patch = "@@ -1,2 +1,4 @@\n a\n+%F0%9F%98%80\n b\n@@ -11,2 +11,2 @@\n i\n-j\n+J\n";
        let script = EditScript::from_patch_text(patch, old).unwrap();
        assert_eq!(script.old_text(), old);
        assert_eq!(script.new_text(), "a😀bcdefghiJ");
    }

    #[test]
    fn patch_text_rejects_start_inside_surrogate_pair() {
        let patch = "@@ -2,1 +2,1 @@\n-x\n+y\n";
        assert!(EditScript::from_patch_text(patch, "😀x").is_err());
    }

    #[test]
    fn patch_text_zero_length_old_range() {
        let patch = "@@ -0,0 +1,2 @@\n+hi\n";
        let script = EditScript::from_patch_text(patch, "").unwrap();
        assert_eq!(script.steps(), &[ins("hi")]);
    }

    #[test]
    fn patch_text_rejects_garbage() {
        assert!(EditScript::from_patch_text("not a patch", "abc").is_err());
        assert!(EditScript::from_patch_text("@@ -1,3 +1,3 @@\n*abc\n", "abc").is_err());
        assert!(EditScript::from_patch_text("@@ -1,1 +1,1 @@\n-%G1\n", "a").is_err());
    }

    #[test]
    fn hunk_start_parsing() {
        assert_eq!(parse_hunk_start("@@ -1,5 +1,4 @@"), Some(0));
        assert_eq!(parse_hunk_start("@@ -7 +7 @@"), Some(6));
        assert_eq!(parse_hunk_start("@@ -3,0 +4,2 @@"), Some(3));
        assert_eq!(parse_hunk_start("@@ -x,1 +1 @@"), None);
    }
}
