use serde::{Deserialize, Serialize};

/// Configuration for the snapshot [`Differ`](crate::Differ).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifferConfig {
    /// Whether reordered array elements are reported as moves.
    /// Must stay `false`; the differ refuses to start otherwise.
    pub array_move_detection: bool,
    /// Strings shorter than this (in characters) on either side are replaced
    /// wholesale instead of character-diffed.
    pub text_diff_min_length: usize,
}

impl Default for DifferConfig {
    fn default() -> Self {
        Self {
            array_move_detection: false,
            text_diff_min_length: 0,
        }
    }
}

impl DifferConfig {
    /// A configuration that never character-diffs strings.
    pub fn whole_values() -> Self {
        Self {
            text_diff_min_length: usize::MAX,
            ..Default::default()
        }
    }

    /// Builder-style setter for the text diff threshold.
    pub fn with_text_diff_min_length(mut self, min_length: usize) -> Self {
        self.text_diff_min_length = min_length;
        self
    }
}
