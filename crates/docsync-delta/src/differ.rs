//! Snapshot differ: compare two tree values and produce a [`Delta`].
//!
//! Objects are compared key by key, arrays with an LCS diff over the JSON
//! encoding of their elements (via `similar`), and strings either wholesale or
//! character by character depending on [`DifferConfig::text_diff_min_length`].
//! Array moves are never reported.

use serde_json::{Map, Value};
use similar::{capture_diff_slices, Algorithm, DiffOp};
use tracing::trace;

use crate::config::DifferConfig;
use crate::delta::{ArrayChild, Delta};
use crate::edit_script::EditScript;
use crate::error::{DiffError, DiffResult};

/// Computes deltas between tree values under a fixed configuration.
#[derive(Clone, Debug)]
pub struct Differ {
    config: DifferConfig,
}

impl Differ {
    /// Create a differ. Fails if array move detection is requested.
    pub fn new(config: DifferConfig) -> DiffResult<Self> {
        if config.array_move_detection {
            return Err(DiffError::MoveDetectionUnsupported);
        }
        Ok(Self { config })
    }

    /// The configuration this differ was built with.
    pub fn config(&self) -> &DifferConfig {
        &self.config
    }

    /// Compute the delta turning `old` into `new`.
    pub fn diff(&self, old: &Value, new: &Value) -> Delta {
        let delta = self.diff_values(old, new);
        trace!(kind = delta.kind_name(), changes = delta.change_count(), "computed delta");
        delta
    }

    fn diff_values(&self, old: &Value, new: &Value) -> Delta {
        if old == new {
            return Delta::Unchanged;
        }
        match (old, new) {
            (Value::Object(o), Value::Object(n)) => self.diff_objects(o, n),
            (Value::Array(o), Value::Array(n)) => self.diff_arrays(o, n),
            (Value::String(o), Value::String(n)) => self.diff_strings(o, n),
            _ => Delta::Modified {
                old: old.clone(),
                new: new.clone(),
            },
        }
    }

    fn diff_objects(&self, old: &Map<String, Value>, new: &Map<String, Value>) -> Delta {
        let mut children = Vec::new();

        for (key, old_val) in old {
            let child = match new.get(key) {
                Some(new_val) => self.diff_values(old_val, new_val),
                None => Delta::Deleted {
                    value: old_val.clone(),
                },
            };
            if !child.is_unchanged() {
                children.push((key.clone(), child));
            }
        }

        for (key, new_val) in new {
            if !old.contains_key(key) {
                children.push((
                    key.clone(),
                    Delta::Added {
                        value: new_val.clone(),
                    },
                ));
            }
        }

        Delta::Object { children }
    }

    fn diff_arrays(&self, old: &[Value], new: &[Value]) -> Delta {
        let old_keys: Vec<String> = old.iter().map(Value::to_string).collect();
        let new_keys: Vec<String> = new.iter().map(Value::to_string).collect();
        let mut children = Vec::new();

        for op in capture_diff_slices(Algorithm::Myers, &old_keys, &new_keys) {
            match op {
                DiffOp::Equal { .. } => {}
                DiffOp::Delete {
                    old_index, old_len, ..
                } => {
                    for i in old_index..old_index + old_len {
                        children.push(ArrayChild::new(
                            i,
                            Delta::Deleted {
                                value: old[i].clone(),
                            },
                        ));
                    }
                }
                DiffOp::Insert {
                    old_index,
                    new_index,
                    new_len,
                } => {
                    for j in new_index..new_index + new_len {
                        children.push(ArrayChild::new(
                            old_index,
                            Delta::Added {
                                value: new[j].clone(),
                            },
                        ));
                    }
                }
                DiffOp::Replace {
                    old_index,
                    old_len,
                    new_index,
                    new_len,
                } => {
                    // Pair replaced elements by position, then delete or
                    // append whatever is left over on either side.
                    let paired = old_len.min(new_len);
                    for k in 0..paired {
                        let child = self.diff_values(&old[old_index + k], &new[new_index + k]);
                        children.push(ArrayChild::new(old_index + k, child));
                    }
                    for k in paired..old_len {
                        children.push(ArrayChild::new(
                            old_index + k,
                            Delta::Deleted {
                                value: old[old_index + k].clone(),
                            },
                        ));
                    }
                    for k in paired..new_len {
                        children.push(ArrayChild::new(
                            old_index + old_len,
                            Delta::Added {
                                value: new[new_index + k].clone(),
                            },
                        ));
                    }
                }
            }
        }

        Delta::Array { children }
    }

    fn diff_strings(&self, old: &str, new: &str) -> Delta {
        let min = self.config.text_diff_min_length;
        if old.chars().count() < min || new.chars().count() < min {
            return Delta::Modified {
                old: Value::String(old.to_string()),
                new: Value::String(new.to_string()),
            };
        }
        Delta::TextDiff {
            script: EditScript::between(old, new),
        }
    }
}
