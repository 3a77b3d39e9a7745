//! The delta tree.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::edit_script::EditScript;

/// A node of a structural delta between an old and a new tree value.
///
/// Only [`Delta::Object`] and [`Delta::Array`] carry children; every other
/// kind describes the node itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Delta {
    /// No change at this node.
    Unchanged,
    /// The node exists only in the new tree.
    Added { value: Value },
    /// The node exists only in the old tree.
    Deleted { value: Value },
    /// The node's value was replaced wholesale.
    Modified { old: Value, new: Value },
    /// A string was edited character by character.
    TextDiff { script: EditScript },
    /// Changed keys of an object, in the differ's key order.
    Object { children: Vec<(String, Delta)> },
    /// Changed elements of an array, addressed by old index.
    Array { children: Vec<ArrayChild> },
    /// An array element moved away from this index.
    Moved { to: usize },
    /// An array element moved to this index.
    MoveDestination { from: usize },
}

/// A child of an array delta.
///
/// `index` addresses the old array. For [`Delta::Added`] it is the old
/// position the new element is inserted in front of, so appends use the old
/// length.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArrayChild {
    pub index: usize,
    pub delta: Delta,
}

impl ArrayChild {
    pub fn new(index: usize, delta: Delta) -> Self {
        Self { index, delta }
    }
}

impl Delta {
    /// Returns `true` for [`Delta::Unchanged`] and for composite nodes
    /// without any changed child.
    pub fn is_unchanged(&self) -> bool {
        match self {
            Delta::Unchanged => true,
            Delta::Object { children } => children.iter().all(|(_, c)| c.is_unchanged()),
            Delta::Array { children } => children.iter().all(|c| c.delta.is_unchanged()),
            _ => false,
        }
    }

    /// Returns `true` if this node carries children.
    pub fn is_composite(&self) -> bool {
        matches!(self, Delta::Object { .. } | Delta::Array { .. })
    }

    /// Short name of the node's kind, for logs and error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Delta::Unchanged => "unchanged",
            Delta::Added { .. } => "added",
            Delta::Deleted { .. } => "deleted",
            Delta::Modified { .. } => "modified",
            Delta::TextDiff { .. } => "text_diff",
            Delta::Object { .. } => "object",
            Delta::Array { .. } => "array",
            Delta::Moved { .. } => "moved",
            Delta::MoveDestination { .. } => "move_destination",
        }
    }

    /// Number of leaf changes below (and including) this node.
    pub fn change_count(&self) -> usize {
        match self {
            Delta::Unchanged | Delta::Moved { .. } | Delta::MoveDestination { .. } => 0,
            Delta::Object { children } => children.iter().map(|(_, c)| c.change_count()).sum(),
            Delta::Array { children } => children.iter().map(|c| c.delta.change_count()).sum(),
            _ => 1,
        }
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} changes)", self.kind_name(), self.change_count())
    }
}
