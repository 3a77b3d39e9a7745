//! Mutation operations, the transaction sink, and the operation log.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single path-addressed mutation.
///
/// Every path and character index refers to the document as it was before
/// any operation of the same log was applied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Insert a value (a whole subtree) at `path`.
    Insert { path: String, value: Value },
    /// Replace the value at `path`.
    Replace { path: String, value: Value },
    /// Delete the value (and everything beneath it) at `path`.
    Delete { path: String },
    /// Insert `text` into the string at `path`, before character `index`.
    StringInsert {
        path: String,
        index: usize,
        text: String,
    },
    /// Remove `length` characters from the string at `path`, starting at `index`.
    StringRemove {
        path: String,
        index: usize,
        length: usize,
    },
}

impl Operation {
    /// The address this operation targets.
    pub fn path(&self) -> &str {
        match self {
            Operation::Insert { path, .. }
            | Operation::Replace { path, .. }
            | Operation::Delete { path }
            | Operation::StringInsert { path, .. }
            | Operation::StringRemove { path, .. } => path,
        }
    }

    /// Short name of the operation kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Insert { .. } => "insert",
            Operation::Replace { .. } => "replace",
            Operation::Delete { .. } => "delete",
            Operation::StringInsert { .. } => "string_insert",
            Operation::StringRemove { .. } => "string_remove",
        }
    }

    /// Returns `true` for character-level splices.
    pub fn is_splice(&self) -> bool {
        matches!(
            self,
            Operation::StringInsert { .. } | Operation::StringRemove { .. }
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Insert { path, value } => write!(f, "insert {path} {value}"),
            Operation::Replace { path, value } => write!(f, "replace {path} {value}"),
            Operation::Delete { path } => write!(f, "delete {path}"),
            Operation::StringInsert { path, index, text } => {
                write!(f, "string_insert {path} @{index} {text:?}")
            }
            Operation::StringRemove {
                path,
                index,
                length,
            } => write!(f, "string_remove {path} @{index} len={length}"),
        }
    }
}

/// The mutation interface of a document store transaction.
///
/// Calls arrive in traversal order; serialization and submission belong to
/// the implementor.
pub trait Transaction {
    fn insert(&mut self, path: &str, value: Value);
    fn replace(&mut self, path: &str, value: Value);
    fn delete(&mut self, path: &str);
    fn string_insert(&mut self, path: &str, index: usize, text: &str);
    fn string_remove(&mut self, path: &str, index: usize, length: usize);
}

/// An ordered list of operations produced by one translation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationLog {
    operations: Vec<Operation>,
}

impl OperationLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the log holds no operations.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// The operations in emission order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    pub fn push(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    /// Number of operations of the given kind (see [`Operation::kind`]).
    pub fn count(&self, kind: &str) -> usize {
        self.operations.iter().filter(|op| op.kind() == kind).count()
    }

    /// Number of character-level splices.
    pub fn splices(&self) -> usize {
        self.operations.iter().filter(|op| op.is_splice()).count()
    }

    /// Hand every operation, in order, to a transaction.
    pub fn replay_into<T: Transaction + ?Sized>(&self, txn: &mut T) {
        for op in &self.operations {
            match op {
                Operation::Insert { path, value } => txn.insert(path, value.clone()),
                Operation::Replace { path, value } => txn.replace(path, value.clone()),
                Operation::Delete { path } => txn.delete(path),
                Operation::StringInsert { path, index, text } => {
                    txn.string_insert(path, *index, text)
                }
                Operation::StringRemove {
                    path,
                    index,
                    length,
                } => txn.string_remove(path, *index, *length),
            }
        }
    }

    pub fn into_operations(self) -> Vec<Operation> {
        self.operations
    }
}

impl Transaction for OperationLog {
    fn insert(&mut self, path: &str, value: Value) {
        self.push(Operation::Insert {
            path: path.to_string(),
            value,
        });
    }

    fn replace(&mut self, path: &str, value: Value) {
        self.push(Operation::Replace {
            path: path.to_string(),
            value,
        });
    }

    fn delete(&mut self, path: &str) {
        self.push(Operation::Delete {
            path: path.to_string(),
        });
    }

    fn string_insert(&mut self, path: &str, index: usize, text: &str) {
        self.push(Operation::StringInsert {
            path: path.to_string(),
            index,
            text: text.to_string(),
        });
    }

    fn string_remove(&mut self, path: &str, index: usize, length: usize) {
        self.push(Operation::StringRemove {
            path: path.to_string(),
            index,
            length,
        });
    }
}

impl From<Vec<Operation>> for OperationLog {
    fn from(operations: Vec<Operation>) -> Self {
        Self { operations }
    }
}

impl Extend<Operation> for OperationLog {
    fn extend<I: IntoIterator<Item = Operation>>(&mut self, iter: I) {
        self.operations.extend(iter);
    }
}

impl<'a> IntoIterator for &'a OperationLog {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transaction_calls_record_in_order() {
        let mut log = OperationLog::new();
        log.insert("doc/a", json!(1));
        log.delete("doc/b");
        log.string_remove("doc/c", 3, 2);
        log.string_insert("doc/c", 3, "p");

        assert_eq!(log.len(), 4);
        assert_eq!(log.count("insert"), 1);
        assert_eq!(log.count("delete"), 1);
        assert_eq!(log.splices(), 2);
        let paths: Vec<&str> = log.iter().map(Operation::path).collect();
        assert_eq!(paths, vec!["doc/a", "doc/b", "doc/c", "doc/c"]);
    }

    #[test]
    fn replay_preserves_order() {
        let log = OperationLog::from(vec![
            Operation::Replace {
                path: "doc/x".into(),
                value: json!("y"),
            },
            Operation::StringInsert {
                path: "doc/s".into(),
                index: 0,
                text: "hi".into(),
            },
        ]);
        let mut copy = OperationLog::new();
        log.replay_into(&mut copy);
        assert_eq!(copy, log);
    }

    #[test]
    fn serializes_with_op_tag() {
        let op = Operation::StringRemove {
            path: "doc/a/b".into(),
            index: 3,
            length: 2,
        };
        let encoded = serde_json::to_value(&op).unwrap();
        assert_eq!(
            encoded,
            json!({"op": "string_remove", "path": "doc/a/b", "index": 3, "length": 2})
        );
        let log: OperationLog = serde_json::from_value(json!([encoded])).unwrap();
        assert_eq!(log.operations(), &[op]);
    }

    #[test]
    fn display_is_readable() {
        let op = Operation::StringInsert {
            path: "doc/s".into(),
            index: 3,
            text: "p".into(),
        };
        assert_eq!(op.to_string(), "string_insert doc/s @3 \"p\"");
        assert_eq!(
            Operation::Delete { path: "doc/a".into() }.to_string(),
            "delete doc/a"
        );
    }
}
