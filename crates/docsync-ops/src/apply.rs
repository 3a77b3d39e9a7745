//! Reference interpretation of an operation log.
//!
//! All operations of one log address the document as it was before the log:
//! array indices and character offsets are never shifted by earlier
//! operations. The log is first folded into a tree of pending edits keyed by
//! path segment, then the new document is rebuilt from the old one in a
//! single pass.
//!
//! At one array slot `i`, inserted values land in front of old element `i`
//! (in log order) and a slot equal to the old length appends. String splices
//! work the same way on characters.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ApplyError, ApplyResult};
use crate::operation::Operation;
use crate::path::{escape_key, split_path};

/// Apply `operations`, all addressed below `base_pointer`, to `document`.
pub fn apply(document: &Value, base_pointer: &str, operations: &[Operation]) -> ApplyResult<Value> {
    let mut root = PendingNode::default();
    for op in operations {
        let segments = split_path(op.path(), base_pointer).ok_or_else(|| ApplyError::OutsideBase {
            path: op.path().to_string(),
            base: base_pointer.to_string(),
        })?;
        if segments.is_empty() && matches!(op, Operation::Insert { .. } | Operation::Delete { .. }) {
            return Err(ApplyError::InvalidRoot { op: op.kind() });
        }
        root.record(&segments, op)?;
    }
    let result = root.rebuild(document, base_pointer)?;
    debug!(base = base_pointer, operations = operations.len(), "applied operation log");
    Ok(result)
}

/// Apply operations whose paths start with a top-level field name of
/// `document`, each field acting as its own base pointer.
pub fn apply_document(document: &Value, operations: &[Operation]) -> ApplyResult<Value> {
    let Value::Object(fields) = document else {
        return Err(ApplyError::TypeMismatch {
            path: String::new(),
            expected: "object",
        });
    };

    let mut by_field: Vec<(&str, Vec<Operation>)> = Vec::new();
    for op in operations {
        let field = op.path().split('/').next().unwrap_or_default();
        match by_field.iter_mut().find(|(f, _)| *f == field) {
            Some((_, ops)) => ops.push(op.clone()),
            None => by_field.push((field, vec![op.clone()])),
        }
    }

    let mut result = fields.clone();
    for (field, ops) in by_field {
        let current = fields
            .get(field)
            .ok_or_else(|| ApplyError::PathNotFound(field.to_string()))?;
        let updated = apply(current, field, &ops)?;
        result.insert(field.to_string(), updated);
    }
    Ok(Value::Object(result))
}

#[derive(Debug)]
enum Edit {
    Replace(Value),
    Delete,
}

#[derive(Debug)]
enum Splice {
    Insert { index: usize, text: String },
    Remove { index: usize, length: usize },
}

/// Edits recorded for one location of the old document.
#[derive(Debug, Default)]
struct PendingNode {
    edit: Option<Edit>,
    /// Values inserted at this location (array slot or new object key).
    inserts: Vec<Value>,
    splices: Vec<Splice>,
    children: BTreeMap<String, PendingNode>,
}

impl PendingNode {
    fn record(&mut self, segments: &[String], op: &Operation) -> ApplyResult<()> {
        let mut node = self;
        for segment in segments {
            node = node.children.entry(segment.clone()).or_default();
        }
        match op {
            Operation::Insert { value, .. } => node.inserts.push(value.clone()),
            Operation::Replace { value, .. } => node.set_edit(Edit::Replace(value.clone()), op.path())?,
            Operation::Delete { .. } => node.set_edit(Edit::Delete, op.path())?,
            Operation::StringInsert { index, text, .. } => node.splices.push(Splice::Insert {
                index: *index,
                text: text.clone(),
            }),
            Operation::StringRemove { index, length, .. } => node.splices.push(Splice::Remove {
                index: *index,
                length: *length,
            }),
        }
        Ok(())
    }

    fn set_edit(&mut self, edit: Edit, path: &str) -> ApplyResult<()> {
        if self.edit.is_some() {
            return Err(ApplyError::Conflict(path.to_string()));
        }
        self.edit = Some(edit);
        Ok(())
    }

    fn is_deleted(&self) -> bool {
        matches!(self.edit, Some(Edit::Delete))
    }

    /// Only inserts were recorded here: the location does not exist yet.
    fn is_insert_only(&self) -> bool {
        self.edit.is_none() && self.splices.is_empty() && self.children.is_empty()
    }

    /// The new value for a location that exists in the old document.
    /// Deletion and inserts at this location are the parent's business.
    fn rebuild(&self, old: &Value, path: &str) -> ApplyResult<Value> {
        if let Some(Edit::Replace(value)) = &self.edit {
            if !self.splices.is_empty() || !self.children.is_empty() {
                return Err(ApplyError::Conflict(path.to_string()));
            }
            return Ok(value.clone());
        }

        if !self.splices.is_empty() {
            if !self.children.is_empty() {
                return Err(ApplyError::Conflict(path.to_string()));
            }
            let Value::String(text) = old else {
                return Err(ApplyError::TypeMismatch {
                    path: path.to_string(),
                    expected: "string",
                });
            };
            return apply_splices(text, &self.splices, path).map(Value::String);
        }

        if self.children.is_empty() {
            return Ok(old.clone());
        }
        match old {
            Value::Object(map) => self.rebuild_object(map, path),
            Value::Array(items) => self.rebuild_array(items, path),
            _ => {
                let first = self.children.keys().next().map(String::as_str).unwrap_or_default();
                Err(ApplyError::PathNotFound(format!("{path}/{}", escape_key(first))))
            }
        }
    }

    fn rebuild_object(&self, map: &Map<String, Value>, path: &str) -> ApplyResult<Value> {
        let mut out = Map::new();
        for (key, value) in map {
            let Some(child) = self.children.get(key) else {
                out.insert(key.clone(), value.clone());
                continue;
            };
            let child_path = format!("{path}/{}", escape_key(key));
            let kept = if child.is_deleted() {
                None
            } else {
                Some(child.rebuild(value, &child_path)?)
            };
            match (kept, child.inserts.as_slice()) {
                (None, []) => {}
                (None, [inserted]) => {
                    out.insert(key.clone(), inserted.clone());
                }
                (Some(updated), []) => {
                    out.insert(key.clone(), updated);
                }
                _ => return Err(ApplyError::Conflict(child_path)),
            }
        }

        for (key, child) in &self.children {
            if map.contains_key(key) {
                continue;
            }
            let child_path = format!("{path}/{}", escape_key(key));
            match child.inserts.as_slice() {
                [inserted] if child.is_insert_only() => {
                    out.insert(key.clone(), inserted.clone());
                }
                [] => return Err(ApplyError::PathNotFound(child_path)),
                _ => return Err(ApplyError::Conflict(child_path)),
            }
        }
        Ok(Value::Object(out))
    }

    fn rebuild_array(&self, items: &[Value], path: &str) -> ApplyResult<Value> {
        let mut slots: BTreeMap<usize, &PendingNode> = BTreeMap::new();
        for (raw, child) in &self.children {
            let index = raw
                .parse::<usize>()
                .map_err(|_| ApplyError::PathNotFound(format!("{path}/{}", escape_key(raw))))?;
            let addressable = index < items.len() || (index == items.len() && child.is_insert_only());
            if !addressable {
                return Err(ApplyError::IndexOutOfRange {
                    path: path.to_string(),
                    index,
                    len: items.len(),
                });
            }
            slots.insert(index, child);
        }

        let mut out = Vec::with_capacity(items.len());
        for i in 0..=items.len() {
            let slot = slots.get(&i);
            if let Some(child) = slot {
                out.extend(child.inserts.iter().cloned());
            }
            let Some(old) = items.get(i) else {
                break;
            };
            match slot {
                Some(child) if child.is_deleted() => {}
                Some(child) => out.push(child.rebuild(old, &format!("{path}/{i}"))?),
                None => out.push(old.clone()),
            }
        }
        Ok(Value::Array(out))
    }
}

fn apply_splices(text: &str, splices: &[Splice], path: &str) -> ApplyResult<String> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let mut removed = vec![false; len];
    let mut inserts: BTreeMap<usize, Vec<&str>> = BTreeMap::new();

    for splice in splices {
        match splice {
            Splice::Remove { index, length } => {
                let end = index
                    .checked_add(*length)
                    .filter(|&end| end <= len)
                    .ok_or_else(|| ApplyError::IndexOutOfRange {
                        path: path.to_string(),
                        index: *index,
                        len,
                    })?;
                for flag in &mut removed[*index..end] {
                    if *flag {
                        return Err(ApplyError::Conflict(path.to_string()));
                    }
                    *flag = true;
                }
            }
            Splice::Insert { index, text } => {
                if *index > len {
                    return Err(ApplyError::IndexOutOfRange {
                        path: path.to_string(),
                        index: *index,
                        len,
                    });
                }
                inserts.entry(*index).or_default().push(text);
            }
        }
    }

    let mut out = String::with_capacity(text.len());
    for i in 0..=len {
        if let Some(texts) = inserts.get(&i) {
            for t in texts {
                out.push_str(t);
            }
        }
        if i < len && !removed[i] {
            out.push(chars[i]);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn op_insert(path: &str, value: Value) -> Operation {
        Operation::Insert {
            path: path.into(),
            value,
        }
    }

    fn op_delete(path: &str) -> Operation {
        Operation::Delete { path: path.into() }
    }

    #[test]
    fn empty_log_is_identity() {
        let doc = json!({"a": [1, 2], "b": "x"});
        assert_eq!(apply(&doc, "doc", &[]).unwrap(), doc);
    }

    #[test]
    fn object_insert_replace_delete() {
        let doc = json!({"keep": 1, "swap": 2, "drop": 3});
        let ops = vec![
            op_insert("doc/new", json!({"n": true})),
            Operation::Replace {
                path: "doc/swap".into(),
                value: json!("two"),
            },
            op_delete("doc/drop"),
        ];
        assert_eq!(
            apply(&doc, "doc", &ops).unwrap(),
            json!({"keep": 1, "swap": "two", "new": {"n": true}})
        );
    }

    #[test]
    fn array_indices_are_old_coordinates() {
        // [a, b, c] -> [a, x, c, y]
        let doc = json!(["a", "b", "c"]);
        let ops = vec![
            op_delete("doc/1"),
            op_insert("doc/2", json!("x")),
            op_insert("doc/3", json!("y")),
        ];
        assert_eq!(apply(&doc, "doc", &ops).unwrap(), json!(["a", "x", "c", "y"]));
    }

    #[test]
    fn multiple_inserts_at_one_slot_keep_order() {
        let doc = json!([1]);
        let ops = vec![op_insert("doc/0", json!(8)), op_insert("doc/0", json!(9))];
        assert_eq!(apply(&doc, "doc", &ops).unwrap(), json!([8, 9, 1]));
    }

    #[test]
    fn splices_use_original_offsets() {
        let doc = json!({"s": "hello"});
        let ops = vec![
            Operation::StringRemove {
                path: "doc/s".into(),
                index: 3,
                length: 2,
            },
            Operation::StringInsert {
                path: "doc/s".into(),
                index: 3,
                text: "p".into(),
            },
        ];
        assert_eq!(apply(&doc, "doc", &ops).unwrap(), json!({"s": "help"}));
    }

    #[test]
    fn splice_on_non_string_is_type_mismatch() {
        let doc = json!({"n": 5});
        let ops = vec![Operation::StringInsert {
            path: "doc/n".into(),
            index: 0,
            text: "x".into(),
        }];
        assert!(matches!(
            apply(&doc, "doc", &ops),
            Err(ApplyError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn overlapping_removes_conflict() {
        let doc = json!({"s": "abcdef"});
        let ops = vec![
            Operation::StringRemove {
                path: "doc/s".into(),
                index: 0,
                length: 3,
            },
            Operation::StringRemove {
                path: "doc/s".into(),
                index: 2,
                length: 2,
            },
        ];
        assert!(matches!(apply(&doc, "doc", &ops), Err(ApplyError::Conflict(_))));
    }

    #[test]
    fn out_of_range_and_missing_paths() {
        let doc = json!({"list": [1], "s": "ab"});
        assert!(matches!(
            apply(&doc, "doc", &[op_delete("doc/list/3")]),
            Err(ApplyError::IndexOutOfRange { index: 3, len: 1, .. })
        ));
        assert!(matches!(
            apply(&doc, "doc", &[op_delete("doc/missing/x")]),
            Err(ApplyError::PathNotFound(_))
        ));
        assert!(matches!(
            apply(&doc, "doc", &[op_delete("other/list")]),
            Err(ApplyError::OutsideBase { .. })
        ));
        assert!(matches!(
            apply(&doc, "doc", &[op_delete("doc")]),
            Err(ApplyError::InvalidRoot { op: "delete" })
        ));
    }

    #[test]
    fn remove_past_end_is_out_of_range() {
        let doc = json!({"s": "abc"});
        let remove = |index: usize, length: usize| {
            vec![Operation::StringRemove {
                path: "doc/s".into(),
                index,
                length,
            }]
        };
        assert!(matches!(
            apply(&doc, "doc", &remove(usize::MAX, 2)),
            Err(ApplyError::IndexOutOfRange { index: usize::MAX, len: 3, .. })
        ));
        assert!(matches!(
            apply(&doc, "doc", &remove(2, 2)),
            Err(ApplyError::IndexOutOfRange { index: 2, len: 3, .. })
        ));
        assert_eq!(apply(&doc, "doc", &remove(1, 2)).unwrap(), json!({"s": "a"}));
    }

    #[test]
    fn double_edit_conflicts() {
        let doc = json!({"a": 1});
        let ops = vec![op_delete("doc/a"), op_delete("doc/a")];
        assert!(matches!(apply(&doc, "doc", &ops), Err(ApplyError::Conflict(_))));
    }

    #[test]
    fn escaped_keys_resolve() {
        let doc = json!({"a/b": {"c~d": 1}});
        let ops = vec![Operation::Replace {
            path: "doc/a~1b/c~0d".into(),
            value: json!(2),
        }];
        assert_eq!(apply(&doc, "doc", &ops).unwrap(), json!({"a/b": {"c~d": 2}}));
    }

    #[test]
    fn apply_document_routes_by_field() {
        let doc = json!({"content": {"title": "a"}, "meta": {"rev": 1}});
        let ops = vec![
            Operation::Replace {
                path: "content/title".into(),
                value: json!("b"),
            },
            Operation::Replace {
                path: "meta/rev".into(),
                value: json!(2),
            },
        ];
        assert_eq!(
            apply_document(&doc, &ops).unwrap(),
            json!({"content": {"title": "b"}, "meta": {"rev": 2}})
        );
        assert!(matches!(
            apply_document(&doc, &[op_delete("nope/x")]),
            Err(ApplyError::PathNotFound(_))
        ));
    }
}
