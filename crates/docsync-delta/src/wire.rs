//! Ingestion of jsondiffpatch-encoded deltas.
//!
//! The encoding packs every leaf into a short JSON array:
//!
//! | Encoding | Kind |
//! |---|---|
//! | `[new]` | added |
//! | `[old, new]` | modified |
//! | `[old, 0, 0]` | deleted |
//! | `[patch, 0, 2]` | text diff (diff-match-patch patch text) |
//! | `["", to, 3]` | moved |
//!
//! Objects are object nodes; objects tagged `"_t": "a"` are array nodes whose
//! `"_N"` keys address old indices and plain `"N"` keys address new indices.
//! New indices are mapped back onto the old array here, which is why the
//! original (left) value is needed alongside the delta.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

use crate::delta::{ArrayChild, Delta};
use crate::edit_script::EditScript;
use crate::error::{DiffError, DiffResult};

const TEXT_DIFF_TAG: u64 = 2;
const MOVED_TAG: u64 = 3;

impl Delta {
    /// Decode a jsondiffpatch delta against the value it was computed from.
    ///
    /// `null` decodes to [`Delta::Unchanged`].
    pub fn from_wire(delta: &Value, left: &Value) -> DiffResult<Delta> {
        decode(delta, Some(left), "")
    }
}

fn decode(delta: &Value, left: Option<&Value>, location: &str) -> DiffResult<Delta> {
    match delta {
        Value::Null => Ok(Delta::Unchanged),
        Value::Array(items) => decode_leaf(items, left, location),
        Value::Object(map) if map.get("_t") == Some(&Value::String("a".into())) => {
            decode_array(map, left, location)
        }
        Value::Object(map) => decode_object(map, left, location),
        other => Err(DiffError::malformed(
            location,
            format!("expected an array or object delta, got {other}"),
        )),
    }
}

fn decode_leaf(items: &[Value], left: Option<&Value>, location: &str) -> DiffResult<Delta> {
    match items {
        [value] => Ok(Delta::Added {
            value: value.clone(),
        }),
        [old, new] => Ok(Delta::Modified {
            old: old.clone(),
            new: new.clone(),
        }),
        [old, Value::Number(zero), Value::Number(tag)] if zero.as_u64() == Some(0) && tag.as_u64() == Some(0) => {
            Ok(Delta::Deleted { value: old.clone() })
        }
        [Value::String(patch), Value::Number(zero), Value::Number(tag)]
            if zero.as_u64() == Some(0) && tag.as_u64() == Some(TEXT_DIFF_TAG) =>
        {
            let Some(Value::String(original)) = left else {
                return Err(DiffError::malformed(
                    location,
                    "text diff requires the original string",
                ));
            };
            let script = EditScript::from_patch_text(patch, original)
                .map_err(|e| relocate(e, location))?;
            Ok(Delta::TextDiff { script })
        }
        [Value::String(_), Value::Number(to), Value::Number(tag)] if tag.as_u64() == Some(MOVED_TAG) => {
            let to = to
                .as_u64()
                .ok_or_else(|| DiffError::malformed(location, "move target must be an index"))?;
            Ok(Delta::Moved { to: to as usize })
        }
        _ => Err(DiffError::malformed(
            location,
            format!("unrecognized leaf delta of length {}", items.len()),
        )),
    }
}

fn decode_object(map: &Map<String, Value>, left: Option<&Value>, location: &str) -> DiffResult<Delta> {
    if let Some(other) = left.filter(|l| !l.is_object()) {
        return Err(DiffError::malformed(
            location,
            format!("object delta applied to non-object value {other}"),
        ));
    }
    let mut children = Vec::with_capacity(map.len());
    for (key, child) in map {
        let child_left = left.and_then(|l| l.get(key));
        let child_location = format!("{location}/{key}");
        let child = decode(child, child_left, &child_location)?;
        if !child.is_unchanged() {
            children.push((key.clone(), child));
        }
    }
    Ok(Delta::Object { children })
}

fn decode_array(map: &Map<String, Value>, left: Option<&Value>, location: &str) -> DiffResult<Delta> {
    let Some(Value::Array(original)) = left else {
        return Err(DiffError::malformed(
            location,
            "array delta requires the original array",
        ));
    };

    // Old-index children (deletions and moves) and new-index children.
    let mut by_old: BTreeMap<usize, &Value> = BTreeMap::new();
    let mut by_new: BTreeMap<usize, &Value> = BTreeMap::new();
    for (key, child) in map {
        if key == "_t" {
            continue;
        }
        let (target, raw) = match key.strip_prefix('_') {
            Some(raw) => (&mut by_old, raw),
            None => (&mut by_new, key.as_str()),
        };
        let index = raw.parse::<usize>().map_err(|_| {
            DiffError::malformed(location, format!("invalid array delta key {key:?}"))
        })?;
        target.insert(index, child);
    }

    let mut removed = BTreeSet::new();
    let mut occupied = BTreeSet::new();
    let mut moves_to: BTreeMap<usize, usize> = BTreeMap::new();
    let mut children = Vec::new();

    for (&index, child) in &by_old {
        let child_location = format!("{location}/_{index}");
        if index >= original.len() {
            return Err(DiffError::malformed(
                &child_location,
                format!("index out of range for array of length {}", original.len()),
            ));
        }
        let decoded = decode(child, original.get(index), &child_location)?;
        match &decoded {
            Delta::Deleted { .. } => {}
            Delta::Moved { to } => {
                occupied.insert(*to);
                moves_to.insert(*to, index);
            }
            other => {
                return Err(DiffError::malformed(
                    &child_location,
                    format!("only deletions and moves may use old indices, got {}", other.kind_name()),
                ));
            }
        }
        removed.insert(index);
        children.push(ArrayChild::new(index, decoded));
    }

    for (&index, child) in &by_new {
        if matches!(child.as_array().map(Vec::len), Some(1)) {
            occupied.insert(index);
        }
    }

    // Surviving old elements keep their relative order; walk them alongside
    // the new indices not taken by insertions or move targets.
    let survivors: Vec<usize> = (0..original.len()).filter(|i| !removed.contains(i)).collect();
    let mut new_to_old: BTreeMap<usize, usize> = BTreeMap::new();
    let mut new_index = 0usize;
    for &old_index in &survivors {
        while occupied.contains(&new_index) {
            new_index += 1;
        }
        new_to_old.insert(new_index, old_index);
        new_index += 1;
    }
    let insertion_point = |new_index: usize| {
        new_to_old
            .range(new_index + 1..)
            .next()
            .map(|(_, &old)| old)
            .unwrap_or(original.len())
    };

    // Moved elements are not followed to their destination; nested changes
    // recorded under a move target are dropped with the move.
    let mut inserted: Vec<(usize, ArrayChild)> = moves_to
        .iter()
        .map(|(&to, &from)| {
            (
                to,
                ArrayChild::new(insertion_point(to), Delta::MoveDestination { from }),
            )
        })
        .collect();
    for (&index, child) in &by_new {
        if moves_to.contains_key(&index) {
            continue;
        }
        let child_location = format!("{location}/{index}");
        if occupied.contains(&index) {
            let decoded = decode(child, None, &child_location)?;
            inserted.push((index, ArrayChild::new(insertion_point(index), decoded)));
            continue;
        }
        let Some(&old_index) = new_to_old.get(&index) else {
            return Err(DiffError::malformed(
                &child_location,
                "new index does not correspond to a surviving element",
            ));
        };
        let decoded = decode(child, original.get(old_index), &child_location)?;
        if matches!(decoded, Delta::Moved { .. }) {
            return Err(DiffError::malformed(&child_location, "moves must use old indices"));
        }
        if !decoded.is_unchanged() {
            children.push(ArrayChild::new(old_index, decoded));
        }
    }

    // Insertions go in front of whatever else sits at the same old index.
    children.sort_by_key(|c| c.index);
    inserted.sort_by_key(|(new_index, _)| *new_index);
    let mut merged: Vec<ArrayChild> = Vec::with_capacity(children.len() + inserted.len());
    let mut rest = children.into_iter().peekable();
    for (_, insert) in inserted {
        while let Some(c) = rest.next_if(|c| c.index < insert.index) {
            merged.push(c);
        }
        merged.push(insert);
    }
    merged.extend(rest);

    Ok(Delta::Array { children: merged })
}

fn relocate(err: DiffError, location: &str) -> DiffError {
    match err {
        DiffError::MalformedDelta { reason, .. } => DiffError::malformed(location, reason),
        other => other,
    }
}
