//! Edit script to string splice conversion.
//!
//! The cursor walks the *old* string only: equal and deleted spans advance
//! it, inserted text does not. Every emitted index is therefore an offset into
//! the original string, and a consumer must apply the splices of one script
//! against the original rather than cumulatively.
//!
//! Inserts are anchored at the start of the change run they belong to. Inside
//! a run the old characters are all removed, so any anchor within it names the
//! same place; the run start also keeps a remove-then-insert pair valid when
//! applied one after another.

use docsync_delta::{EditScript, EditStep};

use crate::operation::Operation;

/// Convert one edit script into splice operations against `path`.
pub fn splice_operations(path: &str, script: &EditScript) -> Vec<Operation> {
    let mut ops = Vec::new();
    let mut idx = 0usize;
    let mut run_start: Option<usize> = None;

    for step in script {
        let len = step.char_len();
        if len == 0 {
            continue;
        }
        match step {
            EditStep::Equal(_) => {
                idx += len;
                run_start = None;
            }
            EditStep::Delete(_) => {
                ops.push(Operation::StringRemove {
                    path: path.to_string(),
                    index: idx,
                    length: len,
                });
                run_start.get_or_insert(idx);
                idx += len;
            }
            EditStep::Insert(text) => {
                ops.push(Operation::StringInsert {
                    path: path.to_string(),
                    index: run_start.unwrap_or(idx),
                    text: text.clone(),
                });
            }
        }
    }

    ops
}
