//! Delta-to-operation translation.
//!
//! The walk is depth-first. Object children are visited in the delta's key
//! order, array children in ascending old index. Each changed leaf emits one
//! operation at the current path (or a run of splices for text diffs); the
//! root itself never emits.

use serde_json::Value;
use tracing::debug;

use docsync_delta::{ArrayChild, Delta};

use crate::error::{TranslateError, TranslateResult};
use crate::operation::{OperationLog, Transaction};
use crate::path::{PathStack, Segment};
use crate::splice::splice_operations;

/// Per-call traversal state: the path stack and the log being built.
struct TranslateContext {
    path: PathStack,
    log: OperationLog,
}

impl TranslateContext {
    fn new(base_pointer: &str) -> Self {
        Self {
            path: PathStack::new(base_pointer),
            log: OperationLog::new(),
        }
    }

    fn dispatch(&mut self, delta: &Delta) -> TranslateResult<()> {
        match delta {
            Delta::Unchanged => {}
            Delta::Added { value } => {
                let path = self.path.current_path();
                self.log.insert(&path, value.clone());
            }
            Delta::Modified { new, .. } => {
                let path = self.path.current_path();
                self.log.replace(&path, new.clone());
            }
            Delta::Deleted { .. } => {
                let path = self.path.current_path();
                self.log.delete(&path);
            }
            Delta::TextDiff { script } => {
                let path = self.path.current_path();
                self.log.extend(splice_operations(&path, script));
            }
            Delta::Object { .. } | Delta::Array { .. } => self.visit_children(delta)?,
            Delta::Moved { to } => {
                debug!(path = %self.path.current_path(), to, "ignoring array move");
            }
            Delta::MoveDestination { from } => {
                debug!(path = %self.path.current_path(), from, "ignoring array move destination");
            }
        }
        Ok(())
    }

    fn visit_children(&mut self, delta: &Delta) -> TranslateResult<()> {
        match delta {
            Delta::Object { children } => {
                for (key, child) in children {
                    self.visit(Segment::Key(key.clone()), child)?;
                }
            }
            Delta::Array { children } => {
                let mut ordered: Vec<&ArrayChild> = children.iter().collect();
                ordered.sort_by_key(|c| c.index);
                for child in ordered {
                    self.visit(Segment::Index(child.index), &child.delta)?;
                }
            }
            other => {
                return Err(TranslateError::MalformedDelta(format!(
                    "expected a composite node at {}, got {}",
                    self.path.current_path(),
                    other.kind_name()
                )));
            }
        }
        Ok(())
    }

    /// Hand over the log; the walk must have left every child it entered.
    fn finish(self) -> TranslateResult<OperationLog> {
        match self.path.depth() {
            0 => Ok(self.log),
            depth => Err(TranslateError::UnbalancedStack { depth }),
        }
    }

    fn visit(&mut self, segment: Segment, child: &Delta) -> TranslateResult<()> {
        if child.is_unchanged() {
            return Ok(());
        }
        let depth = self.path.depth();
        self.path.enter_child(segment);
        self.dispatch(child)?;
        self.path.leave_child()?;
        debug_assert_eq!(self.path.depth(), depth);
        Ok(())
    }
}

/// Translate a delta into an operation log addressed below `base_pointer`.
///
/// The root must be composite (or unchanged, which yields an empty log).
/// On error nothing is returned; there is no partial log.
pub fn translate(delta: &Delta, base_pointer: &str) -> TranslateResult<OperationLog> {
    let mut ctx = TranslateContext::new(base_pointer);
    match delta {
        Delta::Unchanged => {}
        Delta::Object { .. } | Delta::Array { .. } => ctx.visit_children(delta)?,
        other => {
            return Err(TranslateError::MalformedDelta(format!(
                "root delta must be a composite node, got {}",
                other.kind_name()
            )));
        }
    }
    let log = ctx.finish()?;

    debug!(
        base = base_pointer,
        operations = log.len(),
        splices = log.splices(),
        "translated delta"
    );
    Ok(log)
}

/// Translate and hand the result to `txn`. The transaction is only touched
/// once the whole delta has been translated successfully.
pub fn translate_into<T: Transaction + ?Sized>(
    delta: &Delta,
    base_pointer: &str,
    txn: &mut T,
) -> TranslateResult<usize> {
    let log = translate(delta, base_pointer)?;
    log.replay_into(txn);
    Ok(log.len())
}

/// Decode a jsondiffpatch delta against `left` and translate it.
pub fn translate_wire(delta: &Value, left: &Value, base_pointer: &str) -> TranslateResult<OperationLog> {
    let delta = Delta::from_wire(delta, left)?;
    translate(&delta, base_pointer)
}
