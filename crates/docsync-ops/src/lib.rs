//! Delta-to-operation translation for docsync.
//!
//! Walks a [`Delta`](docsync_delta::Delta) depth-first and emits an ordered
//! log of path-addressed mutations that reproduces the new snapshot when
//! replayed against the old one.
//!
//! # Key Types
//!
//! - [`Operation`] / [`OperationLog`] -- Path-addressed mutations and their ordered log
//! - [`Transaction`] -- Sink interface of the remote document store
//! - [`PathStack`] / [`Segment`] -- Path tracking during traversal
//! - [`translate`] -- Translation entry point
//! - [`apply`] / [`apply_document`] -- Reference interpretation of an operation log

pub mod apply;
pub mod error;
pub mod operation;
pub mod path;
pub mod splice;
pub mod translate;

pub use apply::{apply, apply_document};
pub use error::{ApplyError, ApplyResult, TranslateError, TranslateResult};
pub use operation::{Operation, OperationLog, Transaction};
pub use path::{PathStack, Segment};
pub use splice::splice_operations;
pub use translate::{translate, translate_into, translate_wire};
