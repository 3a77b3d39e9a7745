//! Structural deltas between two JSON-like document snapshots.
//!
//! A [`Delta`] mirrors the shape of the documents it compares: composite
//! nodes hold per-key or per-index children, leaf nodes record an addition,
//! deletion, scalar replacement, or character-level [`EditScript`].
//!
//! # Key Types
//!
//! - [`Delta`] / [`ArrayChild`] -- Tagged delta tree
//! - [`EditScript`] / [`EditStep`] -- Character-level equal/insert/delete spans
//! - [`Differ`] / [`DifferConfig`] -- Snapshot differ with explicit configuration

pub mod config;
pub mod delta;
pub mod differ;
pub mod edit_script;
pub mod error;
pub mod wire;

pub use config::DifferConfig;
pub use delta::{ArrayChild, Delta};
pub use differ::Differ;
pub use edit_script::{EditScript, EditStep};
pub use error::{DiffError, DiffResult};
