//! Core shared types for refminer.
//!
//! This crate is intentionally small: source locations, typed ids, and the
//! handful of name-normalisation helpers every other crate needs.

mod location;
mod names;

pub use location::CodeRange;
pub use names::{normalize_name, strip_common_dotted_prefix, THIS_DOT};
pub use text_size::{TextRange, TextSize};

use serde::{Deserialize, Serialize};

/// Identifier of an operation (method, constructor, initializer) within one
/// class-diff input. Ids are unique across both sides of the diff.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct OperationId(pub u32);

impl OperationId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifier of a code fragment (statement or expression).
///
/// Fragment identity is what the body aligner and the detectors use for set
/// membership; two fragments with the same text at different places are
/// different fragments.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FragmentId(pub u32);

impl FragmentId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

impl std::fmt::Display for FragmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fragment#{}", self.0)
    }
}
