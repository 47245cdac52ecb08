//! Locally observed rename/merge/split candidates, as recorded by the aligner
//! for one method pair.

use refminer_core::{CodeRange, FragmentId, OperationId};
use serde::{Deserialize, Serialize};

use crate::mapping::Mapping;
use crate::operation::VariableDeclaration;

/// The mapping a candidate was observed in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub fragment1: FragmentId,
    pub fragment2: FragmentId,
    pub location1: CodeRange,
    pub location2: CodeRange,
}

impl From<&Mapping> for Reference {
    fn from(mapping: &Mapping) -> Self {
        Self {
            fragment1: mapping.fragment1.id,
            fragment2: mapping.fragment2.id,
            location1: mapping.fragment1.location.clone(),
            location2: mapping.fragment2.location.clone(),
        }
    }
}

fn one() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRename {
    pub original_name: String,
    pub renamed_name: String,
    pub operation_before: OperationId,
    pub operation_after: OperationId,
    #[serde(default)]
    pub references: Vec<Reference>,
    #[serde(default = "one")]
    pub occurrences: usize,
    /// Set when the before side is a local variable rather than a field.
    #[serde(default)]
    pub original_declaration: Option<VariableDeclaration>,
    /// Set when the after side is a local variable rather than a field.
    #[serde(default)]
    pub renamed_declaration: Option<VariableDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateMerge {
    pub merged_names: Vec<String>,
    pub new_name: String,
    pub operation_before: OperationId,
    pub operation_after: OperationId,
    #[serde(default)]
    pub references: Vec<Reference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSplit {
    pub old_name: String,
    pub split_names: Vec<String>,
    pub operation_before: OperationId,
    pub operation_after: OperationId,
    #[serde(default)]
    pub references: Vec<Reference>,
}

/// Locals of the before side replaced by a single local of the after side,
/// as the aligner saw it in one method pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableMerge {
    pub merged: Vec<String>,
    pub new_name: String,
}

/// One local of the before side replaced by several locals of the after side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableSplit {
    pub old_name: String,
    pub split: Vec<String>,
}
