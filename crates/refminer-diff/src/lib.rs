//! Refactoring inference over aligned method bodies.
//!
//! Given two versions of a class and the statement mappings between their
//! matched operations, [`ClassDiff`] explains leftover statements as extract
//! and inline operation refactorings and resolves the attribute renames,
//! merges and splits the mappings hint at.
//!
//! Parsing source and aligning method bodies are not done here. The
//! [`BodyAligner`](refminer_model::BodyAligner) seam lets the caller plug in
//! whatever aligner produced the input mappers; [`PrecomputedAligner`] answers
//! from alignments recorded in the input document.
//!
//! [`PrecomputedAligner`]: refminer_model::PrecomputedAligner

mod attributes;
mod call_tree;
mod candidates;
mod class_diff;
mod context;
mod detector;
mod error;
mod extract;
mod inline;
mod invocation;
mod match_condition;
mod operations;
mod refactoring;

pub use attributes::{
    inconsistency_ratio, resolve_in_enclosing_scope, AttributeCandidateResolver, AttributeResolution,
    UnresolvedCandidates, INCONSISTENT_RENAME_RATIO,
};
pub use call_tree::{CallGraphNode, CallKey, CallTree, NodeId};
pub use candidates::{total_occurrences, CandidateMaps};
pub use class_diff::{ClassDiff, ClassDiffInput, ClassDiffReport};
pub use context::DetectionContext;
pub use detector::DetectorEnv;
pub use error::{DiffError, Result};
pub use extract::ExtractOperationDetector;
pub use inline::InlineOperationDetector;
pub use invocation::InvocationMatcher;
pub use match_condition::{
    MatchConditionScorer, MatchCounts, Verdict, MULTIPLE_EXACT_MATCH_SLACK, SINGLE_EXACT_MATCH_SLACK,
};
pub use operations::OperationTable;
pub use refactoring::{AttributeRef, OperationRef, Refactoring, RefactoringKind, VariableRef};

pub use tokio_util::sync::CancellationToken;
