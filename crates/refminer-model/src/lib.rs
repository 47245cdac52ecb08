//! Code model and aligner output consumed by the refminer inference engine.
//!
//! Nothing in here parses source text or aligns method bodies; both are the
//! job of external tools. This crate only describes what they hand over:
//! classes and their operations, statement fragments with the call sites and
//! variables found in them, and the per-method-pair [`BodyMapper`] produced by
//! a statement aligner.

mod aligner;
mod candidate;
mod class;
mod fragment;
mod invocation;
mod mapper;
mod mapping;
mod operation;
mod replacement;
mod types;

pub use aligner::{
    AlignmentKind, AlignmentRequest, BodyAligner, PrecomputedAligner, PrecomputedAlignment,
};
pub use candidate::{CandidateMerge, CandidateRename, CandidateSplit, Reference, VariableMerge, VariableSplit};
pub use class::{AnonymousClass, Attribute, ClassModel, Initializer};
pub use fragment::{Fragment, FragmentKind, OPEN_BLOCK};
pub use invocation::Invocation;
pub use mapper::{BodyMapper, PromotedFragments};
pub use mapping::{ExtractedVariable, Mapping};
pub use operation::{Operation, Parameter, VariableDeclaration};
pub use replacement::{MergeReplacement, Replacement, ReplacementKind, SplitReplacement};
pub use types::{compatible_types, infer_literal_type, TypeHierarchy, TypeRef};

pub use refminer_core::{CodeRange, FragmentId, OperationId};
