//! Utilities shared by refminer tests.
//!
//! Builders for the code model and aligner output ([`FragmentBuilder`],
//! [`OperationBuilder`], [`MapperBuilder`], [`ClassBuilder`]) plus a
//! [`ScriptedAligner`] that hands out canned body mappers and records every
//! request it sees.
//!
//! Builders place fragments deterministically: fragment `n` spans
//! `n * 100 .. n * 100 + 90` in [`FIXTURE_FILE`], and its `k`-th call site
//! starts at `n * 100 + 1 + k`. Ids are therefore expected to be unique
//! within one fixture, just as they are in real input documents.

mod aligner;
mod builders;

pub use aligner::{ScriptedAligner, ScriptedRequest};
pub use builders::{ClassBuilder, FragmentBuilder, MapperBuilder, OperationBuilder};

use refminer_model::{CandidateRename, Mapping, OperationId, Reference};

/// File name used for every location produced by the builders.
pub const FIXTURE_FILE: &str = "Fixture.java";

/// A rename candidate observed in `mapping`.
pub fn rename_candidate(
    original: &str,
    renamed: &str,
    before: u32,
    after: u32,
    mapping: &Mapping,
) -> CandidateRename {
    CandidateRename {
        original_name: original.to_string(),
        renamed_name: renamed.to_string(),
        operation_before: OperationId(before),
        operation_after: OperationId(after),
        references: vec![Reference::from(mapping)],
        occurrences: 1,
        original_declaration: None,
        renamed_declaration: None,
    }
}

/// Pretty JSON for a serializable fixture, for writing input documents to
/// disk in CLI tests.
pub fn to_json_pretty<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).expect("fixture should serialize")
}
