//! Plumbing shared by the extract and inline detectors.

use indexmap::IndexMap;
use refminer_core::OperationId;
use refminer_model::{BodyAligner, BodyMapper, Fragment, Invocation, Operation, Parameter};

use crate::context::DetectionContext;
use crate::invocation::InvocationMatcher;
use crate::match_condition::MatchConditionScorer;
use crate::operations::OperationTable;
use crate::refactoring::Refactoring;

/// Everything a detector borrows from the class-pair diff that drives it.
#[derive(Clone, Copy)]
pub struct DetectorEnv<'a> {
    pub operations: &'a OperationTable<'a>,
    pub matcher: InvocationMatcher<'a>,
    pub aligner: &'a dyn BodyAligner,
    pub ctx: &'a DetectionContext,
}

impl<'a> DetectorEnv<'a> {
    pub fn scorer(&self) -> MatchConditionScorer<'a> {
        MatchConditionScorer::new(self.operations, self.matcher)
    }
}

/// Call sites per candidate operation, filled by sorting candidates by calls.
pub(crate) type CallCounts = IndexMap<OperationId, Vec<Invocation>>;

/// Appends the call sites of `fragment` that are not in `invocations` yet.
/// Call sites are told apart by location.
pub(crate) fn add_statement_invocations(invocations: &mut Vec<Invocation>, fragment: &Fragment) {
    for invocation in &fragment.invocations {
        add_invocation(invocations, invocation);
    }
}

pub(crate) fn add_invocation(invocations: &mut Vec<Invocation>, invocation: &Invocation) {
    if !invocations.iter().any(|i| i.location == invocation.location) {
        invocations.push(invocation.clone());
    }
}

/// Whether two call sites look like the same call: same name, same number of
/// arguments, and both or neither with a receiver.
pub(crate) fn similar_calls(a: &Invocation, b: &Invocation) -> bool {
    a.name == b.name && a.arguments.len() == b.arguments.len() && a.expression.is_some() == b.expression.is_some()
}

/// Candidates with at least one call site among `invocations`, the most
/// called first. Ties keep their input order.
pub(crate) fn sort_by_calls<'a>(
    candidates: &[&'a Operation],
    invocations: &[Invocation],
    caller: &Operation,
    matcher: &InvocationMatcher<'_>,
) -> (Vec<&'a Operation>, CallCounts) {
    let mut counts = CallCounts::new();
    let mut sorted: Vec<(&'a Operation, usize)> = Vec::new();
    for &candidate in candidates {
        let matching = matcher.matching_invocations(candidate, invocations, caller);
        if matching.is_empty() {
            continue;
        }
        let count = matching.len();
        let position = sorted
            .iter()
            .position(|(_, other)| count > *other)
            .unwrap_or(sorted.len());
        sorted.insert(position, (candidate, count));
        counts.insert(candidate.id, matching);
    }
    (sorted.into_iter().map(|(op, _)| op).collect(), counts)
}

/// How many other candidates are called at all, and how many are called at
/// least `calls` times.
pub(crate) fn competing_candidates(
    operation: &Operation,
    candidates: &[&Operation],
    calls: usize,
    call_sites: impl Fn(&Operation) -> usize,
) -> (usize, usize) {
    let mut called = 0;
    let mut same_or_more = 0;
    for other in candidates.iter().filter(|other| other.id != operation.id) {
        let count = call_sites(other);
        if count > 0 {
            called += 1;
        }
        if count > 0 && count >= calls {
            same_or_more += 1;
        }
    }
    (called, same_or_more)
}

/// Positional parameter-to-argument map. A trailing varargs parameter that
/// received no argument is left out.
pub(crate) fn parameter_to_argument(parameters: &[Parameter], arguments: &[String]) -> IndexMap<String, String> {
    parameters
        .iter()
        .zip(arguments)
        .map(|(parameter, argument)| (parameter.name.clone(), argument.clone()))
        .collect()
}

/// Whether an already accepted refactoring covers every mapping of `mapper`.
pub(crate) fn contains_identical_mappings(refactorings: &[Refactoring], mapper: &BodyMapper) -> bool {
    refactorings
        .iter()
        .filter_map(Refactoring::body_mapper)
        .any(|accepted| accepted.contains_all_mappings_of(mapper))
}
