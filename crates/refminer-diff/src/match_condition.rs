//! Acceptance tests for candidate extract and inline mappers.
//!
//! Both detectors align a whole operation body against the leftovers of a
//! host mapper and then have to decide whether the alignment is evidence of
//! moved code or a coincidence. The thresholds below are calibrated against
//! an external benchmark corpus of known refactorings and must not drift.

use refminer_model::{BodyMapper, Mapping, ReplacementKind};

use crate::invocation::InvocationMatcher;
use crate::operations::OperationTable;

/// With a single exact match, how many more leftovers than exact matches the
/// other side may have. Inclusive for extract, exclusive for inline.
pub const SINGLE_EXACT_MATCH_SLACK: i64 = 10;

/// With several exact matches, the leftover surplus must stay strictly below
/// this.
pub const MULTIPLE_EXACT_MATCH_SLACK: i64 = 20;

/// Counts a verdict was reached on. Signed, because the corrections applied
/// to the raw counts may drive them below zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchCounts {
    pub mappings: i64,
    pub non_mapped_t1: i64,
    pub non_mapped_t2: i64,
    pub exact_matches: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub accepted: bool,
    pub counts: MatchCounts,
}

impl Verdict {
    fn rejected() -> Self {
        Self {
            accepted: false,
            counts: MatchCounts::default(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MatchConditionScorer<'a> {
    operations: &'a OperationTable<'a>,
    matcher: InvocationMatcher<'a>,
}

impl<'a> MatchConditionScorer<'a> {
    pub fn new(operations: &'a OperationTable<'a>, matcher: InvocationMatcher<'a>) -> Self {
        Self { operations, matcher }
    }

    /// Whether `candidate`, the alignment of `parent.container1` (or one of
    /// the operations it calls) with an added operation, shows an extraction.
    ///
    /// `additional_exact_matches` counts exact matches already credited to
    /// nested extractions below `candidate`.
    pub fn extract(&self, candidate: &BodyMapper, parent: &BodyMapper, additional_exact_matches: usize) -> Verdict {
        if candidate.mappings.len() == 1 {
            let mapping = &candidate.mappings[0];
            if mapping.fragment1.is_expression() && expression_of_unrelated_composite(mapping, candidate, parent) {
                return Verdict::rejected();
            }
            if candidate.nested && parent.mappings.len() == 1 && self.both_delegates(parent) {
                return Verdict::rejected();
            }
        }

        let mut mappings = candidate.mappings_without_blocks() as i64;
        let non_mapped_t1 = candidate.non_mapped_elements_t1() as i64;
        let mut non_mapped_t2 = candidate.non_mapped_elements_t2() as i64;
        let exact = candidate.exact_matches();

        let mut exception_handling_exact_match = false;
        let mut throws_new_exception_exact_match = false;
        if let [mapping] = exact.as_slice() {
            let (f1, f2) = (&mapping.fragment1, &mapping.fragment2);
            if !f1.is_composite()
                && !f1.is_expression()
                && !f2.is_composite()
                && !f2.is_expression()
                && f1.in_catch_block()
                && f2.in_catch_block()
            {
                exception_handling_exact_match = true;
            }
            if f1.throws_new_exception() && f2.throws_new_exception() {
                throws_new_exception_exact_match = true;
            }
        }

        for mapping in &candidate.mappings {
            // A declaration whose value is simply returned by the extracted
            // operation: the added `return` is plumbing, not new code.
            for declaration in &mapping.fragment2.declarations {
                if candidate
                    .non_mapped_leaves_t2
                    .iter()
                    .any(|leaf| leaf.countable() && leaf.returns_variable(&declaration.name))
                {
                    non_mapped_t2 -= 1;
                }
            }
            let subsumed = mapping.extracted_variables.iter().any(|variable| {
                variable.sub_expression_locations.iter().any(|location| {
                    candidate
                        .non_mapped_leaves_t2
                        .iter()
                        .any(|leaf| leaf.location.subsumes(location))
                })
            });
            if subsumed {
                non_mapped_t2 -= 1;
                mappings += 1;
            }
        }

        if non_mapped_t2 == 1 {
            let declarations = candidate
                .non_mapped_leaves_t2
                .iter()
                .flat_map(|leaf| leaf.declarations.iter());
            for declaration in declarations {
                let replaced = candidate
                    .mappings
                    .iter()
                    .any(|m| m.replacements.iter().any(|r| r.after == declaration.name));
                if replaced {
                    non_mapped_t2 -= 1;
                }
            }
        }

        let additional = additional_exact_matches as i64;
        let mut exact_matches = exact.len() as i64 + additional;
        if exact_matches == 0 && (1..=2).contains(&candidate.mappings.len()) {
            let first = &candidate.mappings[0];
            if first.replacements.iter().all(|r| r.is_containment()) {
                exact_matches += 1;
            }
        }

        let counts = MatchCounts {
            mappings,
            non_mapped_t1,
            non_mapped_t2,
            exact_matches,
        };
        let accepted = (mappings > 0
            && (mappings > non_mapped_t2
                || (mappings > 1 && mappings >= non_mapped_t2)
                || (exact_matches >= mappings && non_mapped_t1 == 0)
                || (exact_matches == 1
                    && !throws_new_exception_exact_match
                    && non_mapped_t2 - exact_matches <= SINGLE_EXACT_MATCH_SLACK)
                || (!exception_handling_exact_match
                    && exact_matches > 1
                    && additional <= exact_matches
                    && non_mapped_t2 - exact_matches < MULTIPLE_EXACT_MATCH_SLACK)
                || (mappings == 1 && mappings > candidate.non_mapped_leaf_elements_t2() as i64)))
            || argument_extracted_with_default_return_added(candidate);
        Verdict { accepted, counts }
    }

    /// Whether `candidate`, the alignment of a removed operation with
    /// `parent.container2`, shows the removed operation was inlined.
    pub fn inline(&self, candidate: &BodyMapper, parent: &BodyMapper) -> Verdict {
        let inlined = self.operations.get(candidate.container1);
        if let Some(statement) = inlined.and_then(|op| op.single_statement()) {
            if let [variable] = statement.variables.as_slice() {
                if statement.returns_variable(variable) {
                    return Verdict::rejected();
                }
            }
        }

        let delegate_statements = match (inlined, self.operations.get(parent.container1)) {
            (Some(inlined), Some(caller)) => candidate
                .non_mapped_leaves_t1
                .iter()
                .filter_map(|leaf| leaf.invocation_covering_entire_fragment())
                .filter(|invocation| self.matcher.matches(invocation, inlined, caller))
                .count(),
            _ => 0,
        };

        let mappings = candidate.mappings_without_blocks() as i64;
        let mut non_mapped_t1 = candidate.non_mapped_elements_t1() as i64 - delegate_statements as i64;
        if non_mapped_t1 == 1 {
            let declarations = candidate
                .non_mapped_leaves_t1
                .iter()
                .flat_map(|leaf| leaf.declarations.iter());
            for declaration in declarations {
                let replaced = candidate
                    .mappings
                    .iter()
                    .any(|m| m.replacements.iter().any(|r| r.before == declaration.name));
                if replaced {
                    non_mapped_t1 -= 1;
                }
            }
        }

        let exact = candidate.exact_matches();
        let outside_nested = candidate.exact_matches_without_matches_in_nested_containers();
        let exact_matches = exact.len() as i64;
        let exact_outside_nested = outside_nested.len() as i64;

        let counts = MatchCounts {
            mappings,
            non_mapped_t1,
            non_mapped_t2: candidate.non_mapped_elements_t2() as i64,
            exact_matches,
        };
        let accepted = mappings > 0
            && (mappings > non_mapped_t1
                || (exact_outside_nested == 1
                    && !outside_nested[0].fragment1.throws_new_exception()
                    && non_mapped_t1 - exact_outside_nested < SINGLE_EXACT_MATCH_SLACK)
                || (exact_matches > 1 && non_mapped_t1 - exact_matches < MULTIPLE_EXACT_MATCH_SLACK));
        Verdict { accepted, counts }
    }

    fn both_delegates(&self, mapper: &BodyMapper) -> bool {
        let delegate = |id| {
            self.operations
                .get(id)
                .is_some_and(|op| op.is_delegate().is_some())
        };
        delegate(mapper.container1) && delegate(mapper.container2)
    }
}

/// A lone expression mapping taken out of a composite of the parent whose
/// after-side counterpart does not call the candidate.
fn expression_of_unrelated_composite(mapping: &Mapping, candidate: &BodyMapper, parent: &BodyMapper) -> bool {
    parent.mappings.iter().filter(|m| m.is_composite()).any(|composite| {
        composite.fragment1.expressions.contains(&mapping.fragment1.id)
            && !candidate
                .invocation
                .as_ref()
                .is_some_and(|call| composite.fragment2.invocations.contains(call))
    })
}

/// `foo(bar())` became `x = bar(); if (...) { return ...; }` style code: one
/// mapping whose argument was replaced by the callee's return expression, one
/// new `if`, and one new `return`.
fn argument_extracted_with_default_return_added(candidate: &BodyMapper) -> bool {
    let [mapping] = candidate.mappings.as_slice() else {
        return false;
    };
    let inner_nodes: Vec<_> = candidate
        .non_mapped_inner_nodes_t2
        .iter()
        .filter(|node| !node.is_block())
        .collect();
    mapping.contains_replacement(ReplacementKind::ArgumentReplacedWithReturnExpression)
        && matches!(inner_nodes.as_slice(), [node] if node.text.starts_with("if"))
        && matches!(candidate.non_mapped_leaves_t2.as_slice(), [leaf] if leaf.text.starts_with("return "))
}
