//! Extract-operation detection for one host mapper.
//!
//! The host is the alignment of a before-side operation with its after-side
//! counterpart. An added operation called from the after side is a candidate:
//! the before-side body is aligned with the candidate's body, and with the
//! bodies of added operations the candidate calls in turn, and each alignment
//! is scored. Statements of rejected alignments go back to the host as
//! non-mapped statements so later candidates can still claim them.

use std::collections::HashMap;

use indexmap::IndexMap;
use refminer_core::THIS_DOT;
use refminer_model::{
    compatible_types, AlignmentKind, AlignmentRequest, BodyMapper, Invocation, Operation, Parameter,
    PromotedFragments, TypeRef,
};

use crate::call_tree::{CallGraphNode, CallKey, CallTree};
use crate::detector::{
    add_statement_invocations, competing_candidates, contains_identical_mappings, parameter_to_argument,
    similar_calls, sort_by_calls, CallCounts, DetectorEnv,
};
use crate::error::Result;
use crate::refactoring::{OperationRef, Refactoring};

pub struct ExtractOperationDetector<'a> {
    env: DetectorEnv<'a>,
    container1: &'a Operation,
    container2: &'a Operation,
    added: Vec<&'a Operation>,
    sorted: Vec<&'a Operation>,
    call_counts: CallCounts,
    call_trees: HashMap<CallKey, CallTree>,
}

impl<'a> ExtractOperationDetector<'a> {
    /// Candidates are added operations called from the after side of `host`,
    /// not counting calls in statements that were mapped exactly.
    pub fn new(env: DetectorEnv<'a>, host: &BodyMapper, added: Vec<&'a Operation>) -> Result<Self> {
        let container2 = env.operations.require(host.container2)?;
        let mut invocations: Vec<Invocation> = container2.all_invocations().cloned().collect();
        let exact = host
            .mappings
            .iter()
            .filter(|m| m.exact && m.replacements_involving_method_invocation().next().is_none());
        for mapping in exact {
            for invocation in &mapping.fragment2.invocations {
                let position = invocations
                    .iter()
                    .position(|i| i == invocation || i.actual_string() == invocation.actual_string());
                if let Some(position) = position {
                    invocations.remove(position);
                }
            }
        }
        for leaf in &host.non_mapped_leaves_t2 {
            add_statement_invocations(&mut invocations, leaf);
        }
        Self::with_invocations(env, host, added, invocations)
    }

    /// Candidates are added operations called from the leftovers of the
    /// other mappers of the class pair, for code that moved into an added
    /// operation called from somewhere else.
    pub fn with_calls_in_other_mappers<'m>(
        env: DetectorEnv<'a>,
        host: &BodyMapper,
        mappers: impl IntoIterator<Item = &'m BodyMapper>,
        added: Vec<&'a Operation>,
    ) -> Result<Self> {
        let mut invocations = Vec::new();
        let others = mappers
            .into_iter()
            .filter(|m| m.container1 != host.container1 || m.container2 != host.container2);
        for other in others {
            for leaf in &other.non_mapped_leaves_t2 {
                add_statement_invocations(&mut invocations, leaf);
            }
            for mapping in other.mappings.iter().filter(|m| !m.exact) {
                add_statement_invocations(&mut invocations, &mapping.fragment2);
            }
        }
        Self::with_invocations(env, host, added, invocations)
    }

    fn with_invocations(
        env: DetectorEnv<'a>,
        host: &BodyMapper,
        added: Vec<&'a Operation>,
        invocations: Vec<Invocation>,
    ) -> Result<Self> {
        let container1 = env.operations.require(host.container1)?;
        let container2 = env.operations.require(host.container2)?;
        let (sorted, call_counts) = sort_by_calls(&added, &invocations, container2, &env.matcher);
        Ok(Self {
            env,
            container1,
            container2,
            added,
            sorted,
            call_counts,
            call_trees: HashMap::new(),
        })
    }

    /// Added operations with at least one call site, the most called first.
    pub fn candidates(&self) -> &[&'a Operation] {
        &self.sorted
    }

    /// Looks for extractions of `added` out of `host`.
    ///
    /// `host` must be the mapper this detector was built for. Statements of
    /// rejected alignments are appended to its non-mapped sets.
    pub fn check(&mut self, host: &mut BodyMapper, added: &'a Operation) -> Result<Vec<Refactoring>> {
        self.env.ctx.check("extract")?;
        let mut refactorings = Vec::new();
        let has_leftovers = !host.non_mapped_leaves_t1.is_empty()
            || !host.non_mapped_inner_nodes_t1.is_empty()
            || !host.replacements_involving_method_invocation().is_empty()
            || host.contains_composite_mapping_without_replacements();
        if !has_leftovers {
            return Ok(refactorings);
        }
        let invocations = match self.call_counts.get(&added.id) {
            Some(invocations) if !invocations.is_empty() => invocations.clone(),
            _ => return Ok(refactorings),
        };

        let (other_called, other_same_or_more) =
            competing_candidates(added, &self.added, invocations.len(), |other| {
                self.call_counts.get(&other.id).map_or(0, Vec::len)
            });
        let dominant = other_same_or_more == 0
            && (other_called == 0
                || self.container1.statement_count() > invocations.len() * added.statement_count());
        if dominant {
            let sorted = sort_by_argument_occurrences(host, invocations);
            for invocation in &sorted {
                self.process(host, added, &sorted, invocation, &mut refactorings)?;
            }
        } else if let Some(first) = invocations.first() {
            self.process(host, added, &invocations, first, &mut refactorings)?;
        }
        Ok(refactorings)
    }

    fn process(
        &mut self,
        host: &mut BodyMapper,
        added: &'a Operation,
        invocations: &[Invocation],
        invocation: &Invocation,
        refactorings: &mut Vec<Refactoring>,
    ) -> Result<()> {
        if invocation.is_super_call() {
            return Ok(());
        }
        let nodes = self.call_tree_below(added, invocation)?;
        let Some(mut candidate) = self.create_mapper(host, self.container1, added, invocation, false) else {
            return Ok(());
        };
        if contains_identical_mappings(refactorings, &candidate) {
            return Ok(());
        }

        let scorer = self.env.scorer();
        let mut additional_exact_matches = 0;
        for node in &nodes {
            self.env.ctx.check("extract")?;
            let original = self.env.operations.require(node.caller)?;
            let invoked = self.env.operations.require(node.invoked)?;
            let Some(nested) = self.create_mapper(&candidate, original, invoked, &node.invocation, true) else {
                continue;
            };
            if contains_identical_mappings(refactorings, &nested) {
                continue;
            }
            additional_exact_matches += nested.exact_matches().len();
            let accepted = scorer.extract(&nested, &candidate, 0).accepted
                && (scorer.extract(&candidate, host, additional_exact_matches).accepted
                    || self.env.matcher.delegates_to(original, invoked).is_some());
            if accepted {
                let source_after = self.env.operations.require(candidate.container2)?;
                tracing::debug!(
                    target: "refminer.diff.extract",
                    extracted = %invoked.signature(),
                    from = %original.signature(),
                    "accepted nested extraction"
                );
                refactorings.push(Refactoring::ExtractOperation {
                    source_before: self.container1.into(),
                    source_after: source_after.into(),
                    extracted: invoked.into(),
                    delegate: None,
                    invocations: self
                        .env
                        .matcher
                        .matching_invocations(invoked, original.all_invocations(), original),
                    body_mapper: nested.clone(),
                });
                candidate.child_mappers.push(nested);
            } else {
                let mut promoted = PromotedFragments::default();
                promoted.push_fragments1(&nested);
                candidate.absorb(promoted);
            }
        }

        let delegate = self.find_delegate(self.container1, added, invocation);
        let verdict = scorer.extract(&candidate, host, additional_exact_matches);
        tracing::debug!(
            target: "refminer.diff.extract",
            added = %added.signature(),
            source = %self.container1.signature(),
            accepted = verdict.accepted,
            mappings = verdict.counts.mappings,
            non_mapped_t1 = verdict.counts.non_mapped_t1,
            non_mapped_t2 = verdict.counts.non_mapped_t2,
            exact_matches = verdict.counts.exact_matches,
            "scored extract candidate"
        );
        if verdict.accepted {
            refactorings.push(Refactoring::ExtractOperation {
                source_before: self.container1.into(),
                source_after: self.container2.into(),
                extracted: added.into(),
                delegate: delegate.map(OperationRef::from),
                invocations: invocations.to_vec(),
                body_mapper: candidate,
            });
        } else {
            let mut promoted = PromotedFragments::default();
            promoted.push_fragments1(&candidate);
            host.absorb(promoted);
        }
        Ok(())
    }

    /// Non-root nodes of the call tree rooted at `invocation`, breadth first.
    fn call_tree_below(&mut self, added: &'a Operation, invocation: &Invocation) -> Result<Vec<CallGraphNode>> {
        let key = CallKey {
            caller: self.container1.id,
            invoked: added.id,
            invocation: invocation.location.clone(),
        };
        if !self.call_trees.contains_key(&key) {
            let tree = CallTree::build(
                self.container1,
                added,
                invocation,
                &self.added,
                &self.env.matcher,
                self.env.ctx,
            )?;
            self.call_trees.insert(key.clone(), tree);
        }
        let nodes = match self.call_trees.get(&key) {
            Some(tree) => tree
                .nodes_in_breadth_first_order()
                .into_iter()
                .skip(1)
                .map(|id| tree.node(id).clone())
                .collect(),
            None => Vec::new(),
        };
        Ok(nodes)
    }

    /// Aligns the host's before side with the body of `added`, as called from
    /// `original` at `invocation`.
    fn create_mapper(
        &self,
        parent: &BodyMapper,
        original: &'a Operation,
        added: &'a Operation,
        invocation: &Invocation,
        nested: bool,
    ) -> Option<BodyMapper> {
        let mut passed_through: IndexMap<&str, (&TypeRef, &Parameter)> = IndexMap::new();
        for (parameter, argument) in added.parameters.iter().zip(&invocation.arguments) {
            for original_parameter in original.parameters.iter().filter(|p| p.name == *argument) {
                passed_through.insert(original_parameter.name.as_str(), (&original_parameter.ty, parameter));
            }
        }
        let hierarchy = self.env.matcher.hierarchy();
        let types_match = passed_through.values().all(|(original_type, parameter)| {
            *original_type == &parameter.ty
                || original_type.equals_unqualified(&parameter.ty)
                || original_type.equal_class_type(&parameter.ty)
                || compatible_types(original_type, &parameter.ty, hierarchy)
        });
        if !types_match {
            tracing::trace!(
                target: "refminer.diff.extract",
                added = %added.signature(),
                "parameter passed through with incompatible type"
            );
            return None;
        }

        let target = self.find_delegate(original, added, invocation).unwrap_or(added);
        let arguments = parameter_to_argument(&added.parameters, &invocation.arguments);
        self.env.aligner.align(&AlignmentRequest {
            kind: AlignmentKind::Extract,
            parent,
            container1: self.container1,
            container2: target,
            invocation,
            parameter_to_argument: &arguments,
            nested,
        })
    }

    /// When `added` only forwards to an added overload, and `original` is
    /// not itself a forwarder, returns that overload.
    fn find_delegate(&self, original: &Operation, added: &Operation, invocation: &Invocation) -> Option<&'a Operation> {
        let forwarded = added.is_delegate()?;
        if original.is_delegate().is_some() || original.all_invocations().any(|i| similar_calls(i, invocation)) {
            return None;
        }
        self.added
            .iter()
            .copied()
            .find(|op| op.id != added.id && self.env.matcher.matches(forwarded, op, added))
    }
}

/// Puts first the call sites whose arguments are used most by the host's
/// non-mapped before-side statements. A call site moves to the front only
/// when it beats every call site seen before it.
fn sort_by_argument_occurrences(host: &BodyMapper, invocations: Vec<Invocation>) -> Vec<Invocation> {
    if invocations.len() <= 1 {
        return invocations;
    }
    let variables: Vec<&str> = host
        .non_mapped_inner_nodes_t1
        .iter()
        .chain(&host.non_mapped_leaves_t1)
        .flat_map(|fragment| fragment.variables.iter().map(String::as_str))
        .collect();
    let frequency = |name: &str| variables.iter().filter(|v| **v == name).count();

    let mut sorted = Vec::with_capacity(invocations.len());
    let mut max = 0;
    for invocation in invocations {
        let occurrences: usize = invocation
            .arguments
            .iter()
            .map(|argument| match argument.strip_prefix(THIS_DOT) {
                Some(field) if !variables.contains(&argument.as_str()) => frequency(field),
                _ => frequency(argument),
            })
            .sum();
        if occurrences > max {
            sorted.insert(0, invocation);
            max = occurrences;
        } else {
            sorted.push(invocation);
        }
    }
    sorted
}
