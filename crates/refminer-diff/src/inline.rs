//! Inline-operation detection for one host mapper.
//!
//! Mirror image of extraction: a removed operation called from the before
//! side of the host is a candidate, and its body is aligned with the after
//! side of the host.

use std::collections::HashMap;

use refminer_model::{
    AlignmentKind, AlignmentRequest, AnonymousClass, BodyMapper, Invocation, Operation, PromotedFragments,
};

use crate::call_tree::{CallGraphNode, CallKey, CallTree};
use crate::detector::{
    add_invocation, add_statement_invocations, competing_candidates, contains_identical_mappings,
    parameter_to_argument, similar_calls, sort_by_calls, CallCounts, DetectorEnv,
};
use crate::error::Result;
use crate::refactoring::Refactoring;

pub struct InlineOperationDetector<'a> {
    env: DetectorEnv<'a>,
    container1: &'a Operation,
    container2: &'a Operation,
    removed: Vec<&'a Operation>,
    added: Vec<&'a Operation>,
    sorted: Vec<&'a Operation>,
    call_counts: CallCounts,
    call_trees: HashMap<CallKey, CallTree>,
}

impl<'a> InlineOperationDetector<'a> {
    /// Candidates are removed operations called from the before side of
    /// `host`, including calls made inside removed anonymous classes declared
    /// in its non-mapped statements.
    ///
    /// `added` is consulted to skip call sites that survive in the after side
    /// and now reach an added operation of the same shape.
    pub fn new(
        env: DetectorEnv<'a>,
        host: &BodyMapper,
        removed: Vec<&'a Operation>,
        added: Vec<&'a Operation>,
        removed_anonymous: &[&AnonymousClass],
    ) -> Result<Self> {
        let container1 = env.operations.require(host.container1)?;
        let container2 = env.operations.require(host.container2)?;
        let mut invocations: Vec<Invocation> = container1.all_invocations().cloned().collect();
        for leaf in &host.non_mapped_leaves_t1 {
            add_statement_invocations(&mut invocations, leaf);
            let declared_here = removed_anonymous
                .iter()
                .filter(|anonymous| leaf.location.subsumes(&anonymous.location));
            for anonymous in declared_here {
                for invocation in anonymous.operations.iter().flat_map(Operation::all_invocations) {
                    add_invocation(&mut invocations, invocation);
                }
            }
        }
        let (sorted, call_counts) = sort_by_calls(&removed, &invocations, container1, &env.matcher);
        Ok(Self {
            env,
            container1,
            container2,
            removed,
            added,
            sorted,
            call_counts,
            call_trees: HashMap::new(),
        })
    }

    /// Removed operations with at least one call site, the most called first.
    pub fn candidates(&self) -> &[&'a Operation] {
        &self.sorted
    }

    /// Looks for inlinings of `removed` into `host`.
    ///
    /// `host` must be the mapper this detector was built for. Statements of
    /// rejected alignments are appended to its after-side non-mapped sets.
    pub fn check(&mut self, host: &mut BodyMapper, removed: &'a Operation) -> Result<Vec<Refactoring>> {
        self.env.ctx.check("inline")?;
        let mut refactorings = Vec::new();
        let has_leftovers = !host.non_mapped_leaves_t2.is_empty()
            || !host.non_mapped_inner_nodes_t2.is_empty()
            || !host.replacements_involving_method_invocation().is_empty()
            || host.contains_composite_mapping_without_replacements();
        if !has_leftovers {
            return Ok(refactorings);
        }
        let invocations = match self.call_counts.get(&removed.id) {
            Some(invocations) if !invocations.is_empty() => invocations.clone(),
            _ => return Ok(refactorings),
        };
        if self.reaches_added_operation(&invocations[0]) {
            return Ok(refactorings);
        }

        let (other_called, other_same_or_more) =
            competing_candidates(removed, &self.removed, invocations.len(), |other| {
                self.call_counts.get(&other.id).map_or(0, Vec::len)
            });
        let dominant = other_same_or_more == 0
            && (other_called == 0
                || self.container2.statement_count() > invocations.len() * removed.statement_count());
        if dominant {
            for invocation in &invocations {
                self.process(host, removed, &invocations, invocation, &mut refactorings)?;
            }
        } else {
            self.process(host, removed, &invocations, &invocations[0], &mut refactorings)?;
        }
        Ok(refactorings)
    }

    /// The call is still made from the after side and resolves to an added
    /// operation there.
    fn reaches_added_operation(&self, invocation: &Invocation) -> bool {
        self.container2
            .all_invocations()
            .any(|other| similar_calls(other, invocation))
            && self
                .added
                .iter()
                .any(|added| self.env.matcher.matches(invocation, added, self.container1))
    }

    fn process(
        &mut self,
        host: &mut BodyMapper,
        removed: &'a Operation,
        invocations: &[Invocation],
        invocation: &Invocation,
        refactorings: &mut Vec<Refactoring>,
    ) -> Result<()> {
        if invocation.is_super_call() {
            return Ok(());
        }
        let nodes = self.call_tree_below(removed, invocation)?;
        let Some(mut candidate) = self.create_mapper(host, removed, invocation, false) else {
            return Ok(());
        };
        if contains_identical_mappings(refactorings, &candidate) {
            return Ok(());
        }

        let scorer = self.env.scorer();
        for node in &nodes {
            self.env.ctx.check("inline")?;
            let already_inlined = refactorings.iter().filter_map(Refactoring::body_mapper).any(|mapper| {
                mapper.container1 == node.invoked && mapper.container2 == candidate.container2
            });
            if already_inlined {
                continue;
            }
            let original = self.env.operations.require(node.caller)?;
            let invoked = self.env.operations.require(node.invoked)?;
            let Some(nested) = self.create_mapper(&candidate, invoked, &node.invocation, true) else {
                continue;
            };
            if scorer.inline(&nested, &candidate).accepted {
                tracing::debug!(
                    target: "refminer.diff.inline",
                    inlined = %invoked.signature(),
                    from = %original.signature(),
                    "accepted nested inlining"
                );
                refactorings.push(Refactoring::InlineOperation {
                    inlined: invoked.into(),
                    target_before: removed.into(),
                    target_after: self.container2.into(),
                    invocations: self
                        .env
                        .matcher
                        .matching_invocations(invoked, original.all_invocations(), original),
                    body_mapper: nested.clone(),
                });
                candidate.child_mappers.push(nested);
            } else {
                let mut promoted = PromotedFragments::default();
                promoted.push_fragments2(&nested);
                candidate.absorb(promoted);
            }
        }

        let verdict = scorer.inline(&candidate, host);
        tracing::debug!(
            target: "refminer.diff.inline",
            removed = %removed.signature(),
            target = %self.container2.signature(),
            accepted = verdict.accepted,
            mappings = verdict.counts.mappings,
            non_mapped_t1 = verdict.counts.non_mapped_t1,
            non_mapped_t2 = verdict.counts.non_mapped_t2,
            exact_matches = verdict.counts.exact_matches,
            "scored inline candidate"
        );
        if verdict.accepted {
            refactorings.push(Refactoring::InlineOperation {
                inlined: removed.into(),
                target_before: self.container1.into(),
                target_after: self.container2.into(),
                invocations: invocations.to_vec(),
                body_mapper: candidate,
            });
        } else {
            let mut promoted = PromotedFragments::default();
            promoted.push_fragments2(&candidate);
            host.absorb(promoted);
        }
        Ok(())
    }

    fn call_tree_below(&mut self, removed: &'a Operation, invocation: &Invocation) -> Result<Vec<CallGraphNode>> {
        let key = CallKey {
            caller: self.container1.id,
            invoked: removed.id,
            invocation: invocation.location.clone(),
        };
        if !self.call_trees.contains_key(&key) {
            let tree = CallTree::build(
                self.container1,
                removed,
                invocation,
                &self.removed,
                &self.env.matcher,
                self.env.ctx,
            )?;
            self.call_trees.insert(key.clone(), tree);
        }
        Ok(self
            .call_trees
            .get(&key)
            .map(|tree| {
                tree.nodes_in_breadth_first_order()
                    .into_iter()
                    .skip(1)
                    .map(|id| tree.node(id).clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn create_mapper(
        &self,
        parent: &BodyMapper,
        removed: &'a Operation,
        invocation: &Invocation,
        nested: bool,
    ) -> Option<BodyMapper> {
        let arguments = parameter_to_argument(&removed.parameters, &invocation.arguments);
        self.env.aligner.align(&AlignmentRequest {
            kind: AlignmentKind::Inline,
            parent,
            container1: removed,
            container2: self.container2,
            invocation,
            parameter_to_argument: &arguments,
            nested,
        })
    }
}
