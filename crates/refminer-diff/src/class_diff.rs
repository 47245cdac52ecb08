//! Refactoring inference for one class pair.
//!
//! [`ClassDiff`] owns everything that changes while a class pair is
//! processed: the matched-operation mappers, the lists of still unmatched
//! added and removed operations, and the anonymous classes nobody claimed
//! yet. Passes run in a fixed order, each one consuming what the earlier ones
//! left:
//!
//! 1. inline detection on every mapper,
//! 2. extract detection on every mapper,
//! 3. extract detection driven by call sites in the other mappers,
//! 4. inline detection into the operations extracted in step 2,
//! 5. attribute rename, merge and split resolution.

use std::time::Instant;

use refminer_config::DetectionConfig;
use refminer_core::OperationId;
use refminer_model::{
    AnonymousClass, BodyAligner, BodyMapper, ClassModel, Operation, PrecomputedAligner, TypeHierarchy,
};
use serde::{Deserialize, Serialize};

use crate::attributes::{AttributeCandidateResolver, UnresolvedCandidates};
use crate::context::DetectionContext;
use crate::detector::DetectorEnv;
use crate::error::{DiffError, Result};
use crate::extract::ExtractOperationDetector;
use crate::inline::InlineOperationDetector;
use crate::invocation::InvocationMatcher;
use crate::operations::OperationTable;
use crate::refactoring::{OperationRef, Refactoring};

/// A class pair as handed over by the parser and the statement aligner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDiffInput {
    pub original: ClassModel,
    pub next: ClassModel,
    /// One mapper per matched operation pair.
    #[serde(default)]
    pub mappers: Vec<BodyMapper>,
    /// Operations only in `next`. When absent, every operation of `next`
    /// that is not the after side of a mapper.
    #[serde(default)]
    pub added_operations: Option<Vec<OperationId>>,
    /// Operations only in `original`. When absent, every operation of
    /// `original` that is not the before side of a mapper.
    #[serde(default)]
    pub removed_operations: Option<Vec<OperationId>>,
    /// Alignments for the extract and inline hypotheses the detectors try.
    #[serde(default)]
    pub alignments: PrecomputedAligner,
    #[serde(default)]
    pub type_hierarchy: TypeHierarchy,
}

impl ClassDiffInput {
    pub fn new(original: ClassModel, next: ClassModel) -> Self {
        Self {
            original,
            next,
            mappers: Vec::new(),
            added_operations: None,
            removed_operations: None,
            alignments: PrecomputedAligner::default(),
            type_hierarchy: TypeHierarchy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassDiffReport {
    pub original_class: String,
    pub next_class: String,
    pub refactorings: Vec<Refactoring>,
    /// The mappers after detection, with accepted extract and inline mappers
    /// attached as children.
    #[serde(skip)]
    pub mappers: Vec<BodyMapper>,
    pub added_operations: Vec<OperationRef>,
    pub removed_operations: Vec<OperationRef>,
    pub added_anonymous_classes: Vec<String>,
    pub removed_anonymous_classes: Vec<String>,
    pub unresolved: UnresolvedCandidates,
}

pub struct ClassDiff<'a> {
    original: &'a ClassModel,
    next: &'a ClassModel,
    operations: OperationTable<'a>,
    hierarchy: &'a TypeHierarchy,
    aligner: &'a dyn BodyAligner,
    mappers: Vec<BodyMapper>,
    added_operations: Vec<&'a Operation>,
    removed_operations: Vec<&'a Operation>,
    added_anonymous: Vec<&'a AnonymousClass>,
    removed_anonymous: Vec<&'a AnonymousClass>,
}

impl<'a> ClassDiff<'a> {
    /// Checks the input for operation ids that are declared twice or not
    /// at all, and works out the unmatched operations and anonymous classes.
    pub fn new(input: &'a ClassDiffInput) -> Result<Self> {
        let original = &input.original;
        let next = &input.next;
        let operations = OperationTable::new(original, next)?;
        for mapper in &input.mappers {
            operations.require(mapper.container1)?;
            operations.require(mapper.container2)?;
        }

        let added_operations = match &input.added_operations {
            Some(ids) => ids.iter().map(|id| operations.require(*id)).collect::<Result<Vec<_>>>()?,
            None => next
                .operations
                .iter()
                .filter(|op| input.mappers.iter().all(|m| m.container2 != op.id))
                .collect(),
        };
        let removed_operations = match &input.removed_operations {
            Some(ids) => ids.iter().map(|id| operations.require(*id)).collect::<Result<Vec<_>>>()?,
            None => original
                .operations
                .iter()
                .filter(|op| input.mappers.iter().all(|m| m.container1 != op.id))
                .collect(),
        };
        let added_anonymous = next
            .anonymous_classes
            .iter()
            .filter(|anon| original.anonymous_classes.iter().all(|other| other.name != anon.name))
            .collect();
        let removed_anonymous = original
            .anonymous_classes
            .iter()
            .filter(|anon| next.anonymous_classes.iter().all(|other| other.name != anon.name))
            .collect();

        Ok(Self {
            original,
            next,
            operations,
            hierarchy: &input.type_hierarchy,
            aligner: &input.alignments,
            mappers: input.mappers.clone(),
            added_operations,
            removed_operations,
            added_anonymous,
            removed_anonymous,
        })
    }

    /// Replaces the precomputed alignments of the input with another aligner.
    pub fn with_aligner(mut self, aligner: &'a dyn BodyAligner) -> Self {
        self.aligner = aligner;
        self
    }

    pub fn added_operations(&self) -> &[&'a Operation] {
        &self.added_operations
    }

    pub fn removed_operations(&self) -> &[&'a Operation] {
        &self.removed_operations
    }

    /// Runs every enabled pass. A tripped deadline or cancellation aborts the
    /// whole class pair; nothing partial is returned.
    pub fn detect(self, config: &DetectionConfig, ctx: &DetectionContext) -> Result<ClassDiffReport> {
        let started = Instant::now();
        let ClassDiff {
            original,
            next,
            operations,
            hierarchy,
            aligner,
            mut mappers,
            added_operations,
            removed_operations,
            added_anonymous,
            removed_anonymous,
        } = self;
        let mut run = Run {
            env: DetectorEnv {
                operations: &operations,
                matcher: InvocationMatcher::new(hierarchy),
                aligner,
                ctx,
            },
            config,
            added: added_operations,
            removed: removed_operations,
            added_anonymous,
            removed_anonymous,
            refactorings: Vec::new(),
        };

        let unresolved = match run.all_passes(original, next, &mut mappers) {
            Ok(unresolved) => unresolved,
            Err(err) => {
                if matches!(err, DiffError::Timeout { .. } | DiffError::Cancelled { .. }) {
                    tracing::warn!(
                        target: "refminer.diff",
                        original = %original.name,
                        next = %next.name,
                        error = %err,
                        "class pair detection aborted"
                    );
                }
                return Err(err);
            }
        };

        tracing::info!(
            target: "refminer.diff",
            original = %original.name,
            next = %next.name,
            refactorings = run.refactorings.len(),
            added_left = run.added.len(),
            removed_left = run.removed.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "class pair processed"
        );
        Ok(ClassDiffReport {
            original_class: original.name.clone(),
            next_class: next.name.clone(),
            refactorings: run.refactorings,
            mappers,
            added_operations: run.added.iter().copied().map(OperationRef::from).collect(),
            removed_operations: run.removed.iter().copied().map(OperationRef::from).collect(),
            added_anonymous_classes: run.added_anonymous.iter().map(|anon| anon.name.clone()).collect(),
            removed_anonymous_classes: run.removed_anonymous.iter().map(|anon| anon.name.clone()).collect(),
            unresolved,
        })
    }
}

/// Where an accepted extraction's mapper lives: as child `child` of mapper
/// `host`, mirrored in refactoring `refactoring`.
#[derive(Debug, Clone, Copy)]
struct ExtractedSlot {
    host: usize,
    child: usize,
    refactoring: usize,
}

struct Run<'r> {
    env: DetectorEnv<'r>,
    config: &'r DetectionConfig,
    added: Vec<&'r Operation>,
    removed: Vec<&'r Operation>,
    added_anonymous: Vec<&'r AnonymousClass>,
    removed_anonymous: Vec<&'r AnonymousClass>,
    refactorings: Vec<Refactoring>,
}

impl<'r> Run<'r> {
    fn all_passes(
        &mut self,
        original: &'r ClassModel,
        next: &'r ClassModel,
        mappers: &mut [BodyMapper],
    ) -> Result<UnresolvedCandidates> {
        if self.config.inline_operations {
            let mut hosts: Vec<&mut BodyMapper> = mappers.iter_mut().collect();
            let accepted = self.inline_into(&mut hosts)?;
            self.consume_removed(&accepted);
        }

        let mut extracted = Vec::new();
        if self.config.extract_operations {
            extracted = self.extract_pass(mappers)?;
        }
        if self.config.extract_with_calls_in_other_mappers {
            self.extract_with_calls_in_other_mappers(mappers)?;
        }
        if self.config.inline_operations && self.config.inline_into_extracted_operations && !extracted.is_empty() {
            let mut hosts: Vec<&mut BodyMapper> = mappers
                .iter_mut()
                .enumerate()
                .flat_map(|(host, mapper)| {
                    let children: Vec<usize> = extracted.iter().filter(|s| s.host == host).map(|s| s.child).collect();
                    mapper
                        .child_mappers
                        .iter_mut()
                        .enumerate()
                        .filter(move |(child, _)| children.contains(child))
                        .map(|(_, body)| body)
                })
                .collect();
            let accepted = self.inline_into(&mut hosts)?;
            drop(hosts);
            for slot in &extracted {
                let updated = mappers[slot.host].child_mappers[slot.child].clone();
                if let Some(body) = self.refactorings[slot.refactoring].body_mapper_mut() {
                    *body = updated;
                }
            }
            self.consume_removed(&accepted);
        }

        let mut resolver = AttributeCandidateResolver::new(original, next, self.env.operations, self.env.matcher)
            .with_unmatched_operations(self.added.clone(), self.removed.clone());
        for mapper in mappers.iter() {
            resolver.collect(mapper, &self.refactorings);
        }
        let resolution = resolver.resolve(mappers, &self.refactorings, self.config, self.env.ctx)?;
        self.refactorings.extend(resolution.refactorings);
        Ok(resolution.unresolved)
    }

    /// Inline detection with each of `hosts` as the host mapper. Returns the
    /// ids of the removed operations that were claimed.
    fn inline_into(&mut self, hosts: &mut [&mut BodyMapper]) -> Result<Vec<OperationId>> {
        let mut consumed = Vec::new();
        for host in hosts.iter_mut() {
            let host: &mut BodyMapper = host;
            let mut detector = InlineOperationDetector::new(
                self.env,
                host,
                self.removed.clone(),
                self.added.clone(),
                &self.removed_anonymous,
            )?;
            for removed in detector.candidates().to_vec() {
                for refactoring in detector.check(host, removed)? {
                    if let Some(body) = refactoring.body_mapper() {
                        host.child_mappers.push(body.clone());
                    }
                    tracing::debug!(target: "refminer.diff", fact = %refactoring, "inline accepted");
                    self.refactorings.push(refactoring);
                    consumed.push(removed.id);
                }
            }
        }
        Ok(consumed)
    }

    fn extract_pass(&mut self, mappers: &mut [BodyMapper]) -> Result<Vec<ExtractedSlot>> {
        let mut consumed: Vec<OperationId> = Vec::new();
        let mut slots = Vec::new();
        for (host_index, host) in mappers.iter_mut().enumerate() {
            let mut detector = ExtractOperationDetector::new(self.env, host, self.added.clone())?;
            for added in detector.candidates().to_vec() {
                let refactorings = detector.check(host, added)?;
                let discarded = self.single_call_discards(&refactorings);
                for (refactoring, discarded) in refactorings.into_iter().zip(discarded) {
                    if discarded {
                        tracing::debug!(target: "refminer.diff", fact = %refactoring, "extract discarded");
                        continue;
                    }
                    self.accept_extract(host, refactoring);
                    slots.push(ExtractedSlot {
                        host: host_index,
                        child: host.child_mappers.len() - 1,
                        refactoring: self.refactorings.len() - 1,
                    });
                    consumed.push(added.id);
                }
            }
        }
        self.consume_added(&consumed);
        Ok(slots)
    }

    fn extract_with_calls_in_other_mappers(&mut self, mappers: &mut [BodyMapper]) -> Result<()> {
        let mut consumed = Vec::new();
        for index in 0..mappers.len() {
            let eligible = {
                let host = &mappers[index];
                (!host.non_mapped_leaves_t1.is_empty() || !host.non_mapped_inner_nodes_t1.is_empty())
                    && host.child_mappers.is_empty()
            };
            if !eligible {
                continue;
            }
            let mut detector = ExtractOperationDetector::with_calls_in_other_mappers(
                self.env,
                &mappers[index],
                mappers.iter(),
                self.added.clone(),
            )?;
            let host = &mut mappers[index];
            for added in detector.candidates().to_vec() {
                for refactoring in detector.check(host, added)? {
                    let exact = refactoring.body_mapper().map_or(0, |body| body.exact_matches().len());
                    if exact > 1 {
                        self.accept_extract(host, refactoring);
                        consumed.push(added.id);
                    }
                }
            }
        }
        self.consume_added(&consumed);
        Ok(())
    }

    fn accept_extract(&mut self, host: &mut BodyMapper, refactoring: Refactoring) {
        if let Some(body) = refactoring.body_mapper() {
            self.removed_anonymous.retain(|anon| {
                !body
                    .mappings
                    .iter()
                    .any(|m| m.fragment1.location.subsumes(&anon.location))
            });
            self.added_anonymous.retain(|anon| {
                !body
                    .mappings
                    .iter()
                    .any(|m| m.fragment2.location.subsumes(&anon.location))
            });
            host.child_mappers.push(body.clone());
        }
        tracing::debug!(target: "refminer.diff", fact = %refactoring, "extract accepted");
        self.refactorings.push(refactoring);
    }

    /// When one check yields several extractions, those whose only mapping
    /// is a changed call to the extracted operation itself are dropped,
    /// unless that would drop all of them.
    fn single_call_discards(&self, refactorings: &[Refactoring]) -> Vec<bool> {
        let mut discarded: Vec<bool> = refactorings
            .iter()
            .map(|refactoring| refactorings.len() > 1 && self.is_single_call_mapping(refactoring))
            .collect();
        if discarded.iter().all(|d| *d) {
            discarded.fill(false);
        }
        discarded
    }

    fn is_single_call_mapping(&self, refactoring: &Refactoring) -> bool {
        let Refactoring::ExtractOperation {
            extracted,
            body_mapper,
            ..
        } = refactoring
        else {
            return false;
        };
        let [mapping] = body_mapper.mappings.as_slice() else {
            return false;
        };
        if mapping.identical_text() {
            return false;
        }
        let Some(extracted) = self.env.operations.get(extracted.id) else {
            return false;
        };
        let calls = (
            mapping.fragment1.invocation_covering_entire_fragment(),
            mapping.fragment2.invocation_covering_entire_fragment(),
        );
        matches!(calls, (Some(call1), Some(call2)) if call1.name == extracted.name && call2.name == extracted.name)
    }

    fn consume_added(&mut self, consumed: &[OperationId]) {
        self.added.retain(|op| !consumed.contains(&op.id));
    }

    fn consume_removed(&mut self, consumed: &[OperationId]) {
        self.removed.retain(|op| !consumed.contains(&op.id));
    }
}
