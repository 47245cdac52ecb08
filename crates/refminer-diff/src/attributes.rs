//! Class-level resolution of attribute rename, merge and split candidates.
//!
//! Mappers only see one method pair at a time, so what they report is a local
//! observation: `count` became `total` in this statement. Whether the class
//! really renamed a field is decided here, once every method pair has been
//! aligned and every extraction and inlining is known.

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};
use refminer_config::DetectionConfig;
use refminer_core::{normalize_name, THIS_DOT};
use refminer_model::{
    Attribute, BodyMapper, CandidateMerge, CandidateRename, CandidateSplit, ClassModel, Fragment, Operation,
    Replacement,
};
use serde::Serialize;

use crate::candidates::{total_occurrences, CandidateMaps};
use crate::context::DetectionContext;
use crate::error::Result;
use crate::invocation::InvocationMatcher;
use crate::operations::OperationTable;
use crate::refactoring::{AttributeRef, OperationRef, Refactoring, VariableRef};

/// A rename pattern is dropped when the share of method pairs using only one
/// of its two names exceeds this.
pub const INCONSISTENT_RENAME_RATIO: f64 = 0.5;

/// Candidates no declaration in this class pair could account for.
///
/// Typically the field lives in a superclass or an enclosing class; see
/// [`resolve_in_enclosing_scope`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnresolvedCandidates {
    pub renames: Vec<CandidateRename>,
    pub merges: Vec<CandidateMerge>,
    pub splits: Vec<CandidateSplit>,
}

impl UnresolvedCandidates {
    pub fn is_empty(&self) -> bool {
        self.renames.is_empty() && self.merges.is_empty() && self.splits.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AttributeResolution {
    pub refactorings: Vec<Refactoring>,
    pub unresolved: UnresolvedCandidates,
}

type AliasGroups = IndexMap<String, IndexSet<String>>;

pub struct AttributeCandidateResolver<'a> {
    original: &'a ClassModel,
    next: &'a ClassModel,
    operations: &'a OperationTable<'a>,
    matcher: InvocationMatcher<'a>,
    added_operations: Vec<&'a Operation>,
    removed_operations: Vec<&'a Operation>,
    aliases_original: AliasGroups,
    aliases_next: AliasGroups,
    candidates: CandidateMaps,
}

impl<'a> AttributeCandidateResolver<'a> {
    pub fn new(
        original: &'a ClassModel,
        next: &'a ClassModel,
        operations: &'a OperationTable<'a>,
        matcher: InvocationMatcher<'a>,
    ) -> Self {
        Self {
            original,
            next,
            operations,
            matcher,
            added_operations: Vec::new(),
            removed_operations: Vec::new(),
            aliases_original: original.aliased_attributes(),
            aliases_next: next.aliased_attributes(),
            candidates: CandidateMaps::new(),
        }
    }

    /// Operations left unmatched after extract and inline detection. A name
    /// missing from one side of a method pair is not held against a rename
    /// when one of these operations, called from that pair, uses it.
    pub fn with_unmatched_operations(mut self, added: Vec<&'a Operation>, removed: Vec<&'a Operation>) -> Self {
        self.added_operations = added;
        self.removed_operations = removed;
        self
    }

    pub fn candidates(&self) -> &CandidateMaps {
        &self.candidates
    }

    /// Records the candidates observed in `mapper` and its child mappers.
    ///
    /// `refactorings` are the extractions and inlinings accepted so far.
    pub fn collect(&mut self, mapper: &BodyMapper, refactorings: &[Refactoring]) {
        for mapper in mapper.self_and_descendants() {
            for candidate in &mapper.candidate_renames {
                if self.passed_as_different_attributes(candidate, refactorings) {
                    tracing::debug!(
                        target: "refminer.diff.attributes",
                        original = %candidate.original_name,
                        renamed = %candidate.renamed_name,
                        "rename candidate explained by arguments of an extracted operation"
                    );
                    continue;
                }
                self.candidates.add_rename(candidate.clone());
            }
            for candidate in &mapper.candidate_merges {
                self.candidates.add_merge(candidate.clone());
            }
            for candidate in &mapper.candidate_splits {
                self.candidates.add_split(candidate.clone());
            }
        }
    }

    /// Turns the collected candidates into class-level facts.
    ///
    /// `mappers` are the top-level mappers of the class pair, with their
    /// child mappers, and `refactorings` every fact reported so far.
    pub fn resolve(
        &self,
        mappers: &[BodyMapper],
        refactorings: &[Refactoring],
        config: &DetectionConfig,
        ctx: &DetectionContext,
    ) -> Result<AttributeResolution> {
        let mut resolution = AttributeResolution::default();
        if config.attribute_merges_and_splits {
            self.resolve_merges(refactorings, &mut resolution);
            self.resolve_splits(refactorings, &mut resolution);
            self.infer_merges_and_splits(mappers, refactorings, &mut resolution);
        }
        if config.attribute_renames {
            self.resolve_renames(mappers, refactorings, ctx, &mut resolution)?;
        }
        Ok(resolution)
    }

    fn resolve_merges(&self, refactorings: &[Refactoring], resolution: &mut AttributeResolution) {
        for (merge, candidates) in self.candidates.merges() {
            let merged: Vec<&Attribute> = merge
                .before
                .iter()
                .filter_map(|name| self.find_attribute_in_original(name))
                .collect();
            let new_attribute = self.find_attribute_in_next(&merge.after);
            let resolved = match new_attribute {
                Some(new_attribute)
                    if merged.len() > 1
                        && merged.len() == merge.before.len()
                        && merged[0].class_name == new_attribute.class_name =>
                {
                    Some(Refactoring::MergeAttribute {
                        merged: merged.iter().copied().map(AttributeRef::from).collect(),
                        new_attribute: AttributeRef::from(new_attribute),
                        class_before: self.original.name.clone(),
                        class_after: self.next.name.clone(),
                        candidates: candidates.clone(),
                    })
                }
                _ => None,
            };
            match resolved {
                Some(refactoring) => {
                    if !refactorings.contains(&refactoring) && !resolution.refactorings.contains(&refactoring) {
                        tracing::debug!(target: "refminer.diff.attributes", fact = %refactoring, "merge resolved");
                        resolution.refactorings.push(refactoring);
                    }
                }
                None => resolution.unresolved.merges.extend(candidates.iter().cloned()),
            }
        }
    }

    fn resolve_splits(&self, refactorings: &[Refactoring], resolution: &mut AttributeResolution) {
        for (split, candidates) in self.candidates.splits() {
            let parts: Vec<&Attribute> = split
                .after
                .iter()
                .filter_map(|name| self.find_attribute_in_next(name))
                .collect();
            let old_attribute = self.find_attribute_in_original(&split.before);
            let still_declared = self.find_attribute_in_next(&split.before).is_some();
            let resolved = match old_attribute {
                Some(old_attribute) if parts.len() > 1 && parts.len() == split.after.len() && !still_declared => {
                    Some(Refactoring::SplitAttribute {
                        old_attribute: AttributeRef::from(old_attribute),
                        split: parts.iter().copied().map(AttributeRef::from).collect(),
                        class_before: self.original.name.clone(),
                        class_after: self.next.name.clone(),
                        candidates: candidates.clone(),
                    })
                }
                _ => None,
            };
            match resolved {
                Some(refactoring) => {
                    if !refactorings.contains(&refactoring) && !resolution.refactorings.contains(&refactoring) {
                        tracing::debug!(target: "refminer.diff.attributes", fact = %refactoring, "split resolved");
                        resolution.refactorings.push(refactoring);
                    }
                }
                None => resolution.unresolved.splits.extend(candidates.iter().cloned()),
            }
        }
    }

    /// Attribute merges and splits the candidate collector missed: a rename
    /// candidate whose names match a local merge or split the aligner saw,
    /// while the other merged (split) names are assigned in statements of the
    /// same method pair that stayed unmatched.
    fn infer_merges_and_splits(
        &self,
        mappers: &[BodyMapper],
        refactorings: &[Refactoring],
        resolution: &mut AttributeResolution,
    ) {
        let all_mappers: Vec<&BodyMapper> = mappers.iter().flat_map(BodyMapper::self_and_descendants).collect();
        let mut inferred = Vec::new();
        for candidate in self.candidates.renames().values().flatten() {
            let original = normalize_name(&candidate.original_name);
            let renamed = normalize_name(&candidate.renamed_name);
            let Some(host) = observing_mapper(mappers, candidate) else {
                continue;
            };
            for merge in all_mappers.iter().copied().flat_map(|m| m.variable_merges.iter()) {
                if merge.new_name != renamed {
                    continue;
                }
                let Some(names) = matched_names(&merge.merged, original, &host.non_mapped_leaves_t1) else {
                    continue;
                };
                let merged: Vec<&Attribute> =
                    names.iter().filter_map(|name| self.find_attribute_in_original(name)).collect();
                let Some(new_attribute) = self.find_attribute_in_next(renamed) else {
                    continue;
                };
                if merged.len() > 1 && merged.len() == merge.merged.len() {
                    inferred.push(Refactoring::MergeAttribute {
                        merged: merged.into_iter().map(AttributeRef::from).collect(),
                        new_attribute: AttributeRef::from(new_attribute),
                        class_before: self.original.name.clone(),
                        class_after: self.next.name.clone(),
                        candidates: Vec::new(),
                    });
                }
            }
            for split in all_mappers.iter().copied().flat_map(|m| m.variable_splits.iter()) {
                if split.old_name != original {
                    continue;
                }
                let Some(names) = matched_names(&split.split, renamed, &host.non_mapped_leaves_t2) else {
                    continue;
                };
                let parts: Vec<&Attribute> =
                    names.iter().filter_map(|name| self.find_attribute_in_next(name)).collect();
                let Some(old_attribute) = self.find_attribute_in_original(original) else {
                    continue;
                };
                if parts.len() > 1 && parts.len() == split.split.len() && self.find_attribute_in_next(original).is_none()
                {
                    inferred.push(Refactoring::SplitAttribute {
                        old_attribute: AttributeRef::from(old_attribute),
                        split: parts.into_iter().map(AttributeRef::from).collect(),
                        class_before: self.original.name.clone(),
                        class_after: self.next.name.clone(),
                        candidates: Vec::new(),
                    });
                }
            }
        }
        for refactoring in inferred {
            if !refactorings.contains(&refactoring) && !resolution.refactorings.contains(&refactoring) {
                tracing::debug!(target: "refminer.diff.attributes", fact = %refactoring, "inferred from local variables");
                resolution.refactorings.push(refactoring);
            }
        }
    }

    fn resolve_renames(
        &self,
        mappers: &[BodyMapper],
        refactorings: &[Refactoring],
        ctx: &DetectionContext,
        resolution: &mut AttributeResolution,
    ) -> Result<()> {
        let renames = self.candidates.renames();
        for pattern in self.consistent_patterns() {
            ctx.check("attributes")?;
            let Some(candidates) = renames.get(pattern) else {
                continue;
            };
            let a1 = self.find_attribute_in_original(&pattern.before);
            let a2 = self.find_attribute_in_next(&pattern.after);
            // Pattern-wide checks, only needed once both ends are fields.
            let mut rejection = None;
            for candidate in candidates {
                if let Some(declaration) = &candidate.original_declaration {
                    match a2 {
                        Some(a2) => self.push_variable_rename(
                            candidate,
                            VariableRef::from(declaration),
                            VariableRef::from(a2),
                            refactorings,
                            resolution,
                        ),
                        None => resolution.unresolved.renames.push(candidate.clone()),
                    }
                    continue;
                }
                if let Some(declaration) = &candidate.renamed_declaration {
                    match a1 {
                        Some(a1) => self.push_variable_rename(
                            candidate,
                            VariableRef::from(a1),
                            VariableRef::from(declaration),
                            refactorings,
                            resolution,
                        ),
                        None => resolution.unresolved.renames.push(candidate.clone()),
                    }
                    continue;
                }
                let (Some(a1), Some(a2)) = (a1, a2) else {
                    resolution.unresolved.renames.push(candidate.clone());
                    continue;
                };
                let rejected = *rejection.get_or_insert_with(|| {
                    self.rename_rejection(pattern, a1, a2, mappers, refactorings, &resolution.refactorings)
                });
                match rejected {
                    // Field use in this class pair does not back the rename.
                    Some(Rejection::Inconsistent) => {
                        resolution.unresolved.renames.push(candidate.clone());
                        continue;
                    }
                    Some(_) => continue,
                    None => {}
                }
                let refactoring = if a1.enum_constant && a2.enum_constant {
                    Refactoring::RenameEnumConstant {
                        original: AttributeRef::from(a1),
                        renamed: AttributeRef::from(a2),
                        class_before: self.original.name.clone(),
                        class_after: self.next.name.clone(),
                        candidates: candidates.clone(),
                    }
                } else {
                    let own_initializer1 =
                        a1.referenced_only_in_own_initializer(candidate.references.iter().map(|r| &r.location1));
                    let own_initializer2 =
                        a2.referenced_only_in_own_initializer(candidate.references.iter().map(|r| &r.location2));
                    if own_initializer1 || own_initializer2 {
                        continue;
                    }
                    Refactoring::RenameAttribute {
                        original: AttributeRef::from(a1),
                        renamed: AttributeRef::from(a2),
                        class_before: self.original.name.clone(),
                        class_after: self.next.name.clone(),
                        candidates: candidates.clone(),
                    }
                };
                if !refactorings.contains(&refactoring) && !resolution.refactorings.contains(&refactoring) {
                    tracing::debug!(target: "refminer.diff.attributes", fact = %refactoring, "rename resolved");
                    resolution.refactorings.push(refactoring);
                    break;
                }
            }
        }
        Ok(())
    }

    fn rename_rejection(
        &self,
        pattern: &Replacement,
        a1: &Attribute,
        a2: &Attribute,
        mappers: &[BodyMapper],
        refactorings: &[Refactoring],
        resolved: &[Refactoring],
    ) -> Option<Rejection> {
        let all = || refactorings.iter().chain(resolved);
        let rejection = if self.cyclic_rename(pattern) {
            Some(Rejection::Cyclic)
        } else if self.original.contains_attribute_with_name(&pattern.after)
            || self.next.contains_attribute_with_name(&pattern.before)
        {
            Some(Rejection::BothDeclared)
        } else if aliased_pair(&self.aliases_original, &pattern.before, &pattern.after)
            || aliased_pair(&self.aliases_next, &pattern.before, &pattern.after)
        {
            Some(Rejection::Aliased)
        } else if self.inconsistent_rename(pattern, mappers) {
            Some(Rejection::Inconsistent)
        } else if all().any(|r| merged_into(r, a1, a2) || split_from(r, a1, a2)) {
            Some(Rejection::MergedOrSplit)
        } else if all().any(|r| conflicting_rename(r, a1, a2)) {
            Some(Rejection::Conflicting)
        } else {
            None
        };
        if let Some(reason) = rejection {
            tracing::debug!(
                target: "refminer.diff.attributes",
                before = %pattern.before,
                after = %pattern.after,
                reason = reason.as_str(),
                "rename rejected"
            );
        }
        rejection
    }

    fn push_variable_rename(
        &self,
        candidate: &CandidateRename,
        original: VariableRef,
        renamed: VariableRef,
        refactorings: &[Refactoring],
        resolution: &mut AttributeResolution,
    ) {
        let operations = (
            self.operations.get(candidate.operation_before),
            self.operations.get(candidate.operation_after),
        );
        let (Some(before), Some(after)) = operations else {
            resolution.unresolved.renames.push(candidate.clone());
            return;
        };
        let refactoring = Refactoring::RenameVariable {
            original,
            renamed,
            operation_before: OperationRef::from(before),
            operation_after: OperationRef::from(after),
            candidates: vec![candidate.clone()],
        };
        if !refactorings.contains(&refactoring) && !resolution.refactorings.contains(&refactoring) {
            resolution.refactorings.push(refactoring);
        }
    }

    /// Rename patterns in insertion order, minus every pair of patterns that
    /// disagree on where a name went or where it came from. Disagreement
    /// between names of one alias group does not count.
    fn consistent_patterns(&self) -> Vec<&Replacement> {
        let patterns: Vec<&Replacement> = self.candidates.renames().keys().collect();
        let mut inconsistent: HashSet<&Replacement> = HashSet::new();
        for (index, &p) in patterns.iter().enumerate() {
            for &q in &patterns[index + 1..] {
                let diverging = p.before == q.before
                    && p.after != q.after
                    && !aliased_pair(&self.aliases_next, &p.after, &q.after);
                let converging = p.after == q.after
                    && p.before != q.before
                    && !aliased_pair(&self.aliases_original, &p.before, &q.before);
                if diverging || converging {
                    inconsistent.insert(p);
                    inconsistent.insert(q);
                }
            }
        }
        patterns
            .into_iter()
            .filter(|pattern| !inconsistent.contains(pattern))
            .collect()
    }

    /// Another pattern continues or precedes this one, and one of the two
    /// was seen more than once.
    fn cyclic_rename(&self, pattern: &Replacement) -> bool {
        let renames = self.candidates.renames();
        let own = renames.get(pattern).map_or(0, |c| total_occurrences(c));
        renames.iter().any(|(other, candidates)| {
            (pattern.after == other.before || pattern.before == other.after)
                && (own > 1 || total_occurrences(candidates) > 1)
        })
    }

    fn inconsistent_rename(&self, pattern: &Replacement, mappers: &[BodyMapper]) -> bool {
        if in_any_group(&self.aliases_original, &pattern.before) || in_any_group(&self.aliases_next, &pattern.after) {
            return false;
        }
        let mut inconsistent = 0usize;
        let mut cases = 0usize;
        for mapper in mappers {
            let containers = (
                self.operations.get(mapper.container1),
                self.operations.get(mapper.container2),
            );
            let (Some(container1), Some(container2)) = containers else {
                continue;
            };
            let mut scope1 = FieldScope::of(container1);
            let mut scope2 = FieldScope::of(container2);
            for child in &mapper.child_mappers {
                if let Some(op) = self.operations.get(child.container1) {
                    scope1.extend(op);
                }
                if let Some(op) = self.operations.get(child.container2) {
                    scope2.extend(op);
                }
            }
            let uses1 = scope1.uses_field(container1, &pattern.before);
            let uses2 = scope2.uses_field(container2, &pattern.after);
            if uses1 && !uses2 && !self.used_by_called_operation(mapper, container2, &pattern.after, Side::After) {
                inconsistent += 1;
            }
            if uses2 && !uses1 && !self.used_by_called_operation(mapper, container1, &pattern.before, Side::Before) {
                inconsistent += 1;
            }
            if uses1 || uses2 {
                cases += 1;
            }
        }
        let ratio = inconsistency_ratio(inconsistent, cases);
        tracing::trace!(
            target: "refminer.diff.attributes",
            before = %pattern.before,
            after = %pattern.after,
            inconsistent,
            cases,
            ratio,
            "rename consistency"
        );
        ratio > INCONSISTENT_RENAME_RATIO
    }

    /// Whether a mapped statement of `mapper` calls an unmatched operation
    /// whose body uses `name`.
    fn used_by_called_operation(&self, mapper: &BodyMapper, caller: &Operation, name: &str, side: Side) -> bool {
        let unmatched = match side {
            Side::Before => &self.removed_operations,
            Side::After => &self.added_operations,
        };
        mapper
            .mappings
            .iter()
            .map(|mapping| match side {
                Side::Before => &mapping.fragment1,
                Side::After => &mapping.fragment2,
            })
            .flat_map(|fragment| fragment.invocations.iter())
            .any(|call| {
                unmatched
                    .iter()
                    .any(|op| self.matcher.matches(call, op, caller) && op.contains_variable(name))
            })
    }

    fn find_attribute_in_original(&self, name: &str) -> Option<&'a Attribute> {
        self.original.attribute(name).or_else(|| {
            self.original
                .enum_constant(name)
                .filter(|_| self.next.enum_constant(name).is_none())
        })
    }

    fn find_attribute_in_next(&self, name: &str) -> Option<&'a Attribute> {
        self.next.attribute(name).or_else(|| {
            self.next
                .enum_constant(name)
                .filter(|_| self.original.enum_constant(name).is_none())
        })
    }

    /// An extracted operation is called more than once with different
    /// attributes as arguments, and one of them is a name of `candidate`:
    /// the two names meet in a parameter, not in a renamed field.
    fn passed_as_different_attributes(&self, candidate: &CandidateRename, refactorings: &[Refactoring]) -> bool {
        refactorings.iter().any(|refactoring| {
            let Refactoring::ExtractOperation {
                extracted,
                invocations,
                ..
            } = refactoring
            else {
                return false;
            };
            if extracted.id != candidate.operation_after || invocations.len() < 2 {
                return false;
            }
            let passed: IndexSet<&str> = invocations
                .iter()
                .flat_map(|invocation| invocation.arguments.iter())
                .filter_map(|argument| self.original.attribute(argument))
                .map(|attribute| attribute.name.as_str())
                .collect();
            passed.len() > 1
                && (passed.contains(candidate.original_name.as_str())
                    || passed.contains(candidate.renamed_name.as_str()))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Before,
    After,
}

/// Why a rename pattern with a declared field on both ends was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Cyclic,
    BothDeclared,
    Aliased,
    Inconsistent,
    MergedOrSplit,
    Conflicting,
}

impl Rejection {
    fn as_str(self) -> &'static str {
        match self {
            Rejection::Cyclic => "cyclic",
            Rejection::BothDeclared => "both names declared",
            Rejection::Aliased => "aliased",
            Rejection::Inconsistent => "inconsistent",
            Rejection::MergedOrSplit => "merged or split",
            Rejection::Conflicting => "conflicting",
        }
    }
}

/// The first top-level mapper, or child of one, whose mappings include every
/// reference of `candidate`.
fn observing_mapper<'m>(mappers: &'m [BodyMapper], candidate: &CandidateRename) -> Option<&'m BodyMapper> {
    let observes = |mapper: &BodyMapper| {
        let keys = mapper.mapping_keys();
        candidate
            .references
            .iter()
            .all(|r| keys.contains(&(r.fragment1, r.fragment2)))
    };
    mappers
        .iter()
        .flat_map(|mapper| std::iter::once(mapper).chain(mapper.child_mappers.iter()))
        .find(|mapper| observes(mapper))
}

/// `matched` plus every other name of `names` assigned in `leftovers`, with
/// `matched` first when `names` lists it first and last otherwise. `None`
/// unless `matched` is one of `names` and some other name is assigned.
fn matched_names<'n>(names: &'n [String], matched: &str, leftovers: &[Fragment]) -> Option<Vec<&'n str>> {
    let matched = names.iter().find(|name| *name == matched)?.as_str();
    let mut ordered: Vec<&str> = names
        .iter()
        .map(String::as_str)
        .filter(|name| *name != matched)
        .filter(|name| leftovers.iter().any(|leaf| assigns(leaf, name)))
        .collect();
    if ordered.is_empty() {
        return None;
    }
    if names.first().is_some_and(|first| first == matched) {
        ordered.insert(0, matched);
    } else {
        ordered.push(matched);
    }
    Some(ordered)
}

/// `name = ...` or `this.name = ...`
fn assigns(fragment: &Fragment, name: &str) -> bool {
    let text = fragment.text.strip_prefix(THIS_DOT).unwrap_or(&fragment.text);
    text.strip_prefix(name).is_some_and(|rest| rest.starts_with(" = "))
}

/// Inconsistent method pairs over method pairs using either name. No such
/// pair at all counts as fully consistent.
pub fn inconsistency_ratio(inconsistent: usize, cases: usize) -> f64 {
    if cases == 0 {
        return 0.0;
    }
    inconsistent as f64 / cases as f64
}

/// Variables read in a method pair side, and the locals declared there.
struct FieldScope<'o> {
    variables: Vec<&'o str>,
    locals: HashSet<&'o str>,
}

impl<'o> FieldScope<'o> {
    fn of(operation: &'o Operation) -> Self {
        let mut scope = Self {
            variables: Vec::new(),
            locals: HashSet::new(),
        };
        scope.extend(operation);
        scope
    }

    fn extend(&mut self, operation: &'o Operation) {
        self.variables.extend(operation.all_variables());
        self.locals.extend(
            operation
                .body
                .iter()
                .flat_map(|f| f.declarations.iter())
                .filter(|decl| !decl.is_attribute && !decl.is_parameter)
                .map(|decl| decl.name.as_str()),
        );
    }

    /// `name` is read unqualified without being a parameter or a local of
    /// its own, or read through `this.`.
    fn uses_field(&self, container: &Operation, name: &str) -> bool {
        let qualified = format!("{THIS_DOT}{name}");
        let unqualified =
            self.variables.contains(&name) && !container.has_parameter(name) && !self.locals.contains(name);
        unqualified || self.variables.contains(&qualified.as_str())
    }
}

fn in_any_group(groups: &AliasGroups, name: &str) -> bool {
    groups.values().any(|group| group.contains(name))
}

fn aliased_pair(groups: &AliasGroups, a: &str, b: &str) -> bool {
    groups.values().any(|group| group.contains(a) && group.contains(b))
}

fn merged_into(refactoring: &Refactoring, a1: &Attribute, a2: &Attribute) -> bool {
    match refactoring {
        Refactoring::MergeAttribute {
            merged, new_attribute, ..
        } => new_attribute.name == a2.name && merged.iter().any(|m| m.name == a1.name),
        _ => false,
    }
}

fn split_from(refactoring: &Refactoring, a1: &Attribute, a2: &Attribute) -> bool {
    match refactoring {
        Refactoring::SplitAttribute {
            old_attribute, split, ..
        } => old_attribute.name == a1.name && split.iter().any(|s| s.name == a2.name),
        _ => false,
    }
}

fn conflicting_rename(refactoring: &Refactoring, a1: &Attribute, a2: &Attribute) -> bool {
    match refactoring {
        Refactoring::RenameAttribute {
            original, renamed, ..
        } => (original.name == a1.name) != (renamed.name == a2.name),
        _ => false,
    }
}

/// Retries rename candidates left unresolved by a nested class pair against
/// the attributes of its enclosing class pair.
///
/// `operations` must cover the nested pair the candidates were observed in.
/// Returns the facts that could be built and the candidates that are still
/// pending.
pub fn resolve_in_enclosing_scope(
    pending: Vec<CandidateRename>,
    enclosing_original: &ClassModel,
    enclosing_next: &ClassModel,
    operations: &OperationTable<'_>,
) -> (Vec<Refactoring>, Vec<CandidateRename>) {
    let mut refactorings: Vec<Refactoring> = Vec::new();
    let mut still_pending = Vec::new();
    for candidate in pending {
        let pattern = CandidateMaps::rename_pattern(&candidate);
        let a1 = enclosing_original
            .attribute(&pattern.before)
            .filter(|_| !enclosing_next.contains_attribute_with_name(&pattern.before));
        let a2 = enclosing_next
            .attribute(&pattern.after)
            .filter(|_| !enclosing_original.contains_attribute_with_name(&pattern.after));
        let ends = match (&candidate.original_declaration, &candidate.renamed_declaration) {
            (Some(declaration), _) => a2.map(|a2| (VariableRef::from(declaration), VariableRef::from(a2))),
            (None, Some(declaration)) => a1.map(|a1| (VariableRef::from(a1), VariableRef::from(declaration))),
            (None, None) => None,
        };
        if let Some((original, renamed)) = ends {
            let before = operations.get(candidate.operation_before);
            let after = operations.get(candidate.operation_after);
            if let (Some(before), Some(after)) = (before, after) {
                let refactoring = Refactoring::RenameVariable {
                    original,
                    renamed,
                    operation_before: OperationRef::from(before),
                    operation_after: OperationRef::from(after),
                    candidates: vec![candidate],
                };
                if !refactorings.contains(&refactoring) {
                    refactorings.push(refactoring);
                }
                continue;
            }
            still_pending.push(candidate);
            continue;
        }
        match (a1, a2) {
            (Some(a1), Some(a2)) if candidate.original_declaration.is_none() && candidate.renamed_declaration.is_none() => {
                let refactoring = Refactoring::RenameAttribute {
                    original: AttributeRef::from(a1),
                    renamed: AttributeRef::from(a2),
                    class_before: enclosing_original.name.clone(),
                    class_after: enclosing_next.name.clone(),
                    candidates: Vec::new(),
                };
                let index = match refactorings.iter().position(|r| *r == refactoring) {
                    Some(index) => index,
                    None => {
                        refactorings.push(refactoring);
                        refactorings.len() - 1
                    }
                };
                if let Refactoring::RenameAttribute { candidates, .. } = &mut refactorings[index] {
                    candidates.push(candidate);
                }
            }
            _ => still_pending.push(candidate),
        }
    }
    (refactorings, still_pending)
}
