//! Class-wide accumulation of rename, merge and split candidates.
//!
//! Every mapper of a class pair reports the candidates it observed locally.
//! They are keyed here by their normalised name pattern so that the resolver
//! can judge each pattern once, with every observation of it at hand.

use indexmap::IndexMap;
use refminer_core::{normalize_name, strip_common_dotted_prefix};
use refminer_model::{
    CandidateMerge, CandidateRename, CandidateSplit, MergeReplacement, Replacement, ReplacementKind,
    SplitReplacement,
};

#[derive(Debug, Clone, Default)]
pub struct CandidateMaps {
    renames: IndexMap<Replacement, Vec<CandidateRename>>,
    merges: Vec<(MergeReplacement, Vec<CandidateMerge>)>,
    splits: Vec<(SplitReplacement, Vec<CandidateSplit>)>,
}

impl CandidateMaps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name pattern of a rename candidate: `this.` stripped from both names,
    /// and a dotted prefix shared by both removed.
    pub fn rename_pattern(candidate: &CandidateRename) -> Replacement {
        let before = normalize_name(&candidate.original_name);
        let after = normalize_name(&candidate.renamed_name);
        let (before, after) = strip_common_dotted_prefix(before, after);
        Replacement::new(before, after, ReplacementKind::VariableName)
    }

    pub fn add_rename(&mut self, candidate: CandidateRename) {
        let pattern = Self::rename_pattern(&candidate);
        let candidates = self.renames.entry(pattern).or_default();
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }

    pub fn add_merge(&mut self, candidate: CandidateMerge) {
        let key = MergeReplacement::new(
            candidate.merged_names.iter().map(|name| normalize_name(name).to_string()),
            normalize_name(&candidate.new_name),
        );
        fold(
            &mut self.merges,
            key,
            candidate,
            MergeReplacement::subsumes,
            MergeReplacement::equal,
            |existing, new| {
                existing.common_after(new).then(|| {
                    MergeReplacement::new(
                        existing.before.iter().chain(new.before.iter()).cloned(),
                        existing.after.clone(),
                    )
                })
            },
        );
    }

    pub fn add_split(&mut self, candidate: CandidateSplit) {
        let key = SplitReplacement::new(
            normalize_name(&candidate.old_name),
            candidate.split_names.iter().map(|name| normalize_name(name).to_string()),
        );
        fold(
            &mut self.splits,
            key,
            candidate,
            SplitReplacement::subsumes,
            SplitReplacement::equal,
            |existing, new| {
                existing.common_before(new).then(|| {
                    SplitReplacement::new(
                        existing.before.clone(),
                        existing.after.iter().chain(new.after.iter()).cloned(),
                    )
                })
            },
        );
    }

    pub fn renames(&self) -> &IndexMap<Replacement, Vec<CandidateRename>> {
        &self.renames
    }

    pub fn merges(&self) -> &[(MergeReplacement, Vec<CandidateMerge>)] {
        &self.merges
    }

    pub fn splits(&self) -> &[(SplitReplacement, Vec<CandidateSplit>)] {
        &self.splits
    }
}

/// Sum of the occurrence counts of every candidate of a pattern.
pub fn total_occurrences(candidates: &[CandidateRename]) -> usize {
    candidates.iter().map(|c| c.occurrences).sum()
}

/// Folds `candidate` into the first key it relates to.
///
/// An existing key that subsumes or equals the new one just gains the
/// candidate. A key sharing the single-name side is replaced by the union of
/// both, and a key the new one subsumes is replaced by the new key. Anything
/// else starts a new entry.
fn fold<K: Clone, C>(
    entries: &mut Vec<(K, Vec<C>)>,
    key: K,
    candidate: C,
    subsumes: impl Fn(&K, &K) -> bool,
    equal: impl Fn(&K, &K) -> bool,
    union: impl Fn(&K, &K) -> Option<K>,
) {
    for index in 0..entries.len() {
        let existing = &entries[index].0;
        if subsumes(existing, &key) || equal(existing, &key) {
            entries[index].1.push(candidate);
            return;
        }
        let replacement = match union(existing, &key) {
            Some(merged) => Some(merged),
            None if subsumes(&key, existing) => Some(key.clone()),
            None => None,
        };
        if let Some(replacement) = replacement {
            let (_, mut candidates) = entries.remove(index);
            candidates.push(candidate);
            entries.push((replacement, candidates));
            return;
        }
    }
    entries.push((key, vec![candidate]));
}
