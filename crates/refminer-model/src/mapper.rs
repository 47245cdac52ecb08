use std::collections::HashSet;

use refminer_core::{FragmentId, OperationId};
use serde::{Deserialize, Serialize};

use crate::candidate::{CandidateMerge, CandidateRename, CandidateSplit, VariableMerge, VariableSplit};
use crate::fragment::Fragment;
use crate::invocation::Invocation;
use crate::mapping::Mapping;
use crate::replacement::Replacement;

/// Statement alignment between two operation bodies.
///
/// `container1` is the before-side operation and `container2` the after-side
/// one. Mappers for extracted or inlined code also carry the call site that
/// anchors them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyMapper {
    pub container1: OperationId,
    pub container2: OperationId,
    #[serde(default)]
    pub mappings: Vec<Mapping>,
    #[serde(default)]
    pub non_mapped_leaves_t1: Vec<Fragment>,
    #[serde(default)]
    pub non_mapped_inner_nodes_t1: Vec<Fragment>,
    #[serde(default)]
    pub non_mapped_leaves_t2: Vec<Fragment>,
    #[serde(default)]
    pub non_mapped_inner_nodes_t2: Vec<Fragment>,
    #[serde(default)]
    pub invocation: Option<Invocation>,
    #[serde(default)]
    pub nested: bool,
    #[serde(default)]
    pub child_mappers: Vec<BodyMapper>,
    /// Names of local variables the aligner saw extracted in this body.
    #[serde(default)]
    pub extracted_variable_names: Vec<String>,
    #[serde(default)]
    pub candidate_renames: Vec<CandidateRename>,
    #[serde(default)]
    pub candidate_merges: Vec<CandidateMerge>,
    #[serde(default)]
    pub candidate_splits: Vec<CandidateSplit>,
    #[serde(default)]
    pub variable_merges: Vec<VariableMerge>,
    #[serde(default)]
    pub variable_splits: Vec<VariableSplit>,
}

impl BodyMapper {
    pub fn new(container1: OperationId, container2: OperationId) -> Self {
        Self {
            container1,
            container2,
            mappings: Vec::new(),
            non_mapped_leaves_t1: Vec::new(),
            non_mapped_inner_nodes_t1: Vec::new(),
            non_mapped_leaves_t2: Vec::new(),
            non_mapped_inner_nodes_t2: Vec::new(),
            invocation: None,
            nested: false,
            child_mappers: Vec::new(),
            extracted_variable_names: Vec::new(),
            candidate_renames: Vec::new(),
            candidate_merges: Vec::new(),
            candidate_splits: Vec::new(),
            variable_merges: Vec::new(),
            variable_splits: Vec::new(),
        }
    }

    pub fn mapping_keys(&self) -> HashSet<(FragmentId, FragmentId)> {
        self.mappings.iter().map(Mapping::key).collect()
    }

    /// Whether every mapping of `other` is also a mapping of `self`.
    pub fn contains_all_mappings_of(&self, other: &BodyMapper) -> bool {
        let keys = self.mapping_keys();
        other.mappings.iter().all(|m| keys.contains(&m.key()))
    }

    pub fn mappings_without_blocks(&self) -> usize {
        self.mappings.iter().filter(|m| !m.is_block()).count()
    }

    pub fn non_mapped_elements_t1(&self) -> usize {
        countable_leaves(&self.non_mapped_leaves_t1) + non_block_nodes(&self.non_mapped_inner_nodes_t1)
    }

    pub fn non_mapped_elements_t2(&self) -> usize {
        countable_leaves(&self.non_mapped_leaves_t2) + non_block_nodes(&self.non_mapped_inner_nodes_t2)
    }

    pub fn non_mapped_leaf_elements_t2(&self) -> usize {
        countable_leaves(&self.non_mapped_leaves_t2)
    }

    /// Exact mappings that are countable on both sides, excluding bare `try`.
    pub fn exact_matches(&self) -> Vec<&Mapping> {
        self.mappings
            .iter()
            .filter(|m| {
                m.exact
                    && m.fragment1.countable()
                    && m.fragment2.countable()
                    && m.fragment1.text != "try"
            })
            .collect()
    }

    pub fn exact_matches_without_matches_in_nested_containers(&self) -> Vec<&Mapping> {
        self.exact_matches()
            .into_iter()
            .filter(|m| !m.fragment1.in_nested_container && !m.fragment2.in_nested_container)
            .collect()
    }

    pub fn replacements_involving_method_invocation(&self) -> Vec<&Replacement> {
        self.mappings
            .iter()
            .flat_map(|m| m.replacements_involving_method_invocation())
            .collect()
    }

    pub fn contains_composite_mapping_without_replacements(&self) -> bool {
        self.mappings
            .iter()
            .any(|m| m.is_composite() && m.replacements.is_empty())
    }

    /// Appends promoted fragments to the non-mapped sets, skipping fragments
    /// that are already present.
    pub fn absorb(&mut self, promoted: PromotedFragments) {
        push_unique(&mut self.non_mapped_leaves_t1, promoted.leaves_t1);
        push_unique(&mut self.non_mapped_inner_nodes_t1, promoted.inner_nodes_t1);
        push_unique(&mut self.non_mapped_leaves_t2, promoted.leaves_t2);
        push_unique(&mut self.non_mapped_inner_nodes_t2, promoted.inner_nodes_t2);
    }

    /// Mapper and all of its descendants, breadth first.
    pub fn self_and_descendants(&self) -> Vec<&BodyMapper> {
        let mut out = vec![self];
        let mut i = 0;
        while i < out.len() {
            let current = out[i];
            out.extend(current.child_mappers.iter());
            i += 1;
        }
        out
    }
}

fn countable_leaves(leaves: &[Fragment]) -> usize {
    leaves.iter().filter(|f| f.countable()).count()
}

fn non_block_nodes(nodes: &[Fragment]) -> usize {
    nodes.iter().filter(|f| !f.is_block()).count()
}

fn push_unique(target: &mut Vec<Fragment>, fragments: Vec<Fragment>) {
    for fragment in fragments {
        if !target.contains(&fragment) {
            target.push(fragment);
        }
    }
}

/// Fragments of rejected candidate mappers that go back to their parent's
/// non-mapped sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromotedFragments {
    pub leaves_t1: Vec<Fragment>,
    pub inner_nodes_t1: Vec<Fragment>,
    pub leaves_t2: Vec<Fragment>,
    pub inner_nodes_t2: Vec<Fragment>,
}

impl PromotedFragments {
    /// Promotes the before-side fragment of every mapping of `mapper`.
    pub fn push_fragments1(&mut self, mapper: &BodyMapper) {
        for mapping in &mapper.mappings {
            let fragment = &mapping.fragment1;
            let target = if fragment.is_composite() {
                &mut self.inner_nodes_t1
            } else {
                &mut self.leaves_t1
            };
            if !target.contains(fragment) {
                target.push(fragment.clone());
            }
        }
    }

    /// Promotes the after-side fragment of every mapping of `mapper`.
    pub fn push_fragments2(&mut self, mapper: &BodyMapper) {
        for mapping in &mapper.mappings {
            let fragment = &mapping.fragment2;
            let target = if fragment.is_composite() {
                &mut self.inner_nodes_t2
            } else {
                &mut self.leaves_t2
            };
            if !target.contains(fragment) {
                target.push(fragment.clone());
            }
        }
    }

    pub fn extend(&mut self, other: PromotedFragments) {
        push_unique(&mut self.leaves_t1, other.leaves_t1);
        push_unique(&mut self.inner_nodes_t1, other.inner_nodes_t1);
        push_unique(&mut self.leaves_t2, other.leaves_t2);
        push_unique(&mut self.inner_nodes_t2, other.inner_nodes_t2);
    }
}
