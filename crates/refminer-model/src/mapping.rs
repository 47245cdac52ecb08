use refminer_core::{CodeRange, FragmentId};
use serde::{Deserialize, Serialize};

use crate::fragment::Fragment;
use crate::replacement::{Replacement, ReplacementKind};

/// A local variable the aligner saw extracted inside a mapped statement,
/// together with where its sub-expression ended up on the after side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedVariable {
    pub name: String,
    #[serde(default)]
    pub sub_expression_locations: Vec<CodeRange>,
}

/// An aligned pair of fragments. Identity is the pair of fragment ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mapping {
    pub fragment1: Fragment,
    pub fragment2: Fragment,
    #[serde(default)]
    pub exact: bool,
    #[serde(default)]
    pub replacements: Vec<Replacement>,
    #[serde(default)]
    pub extracted_variables: Vec<ExtractedVariable>,
}

impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Mapping {}

impl Mapping {
    pub fn new(fragment1: Fragment, fragment2: Fragment) -> Self {
        let exact = fragment1.text == fragment2.text;
        Self {
            fragment1,
            fragment2,
            exact,
            replacements: Vec::new(),
            extracted_variables: Vec::new(),
        }
    }

    pub fn key(&self) -> (FragmentId, FragmentId) {
        (self.fragment1.id, self.fragment2.id)
    }

    pub fn is_composite(&self) -> bool {
        self.fragment1.is_composite()
    }

    pub fn is_block(&self) -> bool {
        self.fragment1.is_block()
    }

    pub fn identical_text(&self) -> bool {
        self.fragment1.text == self.fragment2.text
    }

    pub fn contains_replacement(&self, kind: ReplacementKind) -> bool {
        self.replacements.iter().any(|r| r.kind == kind)
    }

    pub fn replacements_involving_method_invocation(&self) -> impl Iterator<Item = &Replacement> + '_ {
        self.replacements
            .iter()
            .filter(|r| r.kind.involves_method_invocation())
    }
}
