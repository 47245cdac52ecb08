use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// What kind of code element a [`Replacement`] swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplacementKind {
    VariableName,
    MethodInvocation,
    MethodInvocationName,
    MethodInvocationExpression,
    MethodInvocationArgument,
    VariableReplacedWithMethodInvocation,
    ClassInstanceCreation,
    ClassInstanceCreationReplacedWithMethodInvocation,
    ArgumentReplacedWithReturnExpression,
    ArgumentReplacedWithRightHandSideOfAssignment,
    Type,
    StringLiteral,
    NumberLiteral,
    Conditional,
    Annotation,
    Assertion,
    Other,
}

impl ReplacementKind {
    pub fn involves_method_invocation(self) -> bool {
        matches!(
            self,
            ReplacementKind::MethodInvocation
                | ReplacementKind::MethodInvocationName
                | ReplacementKind::MethodInvocationExpression
                | ReplacementKind::MethodInvocationArgument
                | ReplacementKind::VariableReplacedWithMethodInvocation
                | ReplacementKind::ClassInstanceCreationReplacedWithMethodInvocation
        )
    }

    /// Human-readable name of the replaced element.
    pub fn description(self) -> &'static str {
        match self {
            ReplacementKind::VariableName => "variable name",
            ReplacementKind::MethodInvocation => "method invocation",
            ReplacementKind::MethodInvocationName => "method invocation name",
            ReplacementKind::MethodInvocationExpression => "method invocation expression",
            ReplacementKind::MethodInvocationArgument => "method invocation argument",
            ReplacementKind::VariableReplacedWithMethodInvocation => {
                "variable replaced with method invocation"
            }
            ReplacementKind::ClassInstanceCreation => "class instance creation",
            ReplacementKind::ClassInstanceCreationReplacedWithMethodInvocation => {
                "class instance creation replaced with method invocation"
            }
            ReplacementKind::ArgumentReplacedWithReturnExpression => {
                "argument replaced with return expression"
            }
            ReplacementKind::ArgumentReplacedWithRightHandSideOfAssignment => {
                "argument replaced with right-hand side of assignment"
            }
            ReplacementKind::Type => "type",
            ReplacementKind::StringLiteral => "string literal",
            ReplacementKind::NumberLiteral => "number literal",
            ReplacementKind::Conditional => "conditional expression",
            ReplacementKind::Annotation => "annotation",
            ReplacementKind::Assertion => "assertion",
            ReplacementKind::Other => "expression",
        }
    }
}

/// A before/after token substitution inside an otherwise matched statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Replacement {
    pub before: String,
    pub after: String,
    pub kind: ReplacementKind,
}

impl Replacement {
    pub fn new(before: impl Into<String>, after: impl Into<String>, kind: ReplacementKind) -> Self {
        Self {
            before: before.into(),
            after: after.into(),
            kind,
        }
    }

    /// One side textually contains the other.
    pub fn is_containment(&self) -> bool {
        self.after.contains(&self.before) || self.before.contains(&self.after)
    }
}

impl std::fmt::Display for Replacement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} `{}` replaced with `{}`",
            self.kind.description(),
            self.before,
            self.after
        )
    }
}

/// Several variables replaced by one. Set equality ignores order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReplacement {
    pub before: IndexSet<String>,
    pub after: String,
}

impl MergeReplacement {
    pub fn new(before: impl IntoIterator<Item = String>, after: impl Into<String>) -> Self {
        Self {
            before: before.into_iter().collect(),
            after: after.into(),
        }
    }

    /// Same target and a superset of the merged names.
    pub fn subsumes(&self, other: &MergeReplacement) -> bool {
        self.after == other.after && self.before.is_superset(&other.before)
    }

    pub fn equal(&self, other: &MergeReplacement) -> bool {
        self == other
    }

    /// Same target and no merged name in common.
    pub fn common_after(&self, other: &MergeReplacement) -> bool {
        self.after == other.after && self.before.is_disjoint(&other.before)
    }
}

/// One variable replaced by several. Set equality ignores order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitReplacement {
    pub before: String,
    pub after: IndexSet<String>,
}

impl SplitReplacement {
    pub fn new(before: impl Into<String>, after: impl IntoIterator<Item = String>) -> Self {
        Self {
            before: before.into(),
            after: after.into_iter().collect(),
        }
    }

    pub fn subsumes(&self, other: &SplitReplacement) -> bool {
        self.before == other.before && self.after.is_superset(&other.after)
    }

    pub fn equal(&self, other: &SplitReplacement) -> bool {
        self == other
    }

    /// Same source and no split name in common.
    pub fn common_before(&self, other: &SplitReplacement) -> bool {
        self.before == other.before && self.after.is_disjoint(&other.after)
    }
}
