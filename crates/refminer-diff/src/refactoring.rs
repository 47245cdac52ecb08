//! Refactoring facts produced by a class-pair diff.
//!
//! Facts are immutable once built. They carry enough of the declarations they
//! talk about to be rendered and serialized without the input model.

use std::fmt;

use refminer_core::OperationId;
use refminer_model::{
    Attribute, BodyMapper, CandidateMerge, CandidateRename, CandidateSplit, Invocation, Operation,
    TypeRef, VariableDeclaration,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationRef {
    pub id: OperationId,
    pub class_name: String,
    pub signature: String,
}

impl From<&Operation> for OperationRef {
    fn from(operation: &Operation) -> Self {
        Self {
            id: operation.id,
            class_name: operation.class_name.clone(),
            signature: operation.signature(),
        }
    }
}

impl fmt::Display for OperationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeRef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub class_name: String,
}

impl From<&Attribute> for AttributeRef {
    fn from(attribute: &Attribute) -> Self {
        Self {
            name: attribute.name.clone(),
            ty: attribute.ty.clone(),
            class_name: attribute.class_name.clone(),
        }
    }
}

impl fmt::Display for AttributeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.name, self.ty.as_str())
    }
}

/// One end of a variable/attribute replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableRef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Option<TypeRef>,
    pub is_attribute: bool,
    pub is_parameter: bool,
}

impl From<&VariableDeclaration> for VariableRef {
    fn from(declaration: &VariableDeclaration) -> Self {
        Self {
            name: declaration.name.clone(),
            ty: declaration.ty.clone(),
            is_attribute: declaration.is_attribute,
            is_parameter: declaration.is_parameter,
        }
    }
}

impl From<&Attribute> for VariableRef {
    fn from(attribute: &Attribute) -> Self {
        Self {
            name: attribute.name.clone(),
            ty: Some(attribute.ty.clone()),
            is_attribute: true,
            is_parameter: false,
        }
    }
}

impl fmt::Display for VariableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ty {
            Some(ty) => write!(f, "{} : {}", self.name, ty.as_str()),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RefactoringKind {
    ExtractOperation,
    InlineOperation,
    RenameAttribute,
    RenameEnumConstant,
    MergeAttribute,
    SplitAttribute,
    RenameVariable,
    RenameParameter,
    ReplaceVariableWithAttribute,
    ReplaceAttributeWithVariable,
}

impl RefactoringKind {
    pub fn display_name(self) -> &'static str {
        match self {
            RefactoringKind::ExtractOperation => "Extract Method",
            RefactoringKind::InlineOperation => "Inline Method",
            RefactoringKind::RenameAttribute => "Rename Attribute",
            RefactoringKind::RenameEnumConstant => "Rename Enum Constant",
            RefactoringKind::MergeAttribute => "Merge Attribute",
            RefactoringKind::SplitAttribute => "Split Attribute",
            RefactoringKind::RenameVariable => "Rename Variable",
            RefactoringKind::RenameParameter => "Rename Parameter",
            RefactoringKind::ReplaceVariableWithAttribute => "Replace Variable With Attribute",
            RefactoringKind::ReplaceAttributeWithVariable => "Replace Attribute With Variable",
        }
    }
}

impl fmt::Display for RefactoringKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Refactoring {
    ExtractOperation {
        /// The operation the code was taken out of, before the change.
        source_before: OperationRef,
        source_after: OperationRef,
        extracted: OperationRef,
        /// Set when `extracted` only forwards to an overload. The overload is
        /// the operation whose body received the code.
        delegate: Option<OperationRef>,
        invocations: Vec<Invocation>,
        body_mapper: BodyMapper,
    },
    InlineOperation {
        inlined: OperationRef,
        target_before: OperationRef,
        target_after: OperationRef,
        invocations: Vec<Invocation>,
        body_mapper: BodyMapper,
    },
    RenameAttribute {
        original: AttributeRef,
        renamed: AttributeRef,
        class_before: String,
        class_after: String,
        candidates: Vec<CandidateRename>,
    },
    RenameEnumConstant {
        original: AttributeRef,
        renamed: AttributeRef,
        class_before: String,
        class_after: String,
        candidates: Vec<CandidateRename>,
    },
    MergeAttribute {
        merged: Vec<AttributeRef>,
        new_attribute: AttributeRef,
        class_before: String,
        class_after: String,
        candidates: Vec<CandidateMerge>,
    },
    SplitAttribute {
        old_attribute: AttributeRef,
        split: Vec<AttributeRef>,
        class_before: String,
        class_after: String,
        candidates: Vec<CandidateSplit>,
    },
    RenameVariable {
        original: VariableRef,
        renamed: VariableRef,
        operation_before: OperationRef,
        operation_after: OperationRef,
        candidates: Vec<CandidateRename>,
    },
}

impl Refactoring {
    pub fn kind(&self) -> RefactoringKind {
        match self {
            Refactoring::ExtractOperation { .. } => RefactoringKind::ExtractOperation,
            Refactoring::InlineOperation { .. } => RefactoringKind::InlineOperation,
            Refactoring::RenameAttribute { .. } => RefactoringKind::RenameAttribute,
            Refactoring::RenameEnumConstant { .. } => RefactoringKind::RenameEnumConstant,
            Refactoring::MergeAttribute { .. } => RefactoringKind::MergeAttribute,
            Refactoring::SplitAttribute { .. } => RefactoringKind::SplitAttribute,
            Refactoring::RenameVariable {
                original, renamed, ..
            } => match (original.is_attribute, renamed.is_attribute) {
                (false, true) => RefactoringKind::ReplaceVariableWithAttribute,
                (true, false) => RefactoringKind::ReplaceAttributeWithVariable,
                _ if original.is_parameter && renamed.is_parameter => RefactoringKind::RenameParameter,
                _ => RefactoringKind::RenameVariable,
            },
        }
    }

    pub fn body_mapper(&self) -> Option<&BodyMapper> {
        match self {
            Refactoring::ExtractOperation { body_mapper, .. }
            | Refactoring::InlineOperation { body_mapper, .. } => Some(body_mapper),
            _ => None,
        }
    }

    pub fn body_mapper_mut(&mut self) -> Option<&mut BodyMapper> {
        match self {
            Refactoring::ExtractOperation { body_mapper, .. }
            | Refactoring::InlineOperation { body_mapper, .. } => Some(body_mapper),
            _ => None,
        }
    }

    pub fn is_extract(&self) -> bool {
        matches!(self, Refactoring::ExtractOperation { .. })
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Refactoring::InlineOperation { .. })
    }
}

impl PartialEq for Refactoring {
    fn eq(&self, other: &Self) -> bool {
        use Refactoring::*;
        match (self, other) {
            (
                ExtractOperation {
                    source_before: b1,
                    source_after: a1,
                    extracted: e1,
                    ..
                },
                ExtractOperation {
                    source_before: b2,
                    source_after: a2,
                    extracted: e2,
                    ..
                },
            ) => b1.id == b2.id && a1.id == a2.id && e1.id == e2.id,
            (
                InlineOperation {
                    inlined: i1,
                    target_before: b1,
                    target_after: a1,
                    ..
                },
                InlineOperation {
                    inlined: i2,
                    target_before: b2,
                    target_after: a2,
                    ..
                },
            ) => i1.id == i2.id && b1.id == b2.id && a1.id == a2.id,
            (
                RenameAttribute {
                    original: o1,
                    renamed: r1,
                    ..
                },
                RenameAttribute {
                    original: o2,
                    renamed: r2,
                    ..
                },
            )
            | (
                RenameEnumConstant {
                    original: o1,
                    renamed: r1,
                    ..
                },
                RenameEnumConstant {
                    original: o2,
                    renamed: r2,
                    ..
                },
            ) => o1 == o2 && r1 == r2,
            (
                MergeAttribute {
                    merged: m1,
                    new_attribute: n1,
                    ..
                },
                MergeAttribute {
                    merged: m2,
                    new_attribute: n2,
                    ..
                },
            ) => n1 == n2 && m1.len() == m2.len() && m1.iter().all(|a| m2.contains(a)),
            (
                SplitAttribute {
                    old_attribute: o1,
                    split: s1,
                    ..
                },
                SplitAttribute {
                    old_attribute: o2,
                    split: s2,
                    ..
                },
            ) => o1 == o2 && s1.len() == s2.len() && s1.iter().all(|a| s2.contains(a)),
            (
                RenameVariable {
                    original: o1,
                    renamed: r1,
                    operation_before: b1,
                    operation_after: a1,
                    ..
                },
                RenameVariable {
                    original: o2,
                    renamed: r2,
                    operation_before: b2,
                    operation_after: a2,
                    ..
                },
            ) => o1 == o2 && r1 == r2 && b1.id == b2.id && a1.id == a2.id,
            _ => false,
        }
    }
}

impl Eq for Refactoring {}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Refactoring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.kind();
        match self {
            Refactoring::ExtractOperation {
                source_before,
                extracted,
                ..
            } => write!(
                f,
                "{kind} {extracted} extracted from {source_before} in class {}",
                source_before.class_name
            ),
            Refactoring::InlineOperation {
                inlined,
                target_after,
                ..
            } => write!(
                f,
                "{kind} {inlined} inlined to {target_after} in class {}",
                target_after.class_name
            ),
            Refactoring::RenameAttribute {
                original,
                renamed,
                class_after,
                ..
            }
            | Refactoring::RenameEnumConstant {
                original,
                renamed,
                class_after,
                ..
            } => write!(f, "{kind} {original} to {renamed} in class {class_after}"),
            Refactoring::MergeAttribute {
                merged,
                new_attribute,
                class_after,
                ..
            } => write!(
                f,
                "{kind} [{}] to {new_attribute} in class {class_after}",
                join(merged)
            ),
            Refactoring::SplitAttribute {
                old_attribute,
                split,
                class_after,
                ..
            } => write!(
                f,
                "{kind} {old_attribute} to [{}] in class {class_after}",
                join(split)
            ),
            Refactoring::RenameVariable {
                original,
                renamed,
                operation_after,
                ..
            } => write!(f, "{kind} {original} to {renamed} in method {operation_after}"),
        }
    }
}
