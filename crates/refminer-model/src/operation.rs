use std::collections::HashMap;

use refminer_core::{CodeRange, OperationId};
use serde::{Deserialize, Serialize};

use crate::fragment::{Fragment, FragmentKind};
use crate::invocation::Invocation;
use crate::types::TypeRef;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub varargs: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: TypeRef::new(ty),
            varargs: false,
        }
    }
}

/// A local variable, parameter or field declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariableDeclaration {
    pub name: String,
    #[serde(rename = "type", default)]
    pub ty: Option<TypeRef>,
    #[serde(default)]
    pub location: Option<CodeRange>,
    #[serde(default)]
    pub is_parameter: bool,
    #[serde(default)]
    pub is_attribute: bool,
}

impl VariableDeclaration {
    pub fn local(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: Some(TypeRef::new(ty)),
            location: None,
            is_parameter: false,
            is_attribute: false,
        }
    }
}

/// A method, constructor or initializer together with its flattened body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub id: OperationId,
    pub name: String,
    pub class_name: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub is_constructor: bool,
    /// Body fragments in pre-order. Empty for abstract and native methods.
    #[serde(default)]
    pub body: Vec<Fragment>,
    #[serde(default)]
    pub location: Option<CodeRange>,
}

impl PartialEq for Operation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Operation {}

impl Operation {
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.parameters.iter().map(|p| p.name.as_str())
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.iter().any(|p| p.name == name)
    }

    pub fn is_varargs(&self) -> bool {
        self.parameters.last().is_some_and(|p| p.varargs)
    }

    /// `name(T1, T2)`
    pub fn signature(&self) -> String {
        let types: Vec<&str> = self.parameters.iter().map(|p| p.ty.as_str()).collect();
        format!("{}({})", self.name, types.join(", "))
    }

    /// Size of the body, in fragments.
    pub fn statement_count(&self) -> usize {
        self.body.len()
    }

    pub fn top_level_statements(&self) -> impl Iterator<Item = &Fragment> + '_ {
        self.body
            .iter()
            .filter(|f| f.depth == 0 && f.kind != FragmentKind::Expression)
    }

    /// The body's only top-level statement, when that statement is a leaf.
    pub fn single_statement(&self) -> Option<&Fragment> {
        let mut top = self.top_level_statements();
        let first = top.next()?;
        if top.next().is_some() || first.kind != FragmentKind::Leaf {
            return None;
        }
        Some(first)
    }

    pub fn all_invocations(&self) -> impl Iterator<Item = &Invocation> + '_ {
        self.body.iter().flat_map(|f| f.invocations.iter())
    }

    pub fn all_variables(&self) -> impl Iterator<Item = &str> + '_ {
        self.body
            .iter()
            .flat_map(|f| f.variables.iter().map(String::as_str))
    }

    pub fn contains_variable(&self, name: &str) -> bool {
        self.all_variables().any(|v| v == name)
    }

    pub fn variable_declaration(&self, name: &str) -> Option<&VariableDeclaration> {
        self.body
            .iter()
            .flat_map(|f| f.declarations.iter())
            .find(|decl| decl.name == name)
    }

    /// Declared type of every parameter and local variable, by name. Later
    /// declarations shadow earlier ones.
    pub fn variable_types(&self) -> HashMap<&str, &TypeRef> {
        let mut types: HashMap<&str, &TypeRef> = self
            .parameters
            .iter()
            .map(|p| (p.name.as_str(), &p.ty))
            .collect();
        for decl in self.body.iter().flat_map(|f| f.declarations.iter()) {
            if let Some(ty) = &decl.ty {
                types.insert(decl.name.as_str(), ty);
            }
        }
        types
    }

    /// Overload forwarding: the sole statement calls a method of the same name
    /// on `this`. Returns that call.
    pub fn is_delegate(&self) -> Option<&Invocation> {
        self.single_statement()?
            .invocations
            .iter()
            .find(|inv| inv.name == self.name && inv.targets_this())
    }
}
