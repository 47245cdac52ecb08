use indexmap::{IndexMap, IndexSet};
use refminer_core::{CodeRange, OperationId, THIS_DOT};
use serde::{Deserialize, Serialize};

use crate::fragment::FragmentKind;
use crate::operation::Operation;
use crate::types::TypeRef;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Initializer {
    pub text: String,
    pub location: CodeRange,
    /// Anonymous class declarations inside the initializer expression.
    #[serde(default)]
    pub anonymous_classes: u32,
}

/// A field or enum constant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub class_name: String,
    #[serde(default)]
    pub location: Option<CodeRange>,
    #[serde(default)]
    pub initializer: Option<Initializer>,
    #[serde(default)]
    pub enum_constant: bool,
}

impl Attribute {
    pub fn new(name: impl Into<String>, ty: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: TypeRef::new(ty),
            class_name: class_name.into(),
            location: None,
            initializer: None,
            enum_constant: false,
        }
    }

    /// Whether every one of `locations` lies inside this attribute's own
    /// initializer, and that initializer declares an anonymous class.
    pub fn referenced_only_in_own_initializer<'a>(
        &self,
        mut locations: impl Iterator<Item = &'a CodeRange>,
    ) -> bool {
        match &self.initializer {
            Some(init) if init.anonymous_classes > 0 => {
                locations.all(|loc| init.location.subsumes(loc))
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymousClass {
    pub name: String,
    pub location: CodeRange,
    #[serde(default)]
    pub operations: Vec<Operation>,
}

fn default_top_level() -> bool {
    true
}

/// One side of a class pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassModel {
    pub name: String,
    #[serde(default = "default_top_level")]
    pub top_level: bool,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub enum_constants: Vec<Attribute>,
    #[serde(default)]
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub anonymous_classes: Vec<AnonymousClass>,
}

impl ClassModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            top_level: true,
            attributes: Vec::new(),
            enum_constants: Vec::new(),
            operations: Vec::new(),
            anonymous_classes: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn contains_attribute_with_name(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    pub fn enum_constant(&self, name: &str) -> Option<&Attribute> {
        self.enum_constants.iter().find(|a| a.name == name)
    }

    /// Looks an operation up among this class's own operations and those of
    /// its anonymous classes.
    pub fn operation(&self, id: OperationId) -> Option<&Operation> {
        self.operations.iter().find(|op| op.id == id).or_else(|| {
            self.anonymous_classes
                .iter()
                .flat_map(|anon| anon.operations.iter())
                .find(|op| op.id == id)
        })
    }

    /// Groups of attributes initialised from the same constructor parameter
    /// (`this.a = p; this.b = p;`), keyed by that parameter. Only groups with
    /// more than one attribute are returned.
    pub fn aliased_attributes(&self) -> IndexMap<String, IndexSet<String>> {
        let mut groups: IndexMap<String, IndexSet<String>> = IndexMap::new();
        for ctor in self.operations.iter().filter(|op| op.is_constructor) {
            for leaf in ctor.body.iter().filter(|f| f.kind == FragmentKind::Leaf) {
                let Some((attribute, value)) = field_assignment(&leaf.text) else {
                    continue;
                };
                if ctor.has_parameter(value) {
                    groups
                        .entry(value.to_string())
                        .or_default()
                        .insert(attribute.to_string());
                }
            }
        }
        groups.retain(|_, attrs| attrs.len() > 1);
        groups
    }
}

/// Splits `this.a = b;` into `("a", "b")`.
fn field_assignment(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix(THIS_DOT)?;
    let (lhs, rhs) = rest.split_once('=')?;
    let lhs = lhs.trim();
    let rhs = rhs.trim().strip_suffix(';')?.trim();
    if lhs.is_empty() || rhs.is_empty() || rhs.starts_with('=') {
        return None;
    }
    Some((lhs, rhs))
}
