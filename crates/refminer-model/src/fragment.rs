use refminer_core::{CodeRange, FragmentId};
use serde::{Deserialize, Serialize};

use crate::invocation::Invocation;
use crate::operation::VariableDeclaration;

/// Text of a bare block statement.
pub const OPEN_BLOCK: &str = "{";

/// Statements that never count as evidence of moved code on their own.
const TRIVIAL_STATEMENTS: &[&str] = &[
    OPEN_BLOCK,
    "return true;",
    "return false;",
    "return this;",
    "return null;",
    "return;",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentKind {
    /// A simple statement.
    Leaf,
    /// A statement with a body (`if`, `for`, `try`, a block, ...).
    Composite,
    /// An expression owned by a composite, such as an `if` condition.
    Expression,
}

/// One statement or expression of a method body, as handed over by the parser.
///
/// Equality and hashing use [`Fragment::id`] only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fragment {
    pub id: FragmentId,
    pub kind: FragmentKind,
    /// Source text, normalised by the parser (`return x;`, `if(a)`, `{`).
    pub text: String,
    pub location: CodeRange,
    /// Nesting depth below the method body; top-level statements are at 0.
    #[serde(default)]
    pub depth: u32,
    /// Text of the enclosing composite statement, if any.
    #[serde(default)]
    pub parent_text: Option<String>,
    #[serde(default)]
    pub invocations: Vec<Invocation>,
    #[serde(default)]
    pub variables: Vec<String>,
    #[serde(default)]
    pub declarations: Vec<VariableDeclaration>,
    /// Expression fragments of a composite statement.
    #[serde(default)]
    pub expressions: Vec<FragmentId>,
    /// The only statement of a top-level method body.
    #[serde(default)]
    pub sole_statement: bool,
    /// Lives inside a lambda or anonymous class body.
    #[serde(default)]
    pub in_nested_container: bool,
}

impl PartialEq for Fragment {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Fragment {}

impl std::hash::Hash for Fragment {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Fragment {
    pub fn new(id: FragmentId, kind: FragmentKind, text: impl Into<String>, location: CodeRange) -> Self {
        Self {
            id,
            kind,
            text: text.into(),
            location,
            depth: 0,
            parent_text: None,
            invocations: Vec::new(),
            variables: Vec::new(),
            declarations: Vec::new(),
            expressions: Vec::new(),
            sole_statement: false,
            in_nested_container: false,
        }
    }

    pub fn is_composite(&self) -> bool {
        self.kind == FragmentKind::Composite
    }

    pub fn is_expression(&self) -> bool {
        self.kind == FragmentKind::Expression
    }

    pub fn is_block(&self) -> bool {
        self.text == OPEN_BLOCK
    }

    /// Whether this fragment counts towards mapped/non-mapped statement
    /// tallies.
    pub fn countable(&self) -> bool {
        if self.is_expression() || self.sole_statement {
            return true;
        }
        !(TRIVIAL_STATEMENTS.contains(&self.text.as_str())
            || self.text.starts_with("catch(")
            || self.text.starts_with("case "))
    }

    pub fn throws_new_exception(&self) -> bool {
        self.text.starts_with("throw new ")
    }

    pub fn in_catch_block(&self) -> bool {
        self.parent_text
            .as_deref()
            .is_some_and(|parent| parent.starts_with("catch("))
    }

    /// The call that makes up the whole statement, if there is one.
    pub fn invocation_covering_entire_fragment(&self) -> Option<&Invocation> {
        self.invocations
            .iter()
            .find(|invocation| invocation.covers_statement(&self.text))
    }

    pub fn declares(&self, name: &str) -> bool {
        self.declarations.iter().any(|decl| decl.name == name)
    }

    /// `return <name>;`
    pub fn returns_variable(&self, name: &str) -> bool {
        self.text
            .strip_prefix("return ")
            .and_then(|rest| rest.strip_suffix(';'))
            .is_some_and(|returned| returned.trim() == name)
    }
}
