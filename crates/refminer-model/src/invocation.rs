use refminer_core::CodeRange;
use serde::{Deserialize, Serialize};

/// A method call site.
///
/// Call sites are identified by their location: two invocations with the same
/// text at different places are different call sites.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Invocation {
    pub name: String,
    #[serde(default)]
    pub expression: Option<String>,
    #[serde(default)]
    pub arguments: Vec<String>,
    pub location: CodeRange,
}

impl Invocation {
    pub fn new(name: impl Into<String>, arguments: Vec<String>, location: CodeRange) -> Self {
        Self {
            name: name.into(),
            expression: None,
            arguments,
            location,
        }
    }

    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = Some(expression.into());
        self
    }

    /// The call as it would be written: `expr.name(a, b)`.
    pub fn actual_string(&self) -> String {
        let mut out = String::new();
        if let Some(expression) = &self.expression {
            out.push_str(expression);
            out.push('.');
        }
        out.push_str(&self.name);
        out.push('(');
        out.push_str(&self.arguments.join(", "));
        out.push(')');
        out
    }

    pub fn is_super_call(&self) -> bool {
        self.expression.as_deref() == Some("super")
    }

    /// Whether the receiver is absent or ends in `this`.
    pub fn targets_this(&self) -> bool {
        self.expression
            .as_deref()
            .map_or(true, |expr| expr.ends_with("this"))
    }

    /// Whether `statement` consists of nothing but this call, as an expression
    /// statement, a `return`, or the right-hand side of an assignment.
    pub fn covers_statement(&self, statement: &str) -> bool {
        let call = self.actual_string();
        let Some(body) = statement.trim().strip_suffix(';') else {
            return false;
        };
        let body = body.trim_end();
        if body == call {
            return true;
        }
        if body.strip_prefix("return ").map(str::trim_start) == Some(call.as_str()) {
            return true;
        }
        match body.rfind('=') {
            Some(idx) => body[idx + 1..].trim() == call && !body[..idx].ends_with(['=', '!', '<', '>']),
            None => false,
        }
    }
}
