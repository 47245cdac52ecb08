use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// A type as written in source, e.g. `java.util.List<String>`, `int[]` or
/// `Object...`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeRef(String);

impl TypeRef {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self(name.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of array dimensions; a varargs `...` counts as one.
    pub fn array_dimension(&self) -> usize {
        let mut text = self.0.as_str();
        let mut dims = 0;
        if let Some(rest) = text.strip_suffix("...") {
            text = rest;
            dims += 1;
        }
        while let Some(rest) = text.strip_suffix("[]") {
            text = rest;
            dims += 1;
        }
        dims
    }

    /// Erased, unqualified class name: `java.util.List<String>[]` is `List`.
    pub fn class_type(&self) -> &str {
        let base = match self.0.find('<') {
            Some(idx) => &self.0[..idx],
            None => self.0.as_str(),
        };
        let base = base.trim_end_matches("...").trim_end_matches("[]").trim();
        match base.rfind('.') {
            Some(idx) => &base[idx + 1..],
            None => base,
        }
    }

    pub fn is_parameterized(&self) -> bool {
        self.0.contains('<')
    }

    /// Equality modulo package qualification of every named type, so
    /// `java.util.List<java.lang.String>` equals `List<String>`.
    pub fn equals_unqualified(&self, other: &TypeRef) -> bool {
        unqualified(&self.0) == unqualified(&other.0)
    }

    /// Same erased class and the same number of array dimensions.
    pub fn equal_class_type(&self, other: &TypeRef) -> bool {
        self.class_type() == other.class_type() && self.array_dimension() == other.array_dimension()
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn unqualified(text: &str) -> String {
    let text = text.replace("...", "[]");
    let mut out = String::with_capacity(text.len());
    let mut segment = String::new();
    for ch in text.chars() {
        match ch {
            '.' => segment.clear(),
            c if c.is_alphanumeric() || c == '_' || c == '$' => segment.push(c),
            c if c.is_whitespace() => {
                out.push_str(&segment);
                segment.clear();
                if !out.ends_with(' ') && !out.is_empty() {
                    out.push(' ');
                }
            }
            other => {
                out.push_str(&segment);
                segment.clear();
                out.push(other);
            }
        }
    }
    out.push_str(&segment);
    out
}

/// Known `subtype -> supertypes` edges, by unqualified class name.
///
/// The external model supplies whatever it could resolve; anything missing
/// here simply does not count as a subtype relation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeHierarchy {
    supertypes: BTreeMap<String, BTreeSet<String>>,
}

impl TypeHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, subtype: impl Into<String>, supertype: impl Into<String>) {
        self.supertypes
            .entry(subtype.into())
            .or_default()
            .insert(supertype.into());
    }

    pub fn is_empty(&self) -> bool {
        self.supertypes.is_empty()
    }

    /// Transitive, strict subtype check.
    pub fn is_subtype(&self, subtype: &str, supertype: &str) -> bool {
        let mut visited = BTreeSet::new();
        let mut stack = vec![subtype];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(supers) = self.supertypes.get(current) {
                for sup in supers {
                    if sup == supertype {
                        return true;
                    }
                    stack.push(sup.as_str());
                }
            }
        }
        false
    }
}

const WIDENING: &[(&str, &str)] = &[
    ("byte", "short"),
    ("byte", "int"),
    ("short", "int"),
    ("char", "int"),
    ("int", "long"),
    ("int", "float"),
    ("int", "double"),
    ("long", "float"),
    ("long", "double"),
    ("float", "double"),
];

/// Whether an argument of type `argument` may be passed where `parameter` is
/// declared.
pub fn compatible_types(argument: &TypeRef, parameter: &TypeRef, hierarchy: &TypeHierarchy) -> bool {
    if argument.equals_unqualified(parameter) || argument.equal_class_type(parameter) {
        return true;
    }
    let arg = argument.class_type();
    let param = parameter.class_type();
    let same_dims = argument.array_dimension() == parameter.array_dimension();

    if param == "Object" && parameter.array_dimension() == 0 {
        return true;
    }
    if same_dims
        && (param == "Throwable" || param == "Exception")
        && (arg.ends_with("Exception") || arg.ends_with("Error"))
    {
        return true;
    }
    if same_dims && WIDENING.iter().any(|&(from, to)| from == arg && to == param) {
        return true;
    }
    if same_dims && arg.strip_suffix("Impl") == Some(param) {
        return true;
    }
    same_dims && hierarchy.is_subtype(arg, param)
}

/// Best-effort type of an argument expression from its spelling alone.
///
/// Returns `None` when the text gives no reliable hint (plain names, calls,
/// `null`); callers treat that as "anything goes".
pub fn infer_literal_type(argument: &str) -> Option<TypeRef> {
    let arg = argument.trim();
    if arg.starts_with('"') {
        return Some(TypeRef::new("String"));
    }
    if arg.len() >= 3 && arg.starts_with('\'') && arg.ends_with('\'') {
        return Some(TypeRef::new("char"));
    }
    if arg.ends_with(".class") {
        return Some(TypeRef::new("Class"));
    }
    if arg == "true" || arg == "false" {
        return Some(TypeRef::new("boolean"));
    }
    if let Some(rest) = arg.strip_prefix("new ") {
        let idx = rest.find(|c: char| c == '(' || c == '[' || c == '{')?;
        let name = rest[..idx].trim();
        if name.is_empty() {
            return None;
        }
        return Some(if rest[idx..].starts_with('[') {
            TypeRef::new(format!("{name}[]"))
        } else {
            TypeRef::new(name)
        });
    }
    numeric_literal_type(arg).map(TypeRef::new)
}

fn numeric_literal_type(arg: &str) -> Option<&'static str> {
    let first = arg.chars().next()?;
    if !(first.is_ascii_digit() || (first == '-' && arg.len() > 1)) {
        return None;
    }
    let body = arg.replace('_', "");
    if let Some(digits) = body.strip_suffix(['l', 'L']) {
        return digits.parse::<i64>().ok().map(|_| "long");
    }
    if let Some(digits) = body.strip_suffix(['f', 'F']) {
        return digits.parse::<f64>().ok().map(|_| "float");
    }
    if body.parse::<i64>().is_ok() {
        return Some("int");
    }
    if body.strip_suffix(['d', 'D']).unwrap_or(&body).parse::<f64>().is_ok() {
        return Some("double");
    }
    None
}
