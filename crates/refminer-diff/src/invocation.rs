use std::collections::HashMap;

use refminer_model::{compatible_types, infer_literal_type, Invocation, Operation, TypeHierarchy, TypeRef};

/// Decides whether a call site plausibly targets an operation.
///
/// A call matches when the names agree, the arity fits (a trailing varargs
/// parameter may receive no argument at all), and every argument whose type
/// can be inferred is compatible with the declared parameter type. Arguments
/// of unknown type never cause a mismatch.
#[derive(Debug, Clone, Copy)]
pub struct InvocationMatcher<'a> {
    hierarchy: &'a TypeHierarchy,
}

impl<'a> InvocationMatcher<'a> {
    pub fn new(hierarchy: &'a TypeHierarchy) -> Self {
        Self { hierarchy }
    }

    pub fn hierarchy(&self) -> &'a TypeHierarchy {
        self.hierarchy
    }

    pub fn matches(&self, invocation: &Invocation, operation: &Operation, caller: &Operation) -> bool {
        if invocation.name != operation.name {
            return false;
        }
        let arguments = invocation.arguments.len();
        let parameters = operation.parameters.len();
        let arity = arguments == parameters || (operation.is_varargs() && arguments + 1 >= parameters);
        if !arity {
            return false;
        }

        let types = caller.variable_types();
        invocation
            .arguments
            .iter()
            .enumerate()
            .all(|(index, argument)| {
                let Some(argument_type) = argument_type(argument, &types) else {
                    return true;
                };
                let parameter = match operation.parameters.get(index) {
                    Some(parameter) => parameter,
                    // Extra arguments all land in the trailing varargs parameter.
                    None => match operation.parameters.last() {
                        Some(last) => last,
                        None => return false,
                    },
                };
                if parameter.varargs {
                    let element = TypeRef::new(
                        parameter.ty.as_str().strip_suffix("...").unwrap_or(parameter.ty.as_str()),
                    );
                    compatible_types(&argument_type, &element, self.hierarchy)
                        || compatible_types(&argument_type, &parameter.ty, self.hierarchy)
                } else {
                    compatible_types(&argument_type, &parameter.ty, self.hierarchy)
                }
            })
    }

    /// The call sites among `invocations` that match `operation` when made
    /// from `caller`, in their original order.
    pub fn matching_invocations<'i>(
        &self,
        operation: &Operation,
        invocations: impl IntoIterator<Item = &'i Invocation>,
        caller: &Operation,
    ) -> Vec<Invocation> {
        invocations
            .into_iter()
            .filter(|invocation| self.matches(invocation, operation, caller))
            .cloned()
            .collect()
    }

    /// When `operation` consists of one statement that does nothing but call
    /// `target`, returns that call.
    pub fn delegates_to<'o>(&self, operation: &'o Operation, target: &Operation) -> Option<&'o Invocation> {
        let statement = operation.single_statement()?;
        let invocation = statement.invocation_covering_entire_fragment()?;
        self.matches(invocation, target, operation).then_some(invocation)
    }
}

fn argument_type(argument: &str, declared: &HashMap<&str, &TypeRef>) -> Option<TypeRef> {
    match declared.get(argument.trim()) {
        Some(ty) => Some((*ty).clone()),
        None => infer_literal_type(argument),
    }
}
