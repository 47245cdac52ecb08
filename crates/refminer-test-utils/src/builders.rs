use refminer_core::{CodeRange, FragmentId, OperationId};
use refminer_model::{
    AnonymousClass, Attribute, BodyMapper, CandidateMerge, CandidateRename, CandidateSplit,
    ClassModel, ExtractedVariable, Fragment, FragmentKind, Initializer, Invocation, Mapping,
    Operation, Parameter, Replacement, VariableDeclaration, VariableMerge, VariableSplit,
};

use crate::FIXTURE_FILE;

fn fragment_range(id: u32) -> CodeRange {
    CodeRange::new(FIXTURE_FILE, id * 100, id * 100 + 90)
}

#[derive(Debug, Clone)]
pub struct FragmentBuilder {
    fragment: Fragment,
}

impl FragmentBuilder {
    pub fn new(id: u32, kind: FragmentKind, text: &str) -> Self {
        Self {
            fragment: Fragment::new(FragmentId(id), kind, text, fragment_range(id)),
        }
    }

    pub fn leaf(id: u32, text: &str) -> Self {
        Self::new(id, FragmentKind::Leaf, text)
    }

    pub fn composite(id: u32, text: &str) -> Self {
        Self::new(id, FragmentKind::Composite, text)
    }

    pub fn expression(id: u32, text: &str) -> Self {
        Self::new(id, FragmentKind::Expression, text)
    }

    /// Adds a call site. Call sites get consecutive start offsets inside the
    /// fragment so that each one is a distinct location.
    pub fn call(self, name: &str, arguments: &[&str]) -> Self {
        self.push_call(name, None, arguments)
    }

    pub fn call_on(self, receiver: &str, name: &str, arguments: &[&str]) -> Self {
        self.push_call(name, Some(receiver), arguments)
    }

    fn push_call(mut self, name: &str, receiver: Option<&str>, arguments: &[&str]) -> Self {
        let start = self.fragment.location.start() + 1 + self.fragment.invocations.len() as u32;
        let location = CodeRange::new(FIXTURE_FILE, start, self.fragment.location.start() + 50);
        let mut invocation = Invocation::new(
            name,
            arguments.iter().map(|a| a.to_string()).collect(),
            location,
        );
        if let Some(receiver) = receiver {
            invocation = invocation.with_expression(receiver);
        }
        self.fragment.invocations.push(invocation);
        self
    }

    pub fn uses(mut self, variables: &[&str]) -> Self {
        self.fragment
            .variables
            .extend(variables.iter().map(|v| v.to_string()));
        self
    }

    pub fn declares(mut self, name: &str, ty: &str) -> Self {
        self.fragment
            .declarations
            .push(VariableDeclaration::local(name, ty));
        self
    }

    pub fn depth(mut self, depth: u32) -> Self {
        self.fragment.depth = depth;
        self
    }

    pub fn parent(mut self, text: &str) -> Self {
        self.fragment.parent_text = Some(text.to_string());
        self
    }

    pub fn with_expressions(mut self, ids: &[u32]) -> Self {
        self.fragment
            .expressions
            .extend(ids.iter().copied().map(FragmentId));
        self
    }

    pub fn sole_statement(mut self) -> Self {
        self.fragment.sole_statement = true;
        self
    }

    pub fn in_nested_container(mut self) -> Self {
        self.fragment.in_nested_container = true;
        self
    }

    pub fn build(self) -> Fragment {
        self.fragment
    }
}

impl From<FragmentBuilder> for Fragment {
    fn from(builder: FragmentBuilder) -> Self {
        builder.build()
    }
}

#[derive(Debug, Clone)]
pub struct OperationBuilder {
    operation: Operation,
}

impl OperationBuilder {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            operation: Operation {
                id: OperationId(id),
                name: name.to_string(),
                class_name: "Fixture".to_string(),
                parameters: Vec::new(),
                is_constructor: false,
                body: Vec::new(),
                location: None,
            },
        }
    }

    pub fn class_name(mut self, class_name: &str) -> Self {
        self.operation.class_name = class_name.to_string();
        self
    }

    pub fn param(mut self, name: &str, ty: &str) -> Self {
        self.operation.parameters.push(Parameter::new(name, ty));
        self
    }

    pub fn varargs(mut self, name: &str, ty: &str) -> Self {
        let mut parameter = Parameter::new(name, ty);
        parameter.varargs = true;
        self.operation.parameters.push(parameter);
        self
    }

    pub fn constructor(mut self) -> Self {
        self.operation.is_constructor = true;
        self
    }

    pub fn statement(mut self, fragment: impl Into<Fragment>) -> Self {
        self.operation.body.push(fragment.into());
        self
    }

    pub fn build(self) -> Operation {
        self.operation
    }
}

impl From<OperationBuilder> for Operation {
    fn from(builder: OperationBuilder) -> Self {
        builder.build()
    }
}

#[derive(Debug, Clone)]
pub struct MapperBuilder {
    mapper: BodyMapper,
}

impl MapperBuilder {
    pub fn new(container1: u32, container2: u32) -> Self {
        Self {
            mapper: BodyMapper::new(OperationId(container1), OperationId(container2)),
        }
    }

    /// Maps two fragments; the mapping is exact when their texts agree.
    pub fn map(mut self, fragment1: impl Into<Fragment>, fragment2: impl Into<Fragment>) -> Self {
        self.mapper
            .mappings
            .push(Mapping::new(fragment1.into(), fragment2.into()));
        self
    }

    pub fn map_with(
        mut self,
        fragment1: impl Into<Fragment>,
        fragment2: impl Into<Fragment>,
        replacements: Vec<Replacement>,
    ) -> Self {
        let mut mapping = Mapping::new(fragment1.into(), fragment2.into());
        mapping.exact = false;
        mapping.replacements = replacements;
        self.mapper.mappings.push(mapping);
        self
    }

    /// Attaches an extracted variable to the most recent mapping.
    pub fn extracted_variable(mut self, name: &str, sub_expressions: Vec<CodeRange>) -> Self {
        if let Some(mapping) = self.mapper.mappings.last_mut() {
            mapping.extracted_variables.push(ExtractedVariable {
                name: name.to_string(),
                sub_expression_locations: sub_expressions,
            });
        }
        self
    }

    /// Adds a before-side leftover, sorted into leaves or inner nodes.
    pub fn unmapped1(mut self, fragment: impl Into<Fragment>) -> Self {
        let fragment = fragment.into();
        if fragment.is_composite() {
            self.mapper.non_mapped_inner_nodes_t1.push(fragment);
        } else {
            self.mapper.non_mapped_leaves_t1.push(fragment);
        }
        self
    }

    /// Adds an after-side leftover, sorted into leaves or inner nodes.
    pub fn unmapped2(mut self, fragment: impl Into<Fragment>) -> Self {
        let fragment = fragment.into();
        if fragment.is_composite() {
            self.mapper.non_mapped_inner_nodes_t2.push(fragment);
        } else {
            self.mapper.non_mapped_leaves_t2.push(fragment);
        }
        self
    }

    pub fn invocation(mut self, invocation: Invocation) -> Self {
        self.mapper.invocation = Some(invocation);
        self
    }

    pub fn nested(mut self) -> Self {
        self.mapper.nested = true;
        self
    }

    pub fn child(mut self, child: BodyMapper) -> Self {
        self.mapper.child_mappers.push(child);
        self
    }

    pub fn rename(mut self, candidate: CandidateRename) -> Self {
        self.mapper.candidate_renames.push(candidate);
        self
    }

    pub fn merge(mut self, candidate: CandidateMerge) -> Self {
        self.mapper.candidate_merges.push(candidate);
        self
    }

    pub fn split(mut self, candidate: CandidateSplit) -> Self {
        self.mapper.candidate_splits.push(candidate);
        self
    }

    /// Records that the locals `merged` became the local `into`.
    pub fn variable_merge(mut self, merged: &[&str], into: &str) -> Self {
        self.mapper.variable_merges.push(VariableMerge {
            merged: merged.iter().map(|name| name.to_string()).collect(),
            new_name: into.to_string(),
        });
        self
    }

    /// Records that the local `old` became the locals `split`.
    pub fn variable_split(mut self, old: &str, split: &[&str]) -> Self {
        self.mapper.variable_splits.push(VariableSplit {
            old_name: old.to_string(),
            split: split.iter().map(|name| name.to_string()).collect(),
        });
        self
    }

    pub fn build(self) -> BodyMapper {
        self.mapper
    }
}

impl From<MapperBuilder> for BodyMapper {
    fn from(builder: MapperBuilder) -> Self {
        builder.build()
    }
}

#[derive(Debug, Clone)]
pub struct ClassBuilder {
    class: ClassModel,
}

impl ClassBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            class: ClassModel::new(name),
        }
    }

    pub fn nested(mut self) -> Self {
        self.class.top_level = false;
        self
    }

    pub fn attribute(mut self, name: &str, ty: &str) -> Self {
        let attribute = Attribute::new(name, ty, self.class.name.clone());
        self.class.attributes.push(attribute);
        self
    }

    /// An attribute whose initializer spans `start..end` and declares
    /// `anonymous_classes` anonymous classes.
    pub fn attribute_with_initializer(
        mut self,
        name: &str,
        ty: &str,
        text: &str,
        start: u32,
        end: u32,
        anonymous_classes: u32,
    ) -> Self {
        let mut attribute = Attribute::new(name, ty, self.class.name.clone());
        attribute.initializer = Some(Initializer {
            text: text.to_string(),
            location: CodeRange::new(FIXTURE_FILE, start, end),
            anonymous_classes,
        });
        self.class.attributes.push(attribute);
        self
    }

    pub fn enum_constant(mut self, name: &str) -> Self {
        let mut constant = Attribute::new(name, self.class.name.clone(), self.class.name.clone());
        constant.enum_constant = true;
        self.class.enum_constants.push(constant);
        self
    }

    pub fn operation(mut self, operation: impl Into<Operation>) -> Self {
        let mut operation = operation.into();
        operation.class_name = self.class.name.clone();
        self.class.operations.push(operation);
        self
    }

    pub fn anonymous(mut self, name: &str, start: u32, end: u32, operations: Vec<Operation>) -> Self {
        self.class.anonymous_classes.push(AnonymousClass {
            name: name.to_string(),
            location: CodeRange::new(FIXTURE_FILE, start, end),
            operations,
        });
        self
    }

    pub fn build(self) -> ClassModel {
        self.class
    }
}

impl From<ClassBuilder> for ClassModel {
    fn from(builder: ClassBuilder) -> Self {
        builder.build()
    }
}
