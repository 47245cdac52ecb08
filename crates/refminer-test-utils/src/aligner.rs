use std::cell::RefCell;

use refminer_core::OperationId;
use refminer_model::{AlignmentKind, AlignmentRequest, BodyAligner, BodyMapper};

/// What the engine asked a [`ScriptedAligner`] for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedRequest {
    pub kind: AlignmentKind,
    pub container1: OperationId,
    pub container2: OperationId,
    pub nested: bool,
    pub arguments: Vec<(String, String)>,
}

#[derive(Debug)]
struct ScriptEntry {
    kind: AlignmentKind,
    container1: OperationId,
    container2: OperationId,
    /// Only answer requests anchored at this call, as written.
    call: Option<String>,
    mapper: BodyMapper,
}

/// A [`BodyAligner`] that answers from a script keyed by
/// `(kind, container1, container2)`, optionally narrowed to one call site.
///
/// Unscripted requests return `None`. Every request is recorded, answered or
/// not, so tests can assert on what the detectors tried. The first matching
/// entry wins.
#[derive(Debug, Default)]
pub struct ScriptedAligner {
    script: Vec<ScriptEntry>,
    requests: RefCell<Vec<ScriptedRequest>>,
}

impl ScriptedAligner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers extract requests from `before` into `added` with `mapper`.
    pub fn extract(self, before: u32, added: u32, mapper: impl Into<BodyMapper>) -> Self {
        self.script(AlignmentKind::Extract, before, added, None, mapper.into())
    }

    /// Answers extract requests from `before` into `added` made for the call
    /// site written `call`, e.g. `log("stop")`.
    pub fn extract_at(self, before: u32, added: u32, call: &str, mapper: impl Into<BodyMapper>) -> Self {
        self.script(AlignmentKind::Extract, before, added, Some(call.to_string()), mapper.into())
    }

    /// Answers inline requests from `removed` into `after` with `mapper`.
    pub fn inline(self, removed: u32, after: u32, mapper: impl Into<BodyMapper>) -> Self {
        self.script(AlignmentKind::Inline, removed, after, None, mapper.into())
    }

    fn script(mut self, kind: AlignmentKind, c1: u32, c2: u32, call: Option<String>, mapper: BodyMapper) -> Self {
        self.script.push(ScriptEntry {
            kind,
            container1: OperationId(c1),
            container2: OperationId(c2),
            call,
            mapper,
        });
        self
    }

    pub fn requests(&self) -> Vec<ScriptedRequest> {
        self.requests.borrow().clone()
    }
}

impl BodyAligner for ScriptedAligner {
    fn align(&self, request: &AlignmentRequest<'_>) -> Option<BodyMapper> {
        self.requests.borrow_mut().push(ScriptedRequest {
            kind: request.kind,
            container1: request.container1.id,
            container2: request.container2.id,
            nested: request.nested,
            arguments: request
                .parameter_to_argument
                .iter()
                .map(|(p, a)| (p.clone(), a.clone()))
                .collect(),
        });

        let call = request.invocation.actual_string();
        let entry = self.script.iter().find(|entry| {
            entry.kind == request.kind
                && entry.container1 == request.container1.id
                && entry.container2 == request.container2.id
                && entry.call.as_ref().map_or(true, |c| *c == call)
        })?;
        tracing::trace!(
            target: "refminer.test",
            kind = ?request.kind,
            container1 = %request.container1.id,
            container2 = %request.container2.id,
            "scripted alignment"
        );
        let mut mapper = entry.mapper.clone();
        mapper.container1 = request.container1.id;
        mapper.container2 = request.container2.id;
        mapper.invocation = Some(request.invocation.clone());
        mapper.nested = request.nested;
        Some(mapper)
    }
}
