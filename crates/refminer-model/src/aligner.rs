use indexmap::IndexMap;
use refminer_core::{CodeRange, OperationId};
use serde::{Deserialize, Serialize};

use crate::invocation::Invocation;
use crate::mapper::BodyMapper;
use crate::operation::Operation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentKind {
    /// Align a before-side body with the body of an added operation.
    Extract,
    /// Align the body of a removed operation with an after-side body.
    Inline,
}

/// Everything a statement aligner needs to build a candidate mapper for an
/// extract or inline hypothesis.
#[derive(Debug, Clone, Copy)]
pub struct AlignmentRequest<'a> {
    pub kind: AlignmentKind,
    /// The mapper whose leftovers are being explained.
    pub parent: &'a BodyMapper,
    pub container1: &'a Operation,
    pub container2: &'a Operation,
    pub invocation: &'a Invocation,
    /// Callee parameter name to argument text, in declaration order.
    pub parameter_to_argument: &'a IndexMap<String, String>,
    pub nested: bool,
}

/// The external statement aligner.
///
/// Returning `None` means the bodies could not be aligned at all; the
/// candidate is then dropped without further scoring.
pub trait BodyAligner {
    fn align(&self, request: &AlignmentRequest<'_>) -> Option<BodyMapper>;
}

impl<T: BodyAligner + ?Sized> BodyAligner for &T {
    fn align(&self, request: &AlignmentRequest<'_>) -> Option<BodyMapper> {
        (**self).align(request)
    }
}

/// An alignment computed ahead of time, typically shipped alongside the class
/// pair in an input document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrecomputedAlignment {
    pub kind: AlignmentKind,
    pub container1: OperationId,
    pub container2: OperationId,
    /// Restricts the alignment to one call site. `None` matches any.
    #[serde(default)]
    pub invocation: Option<CodeRange>,
    pub mapper: BodyMapper,
}

/// Serves [`PrecomputedAlignment`]s by `(kind, container1, container2)` and,
/// when given, call-site location. The first matching entry wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrecomputedAligner {
    alignments: Vec<PrecomputedAlignment>,
}

impl PrecomputedAligner {
    pub fn new(alignments: Vec<PrecomputedAlignment>) -> Self {
        Self { alignments }
    }

    pub fn push(&mut self, alignment: PrecomputedAlignment) {
        self.alignments.push(alignment);
    }

    pub fn len(&self) -> usize {
        self.alignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alignments.is_empty()
    }
}

impl BodyAligner for PrecomputedAligner {
    fn align(&self, request: &AlignmentRequest<'_>) -> Option<BodyMapper> {
        let entry = self.alignments.iter().find(|a| {
            a.kind == request.kind
                && a.container1 == request.container1.id
                && a.container2 == request.container2.id
                && a.invocation
                    .as_ref()
                    .map_or(true, |loc| *loc == request.invocation.location)
        });
        let Some(entry) = entry else {
            tracing::trace!(
                target: "refminer.model",
                kind = ?request.kind,
                container1 = %request.container1.id,
                container2 = %request.container2.id,
                "no precomputed alignment"
            );
            return None;
        };
        let mut mapper = entry.mapper.clone();
        mapper.container1 = request.container1.id;
        mapper.container2 = request.container2.id;
        mapper.invocation = Some(request.invocation.clone());
        mapper.nested = request.nested;
        Some(mapper)
    }
}
