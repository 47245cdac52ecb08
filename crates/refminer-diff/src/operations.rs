use std::collections::HashMap;

use refminer_core::OperationId;
use refminer_model::{ClassModel, Operation};

use crate::error::{DiffError, Result};

/// Every operation of a class pair, by id.
///
/// Covers both sides, including operations declared inside anonymous classes,
/// so that detectors can follow a call tree from the before side into added
/// operations and back.
#[derive(Debug, Clone, Default)]
pub struct OperationTable<'a> {
    by_id: HashMap<OperationId, &'a Operation>,
}

impl<'a> OperationTable<'a> {
    pub fn new(original: &'a ClassModel, next: &'a ClassModel) -> Result<Self> {
        let mut table = Self::default();
        for class in [original, next] {
            let anonymous = class.anonymous_classes.iter().flat_map(|anon| anon.operations.iter());
            for operation in class.operations.iter().chain(anonymous) {
                if table.by_id.insert(operation.id, operation).is_some() {
                    return Err(DiffError::DuplicateOperation(operation.id));
                }
            }
        }
        Ok(table)
    }

    pub fn get(&self, id: OperationId) -> Option<&'a Operation> {
        self.by_id.get(&id).copied()
    }

    pub fn require(&self, id: OperationId) -> Result<&'a Operation> {
        self.get(id).ok_or(DiffError::UnknownOperation(id))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
