use refminer_core::OperationId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiffError {
    #[error("detection timed out during {phase} after {elapsed_ms} ms")]
    Timeout { phase: &'static str, elapsed_ms: u64 },
    #[error("detection cancelled during {phase}")]
    Cancelled { phase: &'static str },
    #[error("{0} is not declared in either class")]
    UnknownOperation(OperationId),
    #[error("{0} is declared more than once")]
    DuplicateOperation(OperationId),
}

pub type Result<T, E = DiffError> = std::result::Result<T, E>;
