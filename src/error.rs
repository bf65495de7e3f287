//! Error types for registry validation and solving

use std::collections::BTreeSet;

use thiserror::Error;

/// Why a process definition was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedReason {
    #[error("item `{0}` is listed more than once as an input")]
    DuplicateInput(String),
    #[error("item `{0}` is listed more than once as an output")]
    DuplicateOutput(String),
    #[error("item `{0}` is both consumed and produced (self-loop)")]
    SelfLoop(String),
}

/// Everything that can stop a planning request.
///
/// Every variant is fatal to the operation that produced it; no partial
/// result accompanies an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("item `{0}` is already registered")]
    DuplicateItem(String),

    #[error("process `{0}` is already registered")]
    DuplicateProcess(String),

    #[error("malformed process `{process}`: {reason}")]
    MalformedProcess {
        process: String,
        reason: MalformedReason,
    },

    #[error("invalid value {value} for {what}")]
    InvalidRate { what: String, value: f64 },

    #[error("unknown item `{item}` referenced by {referenced_by}")]
    UnknownItem { item: String, referenced_by: String },

    #[error("unknown process `{0}`")]
    UnknownProcess(String),

    #[error("targets cannot be reached from the available materials: {}", join(.unreachable))]
    StructuralInfeasibility { unreachable: BTreeSet<String> },

    #[error("no non-negative throughput satisfies the balance and demand constraints")]
    NumericInfeasibility,

    #[error("objective is unbounded; some target has no limiting constraint")]
    Unbounded,
}

fn join(items: &BTreeSet<String>) -> String {
    items.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

pub type Result<T> = std::result::Result<T, PlanError>;
