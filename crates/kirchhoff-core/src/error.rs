//! Error types for kirchhoff-core.

use thiserror::Error;

/// Input rejected before any graph or matrix work starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("circuit declares no nodes")]
    NoNodes,

    #[error("duplicate node: {0}")]
    DuplicateNode(String),

    #[error("duplicate branch id: {0}")]
    DuplicateBranch(String),

    #[error("branch {branch} references undeclared node '{node}'")]
    UnknownNode { branch: String, node: String },

    #[error("branch {0} connects a node to itself")]
    SelfLoop(String),

    #[error("branch {branch} has invalid value {value}")]
    InvalidValue { branch: String, value: f64 },

    #[error("unknown component type '{0}'")]
    UnknownComponent(String),

    #[error("reference node '{0}' is not declared")]
    UnknownReference(String),
}

/// Structural failures of the circuit graph.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TopologyError {
    /// Some nodes cannot be reached from the others.
    #[error(
        "circuit is not connected ({components} separate parts, unreachable: {}); \
         all nodes must form a connected graph with node '0' as reference",
        unreachable.join(", ")
    )]
    Unconnected {
        components: usize,
        unreachable: Vec<String>,
    },

    /// The tree search did not produce a spanning tree.
    #[error("spanning tree unavailable: found {found} tree branches, expected {expected}")]
    SpanningTreeUnavailable { found: usize, expected: usize },
}

/// Failures while deriving the fundamental matrices.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatrixError {
    /// The twig columns of the reduced incidence matrix cannot be inverted.
    #[error(
        "singular matrix error: cannot invert {size}x{size} tree submatrix, check circuit topology ({detail})"
    )]
    SingularTreeSubmatrix { size: usize, detail: String },

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Per-variable failure in the time-domain or render stage.
///
/// Never aborts a run; it is recorded next to the variable it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ConversionError {
    message: String,
}

impl ConversionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Matrix(#[from] MatrixError),

    /// Assembly produced a non-square system.
    #[error("equation system is not square: {equations} equations for {unknowns} unknowns")]
    UnbalancedSystem { equations: usize, unknowns: usize },

    /// The symbolic solver could not produce a solution.
    #[error("solver error: {0}")]
    Solver(String),
}

pub type Result<T> = std::result::Result<T, Error>;
