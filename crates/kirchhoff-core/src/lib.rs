//! Circuit topology and s-domain equation assembly for Kirchhoff.
//!
//! This crate turns a lumped-element circuit into a square linear system in
//! the Laplace variable `s`:
//! - Topology: the circuit as an undirected multigraph, connectivity check
//! - Tree selection: weighted spanning tree (voltage sources in, current sources out)
//! - Fundamental matrices: incidence, cut-set `Q = [I | Q_l]`, tie-set `B = [-Q_lᵀ | I]`
//! - Equation assembly: KCL, KVL and one constitutive relation per branch

pub mod circuit;
pub mod equations;
pub mod error;
pub mod external;
pub mod matrix;
pub mod polynomial;
pub mod rational;
pub mod topology;
pub mod tree;
pub mod units;

pub use circuit::{Branch, BranchKind, Circuit, GROUND, ReferenceNode};
pub use equations::{
    Equation, EquationKind, EquationSystem, Quantity, Term, Unknown, build_equations,
};
pub use error::{ConversionError, Error, InputError, MatrixError, Result, TopologyError};
pub use external::{
    Artifact, Renderer, SampleWindow, Solution, SymbolicSolver, TimeDomainConverter,
    TimeResponse,
};
pub use matrix::{FundamentalMatrices, IncidenceMatrix, build_cut_set, build_tie_set};
pub use polynomial::Polynomial;
pub use rational::RationalFunction;
pub use topology::CircuitGraph;
pub use tree::{TreePartition, select_tree};
