//! Kirchhoff: lumped circuit analysis by cut-sets and tie-sets in the
//! Laplace domain.
//!
//! A circuit is split into a spanning tree (twigs) and its co-tree (links).
//! The fundamental cut-set matrix gives one KCL equation per twig, the tie-set
//! matrix one KVL equation per link, and each branch adds its constitutive
//! relation in `s`. The resulting square system is solved symbolically, every
//! unknown is taken back to the time domain and sampled, and the samples are
//! plotted.
//!
//! # Example
//!
//! ```
//! use kirchhoff::{Pipeline, Report, parse_netlist};
//!
//! let circuit = parse_netlist("
//! V1 1 0 10
//! R1 1 2 5
//! C1 2 0 0.1
//! ").unwrap();
//!
//! let report = Pipeline::default().report(&circuit);
//! if let Report::Success { time_domain, .. } = report {
//!     assert_eq!(time_domain["V_C1"], "10 - 10*exp(-2*t)");
//! }
//! ```
//!
//! # Crates
//!
//! - [`kirchhoff_core`]: circuit model, topology, tree, matrices, equations
//! - [`kirchhoff_solver`]: symbolic solver, inverse Laplace transform, SVG plots
//! - [`kirchhoff_parser`]: JSON and netlist readers

pub mod pipeline;
pub mod report;

pub use kirchhoff_core::{
    Branch, BranchKind, Circuit, ConversionError, Error, ReferenceNode, Result, SampleWindow,
};
pub use kirchhoff_solver::{BareissSolver, PartialFractionConverter, SvgRenderer};
pub use kirchhoff_parser::{InputFormat, demo_circuit, parse_circuit, parse_json, parse_netlist};
pub use pipeline::{Analysis, Assembly, Pipeline, PipelineConfig};
pub use report::{Plot, Report};
