//! Solve, invert and render for Kirchhoff.
//!
//! Implementations of the collaborator traits from `kirchhoff-core`:
//! - [`BareissSolver`]: fraction-free elimination over polynomials in `s`
//! - [`PartialFractionConverter`]: inverse Laplace transform with sampling
//! - [`SvgRenderer`]: stateless SVG line plots

pub mod error;
pub mod laplace;
pub mod render;
pub mod symbolic;

pub use error::{Error, Result};
pub use laplace::{ExponentialSum, PartialFractionConverter, Pole};
pub use render::SvgRenderer;
pub use symbolic::BareissSolver;
