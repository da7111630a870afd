//! Seams to the stages that run after assembly: symbolic solve, inverse
//! transform with sampling, and rendering.

use indexmap::IndexMap;

use crate::equations::EquationSystem;
use crate::error::{ConversionError, Result};
use crate::rational::RationalFunction;

/// Unknown name (`V_R1`, `I_C1`, ...) to its transform-domain solution,
/// in the system's unknown order.
pub type Solution = IndexMap<String, RationalFunction>;

/// Solves an assembled system for every unknown.
pub trait SymbolicSolver {
    fn solve(&self, system: &EquationSystem) -> Result<Solution>;
}

/// Time-domain form of one transform-domain expression.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeResponse {
    /// Closed-form expression in `t`.
    pub expression: String,
    /// Samples at the requested times, or why sampling failed.
    pub samples: std::result::Result<Vec<f64>, ConversionError>,
}

/// Converts a transform-domain expression back to the time domain.
///
/// A failure concerns one variable only and is reported as a
/// [`ConversionError`].
pub trait TimeDomainConverter {
    fn convert(
        &self,
        transform: &RationalFunction,
        times: &[f64],
    ) -> std::result::Result<TimeResponse, ConversionError>;
}

/// A rendered waveform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    /// File format, e.g. `svg`.
    pub format: String,
    pub bytes: Vec<u8>,
}

/// Renders sampled waveforms. Implementations hold no global state.
pub trait Renderer {
    fn render(
        &self,
        name: &str,
        times: &[f64],
        samples: &[f64],
    ) -> std::result::Result<Artifact, ConversionError>;
}

/// Evaluation window for time-domain sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleWindow {
    pub start: f64,
    pub end: f64,
    /// Number of samples, both ends included.
    pub points: usize,
}

impl Default for SampleWindow {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: 10.0,
            points: 100,
        }
    }
}

impl SampleWindow {
    pub fn new(start: f64, end: f64, points: usize) -> Self {
        Self { start, end, points }
    }

    /// Evenly spaced sample times.
    pub fn times(&self) -> Vec<f64> {
        match self.points {
            0 => Vec::new(),
            1 => vec![self.start],
            n => {
                let step = (self.end - self.start) / (n - 1) as f64;
                (0..n).map(|k| self.start + step * k as f64).collect()
            }
        }
    }
}
