//! Pipeline orchestration: topology, tree, matrices and equations, then the
//! solve, inverse transform and render collaborators.
//!
//! Every call starts from the circuit alone; nothing is carried between runs.

use std::fmt;

use indexmap::IndexMap;

use kirchhoff_core::{
    Artifact, Circuit, CircuitGraph, ConversionError, EquationSystem, FundamentalMatrices,
    ReferenceNode, Renderer, Result, SampleWindow, Solution, SymbolicSolver,
    TimeDomainConverter, TimeResponse, TreePartition, build_equations, select_tree,
};
use kirchhoff_parser::{InputFormat, parse_circuit};
use kirchhoff_solver::{BareissSolver, PartialFractionConverter, SvgRenderer};

use crate::report::{Plot, Report};

/// Pipeline settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Node whose row is dropped from the incidence matrix.
    pub reference: ReferenceNode,
    /// Times at which every time-domain response is sampled.
    pub window: SampleWindow,
    /// Produce plot artifacts.
    pub render: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reference: ReferenceNode::Auto,
            window: SampleWindow::default(),
            render: true,
        }
    }
}

impl PipelineConfig {
    pub fn with_reference(mut self, reference: ReferenceNode) -> Self {
        self.reference = reference;
        self
    }

    pub fn with_window(mut self, window: SampleWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_render(mut self, render: bool) -> Self {
        self.render = render;
        self
    }
}

/// Everything built before the solver is called.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    pub partition: TreePartition,
    pub matrices: FundamentalMatrices,
    pub system: EquationSystem,
}

impl Assembly {
    fn write_ids(f: &mut fmt::Formatter<'_>, circuit: &Circuit, positions: &[usize]) -> fmt::Result {
        let ids: Vec<&str> = positions
            .iter()
            .filter_map(|&p| circuit.branch(p).map(|b| b.id()))
            .collect();
        writeln!(f, "{}", ids.join(" "))
    }

    /// Human-readable dump of the tree, matrices and equations.
    pub fn display<'a>(&'a self, circuit: &'a Circuit) -> impl fmt::Display + 'a {
        AssemblyDisplay {
            assembly: self,
            circuit,
        }
    }
}

struct AssemblyDisplay<'a> {
    assembly: &'a Assembly,
    circuit: &'a Circuit,
}

impl fmt::Display for AssemblyDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Assembly {
            partition,
            matrices,
            system,
        } = self.assembly;
        write!(f, "Twigs: ")?;
        Assembly::write_ids(f, self.circuit, partition.twigs())?;
        write!(f, "Links: ")?;
        Assembly::write_ids(f, self.circuit, partition.links())?;
        let reference = self
            .circuit
            .nodes()
            .get_index(matrices.incidence.reference)
            .map(String::as_str)
            .unwrap_or("?");
        writeln!(f, "Reference node: {reference}")?;
        writeln!(f)?;
        write!(f, "Cut-set matrix Q:{}", matrices.cut_set)?;
        write!(f, "Tie-set matrix B:{}", matrices.tie_set)?;
        writeln!(f, "Equations ({}):", system.len())?;
        write!(f, "{system}")
    }
}

/// Results of a successful run, before they are flattened into a [`Report`].
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub solution: Solution,
    pub responses: IndexMap<String, std::result::Result<TimeResponse, ConversionError>>,
    pub plots: Vec<(String, std::result::Result<Artifact, ConversionError>)>,
}

impl From<Analysis> for Report {
    fn from(analysis: Analysis) -> Self {
        let equations = analysis
            .solution
            .iter()
            .map(|(name, transform)| (name.clone(), transform.to_string()))
            .collect();
        let time_domain = analysis
            .responses
            .into_iter()
            .map(|(name, response)| {
                let text = match response {
                    Ok(response) => response.expression,
                    Err(e) => e.to_string(),
                };
                (name, text)
            })
            .collect();
        let plots = analysis
            .plots
            .into_iter()
            .map(|(name, artifact)| match artifact {
                Ok(artifact) => Plot::from(artifact),
                Err(e) => Plot::Failed {
                    name,
                    error: e.to_string(),
                },
            })
            .collect();
        Report::Success {
            equations,
            time_domain,
            plots,
        }
    }
}

/// Circuit analysis pipeline over pluggable collaborators.
#[derive(Debug, Clone)]
pub struct Pipeline<S = BareissSolver, T = PartialFractionConverter, R = SvgRenderer> {
    solver: S,
    converter: T,
    renderer: R,
    config: PipelineConfig,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(
            BareissSolver::default(),
            PartialFractionConverter::default(),
            SvgRenderer::default(),
        )
    }
}

impl<S, T, R> Pipeline<S, T, R> {
    pub fn new(solver: S, converter: T, renderer: R) -> Self {
        Self {
            solver,
            converter,
            renderer,
            config: PipelineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Graph, tree, fundamental matrices and equations.
    ///
    /// Stops at the first structural failure and returns it unchanged.
    pub fn assemble(&self, circuit: &Circuit) -> Result<Assembly> {
        let graph = CircuitGraph::build(circuit)?;
        let partition = select_tree(&graph, circuit)?;
        let ordered = partition.ordered_branches(circuit);
        let reference = circuit.reference_index(&self.config.reference)?;
        let (n_twigs, n_links) = (partition.num_twigs(), partition.num_links());

        let matrices = FundamentalMatrices::build(circuit, &ordered, reference, n_twigs, n_links)?;
        let system = build_equations(
            &ordered,
            &matrices.cut_set,
            &matrices.tie_set,
            n_twigs,
            n_links,
        )?;
        log::debug!(
            "assembled {} equations ({} twigs, {} links)",
            system.len(),
            n_twigs,
            n_links
        );

        Ok(Assembly {
            partition,
            matrices,
            system,
        })
    }
}

impl<S, T, R> Pipeline<S, T, R>
where
    S: SymbolicSolver,
    T: TimeDomainConverter,
    R: Renderer,
{
    /// Full run. Structural and solver failures abort; conversion and
    /// render failures are kept next to the variable they concern.
    pub fn run(&self, circuit: &Circuit) -> Result<Analysis> {
        let assembly = self.assemble(circuit)?;
        let solution = self.solver.solve(&assembly.system)?;
        let times = self.config.window.times();

        let mut responses = IndexMap::with_capacity(solution.len());
        for (name, transform) in &solution {
            let response = self.converter.convert(transform, &times);
            match &response {
                Ok(TimeResponse {
                    samples: Err(e), ..
                }) => log::warn!("{name}: {e}"),
                Err(e) => log::warn!("{name}: {e}"),
                Ok(_) => {}
            }
            responses.insert(name.clone(), response);
        }

        let mut plots = Vec::new();
        if self.config.render {
            for (name, response) in &responses {
                // Variables without numeric samples are not plotted.
                let Ok(TimeResponse {
                    samples: Ok(samples),
                    ..
                }) = response
                else {
                    continue;
                };
                plots.push((name.clone(), self.renderer.render(name, &times, samples)));
            }
        }

        Ok(Analysis {
            solution,
            responses,
            plots,
        })
    }

    /// [`run`](Self::run) folded into the uniform result shape.
    pub fn report(&self, circuit: &Circuit) -> Report {
        match self.run(circuit) {
            Ok(analysis) => analysis.into(),
            Err(e) => {
                log::debug!("run failed: {e}");
                Report::error(e.to_string())
            }
        }
    }

    /// Parse `text` and report on it; input errors are reported like any other.
    pub fn report_text(&self, text: &str, format: Option<InputFormat>) -> Report {
        match parse_circuit(text, format) {
            Ok(circuit) => self.report(&circuit),
            Err(e) => Report::error(e.to_string()),
        }
    }
}

#[cfg(feature = "parallel")]
impl<S, T, R> Pipeline<S, T, R>
where
    S: SymbolicSolver + Sync,
    T: TimeDomainConverter + Sync,
    R: Renderer + Sync,
{
    /// Report on independent circuits in parallel, in input order.
    pub fn report_batch(&self, circuits: &[Circuit]) -> Vec<Report> {
        use rayon::prelude::*;

        circuits.par_iter().map(|c| self.report(c)).collect()
    }
}

#[cfg(not(feature = "parallel"))]
impl<S, T, R> Pipeline<S, T, R>
where
    S: SymbolicSolver,
    T: TimeDomainConverter,
    R: Renderer,
{
    /// Report on independent circuits, in input order.
    pub fn report_batch(&self, circuits: &[Circuit]) -> Vec<Report> {
        circuits.iter().map(|c| self.report(c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kirchhoff_core::{Branch, EquationKind, RationalFunction};

    fn series_rc() -> Circuit {
        Circuit::new(
            ["0", "1", "2"],
            vec![
                Branch::voltage_source("V1", "1", "0", 10.0),
                Branch::resistor("R1", "1", "2", 5.0),
                Branch::capacitor("C1", "2", "0", 0.1),
            ],
        )
        .unwrap()
    }

    struct FailingConverter;

    impl TimeDomainConverter for FailingConverter {
        fn convert(
            &self,
            transform: &RationalFunction,
            _times: &[f64],
        ) -> std::result::Result<TimeResponse, ConversionError> {
            if transform.is_proper() && transform.denominator().degree() == Some(1) {
                Err(ConversionError::new("refused"))
            } else {
                Ok(TimeResponse {
                    expression: "f(t)".to_string(),
                    samples: Ok(vec![0.0, 1.0]),
                })
            }
        }
    }

    #[test]
    fn test_assemble_only() {
        let assembly = Pipeline::default().assemble(&series_rc()).unwrap();
        assert_eq!(assembly.partition.num_twigs(), 2);
        assert_eq!(assembly.partition.num_links(), 1);
        assert_eq!(assembly.system.len(), 6);
        let kcl = assembly
            .system
            .equations()
            .iter()
            .filter(|e| matches!(e.kind, EquationKind::Kcl { .. }))
            .count();
        assert_eq!(kcl, 2);

        let text = assembly.display(&series_rc()).to_string();
        assert!(text.contains("Twigs: V1"));
        assert!(text.contains("Reference node: 0"));
    }

    #[test]
    fn test_report_success() {
        let report = Pipeline::default().report(&series_rc());
        let Report::Success {
            equations,
            time_domain,
            plots,
        } = report
        else {
            panic!("expected success");
        };
        assert_eq!(equations.len(), 6);
        assert_eq!(time_domain["V_C1"], "10 - 10*exp(-2*t)");
        assert_eq!(plots.len(), 6);
        assert!(matches!(&plots[0], Plot::Image { format, .. } if format == "svg"));
    }

    #[test]
    fn test_conversion_failures_stay_local() {
        let pipeline = Pipeline::new(BareissSolver::new(), FailingConverter, SvgRenderer::default())
            .with_config(PipelineConfig::default().with_window(SampleWindow::new(0.0, 1.0, 2)));
        let analysis = pipeline.run(&series_rc()).unwrap();
        let failed = analysis.responses.values().filter(|r| r.is_err()).count();
        assert!(failed > 0);
        assert!(failed < analysis.responses.len());
        assert_eq!(analysis.plots.len(), analysis.responses.len() - failed);

        let report = Report::from(analysis);
        assert!(report.is_success());
    }

    #[test]
    fn test_render_disabled() {
        let pipeline = Pipeline::default().with_config(PipelineConfig::default().with_render(false));
        let analysis = pipeline.run(&series_rc()).unwrap();
        assert!(analysis.plots.is_empty());
        assert_eq!(analysis.responses.len(), 6);
    }

    #[test]
    fn test_structural_error_reported() {
        let circuit = Circuit::new(
            ["0", "1", "2", "3"],
            vec![
                Branch::voltage_source("V1", "1", "0", 1.0),
                Branch::resistor("R1", "2", "3", 1.0),
            ],
        )
        .unwrap();
        let report = Pipeline::default().report(&circuit);
        assert!(report.message().unwrap().contains("not connected"));
    }

    #[test]
    fn test_input_error_reported() {
        let report = Pipeline::default().report_text("{\"nodes\": [\"0\"]}", None);
        assert_eq!(
            report.message(),
            Some("missing required field: branches")
        );
    }
}
