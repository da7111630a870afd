//! Equation assembly: KCL, KVL and branch constitutive relations in `s`.

use std::fmt;

use nalgebra::DMatrix;

use crate::circuit::{Branch, BranchKind};
use crate::error::{Error, MatrixError, Result};
use crate::polynomial::Polynomial;
use crate::rational::RationalFunction;
use crate::units::format_coefficient;

/// Which branch quantity an unknown stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    Voltage,
    Current,
}

impl Quantity {
    pub fn prefix(self) -> char {
        match self {
            Quantity::Voltage => 'V',
            Quantity::Current => 'I',
        }
    }
}

/// Transform-domain branch voltage or current, displayed as `V_R1` / `I_R1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Unknown {
    pub quantity: Quantity,
    pub branch: String,
}

impl Unknown {
    pub fn voltage(branch: &str) -> Self {
        Self {
            quantity: Quantity::Voltage,
            branch: branch.to_string(),
        }
    }

    pub fn current(branch: &str) -> Self {
        Self {
            quantity: Quantity::Current,
            branch: branch.to_string(),
        }
    }

    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Unknown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.quantity.prefix(), self.branch)
    }
}

/// Where an equation came from.
#[derive(Debug, Clone, PartialEq)]
pub enum EquationKind {
    /// Fundamental cut-set of a twig.
    Kcl { twig: String },
    /// Fundamental loop of a link.
    Kvl { link: String },
    Constitutive { branch: String, kind: BranchKind },
}

impl fmt::Display for EquationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EquationKind::Kcl { twig } => write!(f, "KCL[{twig}]"),
            EquationKind::Kvl { link } => write!(f, "KVL[{link}]"),
            EquationKind::Constitutive { branch, kind } => write!(f, "{kind}[{branch}]"),
        }
    }
}

/// One coefficient of an equation.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    /// Index into [`EquationSystem::unknowns`].
    pub unknown: usize,
    pub coefficient: RationalFunction,
}

/// `Σ coefficient·unknown + constant = 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Equation {
    pub kind: EquationKind,
    pub terms: Vec<Term>,
    pub constant: RationalFunction,
}

impl Equation {
    /// Coefficient of an unknown, zero when it does not appear.
    pub fn coefficient(&self, unknown: usize) -> RationalFunction {
        self.terms
            .iter()
            .find(|t| t.unknown == unknown)
            .map(|t| t.coefficient.clone())
            .unwrap_or_else(RationalFunction::zero)
    }

    /// Left-hand side evaluated at a real `s` for given unknown values.
    pub fn residual(&self, s: f64, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|t| t.coefficient.eval(s) * values.get(t.unknown).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant.eval(s)
    }

    /// Render against the system's unknown names, e.g. `V_C1 - 10/s*I_C1 = 0`.
    pub fn render(&self, unknowns: &[Unknown]) -> String {
        let mut out = String::new();
        for term in &self.terms {
            let name = unknowns
                .get(term.unknown)
                .map(Unknown::name)
                .unwrap_or_else(|| format!("x{}", term.unknown));
            push_term(&mut out, &term.coefficient, Some(&name));
        }
        if !self.constant.is_zero() {
            push_term(&mut out, &self.constant, None);
        }
        if out.is_empty() {
            out.push('0');
        }
        out.push_str(" = 0");
        out
    }
}

fn push_term(out: &mut String, coefficient: &RationalFunction, name: Option<&str>) {
    let (negative, body) = if let Some(c) = coefficient.as_constant() {
        let magnitude = format_coefficient(c.abs());
        let body = match name {
            Some(name) if magnitude == "1" => name.to_string(),
            Some(name) => format!("{magnitude}*{name}"),
            None => magnitude,
        };
        (c < 0.0, body)
    } else {
        let (negative, shown) = if coefficient.is_negative_monomial() {
            (true, -coefficient)
        } else {
            (false, coefficient.clone())
        };
        let body = match name {
            Some(name) if shown.numerator().num_terms() > 1 => format!("({shown})*{name}"),
            Some(name) => format!("{shown}*{name}"),
            None => shown.to_string(),
        };
        (negative, body)
    };

    match (out.is_empty(), negative) {
        (true, true) => out.push('-'),
        (true, false) => {}
        (false, true) => out.push_str(" - "),
        (false, false) => out.push_str(" + "),
    }
    out.push_str(&body);
}

/// Square system of equations over branch voltages and currents.
///
/// Unknowns are all voltages in working branch order followed by all
/// currents in the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct EquationSystem {
    unknowns: Vec<Unknown>,
    equations: Vec<Equation>,
}

impl EquationSystem {
    /// Build a system, checking that it is square.
    pub fn new(unknowns: Vec<Unknown>, equations: Vec<Equation>) -> Result<Self> {
        if equations.len() != unknowns.len() {
            return Err(Error::UnbalancedSystem {
                equations: equations.len(),
                unknowns: unknowns.len(),
            });
        }
        Ok(Self {
            unknowns,
            equations,
        })
    }

    pub fn unknowns(&self) -> &[Unknown] {
        &self.unknowns
    }

    pub fn equations(&self) -> &[Equation] {
        &self.equations
    }

    pub fn len(&self) -> usize {
        self.equations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equations.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.unknowns.iter().position(|u| u.name() == name)
    }

    /// Every equation rendered as text, in system order.
    pub fn rendered(&self) -> Vec<String> {
        self.equations
            .iter()
            .map(|eq| eq.render(&self.unknowns))
            .collect()
    }
}

impl fmt::Display for EquationSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for eq in &self.equations {
            writeln!(f, "{:<14} {}", eq.kind.to_string(), eq.render(&self.unknowns))?;
        }
        Ok(())
    }
}

/// Constitutive relation of one branch as `(V coefficient, I coefficient, constant)`.
fn constitutive(branch: &Branch) -> (RationalFunction, RationalFunction, RationalFunction) {
    let value = branch.value();
    let one = RationalFunction::one();
    let zero = RationalFunction::zero();
    match branch.kind() {
        BranchKind::Resistor => (one, RationalFunction::constant(-value), zero),
        BranchKind::Inductor => (
            one,
            RationalFunction::from_polynomial(Polynomial::monomial(-value, 1)),
            zero,
        ),
        // V - I/(sC); capacitance is non-zero by circuit validation.
        BranchKind::Capacitor => (one, RationalFunction::step(-1.0 / value), zero),
        BranchKind::VoltageSource => (one, zero, RationalFunction::step(-value)),
        BranchKind::CurrentSource => (zero, one, RationalFunction::step(-value)),
    }
}

fn topological_row(
    matrix: &DMatrix<f64>,
    row: usize,
    offset: usize,
) -> Vec<Term> {
    matrix
        .row(row)
        .iter()
        .enumerate()
        .filter(|(_, v)| **v != 0.0)
        .map(|(j, &v)| Term {
            unknown: offset + j,
            coefficient: RationalFunction::constant(v),
        })
        .collect()
}

/// Assemble KCL rows from `q`, KVL rows from `b`, then one constitutive
/// equation per branch.
///
/// `ordered` is the working branch order (twigs then links) that `q` and `b`
/// were built against.
pub fn build_equations(
    ordered: &[&Branch],
    q: &DMatrix<f64>,
    b: &DMatrix<f64>,
    n_twigs: usize,
    n_links: usize,
) -> Result<EquationSystem> {
    let n = ordered.len();
    if n_twigs + n_links != n {
        return Err(MatrixError::DimensionMismatch {
            expected: n,
            actual: n_twigs + n_links,
        }
        .into());
    }
    for (matrix, rows) in [(q, n_twigs), (b, n_links)] {
        if matrix.nrows() != rows {
            return Err(MatrixError::DimensionMismatch {
                expected: rows,
                actual: matrix.nrows(),
            }
            .into());
        }
        if matrix.ncols() != n {
            return Err(MatrixError::DimensionMismatch {
                expected: n,
                actual: matrix.ncols(),
            }
            .into());
        }
    }

    let unknowns: Vec<Unknown> = ordered
        .iter()
        .map(|br| Unknown::voltage(br.id()))
        .chain(ordered.iter().map(|br| Unknown::current(br.id())))
        .collect();

    let mut equations = Vec::with_capacity(2 * n);

    for (r, twig) in ordered.iter().take(n_twigs).enumerate() {
        equations.push(Equation {
            kind: EquationKind::Kcl {
                twig: twig.id().to_string(),
            },
            terms: topological_row(q, r, n),
            constant: RationalFunction::zero(),
        });
    }

    for (r, link) in ordered.iter().skip(n_twigs).enumerate() {
        equations.push(Equation {
            kind: EquationKind::Kvl {
                link: link.id().to_string(),
            },
            terms: topological_row(b, r, 0),
            constant: RationalFunction::zero(),
        });
    }

    for (i, branch) in ordered.iter().enumerate() {
        let (v_coef, i_coef, constant) = constitutive(branch);
        let terms = [(i, v_coef), (n + i, i_coef)]
            .into_iter()
            .filter(|(_, c)| !c.is_zero())
            .map(|(unknown, coefficient)| Term {
                unknown,
                coefficient,
            })
            .collect();
        equations.push(Equation {
            kind: EquationKind::Constitutive {
                branch: branch.id().to_string(),
                kind: branch.kind(),
            },
            terms,
            constant,
        });
    }

    log::debug!(
        "assembled {} equations ({} KCL, {} KVL, {} constitutive)",
        equations.len(),
        n_twigs,
        n_links,
        n
    );

    EquationSystem::new(unknowns, equations)
}
