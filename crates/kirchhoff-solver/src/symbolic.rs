//! Fraction-free (Bareiss) elimination over polynomials in `s`.
//!
//! Each equation is multiplied through by its distinct denominators so that
//! every coefficient is a polynomial. Bareiss elimination keeps entries
//! polynomial by dividing each update exactly by the previous pivot, and
//! back substitution yields `x_i = N_i(s) / det(s)`.

use std::iter;

use indexmap::IndexMap;
use kirchhoff_core::polynomial::DEFAULT_TOLERANCE;
use kirchhoff_core::{EquationSystem, Polynomial, RationalFunction, Solution, SymbolicSolver};

use crate::error::{Error, Result};

/// Relative size below which a solution coefficient is treated as round-off.
const CLEANUP_TOLERANCE: f64 = 1e-13;

/// Symbolic solver for square systems with rational coefficients in `s`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BareissSolver {
    /// Relative tolerance for cancellation and common-factor detection.
    pub tolerance: f64,
}

impl Default for BareissSolver {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl BareissSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Solve for every unknown, in the system's unknown order.
    pub fn solve_system(&self, system: &EquationSystem) -> Result<Solution> {
        let names: Vec<String> = system.unknowns().iter().map(|u| u.name()).collect();
        let n = names.len();
        if system.len() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                actual: system.len(),
            });
        }
        if n == 0 {
            return Ok(IndexMap::new());
        }

        let augmented = polynomial_rows(system)?;
        let upper = self.eliminate(augmented, &names)?;
        let numerators = self.back_substitute(&upper);
        let det = upper[n - 1][n - 1].clone();

        log::debug!(
            "bareiss: {} unknowns, determinant degree {:?}",
            n,
            det.degree()
        );

        let mut solution = IndexMap::with_capacity(n);
        for (name, numerator) in names.into_iter().zip(numerators) {
            let value = RationalFunction::new(numerator, det.clone())
                .ok_or_else(|| Error::SingularSystem {
                    unknown: name.clone(),
                })?
                .reduced(self.tolerance)
                .cleaned(CLEANUP_TOLERANCE);
            if !value.is_finite() {
                return Err(Error::NonFinite { unknown: name });
            }
            solution.insert(name, value);
        }
        Ok(solution)
    }

    /// Reduce the augmented matrix to upper triangular form in place.
    fn eliminate(
        &self,
        mut m: Vec<Vec<Polynomial>>,
        names: &[String],
    ) -> Result<Vec<Vec<Polynomial>>> {
        let n = m.len();
        let mut prev = Polynomial::one();

        for k in 0..n {
            let pivot = (k..n)
                .filter(|&i| !m[i][k].is_zero())
                .min_by(|&a, &b| {
                    let (pa, pb) = (&m[a][k], &m[b][k]);
                    pa.degree()
                        .cmp(&pb.degree())
                        .then(pb.max_abs().total_cmp(&pa.max_abs()))
                });
            let Some(p) = pivot else {
                return Err(Error::SingularSystem {
                    unknown: names[k].clone(),
                });
            };
            m.swap(k, p);

            for i in k + 1..n {
                for j in k + 1..=n {
                    let a = &m[k][k] * &m[i][j];
                    let b = &m[i][k] * &m[k][j];
                    m[i][j] = exact_div(&a.sub_cancelling(&b, self.tolerance), &prev);
                }
                m[i][k] = Polynomial::zero();
            }
            prev = m[k][k].clone();
        }
        Ok(m)
    }

    /// Cramer numerators from the triangular system.
    fn back_substitute(&self, upper: &[Vec<Polynomial>]) -> Vec<Polynomial> {
        let n = upper.len();
        let det = &upper[n - 1][n - 1];
        let mut numerators = vec![Polynomial::zero(); n];
        for i in (0..n).rev() {
            let mut acc = det * &upper[i][n];
            for j in i + 1..n {
                if upper[i][j].is_zero() || numerators[j].is_zero() {
                    continue;
                }
                acc = acc.sub_cancelling(&(&upper[i][j] * &numerators[j]), self.tolerance);
            }
            numerators[i] = exact_div(&acc, &upper[i][i]);
        }
        numerators
    }
}

impl SymbolicSolver for BareissSolver {
    fn solve(&self, system: &EquationSystem) -> kirchhoff_core::Result<Solution> {
        Ok(self.solve_system(system)?)
    }
}

/// Quotient of a division known to be exact up to round-off.
fn exact_div(a: &Polynomial, d: &Polynomial) -> Polynomial {
    if d.as_constant() == Some(1.0) {
        return a.clone();
    }
    match a.div_rem(d) {
        Some((q, _)) => q,
        None => a.clone(),
    }
}

/// Augmented polynomial matrix `[M | r]` with `M x = r`.
fn polynomial_rows(system: &EquationSystem) -> Result<Vec<Vec<Polynomial>>> {
    let n = system.unknowns().len();
    let mut rows = Vec::with_capacity(n);

    for eq in system.equations() {
        let coefficients = eq.terms.iter().map(|t| &t.coefficient);
        let mut denominators: Vec<&Polynomial> = Vec::new();
        for c in coefficients.chain(iter::once(&eq.constant)) {
            let d = c.denominator();
            if d.degree().unwrap_or(0) > 0 && !denominators.contains(&d) {
                denominators.push(d);
            }
        }
        let cofactor = |d: &Polynomial| -> Polynomial {
            denominators
                .iter()
                .filter(|x| **x != d)
                .fold(Polynomial::one(), |acc, x| &acc * *x)
        };

        let mut row = vec![Polynomial::zero(); n + 1];
        for term in &eq.terms {
            if term.unknown >= n {
                return Err(Error::DimensionMismatch {
                    expected: n,
                    actual: term.unknown + 1,
                });
            }
            let c = &term.coefficient;
            let scaled = c.numerator() * &cofactor(c.denominator());
            row[term.unknown] = &row[term.unknown] + &scaled;
        }
        row[n] = -(eq.constant.numerator() * &cofactor(eq.constant.denominator()));
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kirchhoff_core::{
        Branch, Circuit, CircuitGraph, Equation, EquationKind, FundamentalMatrices,
        ReferenceNode, Term, Unknown, build_equations, select_tree,
    };

    fn assemble(circuit: &Circuit) -> EquationSystem {
        let graph = CircuitGraph::build(circuit).unwrap();
        let tree = select_tree(&graph, circuit).unwrap();
        let ordered = tree.ordered_branches(circuit);
        let reference = circuit.reference_index(&ReferenceNode::Auto).unwrap();
        let (t, l) = (tree.num_twigs(), tree.num_links());
        let m = FundamentalMatrices::build(circuit, &ordered, reference, t, l).unwrap();
        build_equations(&ordered, &m.cut_set, &m.tie_set, t, l).unwrap()
    }

    #[test]
    fn test_series_rc_step_response() {
        let circuit = Circuit::new(
            ["0", "1", "2"],
            vec![
                Branch::voltage_source("V1", "1", "0", 10.0),
                Branch::resistor("R1", "1", "2", 5.0),
                Branch::capacitor("C1", "2", "0", 0.1),
            ],
        )
        .unwrap();
        let solution = BareissSolver::new().solve_system(&assemble(&circuit)).unwrap();
        assert_eq!(solution.len(), 6);

        // I = 2/(s + 2), V_C = 20/(s (s + 2)), V_V1 = 10/s
        let i_r = &solution["I_R1"];
        assert!((i_r.eval(1.0) - 2.0 / 3.0).abs() < 1e-9);
        assert!((i_r.eval(3.0) - 0.4).abs() < 1e-9);
        assert_eq!(i_r.denominator().degree(), Some(1));

        let v_c = &solution["V_C1"];
        assert!((v_c.eval(1.0) - 20.0 / 3.0).abs() < 1e-9);
        assert!((solution["V_V1"].eval(2.0) - 5.0).abs() < 1e-9);

        // Source current flows against its orientation.
        assert!((solution["I_V1"].eval(1.0) + 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_resistive_divider() {
        let circuit = Circuit::new(
            ["0", "in", "mid"],
            vec![
                Branch::voltage_source("V1", "in", "0", 12.0),
                Branch::resistor("R1", "in", "mid", 1e3),
                Branch::resistor("R2", "mid", "0", 2e3),
            ],
        )
        .unwrap();
        let solution = BareissSolver::new().solve_system(&assemble(&circuit)).unwrap();
        // 8/s
        let v = &solution["V_R2"];
        assert!((v.eval(1.0) - 8.0).abs() < 1e-9);
        assert!((v.eval(4.0) - 2.0).abs() < 1e-9);
        assert!((solution["I_R1"].eval(1.0) - 4e-3).abs() < 1e-12);
    }

    #[test]
    fn test_current_source_into_resistor() {
        let circuit = Circuit::new(
            ["0", "1"],
            vec![
                Branch::current_source("I1", "0", "1", 2.0),
                Branch::resistor("R1", "1", "0", 5.0),
            ],
        )
        .unwrap();
        let solution = BareissSolver::new().solve_system(&assemble(&circuit)).unwrap();
        assert!((solution["V_R1"].eval(1.0) - 10.0).abs() < 1e-9);
        assert!((solution["I_R1"].eval(2.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_series_rlc_second_order() {
        // 1 V step into R = 2, L = 1, C = 1: I = 1/(s^2 + 2s + 1)
        let circuit = Circuit::new(
            ["0", "1", "2", "3"],
            vec![
                Branch::voltage_source("V1", "1", "0", 1.0),
                Branch::resistor("R1", "1", "2", 2.0),
                Branch::inductor("L1", "2", "3", 1.0),
                Branch::capacitor("C1", "3", "0", 1.0),
            ],
        )
        .unwrap();
        let solution = BareissSolver::new().solve_system(&assemble(&circuit)).unwrap();
        let i = &solution["I_L1"];
        assert!((i.eval(1.0) - 0.25).abs() < 1e-9);
        assert!((i.eval(0.5) - 1.0 / 2.25).abs() < 1e-9);
        assert!(i.is_proper());
    }

    #[test]
    fn test_singular_system_reported() {
        let unknowns = vec![Unknown::voltage("R1"), Unknown::current("R1")];
        let row = Equation {
            kind: EquationKind::Kvl {
                link: "R1".to_string(),
            },
            terms: vec![
                Term {
                    unknown: 0,
                    coefficient: RationalFunction::one(),
                },
                Term {
                    unknown: 1,
                    coefficient: RationalFunction::constant(2.0),
                },
            ],
            constant: RationalFunction::zero(),
        };
        let system = EquationSystem::new(unknowns, vec![row.clone(), row]).unwrap();
        let result = BareissSolver::new().solve_system(&system);
        assert!(matches!(result, Err(Error::SingularSystem { .. })));

        let core_err: kirchhoff_core::Error = result.unwrap_err().into();
        assert!(matches!(core_err, kirchhoff_core::Error::Solver(_)));
    }

    #[test]
    fn test_solution_order_follows_unknowns() {
        let circuit = Circuit::new(
            ["0", "1"],
            vec![
                Branch::voltage_source("V1", "1", "0", 1.0),
                Branch::resistor("R1", "1", "0", 1.0),
            ],
        )
        .unwrap();
        let system = assemble(&circuit);
        let solution = BareissSolver::new().solve_system(&system).unwrap();
        let keys: Vec<&String> = solution.keys().collect();
        let names: Vec<String> = system.unknowns().iter().map(|u| u.name()).collect();
        assert_eq!(keys, names.iter().collect::<Vec<_>>());
    }
}
