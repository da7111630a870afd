//! Fundamental circuit matrices.
//!
//! - Incidence matrix `A` (nodes x branches), reduced by dropping the
//!   reference row.
//! - Cut-set matrix `Q = [I | Q_l]` with `Q_l = A_t^-1 A_l`, so that
//!   `Q = A_t^-1 A_red` and `Q i = 0` for every current vector obeying KCL.
//! - Tie-set matrix `B = [-Q_l^T | I]` (KVL).
//!
//! All matrices use the working branch order: twigs followed by links.

use nalgebra::DMatrix;

use crate::circuit::{Branch, Circuit};
use crate::error::{MatrixError, Result};

/// The tree submatrix of a valid tree is unimodular, so its determinant is
/// +1 or -1. Anything below this magnitude is treated as singular.
const UNIMODULAR_THRESHOLD: f64 = 0.5;

/// Node-branch incidence matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidenceMatrix {
    /// Full `nodes x branches` matrix.
    pub full: DMatrix<f64>,
    /// Full matrix without the reference node row.
    pub reduced: DMatrix<f64>,
    /// Index of the removed reference node in the circuit's node order.
    pub reference: usize,
}

impl IncidenceMatrix {
    /// Build the incidence matrix for branches in working order.
    ///
    /// Entry `(n, b)` is +1 when branch `b` leaves node `n`, -1 when it
    /// enters, 0 otherwise.
    pub fn build(circuit: &Circuit, ordered: &[&Branch], reference: usize) -> Result<Self> {
        let n_nodes = circuit.num_nodes();
        if reference >= n_nodes {
            return Err(MatrixError::DimensionMismatch {
                expected: n_nodes,
                actual: reference,
            }
            .into());
        }

        let mut full = DMatrix::zeros(n_nodes, ordered.len());
        for (col, branch) in ordered.iter().enumerate() {
            let from = circuit.nodes().get_index_of(branch.from());
            let to = circuit.nodes().get_index_of(branch.to());
            let (Some(from), Some(to)) = (from, to) else {
                return Err(MatrixError::DimensionMismatch {
                    expected: n_nodes,
                    actual: n_nodes + 1,
                }
                .into());
            };
            full[(from, col)] = 1.0;
            full[(to, col)] = -1.0;
        }

        let reduced = full.clone().remove_row(reference);

        Ok(Self {
            full,
            reduced,
            reference,
        })
    }
}

/// Cut-set matrix `Q = [I | Q_l]` from the reduced incidence matrix.
///
/// Fails with [`MatrixError::SingularTreeSubmatrix`] when the twig columns do
/// not form an invertible square block; no partial matrix is returned.
pub fn build_cut_set(
    a_reduced: &DMatrix<f64>,
    n_twigs: usize,
    n_links: usize,
) -> Result<DMatrix<f64>> {
    if a_reduced.nrows() != n_twigs {
        return Err(MatrixError::DimensionMismatch {
            expected: n_twigs,
            actual: a_reduced.nrows(),
        }
        .into());
    }
    if a_reduced.ncols() != n_twigs + n_links {
        return Err(MatrixError::DimensionMismatch {
            expected: n_twigs + n_links,
            actual: a_reduced.ncols(),
        }
        .into());
    }

    let a_t = a_reduced.columns(0, n_twigs).clone_owned();
    let a_l = a_reduced.columns(n_twigs, n_links).clone_owned();

    let q_l = if n_twigs == 0 {
        DMatrix::zeros(0, n_links)
    } else {
        let det = a_t.determinant();
        if det.abs() < UNIMODULAR_THRESHOLD {
            return Err(MatrixError::SingularTreeSubmatrix {
                size: n_twigs,
                detail: format!("determinant {det}"),
            }
            .into());
        }
        let a_t_inv = a_t
            .lu()
            .try_inverse()
            .ok_or_else(|| MatrixError::SingularTreeSubmatrix {
                size: n_twigs,
                detail: "LU decomposition has a zero pivot".to_string(),
            })?;
        // Entries of A_t^-1 A_l are integers; rounding strips LU noise.
        (a_t_inv * a_l).map(|x| x.round())
    };

    Ok(DMatrix::from_fn(n_twigs, n_twigs + n_links, |i, j| {
        if j < n_twigs {
            if i == j { 1.0 } else { 0.0 }
        } else {
            q_l[(i, j - n_twigs)]
        }
    }))
}

/// Tie-set matrix `B = [-Q_l^T | I]` from the link block of `Q`.
pub fn build_tie_set(q_l: &DMatrix<f64>, n_twigs: usize, n_links: usize) -> DMatrix<f64> {
    let b_t = -q_l.transpose();
    DMatrix::from_fn(n_links, n_twigs + n_links, |i, j| {
        if j < n_twigs {
            b_t[(i, j)]
        } else if i == j - n_twigs {
            1.0
        } else {
            0.0
        }
    })
}

/// Incidence, cut-set and tie-set matrices for one tree partition.
#[derive(Debug, Clone, PartialEq)]
pub struct FundamentalMatrices {
    pub incidence: IncidenceMatrix,
    /// Cut-set matrix `Q`, `n_twigs x n_branches`.
    pub cut_set: DMatrix<f64>,
    /// Tie-set matrix `B`, `n_links x n_branches`.
    pub tie_set: DMatrix<f64>,
    pub n_twigs: usize,
    pub n_links: usize,
}

impl FundamentalMatrices {
    /// Derive all three matrices from branches in working order.
    pub fn build(
        circuit: &Circuit,
        ordered: &[&Branch],
        reference: usize,
        n_twigs: usize,
        n_links: usize,
    ) -> Result<Self> {
        let incidence = IncidenceMatrix::build(circuit, ordered, reference)?;
        let cut_set = build_cut_set(&incidence.reduced, n_twigs, n_links)?;
        let q_l = cut_set.columns(n_twigs, n_links).clone_owned();
        let tie_set = build_tie_set(&q_l, n_twigs, n_links);

        log::debug!(
            "fundamental matrices: Q {}x{}, B {}x{}",
            cut_set.nrows(),
            cut_set.ncols(),
            tie_set.nrows(),
            tie_set.ncols()
        );

        Ok(Self {
            incidence,
            cut_set,
            tie_set,
            n_twigs,
            n_links,
        })
    }

    /// Link block `Q_l` of the cut-set matrix.
    pub fn q_links(&self) -> DMatrix<f64> {
        self.cut_set.columns(self.n_twigs, self.n_links).clone_owned()
    }
}
