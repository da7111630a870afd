//! Inverse Laplace transform of rational functions by partial fractions.
//!
//! Poles come from the eigenvalues of the (scaled) companion matrix of the
//! denominator. Nearby eigenvalues are merged into one repeated pole, and the
//! coefficients of `t^j exp(p t)` follow from a Taylor expansion of the
//! remaining factor around each pole.

use nalgebra::DMatrix;
use nalgebra::linalg::Schur;
use num_complex::Complex64;
use num_traits::Zero;

use kirchhoff_core::polynomial::DEFAULT_TOLERANCE;
use kirchhoff_core::units::format_coefficient;
use kirchhoff_core::{
    ConversionError, Polynomial, RationalFunction, TimeDomainConverter, TimeResponse,
};

const MAX_SCHUR_ITERATIONS: usize = 10_000;

/// Coefficients below this fraction of the largest one are not printed.
const DISPLAY_CUTOFF: f64 = 1e-9;

/// One (possibly repeated) pole of a transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Pole {
    pub location: Complex64,
    pub multiplicity: usize,
    /// `coefficients[j]` multiplies `t^j * exp(location * t)`.
    pub coefficients: Vec<Complex64>,
}

/// A time-domain signal as a sum of `t^j exp(p t)` terms.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExponentialSum {
    /// Poles sorted by decreasing real part, then by increasing frequency.
    pub poles: Vec<Pole>,
}

impl ExponentialSum {
    pub fn eval(&self, t: f64) -> f64 {
        self.poles
            .iter()
            .map(|pole| {
                let envelope = (pole.location * t).exp();
                let poly = pole
                    .coefficients
                    .iter()
                    .rev()
                    .fold(Complex64::zero(), |acc, c| acc * t + *c);
                (poly * envelope).re
            })
            .sum()
    }

    /// Closed form in `t`, e.g. `10 - 10*exp(-2*t)`.
    ///
    /// Conjugate pole pairs print once as
    /// `exp(a*t)*(c*cos(b*t) + d*sin(b*t))`.
    pub fn to_expression(&self) -> String {
        let scale = self
            .poles
            .iter()
            .flat_map(|p| p.coefficients.iter())
            .fold(0.0_f64, |m, c| m.max(c.norm()));
        let negligible = |c: f64| c.abs() <= DISPLAY_CUTOFF * scale;

        let mut out = String::new();
        for pole in &self.poles {
            if pole.location.im < 0.0 {
                continue;
            }
            let envelope = exp_factor(pole.location.re);
            for (j, c) in pole.coefficients.iter().enumerate() {
                let power = match j {
                    0 => String::new(),
                    1 => "t".to_string(),
                    _ => format!("t^{j}"),
                };
                let factors = [power.as_str(), envelope.as_str()];

                if pole.location.im == 0.0 {
                    if negligible(c.re) {
                        continue;
                    }
                    push_signed(&mut out, c.re < 0.0, &product(c.re.abs(), &factors));
                    continue;
                }

                let freq = frequency(pole.location.im);
                let cos = format!("cos({freq})");
                let sin = format!("sin({freq})");
                let (a, b) = (2.0 * c.re, -2.0 * c.im);
                match (negligible(a), negligible(b)) {
                    (true, true) => {}
                    (false, true) => {
                        let body = product(a.abs(), &[factors[0], factors[1], cos.as_str()]);
                        push_signed(&mut out, a < 0.0, &body);
                    }
                    (true, false) => {
                        let body = product(b.abs(), &[factors[0], factors[1], sin.as_str()]);
                        push_signed(&mut out, b < 0.0, &body);
                    }
                    (false, false) => {
                        let mut inner = String::new();
                        push_signed(&mut inner, a < 0.0, &product(a.abs(), &[cos.as_str()]));
                        push_signed(&mut inner, b < 0.0, &product(b.abs(), &[sin.as_str()]));
                        let grouped = format!("({inner})");
                        let body = product(1.0, &[factors[0], factors[1], grouped.as_str()]);
                        push_signed(&mut out, false, &body);
                    }
                }
            }
        }

        if out.is_empty() { "0".to_string() } else { out }
    }
}

fn exp_factor(rate: f64) -> String {
    if rate == 0.0 {
        return String::new();
    }
    format!("exp({})", frequency(rate))
}

/// `k*t` with a unit coefficient folded away: `t`, `-t`, `2*t`.
fn frequency(k: f64) -> String {
    let magnitude = format_coefficient(k.abs());
    let sign = if k < 0.0 { "-" } else { "" };
    if magnitude == "1" {
        format!("{sign}t")
    } else {
        format!("{sign}{magnitude}*t")
    }
}

fn product(magnitude: f64, factors: &[&str]) -> String {
    let coeff = format_coefficient(magnitude);
    let factors: Vec<&str> = factors.iter().copied().filter(|f| !f.is_empty()).collect();
    if factors.is_empty() {
        return coeff;
    }
    if coeff == "1" {
        return factors.join("*");
    }
    format!("{coeff}*{}", factors.join("*"))
}

fn push_signed(out: &mut String, negative: bool, body: &str) {
    match (out.is_empty(), negative) {
        (true, true) => out.push('-'),
        (true, false) => {}
        (false, true) => out.push_str(" - "),
        (false, false) => out.push_str(" + "),
    }
    out.push_str(body);
}

/// Partial-fraction inverse Laplace converter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartialFractionConverter {
    /// Distance (after scaling the denominator's roots to unit size) under
    /// which computed roots are treated as one repeated pole.
    pub cluster_tolerance: f64,
    /// Relative tolerance for cancelling common factors first.
    pub tolerance: f64,
}

impl Default for PartialFractionConverter {
    fn default() -> Self {
        Self {
            cluster_tolerance: 1e-5,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl PartialFractionConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cluster_tolerance(mut self, tolerance: f64) -> Self {
        self.cluster_tolerance = tolerance;
        self
    }

    /// Decompose a strictly proper transform into exponential terms.
    pub fn decompose(
        &self,
        transform: &RationalFunction,
    ) -> Result<ExponentialSum, ConversionError> {
        let f = transform.reduced(self.tolerance);
        if f.is_zero() {
            return Ok(ExponentialSum::default());
        }
        if !f.is_proper() {
            return Err(ConversionError::new(format!(
                "cannot compute inverse Laplace transform of {f}: improper transform has an impulse component"
            )));
        }

        let roots = self.poles(f.denominator()).ok_or_else(|| {
            ConversionError::new(format!(
                "cannot compute inverse Laplace transform of {f}: root finding did not converge"
            ))
        })?;

        let numerator: Vec<Complex64> = f
            .numerator()
            .coeffs()
            .iter()
            .map(|&c| Complex64::new(c, 0.0))
            .collect();

        let mut poles = Vec::with_capacity(roots.len());
        for (idx, &(p, m)) in roots.iter().enumerate() {
            // Denominator is monic: D(s) = (s - p)^m * G(s).
            let mut g = vec![Complex64::new(1.0, 0.0)];
            for (other, &(q, mq)) in roots.iter().enumerate() {
                if other != idx {
                    for _ in 0..mq {
                        g = mul_linear(&g, q);
                    }
                }
            }
            let n_shift = taylor_shift(&numerator, p, m);
            let g_shift = taylor_shift(&g, p, m);
            if g_shift[0].norm() == 0.0 {
                return Err(ConversionError::new(format!(
                    "cannot compute inverse Laplace transform of {f}: poles could not be separated"
                )));
            }
            let h = series_div(&n_shift, &g_shift, m);
            let coefficients = (0..m).map(|j| h[m - 1 - j] / factorial(j)).collect();
            poles.push(Pole {
                location: p,
                multiplicity: m,
                coefficients,
            });
        }

        poles.sort_by(|a, b| {
            b.location
                .re
                .total_cmp(&a.location.re)
                .then(a.location.im.abs().total_cmp(&b.location.im.abs()))
                .then(b.location.im.total_cmp(&a.location.im))
        });

        Ok(ExponentialSum { poles })
    }

    /// Distinct roots of a monic polynomial with multiplicities.
    fn poles(&self, den: &Polynomial) -> Option<Vec<(Complex64, usize)>> {
        let coeffs = den.coeffs();
        let at_origin = coeffs.iter().take_while(|c| **c == 0.0).count();
        let rest = &coeffs[at_origin..];
        let degree = rest.len().saturating_sub(1);

        let mut clusters = Vec::new();
        if at_origin > 0 {
            clusters.push((Complex64::zero(), at_origin));
        }
        if degree == 0 {
            return Some(clusters);
        }

        // Scale s = sigma * u so the roots in u are of unit size.
        let lead = rest[degree];
        let sigma = (0..degree)
            .map(|k| (rest[k] / lead).abs().powf(1.0 / (degree - k) as f64))
            .fold(0.0_f64, f64::max);
        let sigma = if sigma > 0.0 && sigma.is_finite() { sigma } else { 1.0 };

        let scaled: Vec<f64> = (0..degree)
            .map(|k| rest[k] / lead / sigma.powi((degree - k) as i32))
            .collect();
        let companion = DMatrix::from_fn(degree, degree, |i, j| {
            if i + 1 == j {
                1.0
            } else if i == degree - 1 {
                -scaled[j]
            } else {
                0.0
            }
        });

        let schur = Schur::try_new(companion, f64::EPSILON, MAX_SCHUR_ITERATIONS)?;
        let roots: Vec<Complex64> = schur.complex_eigenvalues().iter().copied().collect();
        if roots.iter().any(|r| !r.re.is_finite() || !r.im.is_finite()) {
            return None;
        }

        for (u, m) in cluster(roots, self.cluster_tolerance) {
            let p = u * sigma;
            match clusters.iter_mut().find(|(q, _)| *q == p) {
                Some((_, count)) => *count += m,
                None => clusters.push((p, m)),
            }
        }
        Some(clusters)
    }
}

impl TimeDomainConverter for PartialFractionConverter {
    fn convert(
        &self,
        transform: &RationalFunction,
        times: &[f64],
    ) -> Result<TimeResponse, ConversionError> {
        let signal = self.decompose(transform)?;
        let expression = signal.to_expression();

        let mut values = Vec::with_capacity(times.len());
        let mut samples = Ok(());
        for &t in times {
            let v = signal.eval(t);
            if !v.is_finite() {
                samples = Err(ConversionError::new(format!(
                    "non-finite value of {expression} at t = {t}"
                )));
                break;
            }
            values.push(v);
        }

        Ok(TimeResponse {
            expression,
            samples: samples.map(|()| values),
        })
    }
}

/// Scaled roots (or real parts) this small are eigenvalue round-off.
const ROUND_OFF: f64 = 1e-12;

/// Merge roots closer than `tol` into one pole, snapping nearly real
/// clusters onto the real axis.
fn cluster(roots: Vec<Complex64>, tol: f64) -> Vec<(Complex64, usize)> {
    let mut groups: Vec<(Complex64, usize)> = Vec::new();
    for r in roots {
        let existing = groups
            .iter_mut()
            .find(|(sum, count)| (r - *sum / *count as f64).norm() <= tol);
        match existing {
            Some((sum, count)) => {
                *sum += r;
                *count += 1;
            }
            None => groups.push((r, 1)),
        }
    }
    groups
        .into_iter()
        .map(|(sum, count)| {
            let mut center = sum / count as f64;
            if center.im.abs() <= tol {
                center.im = 0.0;
            }
            if center.norm() <= ROUND_OFF {
                center = Complex64::zero();
            } else if center.re.abs() <= ROUND_OFF * center.norm() {
                center.re = 0.0;
            }
            (center, count)
        })
        .collect()
}

/// Multiply ascending coefficients by `(s - root)`.
fn mul_linear(p: &[Complex64], root: Complex64) -> Vec<Complex64> {
    let mut out = vec![Complex64::zero(); p.len() + 1];
    for (k, &c) in p.iter().enumerate() {
        out[k + 1] += c;
        out[k] -= c * root;
    }
    out
}

/// First `m` coefficients of `P(at + u)` in powers of `u`.
fn taylor_shift(p: &[Complex64], at: Complex64, m: usize) -> Vec<Complex64> {
    let mut coeffs = p.to_vec();
    let mut out = Vec::with_capacity(m);
    for _ in 0..m {
        if coeffs.is_empty() {
            out.push(Complex64::zero());
            continue;
        }
        let mut quotient = vec![Complex64::zero(); coeffs.len() - 1];
        let mut acc = Complex64::zero();
        for k in (0..coeffs.len()).rev() {
            acc = acc * at + coeffs[k];
            if k > 0 {
                quotient[k - 1] = acc;
            }
        }
        out.push(acc);
        coeffs = quotient;
    }
    out
}

/// First `m` coefficients of the power series `n / g`, with `g[0] != 0`.
fn series_div(n: &[Complex64], g: &[Complex64], m: usize) -> Vec<Complex64> {
    let mut h: Vec<Complex64> = Vec::with_capacity(m);
    for k in 0..m {
        let mut acc = n.get(k).copied().unwrap_or_else(Complex64::zero);
        for j in 1..=k {
            acc -= g.get(j).copied().unwrap_or_else(Complex64::zero) * h[k - j];
        }
        h.push(acc / g[0]);
    }
    h
}

fn factorial(j: usize) -> f64 {
    (1..=j).map(|k| k as f64).product()
}
