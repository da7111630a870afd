//! Real-coefficient polynomials in the transform variable `s`.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use num_complex::Complex64;
use num_traits::{One, Zero};

use crate::units::format_coefficient;

/// Relative tolerance used when deciding that a remainder vanished.
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// Polynomial with coefficients stored in ascending powers of `s`.
///
/// Trailing zero coefficients are never stored, so the zero polynomial has
/// an empty coefficient list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polynomial {
    coeffs: Vec<f64>,
}

impl Polynomial {
    /// Build from ascending coefficients: `[c0, c1, c2]` is `c0 + c1 s + c2 s^2`.
    pub fn new(coeffs: Vec<f64>) -> Self {
        let mut p = Self { coeffs };
        p.trim();
        p
    }

    pub fn zero() -> Self {
        Self { coeffs: Vec::new() }
    }

    pub fn one() -> Self {
        Self::constant(1.0)
    }

    pub fn constant(c: f64) -> Self {
        Self::new(vec![c])
    }

    /// `c * s^k`.
    pub fn monomial(c: f64, k: usize) -> Self {
        let mut coeffs = vec![0.0; k + 1];
        coeffs[k] = c;
        Self::new(coeffs)
    }

    /// The transform variable itself.
    pub fn s() -> Self {
        Self::monomial(1.0, 1)
    }

    /// `(s - root)`.
    pub fn linear_factor(root: f64) -> Self {
        Self::new(vec![-root, 1.0])
    }

    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Degree, `None` for the zero polynomial.
    pub fn degree(&self) -> Option<usize> {
        self.coeffs.len().checked_sub(1)
    }

    /// Highest-order coefficient (0 for the zero polynomial).
    pub fn leading(&self) -> f64 {
        self.coeffs.last().copied().unwrap_or(0.0)
    }

    /// Some(c) when the polynomial is the constant `c`.
    pub fn as_constant(&self) -> Option<f64> {
        match self.coeffs.len() {
            0 => Some(0.0),
            1 => Some(self.coeffs[0]),
            _ => None,
        }
    }

    /// Number of non-zero coefficients.
    pub fn num_terms(&self) -> usize {
        self.coeffs.iter().filter(|c| **c != 0.0).count()
    }

    /// Largest coefficient magnitude.
    pub fn max_abs(&self) -> f64 {
        self.coeffs.iter().fold(0.0, |m, c| m.max(c.abs()))
    }

    /// Horner evaluation at a real point.
    pub fn eval(&self, s: f64) -> f64 {
        self.coeffs.iter().rev().fold(0.0, |acc, &c| acc * s + c)
    }

    /// Horner evaluation at a complex point.
    pub fn eval_complex(&self, s: Complex64) -> Complex64 {
        self.coeffs
            .iter()
            .rev()
            .fold(Complex64::new(0.0, 0.0), |acc, &c| acc * s + c)
    }

    pub fn scale(&self, k: f64) -> Self {
        Self::new(self.coeffs.iter().map(|c| c * k).collect())
    }

    /// Scaled so that the leading coefficient is 1. Zero stays zero.
    pub fn monic(&self) -> Self {
        let lead = self.leading();
        if lead == 0.0 {
            return Self::zero();
        }
        self.scale(1.0 / lead)
    }

    /// Polynomial long division, `None` when dividing by zero.
    pub fn div_rem(&self, divisor: &Self) -> Option<(Self, Self)> {
        let dd = divisor.degree()?;
        let Some(nd) = self.degree() else {
            return Some((Self::zero(), Self::zero()));
        };
        if nd < dd {
            return Some((Self::zero(), self.clone()));
        }

        let lead = divisor.leading();
        let mut rem = self.coeffs.clone();
        let mut quot = vec![0.0; nd - dd + 1];
        for k in (0..=nd - dd).rev() {
            let c = rem[k + dd] / lead;
            quot[k] = c;
            for (j, &d) in divisor.coeffs.iter().enumerate() {
                rem[k + j] -= c * d;
            }
            rem[k + dd] = 0.0;
        }
        rem.truncate(dd);

        Some((Self::new(quot), Self::new(rem)))
    }

    /// Drop coefficients whose magnitude is at most `tol * scale`.
    pub fn chop(&self, tol: f64, scale: f64) -> Self {
        let threshold = tol * scale;
        Self::new(
            self.coeffs
                .iter()
                .map(|&c| if c.abs() <= threshold { 0.0 } else { c })
                .collect(),
        )
    }

    /// `self - other`, zeroing coefficients that cancel to round-off.
    ///
    /// A coefficient is considered cancelled when the difference is at most
    /// `tol` times the larger of the two operands at that power.
    pub fn sub_cancelling(&self, other: &Self, tol: f64) -> Self {
        let n = self.coeffs.len().max(other.coeffs.len());
        let coeffs = (0..n)
            .map(|k| {
                let a = self.coeffs.get(k).copied().unwrap_or(0.0);
                let b = other.coeffs.get(k).copied().unwrap_or(0.0);
                let diff = a - b;
                if diff.abs() <= tol * a.abs().max(b.abs()) {
                    0.0
                } else {
                    diff
                }
            })
            .collect();
        Self::new(coeffs)
    }

    /// Monic greatest common divisor by the Euclidean algorithm.
    ///
    /// Remainders are chopped relative to the operands, so nearly common
    /// roots are treated as common.
    pub fn gcd(&self, other: &Self, tol: f64) -> Self {
        let mut a = self.monic();
        let mut b = other.monic();
        if a.is_zero() {
            return b;
        }
        if b.is_zero() {
            return a;
        }
        if a.degree() < b.degree() {
            std::mem::swap(&mut a, &mut b);
        }
        loop {
            let scale = a.max_abs().max(b.max_abs());
            let Some((_, r)) = a.div_rem(&b) else {
                return a;
            };
            let r = r.chop(tol, scale);
            if r.is_zero() {
                return b;
            }
            a = b;
            b = r.monic();
        }
    }

    /// Product of `(s - root)` factors.
    pub fn from_roots(roots: &[f64]) -> Self {
        roots
            .iter()
            .fold(Self::one(), |acc, &r| &acc * &Self::linear_factor(r))
    }

    fn trim(&mut self) {
        while self.coeffs.last().is_some_and(|c| *c == 0.0) {
            self.coeffs.pop();
        }
    }
}

impl Zero for Polynomial {
    fn zero() -> Self {
        Polynomial::zero()
    }

    fn is_zero(&self) -> bool {
        Polynomial::is_zero(self)
    }
}

impl One for Polynomial {
    fn one() -> Self {
        Polynomial::one()
    }
}

impl Add<&Polynomial> for &Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: &Polynomial) -> Polynomial {
        let n = self.coeffs.len().max(rhs.coeffs.len());
        Polynomial::new(
            (0..n)
                .map(|k| {
                    self.coeffs.get(k).copied().unwrap_or(0.0)
                        + rhs.coeffs.get(k).copied().unwrap_or(0.0)
                })
                .collect(),
        )
    }
}

impl Sub<&Polynomial> for &Polynomial {
    type Output = Polynomial;

    fn sub(self, rhs: &Polynomial) -> Polynomial {
        self + &(-rhs)
    }
}

impl Mul<&Polynomial> for &Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: &Polynomial) -> Polynomial {
        if self.is_zero() || rhs.is_zero() {
            return Polynomial::zero();
        }
        let mut coeffs = vec![0.0; self.coeffs.len() + rhs.coeffs.len() - 1];
        for (i, &a) in self.coeffs.iter().enumerate() {
            for (j, &b) in rhs.coeffs.iter().enumerate() {
                coeffs[i + j] += a * b;
            }
        }
        Polynomial::new(coeffs)
    }
}

impl Neg for &Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        self.scale(-1.0)
    }
}

impl Neg for Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        -&self
    }
}

macro_rules! forward_owned_binop {
    ($imp:ident, $method:ident) => {
        impl $imp<Polynomial> for Polynomial {
            type Output = Polynomial;

            fn $method(self, rhs: Polynomial) -> Polynomial {
                (&self).$method(&rhs)
            }
        }
    };
}

forward_owned_binop!(Add, add);
forward_owned_binop!(Sub, sub);
forward_owned_binop!(Mul, mul);

impl fmt::Display for Polynomial {
    /// Descending powers, e.g. `0.5*s^2 - s + 3`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        let mut first = true;
        for (k, &c) in self.coeffs.iter().enumerate().rev() {
            if c == 0.0 {
                continue;
            }
            let magnitude = c.abs();
            let coeff = format_coefficient(magnitude);
            let body = match (k, coeff.as_str()) {
                (0, _) => coeff,
                (1, "1") => "s".to_string(),
                (1, _) => format!("{coeff}*s"),
                (_, "1") => format!("s^{k}"),
                _ => format!("{coeff}*s^{k}"),
            };
            match (first, c < 0.0) {
                (true, true) => write!(f, "-{body}")?,
                (true, false) => write!(f, "{body}")?,
                (false, true) => write!(f, " - {body}")?,
                (false, false) => write!(f, " + {body}")?,
            }
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: &Polynomial, b: &[f64]) -> bool {
        a.coeffs().len() == b.len()
            && a.coeffs().iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn test_trailing_zeros_trimmed() {
        let p = Polynomial::new(vec![1.0, 2.0, 0.0, 0.0]);
        assert_eq!(p.degree(), Some(1));
        assert_eq!(Polynomial::new(vec![0.0]).degree(), None);
        assert!(Polynomial::new(vec![0.0, 0.0]).is_zero());
    }

    #[test]
    fn test_arithmetic() {
        let a = Polynomial::new(vec![1.0, 1.0]); // s + 1
        let b = Polynomial::new(vec![-1.0, 1.0]); // s - 1
        assert!(approx(&(&a * &b), &[-1.0, 0.0, 1.0]));
        assert!(approx(&(&a + &b), &[0.0, 2.0]));
        assert!(approx(&(&a - &b), &[2.0]));
        assert!((&a - &a).is_zero());
        assert!(approx(&(a.clone() * Polynomial::zero()), &[]));
    }

    #[test]
    fn test_eval() {
        let p = Polynomial::new(vec![3.0, -1.0, 0.5]);
        assert!((p.eval(2.0) - 3.0).abs() < 1e-12);
        let z = p.eval_complex(Complex64::new(0.0, 1.0));
        assert!((z - Complex64::new(2.5, -1.0)).norm() < 1e-12);
    }

    #[test]
    fn test_div_rem() {
        // (s^2 + 3s + 2) / (s + 1) = s + 2
        let num = Polynomial::new(vec![2.0, 3.0, 1.0]);
        let den = Polynomial::new(vec![1.0, 1.0]);
        let (q, r) = num.div_rem(&den).unwrap();
        assert!(approx(&q, &[2.0, 1.0]));
        assert!(r.is_zero());

        // (s^2 + 1) / (2s) = 0.5 s, remainder 1
        let (q, r) = Polynomial::new(vec![1.0, 0.0, 1.0])
            .div_rem(&Polynomial::monomial(2.0, 1))
            .unwrap();
        assert!(approx(&q, &[0.0, 0.5]));
        assert!(approx(&r, &[1.0]));

        assert!(num.div_rem(&Polynomial::zero()).is_none());
    }

    #[test]
    fn test_gcd_finds_common_factor() {
        // (s + 2)(s + 3) and (s + 2)(s - 5)
        let a = Polynomial::from_roots(&[-2.0, -3.0]);
        let b = Polynomial::from_roots(&[-2.0, 5.0]);
        let g = a.gcd(&b, DEFAULT_TOLERANCE);
        assert!(approx(&g, &[2.0, 1.0]), "gcd = {g}");
    }

    #[test]
    fn test_gcd_of_coprime_is_constant() {
        let a = Polynomial::from_roots(&[-1.0]);
        let b = Polynomial::from_roots(&[-4.0, -7.0]);
        assert_eq!(a.gcd(&b, DEFAULT_TOLERANCE).degree(), Some(0));
    }

    #[test]
    fn test_sub_cancelling() {
        let a = Polynomial::new(vec![0.1 + 0.2, 5.0]);
        let b = Polynomial::new(vec![0.3, 1.0]);
        assert!(approx(&a.sub_cancelling(&b, 1e-12), &[0.0, 4.0]));
    }

    #[test]
    fn test_display() {
        assert_eq!(Polynomial::new(vec![3.0, -1.0, 0.5]).to_string(), "0.5*s^2 - s + 3");
        assert_eq!(Polynomial::s().to_string(), "s");
        assert_eq!(Polynomial::monomial(-2.0, 3).to_string(), "-2*s^3");
        assert_eq!(Polynomial::zero().to_string(), "0");
        assert_eq!(Polynomial::constant(-10.0).to_string(), "-10");
    }
}
