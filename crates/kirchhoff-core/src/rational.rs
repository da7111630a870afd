//! Rational functions of `s`: the coefficients and solutions of the
//! Laplace-domain system.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use num_complex::Complex64;

use crate::polynomial::Polynomial;

/// Ratio of two polynomials with a monic denominator.
///
/// Zero is always stored as `0 / 1`. No common factors are cancelled unless
/// [`RationalFunction::reduced`] is called.
#[derive(Debug, Clone, PartialEq)]
pub struct RationalFunction {
    num: Polynomial,
    den: Polynomial,
}

impl RationalFunction {
    /// `None` when the denominator is the zero polynomial.
    pub fn new(num: Polynomial, den: Polynomial) -> Option<Self> {
        if den.is_zero() {
            return None;
        }
        Some(Self::normalized(num, den))
    }

    fn normalized(num: Polynomial, den: Polynomial) -> Self {
        if num.is_zero() {
            return Self::zero();
        }
        let lead = den.leading();
        Self {
            num: num.scale(1.0 / lead),
            den: den.monic(),
        }
    }

    pub fn zero() -> Self {
        Self {
            num: Polynomial::zero(),
            den: Polynomial::one(),
        }
    }

    pub fn one() -> Self {
        Self::constant(1.0)
    }

    pub fn constant(c: f64) -> Self {
        Self::from_polynomial(Polynomial::constant(c))
    }

    pub fn from_polynomial(p: Polynomial) -> Self {
        Self {
            num: p,
            den: Polynomial::one(),
        }
    }

    /// `c / s`, the transform of a step of height `c`.
    pub fn step(c: f64) -> Self {
        Self::normalized(Polynomial::constant(c), Polynomial::s())
    }

    pub fn numerator(&self) -> &Polynomial {
        &self.num
    }

    pub fn denominator(&self) -> &Polynomial {
        &self.den
    }

    pub fn is_zero(&self) -> bool {
        self.num.is_zero()
    }

    /// Some(c) when the function is the constant `c`.
    pub fn as_constant(&self) -> Option<f64> {
        match (self.num.as_constant(), self.den.as_constant()) {
            (Some(n), Some(d)) => Some(n / d),
            _ => None,
        }
    }

    /// Numerator degree strictly below denominator degree (zero counts).
    pub fn is_proper(&self) -> bool {
        match (self.num.degree(), self.den.degree()) {
            (None, _) => true,
            (Some(n), Some(d)) => n < d,
            (Some(_), None) => false,
        }
    }

    pub fn eval(&self, s: f64) -> f64 {
        self.num.eval(s) / self.den.eval(s)
    }

    pub fn eval_complex(&self, s: Complex64) -> Complex64 {
        self.num.eval_complex(s) / self.den.eval_complex(s)
    }

    pub fn scale(&self, k: f64) -> Self {
        Self::normalized(self.num.scale(k), self.den.clone())
    }

    /// Multiplicative inverse, `None` for zero.
    pub fn recip(&self) -> Option<Self> {
        Self::new(self.den.clone(), self.num.clone())
    }

    /// `self / other`, `None` when `other` is zero.
    pub fn checked_div(&self, other: &Self) -> Option<Self> {
        Some(self * &other.recip()?)
    }

    /// Cancel the greatest common divisor of numerator and denominator.
    pub fn reduced(&self, tol: f64) -> Self {
        let g = self.num.gcd(&self.den, tol);
        if g.degree().unwrap_or(0) == 0 {
            return self.clone();
        }
        match (self.num.div_rem(&g), self.den.div_rem(&g)) {
            (Some((num, _)), Some((den, _))) => Self::normalized(num, den),
            _ => self.clone(),
        }
    }

    /// Drop numerator coefficients below `tol` times its largest coefficient.
    pub fn cleaned(&self, tol: f64) -> Self {
        Self::normalized(self.num.chop(tol, self.num.max_abs()), self.den.clone())
    }

    /// All coefficients are finite.
    pub fn is_finite(&self) -> bool {
        self.num
            .coeffs()
            .iter()
            .chain(self.den.coeffs())
            .all(|c| c.is_finite())
    }

    /// True when the numerator has a single term with a negative coefficient.
    pub(crate) fn is_negative_monomial(&self) -> bool {
        self.num.num_terms() == 1 && self.num.leading() < 0.0
    }
}

impl From<f64> for RationalFunction {
    fn from(c: f64) -> Self {
        Self::constant(c)
    }
}

impl From<Polynomial> for RationalFunction {
    fn from(p: Polynomial) -> Self {
        Self::from_polynomial(p)
    }
}

impl Add<&RationalFunction> for &RationalFunction {
    type Output = RationalFunction;

    fn add(self, rhs: &RationalFunction) -> RationalFunction {
        if self.den == rhs.den {
            return RationalFunction::normalized(&self.num + &rhs.num, self.den.clone());
        }
        RationalFunction::normalized(
            &(&self.num * &rhs.den) + &(&rhs.num * &self.den),
            &self.den * &rhs.den,
        )
    }
}

impl Sub<&RationalFunction> for &RationalFunction {
    type Output = RationalFunction;

    fn sub(self, rhs: &RationalFunction) -> RationalFunction {
        self + &(-rhs)
    }
}

impl Mul<&RationalFunction> for &RationalFunction {
    type Output = RationalFunction;

    fn mul(self, rhs: &RationalFunction) -> RationalFunction {
        RationalFunction::normalized(&self.num * &rhs.num, &self.den * &rhs.den)
    }
}

impl Neg for &RationalFunction {
    type Output = RationalFunction;

    fn neg(self) -> RationalFunction {
        RationalFunction {
            num: -&self.num,
            den: self.den.clone(),
        }
    }
}

impl Neg for RationalFunction {
    type Output = RationalFunction;

    fn neg(self) -> RationalFunction {
        -&self
    }
}

macro_rules! forward_owned_binop {
    ($imp:ident, $method:ident) => {
        impl $imp<RationalFunction> for RationalFunction {
            type Output = RationalFunction;

            fn $method(self, rhs: RationalFunction) -> RationalFunction {
                (&self).$method(&rhs)
            }
        }
    };
}

forward_owned_binop!(Add, add);
forward_owned_binop!(Sub, sub);
forward_owned_binop!(Mul, mul);

fn needs_parens(p: &Polynomial) -> bool {
    p.num_terms() > 1
}

impl fmt::Display for RationalFunction {
    /// `-10/s`, `(s + 2)/(s^2 + 3*s + 2)`, or a bare polynomial.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den.as_constant().is_some() {
            return write!(f, "{}", self.num);
        }
        if needs_parens(&self.num) {
            write!(f, "({})", self.num)?;
        } else {
            write!(f, "{}", self.num)?;
        }
        if needs_parens(&self.den) {
            write!(f, "/({})", self.den)
        } else {
            write!(f, "/{}", self.den)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polynomial::DEFAULT_TOLERANCE;

    #[test]
    fn test_denominator_normalized_monic() {
        let r = RationalFunction::new(Polynomial::constant(-1.0), Polynomial::monomial(0.1, 1))
            .unwrap();
        assert!((r.numerator().leading() + 10.0).abs() < 1e-12);
        assert_eq!(r.denominator(), &Polynomial::s());
        assert_eq!(r.to_string(), "-10/s");
    }

    #[test]
    fn test_zero_denominator_rejected() {
        assert!(RationalFunction::new(Polynomial::one(), Polynomial::zero()).is_none());
        assert!(RationalFunction::zero().recip().is_none());
    }

    #[test]
    fn test_arithmetic() {
        let a = RationalFunction::step(1.0); // 1/s
        let b = RationalFunction::constant(2.0);
        let sum = &a + &b; // (2s + 1)/s
        assert!((sum.eval(2.0) - 2.5).abs() < 1e-12);

        let prod = &a * &a; // 1/s^2
        assert!((prod.eval(2.0) - 0.25).abs() < 1e-12);

        // Subtraction keeps the common factor: 2s/s until reduced.
        let diff = &sum - &a;
        assert_eq!(diff.as_constant(), None);
        assert!((diff.eval(5.0) - 2.0).abs() < 1e-12);
        assert_eq!(diff.reduced(DEFAULT_TOLERANCE).as_constant(), Some(2.0));

        let quot = b.checked_div(&a).unwrap(); // 2s
        assert!((quot.eval(3.0) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_reduced_cancels_common_factor() {
        // (s + 1) / (s^2 + 3s + 2) = 1 / (s + 2)
        let r = RationalFunction::new(
            Polynomial::from_roots(&[-1.0]),
            Polynomial::from_roots(&[-1.0, -2.0]),
        )
        .unwrap()
        .reduced(DEFAULT_TOLERANCE);
        assert_eq!(r.numerator().degree(), Some(0));
        assert_eq!(r.denominator().degree(), Some(1));
        assert!((r.eval(0.0) - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_properness() {
        assert!(RationalFunction::step(3.0).is_proper());
        assert!(RationalFunction::zero().is_proper());
        assert!(!RationalFunction::constant(3.0).is_proper());
        assert!(!RationalFunction::from(Polynomial::s()).is_proper());
    }

    #[test]
    fn test_display() {
        let r = RationalFunction::new(
            Polynomial::new(vec![2.0, 1.0]),
            Polynomial::new(vec![2.0, 3.0, 1.0]),
        )
        .unwrap();
        assert_eq!(r.to_string(), "(s + 2)/(s^2 + 3*s + 2)");
        assert_eq!(RationalFunction::constant(5.0).to_string(), "5");
        assert_eq!(RationalFunction::step(10.0).to_string(), "10/s");
    }
}
