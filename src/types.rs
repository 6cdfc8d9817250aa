//! Exact scalar and point types shared by the whole crate.
//!
//! Every coordinate and coefficient is an arbitrary-precision rational number,
//! so that all equality tests (domain equality, coefficient equality, zero-sum
//! checks) are exact.

use std::fmt;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};

/// An exact rational number.
pub type Rational = BigRational;

/// A point (or a coordinate vector) in `R^n`.
pub type Point = Vec<Rational>;

/// Creates the rational `value / 1`.
pub fn int(value: i64) -> Rational {
    Rational::from_integer(BigInt::from(value))
}

/// Creates the rational `numer / denom`.
///
/// # Panics
///
/// Panics if `denom == 0`.
pub fn rat(numer: i64, denom: i64) -> Rational {
    assert_ne!(denom, 0, "Denominator must be non-zero");
    Rational::new(BigInt::from(numer), BigInt::from(denom))
}

/// Creates a point with integer coordinates.
pub fn point<I>(coords: I) -> Point
where
    I: IntoIterator<Item = i64>,
{
    coords.into_iter().map(int).collect()
}

/// Creates a list of points with integer coordinates.
pub fn points<I, P>(coords: I) -> Vec<Point>
where
    I: IntoIterator<Item = P>,
    P: IntoIterator<Item = i64>,
{
    coords.into_iter().map(point).collect()
}

/// Dot product of two equally long vectors.
pub fn dot(a: &[Rational], b: &[Rational]) -> Rational {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).fold(Rational::zero(), |acc, (x, y)| acc + x * y)
}

/// Returns true if every component is zero.
pub fn is_zero_vector(v: &[Rational]) -> bool {
    v.iter().all(Zero::is_zero)
}

/// Returns true if the rational is an integer.
pub fn is_integral(x: &Rational) -> bool {
    x.denom().is_one()
}

/// Wrapper rendering a point as `(x1, x2, ...)`.
pub struct DisplayPoint<'a>(pub &'a [Rational]);

impl fmt::Display for DisplayPoint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, x) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", x)?;
        }
        write!(f, ")")
    }
}

/// Wrapper rendering a list of points as `[(..), (..)]`.
pub struct DisplayPoints<'a>(pub &'a [Point]);

impl fmt::Display for DisplayPoints<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, p) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", DisplayPoint(p))?;
        }
        write!(f, "]")
    }
}
