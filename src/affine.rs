//! Affine functions on polytope domains.

use std::fmt;

use num_traits::{One, Zero};

use crate::error::{CdpError, DomainError, PolytopeError};
use crate::matrix::Matrix;
use crate::polytope::Polytope;
use crate::types::{dot, Rational};

/// An affine function `c0 + c1·x1 + ... + cn·xn`, valid on a polytope domain in `R^n`.
///
/// # Invariants
///
/// - `coefficients.len() == domain.ambient_dim() + 1`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AffineFunction {
    coefficients: Vec<Rational>,
    domain: Polytope,
}

impl AffineFunction {
    pub fn new(coefficients: Vec<Rational>, domain: Polytope) -> Result<Self, CdpError> {
        if coefficients.len() != domain.ambient_dim() + 1 {
            return Err(CdpError::CoefficientMismatch {
                domain_dim: domain.ambient_dim(),
                coefficients: coefficients.len(),
            });
        }
        Ok(Self { coefficients, domain })
    }

    /// All coefficients, constant term first.
    pub fn coefficients(&self) -> &[Rational] {
        &self.coefficients
    }

    /// The constant term `c0`.
    pub fn constant(&self) -> &Rational {
        &self.coefficients[0]
    }

    /// The linear part `[c1, ..., cn]`.
    pub fn linear(&self) -> &[Rational] {
        &self.coefficients[1..]
    }

    pub fn domain(&self) -> &Polytope {
        &self.domain
    }

    pub fn dim(&self) -> usize {
        self.domain.ambient_dim()
    }

    /// Value at `x`, which must lie in the domain.
    pub fn value(&self, x: &[Rational]) -> Result<Rational, DomainError> {
        if x.len() != self.dim() {
            return Err(DomainError::WrongDimension {
                expected: self.dim(),
                found: x.len(),
            });
        }
        if !self.domain.contains(x) {
            return Err(DomainError::OutOfDomain { point: x.to_vec() });
        }
        Ok(self.constant() + dot(self.linear(), x))
    }

    pub(crate) fn shift_constant(&mut self, alpha: &Rational) {
        self.coefficients[0] += alpha;
    }

    pub(crate) fn shift_linear(&mut self, delta: &[Rational]) {
        debug_assert_eq!(delta.len(), self.dim());
        for (c, d) in self.coefficients[1..].iter_mut().zip(delta) {
            *c += d;
        }
    }

    /// Moves the function along the linear map `phi`: the domain becomes its
    /// image, and the linear part becomes `phi_inverse_transpose · linear`, so
    /// that the value at `phi(x)` equals the old value at `x`.
    pub(crate) fn transform(&mut self, phi: &Matrix, phi_inverse_transpose: &Matrix) -> Result<(), PolytopeError> {
        let domain = self.domain.map(phi)?;
        let linear = phi_inverse_transpose.mul_vec(self.linear());
        self.coefficients.truncate(1);
        self.coefficients.extend(linear);
        self.domain = domain;
        Ok(())
    }
}

impl fmt::Display for AffineFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Affine function ")?;
        let mut empty = true;
        if !self.constant().is_zero() {
            write!(f, "{}", self.constant())?;
            empty = false;
        }
        for (i, c) in self.linear().iter().enumerate() {
            if c.is_zero() {
                continue;
            }
            let negative = c < &Rational::zero();
            let magnitude = if negative { -c } else { c.clone() };
            match (empty, negative) {
                (true, false) => {}
                (true, true) => write!(f, "-")?,
                (false, false) => write!(f, " + ")?,
                (false, true) => write!(f, " - ")?,
            }
            if !magnitude.is_one() {
                write!(f, "{}", magnitude)?;
            }
            write!(f, "x_{}", i + 1)?;
            empty = false;
        }
        if empty {
            write!(f, "0")?;
        }
        write!(f, " with domain {}", self.domain)
    }
}
