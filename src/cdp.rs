//! Compatibly divisible piecewise-affine families (CDPs).
//!
//! A [`Cdp`] is a list of piecewise-affine functions `ψ_1, ..., ψ_m` over a
//! common convex polytope, the *base*, such that `Σ ψ_i ≥ 0` on the base.
//!
//! # Validation
//!
//! The non-negativity invariant is checked once, at construction, at every
//! base vertex and at every vertex of a piece domain lying inside the base.
//! What happens at a check point where some function is undefined is chosen
//! by [`Validation`]:
//!
//! - [`Validation::Lenient`] skips the point, unless it is a base vertex at
//!   which no function at all is defined;
//! - [`Validation::Strict`] rejects the CDP.
//!
//! # Mutators
//!
//! The three mutators leave the invariant intact by construction and do not
//! re-check it:
//!
//! - [`transform_base`][Cdp::transform_base]: a linear change of coordinates;
//! - [`translate`][Cdp::translate]: per-function constant shifts summing to zero;
//! - [`shear`][Cdp::shear]: per-function multiples of a shared direction
//!   added to the linear parts, with weights summing to zero.
//!
//! Each comes in an in-place form and in a consuming form
//! ([`transformed`][Cdp::transformed], [`translated`][Cdp::translated],
//! [`sheared`][Cdp::sheared]). All of them leave the CDP untouched on error.

use std::fmt;

use log::debug;
use num_traits::Zero;

use crate::error::{CdpError, DomainError};
use crate::matrix::Matrix;
use crate::piecewise::PiecewiseAffineFunction;
use crate::polytope::Polytope;
use crate::types::{DisplayPoint, Point, Rational};

/// Strictness of the construction-time non-negativity check.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Validation {
    /// Skip check points where some function is undefined; only a base vertex
    /// covered by no function is an error.
    #[default]
    Lenient,
    /// Every function must be defined at every check point.
    Strict,
}

#[derive(Debug, Clone)]
pub struct Cdp {
    psi_list: Vec<PiecewiseAffineFunction>,
    base: Polytope,
}

impl Cdp {
    /// Creates a CDP with [`Validation::Lenient`].
    pub fn new(psi_list: Vec<PiecewiseAffineFunction>, base: Polytope) -> Result<Self, CdpError> {
        Self::with_validation(psi_list, base, Validation::default())
    }

    pub fn with_validation(
        psi_list: Vec<PiecewiseAffineFunction>,
        base: Polytope,
        validation: Validation,
    ) -> Result<Self, CdpError> {
        let n = base.ambient_dim();
        if let Some(psi) = psi_list.iter().find(|psi| psi.dim() != n) {
            return Err(CdpError::DimensionMismatch {
                expected: n,
                found: psi.dim(),
            });
        }
        let cdp = Self { psi_list, base };
        cdp.validate(validation)?;
        Ok(cdp)
    }

    /// Base vertices first, then piece-domain vertices inside the base, without repeats.
    fn check_points(&self) -> Vec<(Point, bool)> {
        let mut result: Vec<(Point, bool)> = self.base.vertices().iter().map(|v| (v.clone(), true)).collect();
        for psi in &self.psi_list {
            for piece in psi.pieces() {
                for v in piece.domain().vertices() {
                    if self.base.contains(v) && !result.iter().any(|(p, _)| p == v) {
                        result.push((v.clone(), false));
                    }
                }
            }
        }
        result
    }

    fn validate(&self, validation: Validation) -> Result<(), CdpError> {
        for (vertex, is_base_vertex) in self.check_points() {
            let values: Vec<Result<Rational, DomainError>> =
                self.psi_list.iter().map(|psi| psi.value(&vertex)).collect();

            if let Some(missing) = values.iter().position(Result::is_err) {
                let covered = values.iter().any(Result::is_ok);
                if validation == Validation::Strict {
                    return Err(CdpError::UncoveredVertex {
                        vertex,
                        function: Some(missing),
                    });
                }
                if is_base_vertex && !covered {
                    return Err(CdpError::UncoveredVertex { vertex, function: None });
                }
                debug!(
                    "function {} is not defined at {}, skipping the check there",
                    missing,
                    DisplayPoint(&vertex)
                );
                continue;
            }

            let sum = values.into_iter().flatten().fold(Rational::zero(), |acc, v| acc + v);
            if sum < Rational::zero() {
                return Err(CdpError::InvalidCdp { vertex, sum });
            }
        }
        Ok(())
    }

    pub fn psi_list(&self) -> &[PiecewiseAffineFunction] {
        &self.psi_list
    }

    pub fn base(&self) -> &Polytope {
        &self.base
    }

    /// Dimension `n` of the base's ambient space.
    pub fn dim(&self) -> usize {
        self.base.ambient_dim()
    }

    /// Number `k` of base vertices.
    pub fn vertex_count(&self) -> usize {
        self.base.vertex_count()
    }

    pub fn function_count(&self) -> usize {
        self.psi_list.len()
    }

    /// Whether base vertices `i` and `j` share an edge.
    pub fn adjacent(&self, i: usize, j: usize) -> bool {
        self.base.adjacent(i, j)
    }

    /// `Σ ψ_i(x)`, defined where every function is.
    pub fn value_sum(&self, x: &[Rational]) -> Result<Rational, DomainError> {
        self.psi_list
            .iter()
            .try_fold(Rational::zero(), |acc, psi| Ok(acc + psi.value(x)?))
    }

    /// Changes coordinates on the base by the invertible linear map `phi`.
    pub fn transform_base(&mut self, phi: &Matrix) -> Result<(), CdpError> {
        let n = self.dim();
        if phi.nrows() != n || phi.ncols() != n {
            return Err(CdpError::DimensionMismatch {
                expected: n,
                found: if phi.nrows() != n { phi.nrows() } else { phi.ncols() },
            });
        }
        let phi_inverse = phi.inverse().ok_or(CdpError::NonInvertibleMap)?;
        let phi_inverse_transpose = phi_inverse.transpose();

        let base = self.base.map(phi)?;
        let mut psi_list = self.psi_list.clone();
        for psi in &mut psi_list {
            psi.transform(phi, &phi_inverse_transpose)?;
        }
        self.base = base;
        self.psi_list = psi_list;
        Ok(())
    }

    /// Adds `alphas[i]` to the constant term of every piece of `ψ_i`.
    pub fn translate(&mut self, alphas: &[Rational]) -> Result<(), CdpError> {
        self.check_weights(alphas)?;
        for (psi, alpha) in self.psi_list.iter_mut().zip(alphas) {
            psi.shift_constants(alpha);
        }
        Ok(())
    }

    /// Adds `betas[i] · direction` to the linear part of every piece of `ψ_i`.
    pub fn shear(&mut self, betas: &[Rational], direction: &[Rational]) -> Result<(), CdpError> {
        self.check_weights(betas)?;
        if direction.len() != self.dim() {
            return Err(CdpError::DimensionMismatch {
                expected: self.dim(),
                found: direction.len(),
            });
        }
        for (psi, beta) in self.psi_list.iter_mut().zip(betas) {
            let delta: Point = direction.iter().map(|v| beta * v).collect();
            psi.shift_linear(&delta);
        }
        Ok(())
    }

    fn check_weights(&self, weights: &[Rational]) -> Result<(), CdpError> {
        if weights.len() != self.psi_list.len() {
            return Err(CdpError::LengthMismatch {
                expected: self.psi_list.len(),
                found: weights.len(),
            });
        }
        let sum = weights.iter().fold(Rational::zero(), |acc, w| acc + w);
        if !sum.is_zero() {
            return Err(CdpError::NonZeroSum { sum });
        }
        Ok(())
    }

    /// Consuming form of [`transform_base`][Cdp::transform_base].
    pub fn transformed(mut self, phi: &Matrix) -> Result<Self, CdpError> {
        self.transform_base(phi)?;
        Ok(self)
    }

    /// Consuming form of [`translate`][Cdp::translate].
    pub fn translated(mut self, alphas: &[Rational]) -> Result<Self, CdpError> {
        self.translate(alphas)?;
        Ok(self)
    }

    /// Consuming form of [`shear`][Cdp::shear].
    pub fn sheared(mut self, betas: &[Rational], direction: &[Rational]) -> Result<Self, CdpError> {
        self.shear(betas, direction)?;
        Ok(self)
    }
}

/// Equal iff the bases coincide and the function lists agree as multisets.
impl PartialEq for Cdp {
    fn eq(&self, other: &Self) -> bool {
        if self.base != other.base || self.psi_list.len() != other.psi_list.len() {
            return false;
        }
        let mut used = vec![false; other.psi_list.len()];
        self.psi_list.iter().all(|psi| {
            match (0..other.psi_list.len()).find(|&j| !used[j] && &other.psi_list[j] == psi) {
                Some(j) => {
                    used[j] = true;
                    true
                }
                None => false,
            }
        })
    }
}

impl Eq for Cdp {}

impl fmt::Display for Cdp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CDP over base {}", self.base)?;
        for psi in &self.psi_list {
            write!(f, "\n{}", psi)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::affine::AffineFunction;
    use crate::types::{int, point, points, rat};

    fn segment(a: i64, b: i64) -> Polytope {
        Polytope::new(points([[a], [b]])).unwrap()
    }

    fn piecewise(pieces: Vec<(Rational, Rational, Polytope)>) -> PiecewiseAffineFunction {
        PiecewiseAffineFunction::new(
            pieces
                .into_iter()
                .map(|(c, s, d)| AffineFunction::new(vec![c, s], d).unwrap())
                .collect(),
        )
        .unwrap()
    }

    fn tent_and_line() -> Vec<PiecewiseAffineFunction> {
        vec![
            piecewise(vec![(int(1), int(1), segment(-1, 0)), (int(1), int(-1), segment(0, 1))]),
            piecewise(vec![(rat(1, 2), rat(1, 2), segment(-1, 1))]),
        ]
    }

    fn coefficients(cdp: &Cdp, function: usize, piece: usize) -> Vec<Rational> {
        cdp.psi_list()[function].pieces()[piece].coefficients().to_vec()
    }

    #[test]
    fn test_valid_cdp() {
        let cdp = Cdp::new(tent_and_line(), segment(-1, 1)).unwrap();
        assert_eq!(cdp.dim(), 1);
        assert_eq!(cdp.vertex_count(), 2);
        assert_eq!(cdp.function_count(), 2);
        assert!(cdp.adjacent(0, 1));
        assert_eq!(cdp.value_sum(&point([1])), Ok(int(1)));
    }

    #[test]
    fn test_not_valid_cdp() {
        let psi_list = vec![
            piecewise(vec![(int(0), int(1), segment(-1, 0)), (int(0), int(-1), segment(0, 1))]),
            piecewise(vec![(rat(-1, 2), rat(1, 2), segment(-1, 1))]),
        ];
        let err = Cdp::new(psi_list, segment(-1, 1)).unwrap_err();
        assert_eq!(
            err,
            CdpError::InvalidCdp {
                vertex: point([-1]),
                sum: int(-2),
            }
        );
    }

    #[test]
    fn test_negative_at_interior_piece_vertex() {
        // Sum is 0 at both base vertices but -1 at the breakpoint 0.
        let psi_list = vec![
            piecewise(vec![(int(-1), int(-1), segment(-1, 0)), (int(-1), int(1), segment(0, 1))]),
            piecewise(vec![(int(0), int(0), segment(-1, 1))]),
        ];
        let err = Cdp::new(psi_list, segment(-1, 1)).unwrap_err();
        assert_eq!(
            err,
            CdpError::InvalidCdp {
                vertex: point([0]),
                sum: int(-1),
            }
        );
    }

    #[test]
    fn test_lenient_and_strict() {
        // The second function only covers [0, 1].
        let psi_list = vec![
            piecewise(vec![(int(1), int(0), segment(-1, 1))]),
            piecewise(vec![(int(0), int(1), segment(0, 1))]),
        ];
        assert!(Cdp::new(psi_list.clone(), segment(-1, 1)).is_ok());
        let err = Cdp::with_validation(psi_list, segment(-1, 1), Validation::Strict).unwrap_err();
        assert_eq!(
            err,
            CdpError::UncoveredVertex {
                vertex: point([-1]),
                function: Some(1),
            }
        );
    }

    #[test]
    fn test_uncovered_base_vertex() {
        let psi_list = vec![piecewise(vec![(int(1), int(0), segment(0, 1))])];
        let err = Cdp::new(psi_list, segment(-1, 1)).unwrap_err();
        assert_eq!(
            err,
            CdpError::UncoveredVertex {
                vertex: point([-1]),
                function: None,
            }
        );
    }

    #[test]
    fn test_dimension_mismatch() {
        let square = Polytope::new(points([[0, 0], [1, 0], [0, 1]])).unwrap();
        let err = Cdp::new(tent_and_line(), square).unwrap_err();
        assert_eq!(err, CdpError::DimensionMismatch { expected: 2, found: 1 });
    }

    #[test]
    fn test_1d_shear() {
        let mut cdp = Cdp::new(tent_and_line(), segment(-1, 1)).unwrap();
        cdp.shear(&[int(-1), int(1)], &point([-1])).unwrap();
        assert_eq!(coefficients(&cdp, 0, 0), vec![int(1), int(2)]);
        assert_eq!(coefficients(&cdp, 1, 0), vec![rat(1, 2), rat(-1, 2)]);
    }

    #[test]
    fn test_1d_translate() {
        let mut cdp = Cdp::new(tent_and_line(), segment(-1, 1)).unwrap();
        cdp.shear(&[int(-1), int(1)], &point([-1])).unwrap();
        cdp.translate(&[int(1), int(-1)]).unwrap();
        assert_eq!(coefficients(&cdp, 0, 0), vec![int(2), int(2)]);
        assert_eq!(coefficients(&cdp, 1, 0), vec![rat(-1, 2), rat(-1, 2)]);
    }

    #[test]
    fn test_1d_transform_base() {
        let cdp = Cdp::new(tent_and_line(), segment(-1, 1))
            .unwrap()
            .sheared(&[int(-1), int(1)], &point([-1]))
            .unwrap()
            .translated(&[int(1), int(-1)])
            .unwrap()
            .transformed(&Matrix::diagonal([-1]))
            .unwrap();
        assert_eq!(coefficients(&cdp, 0, 0), vec![int(2), int(-2)]);
        assert_eq!(cdp.psi_list()[0].pieces()[0].domain().vertices(), points([[0], [1]]).as_slice());
        assert_eq!(coefficients(&cdp, 1, 0), vec![rat(-1, 2), rat(1, 2)]);
    }

    #[test]
    fn test_weight_errors() {
        let mut cdp = Cdp::new(tent_and_line(), segment(-1, 1)).unwrap();
        let before = cdp.clone();
        assert_eq!(
            cdp.translate(&[int(1)]),
            Err(CdpError::LengthMismatch { expected: 2, found: 1 })
        );
        assert_eq!(
            cdp.translate(&[int(1), int(1)]),
            Err(CdpError::NonZeroSum { sum: int(2) })
        );
        assert_eq!(
            cdp.shear(&[int(1), int(-1), int(0)], &point([1])),
            Err(CdpError::LengthMismatch { expected: 2, found: 3 })
        );
        assert_eq!(
            cdp.shear(&[int(1), int(-1)], &point([1, 0])),
            Err(CdpError::DimensionMismatch { expected: 1, found: 2 })
        );
        assert_eq!(cdp, before);
    }

    #[test]
    fn test_non_invertible_map() {
        let mut cdp = Cdp::new(tent_and_line(), segment(-1, 1)).unwrap();
        assert_eq!(cdp.transform_base(&Matrix::diagonal([0])), Err(CdpError::NonInvertibleMap));
        assert_eq!(
            cdp.transform_base(&Matrix::identity(2)),
            Err(CdpError::DimensionMismatch { expected: 1, found: 2 })
        );
    }

    #[test]
    fn test_equality_ignores_function_order() {
        let cdp1 = Cdp::new(tent_and_line(), segment(-1, 1)).unwrap();
        let mut reversed = tent_and_line();
        reversed.reverse();
        let cdp2 = Cdp::new(reversed, segment(-1, 1)).unwrap();
        assert_eq!(cdp1, cdp2);
    }

    #[test]
    fn test_inequality() {
        let cdp1 = Cdp::new(tent_and_line(), segment(-1, 1)).unwrap();
        let psi_list = vec![
            piecewise(vec![(rat(1, 2), rat(1, 2), segment(-1, 2))]),
            piecewise(vec![(int(1), int(1), segment(-1, 0)), (int(1), int(-1), segment(0, 2))]),
        ];
        let cdp2 = Cdp::new(psi_list, segment(-1, 2)).unwrap();
        assert_ne!(cdp1, cdp2);
    }

    #[test]
    fn test_display() {
        let cdp = Cdp::new(tent_and_line(), segment(-1, 1)).unwrap();
        let text = cdp.to_string();
        assert!(text.starts_with("CDP over base [(-1), (1)]\nPiecewise affine function:\n"));
        assert!(text.ends_with("Affine function 1/2 + 1/2x_1 with domain [(-1), (1)]"));
    }
}
