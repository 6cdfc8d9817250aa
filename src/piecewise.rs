//! Piecewise-affine functions.
//!
//! A [`PiecewiseAffineFunction`] is an ordered list of affine pieces whose
//! domains are meant to cover a region without overlapping interiors, agreeing
//! on shared boundaries. That partition property is not enforced.
//!
//! Besides evaluation, this module provides the comparisons the equivalence
//! search is built on:
//!
//! - [`domains_match`][PiecewiseAffineFunction::domains_match]: the two
//!   functions are defined on the same set of piece domains, ignoring values;
//! - [`can_be_translated`][PiecewiseAffineFunction::can_be_translated]: one
//!   constant shift, the same for every piece, turns one into the other's
//!   constant terms;
//! - [`can_be_sheared`][PiecewiseAffineFunction::can_be_sheared]: one linear
//!   coefficient offset, the same for every piece, turns one into the other's
//!   linear parts.
//!
//! The last two match pieces by domain, see
//! [`domain_correspondence`][PiecewiseAffineFunction::domain_correspondence].

use std::fmt;

use crate::affine::AffineFunction;
use crate::error::{CdpError, DomainError, PolytopeError};
use crate::matrix::Matrix;
use crate::types::{Point, Rational};

#[derive(Debug, Clone)]
pub struct PiecewiseAffineFunction {
    pieces: Vec<AffineFunction>,
}

impl PiecewiseAffineFunction {
    /// Creates a function from its pieces, which must be non-empty and share one dimension.
    pub fn new(pieces: Vec<AffineFunction>) -> Result<Self, CdpError> {
        let first = pieces.first().ok_or(CdpError::EmptyFunction)?;
        let dim = first.dim();
        if let Some(p) = pieces.iter().find(|p| p.dim() != dim) {
            return Err(CdpError::DimensionMismatch {
                expected: dim,
                found: p.dim(),
            });
        }
        Ok(Self { pieces })
    }

    pub fn pieces(&self) -> &[AffineFunction] {
        &self.pieces
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.pieces[0].dim()
    }

    /// Value of the first piece whose domain contains `x`.
    pub fn value(&self, x: &[Rational]) -> Result<Rational, DomainError> {
        if x.len() != self.dim() {
            return Err(DomainError::WrongDimension {
                expected: self.dim(),
                found: x.len(),
            });
        }
        self.pieces
            .iter()
            .find(|p| p.domain().contains(x))
            .ok_or_else(|| DomainError::OutOfDomain { point: x.to_vec() })
            .and_then(|p| p.value(x))
    }

    /// Applies [`AffineFunction::transform`] to every piece; on error nothing changes.
    pub fn transform(&mut self, phi: &Matrix, phi_inverse_transpose: &Matrix) -> Result<(), PolytopeError> {
        let mut pieces = self.pieces.clone();
        for piece in &mut pieces {
            piece.transform(phi, phi_inverse_transpose)?;
        }
        self.pieces = pieces;
        Ok(())
    }

    pub(crate) fn shift_constants(&mut self, alpha: &Rational) {
        for piece in &mut self.pieces {
            piece.shift_constant(alpha);
        }
    }

    pub(crate) fn shift_linear(&mut self, delta: &[Rational]) {
        for piece in &mut self.pieces {
            piece.shift_linear(delta);
        }
    }

    /// For every piece of `self`, the index of a distinct piece of `other` with the same domain.
    ///
    /// Returns `None` when the piece domains of the two functions differ.
    pub fn domain_correspondence(&self, other: &PiecewiseAffineFunction) -> Option<Vec<usize>> {
        if self.len() != other.len() {
            return None;
        }
        let mut used = vec![false; other.len()];
        let mut correspondence = Vec::with_capacity(self.len());
        for piece in &self.pieces {
            let j = (0..other.len()).find(|&j| !used[j] && other.pieces[j].domain() == piece.domain())?;
            used[j] = true;
            correspondence.push(j);
        }
        Some(correspondence)
    }

    /// Whether both functions are defined on the same set of piece domains.
    pub fn domains_match(&self, other: &PiecewiseAffineFunction) -> bool {
        self.domain_correspondence(other).is_some()
    }

    /// The constant `alpha` such that adding it to every piece of `self` gives
    /// the constant terms of `other`, if a single such constant exists.
    pub fn can_be_translated(&self, other: &PiecewiseAffineFunction) -> Option<Rational> {
        let correspondence = self.domain_correspondence(other)?;
        let mut alpha: Option<Rational> = None;
        for (piece, &j) in self.pieces.iter().zip(&correspondence) {
            let diff = other.pieces[j].constant() - piece.constant();
            match &alpha {
                None => alpha = Some(diff),
                Some(a) if *a == diff => {}
                Some(_) => return None,
            }
        }
        alpha
    }

    /// The vector `delta` such that adding it to the linear part of every
    /// piece of `self` gives the linear parts of `other`, if a single such
    /// vector exists.
    pub fn can_be_sheared(&self, other: &PiecewiseAffineFunction) -> Option<Point> {
        let correspondence = self.domain_correspondence(other)?;
        let mut delta: Option<Point> = None;
        for (piece, &j) in self.pieces.iter().zip(&correspondence) {
            let diff: Point = other.pieces[j]
                .linear()
                .iter()
                .zip(piece.linear())
                .map(|(a, b)| a - b)
                .collect();
            match &delta {
                None => delta = Some(diff),
                Some(d) if *d == diff => {}
                Some(_) => return None,
            }
        }
        delta
    }
}

/// Equal iff the pieces agree as multisets.
impl PartialEq for PiecewiseAffineFunction {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let mut used = vec![false; other.len()];
        self.pieces.iter().all(|piece| {
            match (0..other.len()).find(|&j| !used[j] && &other.pieces[j] == piece) {
                Some(j) => {
                    used[j] = true;
                    true
                }
                None => false,
            }
        })
    }
}

impl Eq for PiecewiseAffineFunction {}

impl fmt::Display for PiecewiseAffineFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Piecewise affine function:")?;
        for piece in &self.pieces {
            write!(f, "\n{}", piece)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::polytope::Polytope;
    use crate::types::{int, point, points, rat};

    fn segment(a: i64, b: i64) -> Polytope {
        Polytope::new(points([[a], [b]])).unwrap()
    }

    fn piece(constant: Rational, slope: Rational, domain: Polytope) -> AffineFunction {
        AffineFunction::new(vec![constant, slope], domain).unwrap()
    }

    /// `1 + x` on `[-1, 0]`, `1 - x` on `[0, 1]`.
    fn tent() -> PiecewiseAffineFunction {
        PiecewiseAffineFunction::new(vec![
            piece(int(1), int(1), segment(-1, 0)),
            piece(int(1), int(-1), segment(0, 1)),
        ])
        .unwrap()
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(PiecewiseAffineFunction::new(vec![]).unwrap_err(), CdpError::EmptyFunction);
    }

    #[test]
    fn test_mixed_dimensions_rejected() {
        let square = Polytope::new(points([[0, 0], [1, 0], [0, 1]])).unwrap();
        let flat = AffineFunction::new(vec![int(0), int(0), int(0)], square).unwrap();
        let err = PiecewiseAffineFunction::new(vec![piece(int(0), int(0), segment(0, 1)), flat]).unwrap_err();
        assert_eq!(err, CdpError::DimensionMismatch { expected: 1, found: 2 });
    }

    #[test]
    fn test_value_dispatch() {
        let f = tent();
        assert_eq!(f.value(&point([-1])), Ok(int(0)));
        assert_eq!(f.value(&point([0])), Ok(int(1)));
        assert_eq!(f.value(&[rat(1, 2)]), Ok(rat(1, 2)));
        assert_eq!(f.value(&point([2])), Err(DomainError::OutOfDomain { point: point([2]) }));
    }

    #[test]
    fn test_equality_ignores_order() {
        let f = tent();
        let mut pieces = f.pieces().to_vec();
        pieces.reverse();
        let g = PiecewiseAffineFunction::new(pieces).unwrap();
        assert_eq!(f, g);

        let h = PiecewiseAffineFunction::new(vec![
            piece(int(1), int(1), segment(-1, 0)),
            piece(int(1), int(-2), segment(0, 1)),
        ])
        .unwrap();
        assert_ne!(f, h);
    }

    #[test]
    fn test_domains_match() {
        let f = tent();
        let g = PiecewiseAffineFunction::new(vec![
            piece(int(5), int(0), segment(0, 1)),
            piece(int(7), int(3), segment(-1, 0)),
        ])
        .unwrap();
        assert!(f.domains_match(&g));
        assert_eq!(f.domain_correspondence(&g), Some(vec![1, 0]));

        let whole = PiecewiseAffineFunction::new(vec![piece(int(0), int(0), segment(-1, 1))]).unwrap();
        assert!(!f.domains_match(&whole));
    }

    #[test]
    fn test_can_be_translated() {
        let f = tent();
        let mut g = tent();
        g.shift_constants(&rat(3, 2));
        assert_eq!(f.can_be_translated(&g), Some(rat(3, 2)));
        assert_eq!(g.can_be_translated(&f), Some(rat(-3, 2)));

        let h = PiecewiseAffineFunction::new(vec![
            piece(int(1), int(1), segment(-1, 0)),
            piece(int(2), int(-1), segment(0, 1)),
        ])
        .unwrap();
        assert_eq!(f.can_be_translated(&h), None);
    }

    #[test]
    fn test_can_be_sheared() {
        let f = tent();
        // 2 on [-1, 0], 2 - 2x on [0, 1]
        let g = PiecewiseAffineFunction::new(vec![
            piece(int(2), int(0), segment(-1, 0)),
            piece(int(2), int(-2), segment(0, 1)),
        ])
        .unwrap();
        assert_eq!(f.can_be_sheared(&g), Some(point([-1])));
        assert_eq!(f.can_be_translated(&g), Some(int(1)));

        // 2 - x on [0, 1] changes the slope of one piece only.
        let h = PiecewiseAffineFunction::new(vec![
            piece(int(2), int(0), segment(-1, 0)),
            piece(int(2), int(-1), segment(0, 1)),
        ])
        .unwrap();
        assert_eq!(f.can_be_sheared(&h), None);
    }

    #[test]
    fn test_transform_reflection() {
        let mut f = tent();
        let phi = Matrix::diagonal([-1]);
        let inv_t = phi.inverse().unwrap().transpose();
        f.transform(&phi, &inv_t).unwrap();
        // The tent is symmetric.
        assert_eq!(f, tent());
        assert_eq!(f.pieces()[0].domain(), &segment(0, 1));
        assert_eq!(f.pieces()[0].coefficients(), &[int(1), int(-1)]);
    }

    #[test]
    fn test_display() {
        let f = tent();
        assert_eq!(
            f.to_string(),
            "Piecewise affine function:\n\
             Affine function 1 + x_1 with domain [(-1), (0)]\n\
             Affine function 1 - x_1 with domain [(0), (1)]"
        );
    }
}
