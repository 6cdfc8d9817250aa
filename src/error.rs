//! Error types.
//!
//! Errors are grouped by the object that produces them: evaluating a function
//! outside its domain, building a polytope, and building or mutating a CDP.
//! The equivalence search never surfaces any of them.

use thiserror::Error;

use crate::types::{DisplayPoint, Point, Rational};

/// Evaluation of an affine or piecewise-affine function at a point where it is not defined.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The point lies outside the domain of every (candidate) piece.
    #[error("point {} is not in the function domain", DisplayPoint(.point))]
    OutOfDomain { point: Point },

    /// The point has the wrong number of coordinates.
    #[error("wrong dimension of point: expected {expected}, found {found}")]
    WrongDimension { expected: usize, found: usize },
}

/// Malformed input to polytope construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolytopeError {
    #[error("polytope must have at least one point")]
    Empty,

    #[error("points of differing dimensions: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
}

/// Construction, mutation and generation errors of CDPs and their functions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CdpError {
    /// The non-negativity invariant is violated at a vertex.
    #[error("sum of functions at vertex {} is {sum}, which is negative", DisplayPoint(.vertex))]
    InvalidCdp { vertex: Point, sum: Rational },

    /// The sum of functions is undefined at a vertex.
    #[error("{}", uncovered_message(.vertex, .function))]
    UncoveredVertex { vertex: Point, function: Option<usize> },

    /// A per-function argument list has the wrong length.
    #[error("expected {expected} values (one per function), found {found}")]
    LengthMismatch { expected: usize, found: usize },

    /// Translation or shear weights do not sum to zero.
    #[error("weights must sum to zero, but sum to {sum}")]
    NonZeroSum { sum: Rational },

    /// A vector or matrix does not fit the base dimension.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// The linear map given to `transform_base` is singular.
    #[error("linear map is not invertible")]
    NonInvertibleMap,

    /// An affine piece has the wrong number of coefficients for its domain.
    #[error("domain dimension {domain_dim} does not match {coefficients} coefficients")]
    CoefficientMismatch { domain_dim: usize, coefficients: usize },

    /// A piecewise-affine function without pieces.
    #[error("piecewise affine function must have at least one piece")]
    EmptyFunction,

    /// A Cayley polytope that does not span its ambient space.
    #[error("polytope of dimension {affine_dim} is not full-dimensional in R^{ambient_dim}")]
    NotFullDimensional { affine_dim: usize, ambient_dim: usize },

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Polytope(#[from] PolytopeError),
}

fn uncovered_message(vertex: &Point, function: &Option<usize>) -> String {
    match function {
        Some(i) => format!("function {} is not defined at vertex {}", i, DisplayPoint(vertex)),
        None => format!("no function is defined at vertex {}", DisplayPoint(vertex)),
    }
}
