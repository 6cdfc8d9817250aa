//! # cdp-rs: Equivalence of compatibly divisible piecewise-affine families
//!
//! **`cdp-rs`** decides structural equivalence of **CDPs**: finite families of
//! piecewise-affine functions over a common convex polytope (the *base*), whose
//! pointwise sum is non-negative on the base.
//!
//! ## What is equivalence?
//!
//! Two CDPs are *equivalent* if one can be turned into the other by
//!
//! - a linear change of coordinates on the base,
//! - per-function constant shifts summing to zero (*translation*),
//! - per-function multiples of a shared direction added to the linear parts,
//!   with weights summing to zero (*shear*),
//!
//! up to relabeling the base vertices and the functions.
//!
//! ## Key Features
//!
//! - **Exact arithmetic**: every coordinate and coefficient is a [`BigRational`][num_rational::BigRational], so all equality tests are exact.
//! - **Self-contained geometry**: convex hulls, facets, vertex adjacency and membership for small polytopes of any dimension ([`polytope`]).
//! - **Pruned search**: vertex relabelings are restricted by base adjacency, function relabelings by piece-domain classes ([`equivalence`]).
//! - **Witnesses**: a successful search reports the transform, the relabelings, and the translation and shear that realize the equivalence.
//!
//! ## Basic Usage
//!
//! ```rust
//! use cdp_rs::generate::from_cayley_polytope;
//! use cdp_rs::matrix::Matrix;
//! use cdp_rs::polytope::Polytope;
//! use cdp_rs::types::{int, point, points};
//!
//! // 1. Build a CDP from the upper and lower boundary of a polygon
//! let poly = Polytope::new(points([[-2, 0], [0, 2], [1, 2], [2, 1], [2, -2], [-2, -2]])).unwrap();
//! let cdp = from_cayley_polytope(&poly).unwrap();
//!
//! // 2. Reflect the base and shear
//! let other = cdp
//!     .clone()
//!     .transformed(&Matrix::diagonal([-1]))
//!     .unwrap()
//!     .sheared(&[int(-2), int(2)], &point([2]))
//!     .unwrap();
//!
//! // 3. The two are equivalent
//! assert!(cdp.equal(&other));
//! ```
//!
//! ## Core Components
//!
//! - **[`cdp`]**: the [`Cdp`][crate::cdp::Cdp] type, its validation and mutators.
//! - **[`equivalence`]**: the equivalence search.
//! - **[`generate`]**: CDPs from Cayley polytopes.

pub mod affine;
pub mod cdp;
pub mod equivalence;
pub mod error;
pub mod generate;
pub mod matrix;
pub mod piecewise;
pub mod polytope;
pub mod types;
