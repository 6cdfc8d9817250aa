//! Exact convex polytopes given by their vertices.
//!
//! A [`Polytope`] is built from a finite point set. Construction discards
//! duplicate and non-extreme points and keeps the vertices in lexicographic
//! order, so two polytopes with the same point set always list their vertices
//! identically.
//!
//! # Representation
//!
//! Besides the vertices, a polytope stores:
//!
//! - the **equations** `a·x = b` of its affine hull (empty when the polytope
//!   is full-dimensional);
//! - its **facets**, as inequalities `a·x ≤ b` together with the vertices
//!   lying on them;
//! - the **adjacency** relation of its vertices, computed once at
//!   construction.
//!
//! Facets are found in a coordinate projection that is injective on the
//! affine hull: every `d`-subset of points (`d` the affine dimension) that
//! spans a hyperplane leaving all points on one side yields a facet. This is
//! exponential in `d` and meant for the small low-dimensional polytopes this
//! crate works with.
//!
//! Two distinct vertices are adjacent (form an edge) iff the normals of the
//! facets containing both have rank `d - 1`.

use std::fmt;
use std::hash::{Hash, Hasher};

use log::trace;
use num_traits::{Signed, Zero};

use crate::error::PolytopeError;
use crate::matrix::Matrix;
use crate::types::{dot, DisplayPoints, Point, Rational};

/// A facet `normal · x ≤ offset` of a polytope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facet {
    normal: Point,
    offset: Rational,
    vertices: Vec<usize>,
}

impl Facet {
    /// Outer normal of the facet.
    pub fn normal(&self) -> &[Rational] {
        &self.normal
    }

    pub fn offset(&self) -> &Rational {
        &self.offset
    }

    /// Indices (into [`Polytope::vertices`]) of the vertices on this facet.
    pub fn vertices(&self) -> &[usize] {
        &self.vertices
    }
}

#[derive(Debug, Clone)]
pub struct Polytope {
    ambient_dim: usize,
    vertices: Vec<Point>,
    equations: Vec<(Point, Rational)>,
    facets: Vec<Facet>,
    adjacency: Vec<Vec<bool>>,
}

impl Polytope {
    /// Builds the convex hull of the given points.
    pub fn new(points: Vec<Point>) -> Result<Self, PolytopeError> {
        let ambient_dim = points.first().ok_or(PolytopeError::Empty)?.len();
        if let Some(p) = points.iter().find(|p| p.len() != ambient_dim) {
            return Err(PolytopeError::DimensionMismatch {
                expected: ambient_dim,
                found: p.len(),
            });
        }

        let mut points = points;
        points.sort();
        points.dedup();

        let origin = points[0].clone();
        let directions: Vec<Point> = points[1..].iter().map(|p| sub(p, &origin)).collect();
        let directions = Matrix::from_rows_with_cols(directions, ambient_dim);
        let pivots = directions.pivot_columns();
        let equations: Vec<(Point, Rational)> = directions
            .null_space()
            .into_iter()
            .map(|a| {
                let b = dot(&a, &origin);
                (a, b)
            })
            .collect();

        let d = pivots.len();
        let projected: Vec<Point> = points.iter().map(|p| project(p, &pivots)).collect();
        let halfspaces = if d == 0 { Vec::new() } else { hull_halfspaces(&projected, d) };
        trace!(
            "hull of {} points: affine dimension {}, {} facets",
            points.len(),
            d,
            halfspaces.len()
        );

        let is_extreme = |q: &Point| {
            let active: Vec<Point> = halfspaces
                .iter()
                .filter(|(a, b)| &dot(a, q) == b)
                .map(|(a, _)| a.clone())
                .collect();
            Matrix::from_rows_with_cols(active, d).rank() == d
        };
        let (vertices, projected): (Vec<Point>, Vec<Point>) = points
            .into_iter()
            .zip(projected)
            .filter(|(_, q)| is_extreme(q))
            .unzip();

        let facets: Vec<Facet> = halfspaces
            .into_iter()
            .map(|(a, b)| {
                let on_facet = projected
                    .iter()
                    .enumerate()
                    .filter(|(_, q)| dot(&a, q) == b)
                    .map(|(i, _)| i)
                    .collect();
                let mut normal = vec![Rational::zero(); ambient_dim];
                for (k, &c) in pivots.iter().enumerate() {
                    normal[c] = a[k].clone();
                }
                Facet {
                    normal,
                    offset: b,
                    vertices: on_facet,
                }
            })
            .collect();

        let k = vertices.len();
        let mut adjacency = vec![vec![false; k]; k];
        for i in 0..k {
            for j in i + 1..k {
                let common: Vec<Point> = facets
                    .iter()
                    .filter(|f| f.vertices.contains(&i) && f.vertices.contains(&j))
                    .map(|f| f.normal.clone())
                    .collect();
                let rank = Matrix::from_rows_with_cols(common, ambient_dim).rank();
                if rank + 1 == d {
                    adjacency[i][j] = true;
                    adjacency[j][i] = true;
                }
            }
        }

        Ok(Self {
            ambient_dim,
            vertices,
            equations,
            facets,
            adjacency,
        })
    }

    /// Dimension of the space the polytope lives in.
    pub fn ambient_dim(&self) -> usize {
        self.ambient_dim
    }

    /// Dimension of the affine hull of the polytope.
    pub fn affine_dim(&self) -> usize {
        self.ambient_dim - self.equations.len()
    }

    pub fn is_full_dimensional(&self) -> bool {
        self.equations.is_empty()
    }

    /// Vertices in lexicographic order.
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn vertex(&self, i: usize) -> &Point {
        &self.vertices[i]
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn facets(&self) -> &[Facet] {
        &self.facets
    }

    /// Outer normal of a facet. Unique up to scaling only for full-dimensional polytopes.
    pub fn outer_normal(&self, facet: usize) -> &[Rational] {
        self.facets[facet].normal()
    }

    /// Coordinates of the vertices of a facet.
    pub fn facet_vertices(&self, facet: usize) -> Vec<Point> {
        self.facets[facet].vertices.iter().map(|&i| self.vertices[i].clone()).collect()
    }

    /// Exact membership test. Points of the wrong length are never contained.
    pub fn contains(&self, x: &[Rational]) -> bool {
        if x.len() != self.ambient_dim {
            return false;
        }
        if self.vertices.len() == 1 {
            return self.vertices[0] == x;
        }
        self.equations.iter().all(|(a, b)| &dot(a, x) == b)
            && self.facets.iter().all(|f| dot(&f.normal, x) <= f.offset)
    }

    /// Whether vertices `i` and `j` span an edge.
    pub fn adjacent(&self, i: usize, j: usize) -> bool {
        self.adjacency[i][j]
    }

    /// All edges `(i, j)` with `i < j`.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let k = self.vertices.len();
        (0..k)
            .flat_map(|i| (i + 1..k).map(move |j| (i, j)))
            .filter(|&(i, j)| self.adjacency[i][j])
            .collect()
    }

    /// Image of the polytope under the linear map `x ↦ phi·x`.
    pub fn map(&self, phi: &Matrix) -> Result<Polytope, PolytopeError> {
        if phi.ncols() != self.ambient_dim {
            return Err(PolytopeError::DimensionMismatch {
                expected: self.ambient_dim,
                found: phi.ncols(),
            });
        }
        Polytope::new(self.vertices.iter().map(|v| phi.mul_vec(v)).collect())
    }
}

impl PartialEq for Polytope {
    fn eq(&self, other: &Self) -> bool {
        self.vertices == other.vertices
    }
}

impl Eq for Polytope {}

impl Hash for Polytope {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.vertices.hash(state);
    }
}

impl fmt::Display for Polytope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", DisplayPoints(&self.vertices))
    }
}

fn sub(a: &[Rational], b: &[Rational]) -> Point {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

fn project(p: &[Rational], coords: &[usize]) -> Point {
    coords.iter().map(|&c| p[c].clone()).collect()
}

/// Facet inequalities `a·q ≤ b` of the hull of full-dimensional points in `R^d`.
///
/// Each normal is scaled so that its first non-zero component is `±1`.
fn hull_halfspaces(points: &[Point], d: usize) -> Vec<(Point, Rational)> {
    let mut result: Vec<(Point, Rational)> = Vec::new();
    for subset in combinations(points.len(), d) {
        let base = &points[subset[0]];
        let diffs: Vec<Point> = subset[1..].iter().map(|&i| sub(&points[i], base)).collect();
        let mut null = Matrix::from_rows_with_cols(diffs, d).null_space();
        if null.len() != 1 {
            continue;
        }
        let mut a = null.remove(0);
        let mut b = dot(&a, base);

        let mut above = false;
        let mut below = false;
        for p in points {
            let s = dot(&a, p) - &b;
            if s.is_positive() {
                above = true;
            } else if s.is_negative() {
                below = true;
            }
        }
        if above == below {
            continue;
        }
        if above {
            a = a.into_iter().map(|x| -x).collect();
            b = -b;
        }

        let Some(scale) = a.iter().find(|x| !x.is_zero()).map(|x| x.abs()) else {
            continue;
        };
        let a: Point = a.into_iter().map(|x| x / &scale).collect();
        let b = b / &scale;
        if !result.iter().any(|(a2, b2)| a2 == &a && b2 == &b) {
            result.push((a, b));
        }
    }
    result
}

/// All `k`-subsets of `0..n`, in lexicographic order.
fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    fn go(start: usize, n: usize, k: usize, current: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if current.len() == k {
            out.push(current.clone());
            return;
        }
        for i in start..n {
            if n - i < k - current.len() {
                break;
            }
            current.push(i);
            go(i + 1, n, k, current, out);
            current.pop();
        }
    }
    let mut out = Vec::new();
    if k <= n {
        go(0, n, k, &mut Vec::with_capacity(k), &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::types::{int, point, points, rat};

    fn diamond() -> Polytope {
        Polytope::new(points([[1, 0], [0, -1], [-1, 0], [0, 1]])).unwrap()
    }

    #[test]
    fn test_combinations() {
        assert_eq!(combinations(4, 2).len(), 6);
        assert_eq!(combinations(3, 3), vec![vec![0, 1, 2]]);
        assert_eq!(combinations(2, 3), Vec::<Vec<usize>>::new());
        assert_eq!(combinations(3, 0), vec![Vec::<usize>::new()]);
    }

    #[test]
    fn test_empty() {
        assert_eq!(Polytope::new(vec![]).unwrap_err(), PolytopeError::Empty);
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = Polytope::new(vec![point([0, 0]), point([1])]).unwrap_err();
        assert_eq!(err, PolytopeError::DimensionMismatch { expected: 2, found: 1 });
    }

    #[test]
    fn test_segment() {
        let p = Polytope::new(points([[1], [-1], [0], [1]])).unwrap();
        assert_eq!(p.vertices(), points([[-1], [1]]).as_slice());
        assert_eq!(p.affine_dim(), 1);
        assert!(p.is_full_dimensional());
        assert_eq!(p.facets().len(), 2);
        assert!(p.adjacent(0, 1));
        assert!(p.contains(&[rat(1, 2)]));
        assert!(p.contains(&point([-1])));
        assert!(!p.contains(&point([2])));
        assert!(!p.contains(&point([0, 0])));
    }

    #[test]
    fn test_diamond() {
        let p = diamond();
        assert_eq!(p.vertices(), points([[-1, 0], [0, -1], [0, 1], [1, 0]]).as_slice());
        assert_eq!(p.facets().len(), 4);
        for f in p.facets() {
            assert_eq!(f.vertices().len(), 2);
            assert_eq!(f.offset(), &int(1));
        }
        // (-1,0) and (1,0) are opposite, as are (0,-1) and (0,1).
        assert!(!p.adjacent(0, 3));
        assert!(!p.adjacent(1, 2));
        assert!(p.adjacent(0, 1));
        assert!(p.adjacent(0, 2));
        assert!(p.adjacent(3, 1));
        assert_eq!(p.edges().len(), 4);
        assert!(p.contains(&point([0, 0])));
        assert!(p.contains(&[rat(1, 2), rat(1, 2)]));
        assert!(!p.contains(&[rat(1, 2), rat(2, 3)]));
    }

    #[test]
    fn test_interior_points_dropped() {
        let p = Polytope::new(points([[0, 0], [2, 0], [0, 2], [2, 2], [1, 1], [1, 0]])).unwrap();
        assert_eq!(p.vertex_count(), 4);
        assert_eq!(p.edges().len(), 4);
    }

    #[test]
    fn test_lower_dimensional() {
        let p = Polytope::new(points([[0, 0], [2, 2], [1, 1]])).unwrap();
        assert_eq!(p.affine_dim(), 1);
        assert!(!p.is_full_dimensional());
        assert_eq!(p.vertices(), points([[0, 0], [2, 2]]).as_slice());
        assert!(p.contains(&point([1, 1])));
        assert!(!p.contains(&point([1, 0])));
        assert!(!p.contains(&point([3, 3])));
        assert!(p.adjacent(0, 1));
    }

    #[test]
    fn test_single_point() {
        let p = Polytope::new(points([[1, 2], [1, 2]])).unwrap();
        assert_eq!(p.vertex_count(), 1);
        assert_eq!(p.affine_dim(), 0);
        assert!(p.contains(&point([1, 2])));
        assert!(!p.contains(&point([2, 1])));
    }

    #[test]
    fn test_pyramid() {
        let p = Polytope::new(points([[1, 0, 0], [0, 1, 0], [0, 0, 1], [-1, 0, 0], [0, 0, -1]])).unwrap();
        assert_eq!(p.vertex_count(), 5);
        assert_eq!(p.facets().len(), 5);
        // The apex (0,1,0) is adjacent to all four base vertices.
        let apex = p.vertices().iter().position(|v| v == &point([0, 1, 0])).unwrap();
        for i in 0..5 {
            if i != apex {
                assert!(p.adjacent(apex, i));
            }
        }
        assert_eq!(p.edges().len(), 8);
    }

    #[test]
    fn test_equality_is_by_point_set() {
        let a = Polytope::new(points([[0], [1]])).unwrap();
        let b = Polytope::new(points([[1], [0], [1]])).unwrap();
        let c = Polytope::new(points([[0], [2]])).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_map() {
        let p = Polytope::new(points([[-1], [0]])).unwrap();
        let q = p.map(&Matrix::diagonal([-1])).unwrap();
        assert_eq!(q.vertices(), points([[0], [1]]).as_slice());

        let err = p.map(&Matrix::identity(2)).unwrap_err();
        assert_eq!(err, PolytopeError::DimensionMismatch { expected: 1, found: 2 });
    }
}
