//! CDPs from Cayley polytopes.
//!
//! A full-dimensional polytope `P ⊂ R^{n+1}` defines a CDP over the projection
//! of `P` onto the first `n` coordinates: its upper boundary is the graph of
//! `ψ_1`, and its lower boundary is the graph of `-ψ_2`. Then `ψ_1 + ψ_2` is
//! the height of `P` above each point, which is non-negative.
//!
//! Facets are classified by the last component of their outer normal:
//! positive for upper facets, negative for lower facets, zero for vertical
//! facets (which are skipped).

use log::debug;
use num_traits::Zero;

use crate::affine::AffineFunction;
use crate::cdp::Cdp;
use crate::error::CdpError;
use crate::matrix::Matrix;
use crate::piecewise::PiecewiseAffineFunction;
use crate::polytope::Polytope;
use crate::types::{int, is_integral, Point, Rational};

/// Builds the CDP `[ψ_1, ψ_2]` of a full-dimensional polytope in `R^{n+1}`.
pub fn from_cayley_polytope(poly: &Polytope) -> Result<Cdp, CdpError> {
    if !poly.is_full_dimensional() || poly.ambient_dim() < 2 {
        return Err(CdpError::NotFullDimensional {
            affine_dim: poly.affine_dim(),
            ambient_dim: poly.ambient_dim(),
        });
    }
    let n = poly.ambient_dim() - 1;

    let mut upper = Vec::new();
    let mut lower = Vec::new();
    for (i, facet) in poly.facets().iter().enumerate() {
        let normal = facet.normal();
        let height = &normal[n];
        if height.is_zero() {
            debug!("facet {} is vertical, skipping", i);
            continue;
        }

        // On the facet, z = (b - a'·x) / a_z.
        let mut coefficients = Vec::with_capacity(n + 1);
        coefficients.push(facet.offset() / height);
        coefficients.extend(normal[..n].iter().map(|a| -a / height));
        let domain = Polytope::new(poly.facet_vertices(i).into_iter().map(drop_last).collect())?;

        if height > &Rational::zero() {
            upper.push(AffineFunction::new(coefficients, domain)?);
        } else {
            let negated = coefficients.into_iter().map(|c| -c).collect();
            lower.push(AffineFunction::new(negated, domain)?);
        }
    }
    debug!("{} upper and {} lower facets", upper.len(), lower.len());

    let base = Polytope::new(poly.vertices().iter().cloned().map(drop_last).collect())?;
    let psi1 = PiecewiseAffineFunction::new(upper)?;
    let psi2 = PiecewiseAffineFunction::new(lower)?;
    Cdp::new(vec![psi1, psi2], base)
}

fn drop_last(mut p: Point) -> Point {
    p.pop();
    p
}

/// Whether the hyperplane through `vertices` is `u·x = 1` with `u` integral.
///
/// Points that do not span a hyperplane, or span one through the origin, are
/// not at height one.
pub fn facet_at_height_one(vertices: &[Point]) -> bool {
    let Some(first) = vertices.first() else {
        return false;
    };
    let n = first.len();
    if vertices.iter().any(|v| v.len() != n) {
        return false;
    }
    // Solutions (u, c) of u·v - c = 0 for every vertex.
    let rows: Vec<Point> = vertices
        .iter()
        .map(|v| {
            let mut row = v.clone();
            row.push(int(-1));
            row
        })
        .collect();
    let null = Matrix::from_rows_with_cols(rows, n + 1).null_space();
    let [plane] = null.as_slice() else {
        return false;
    };
    let c = &plane[n];
    if c.is_zero() {
        return false;
    }
    plane[..n].iter().all(|u| is_integral(&(u / c)))
}
