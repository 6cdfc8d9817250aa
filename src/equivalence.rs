//! Equivalence of CDPs.
//!
//! Two CDPs are *equivalent* if the second one can be obtained from the first
//! by a linear change of coordinates on the base
//! ([`transform_base`][Cdp::transform_base]), a zero-sum
//! [`translate`][Cdp::translate] and a zero-sum [`shear`][Cdp::shear], up to
//! relabeling the base vertices and the functions.
//!
//! # Algorithm
//!
//! The search has two nested backtracking dimensions, each pruned as early as
//! possible, and stops at the first success:
//!
//! 1. **Vertex relabeling.** A permutation `perm` of the source base vertices
//!    is built position by position. Source vertex `perm[i]` is meant to land
//!    on target vertex `i`, so a partial permutation is abandoned as soon as
//!    two assigned positions disagree on adjacency in the two bases (for two
//!    identically labelled bases this enumerates exactly the automorphisms of
//!    the vertex-edge graph).
//! 2. **Transform fitting.** For a complete permutation, with `V` the source
//!    vertices in permuted order and `G` the target vertices (both as
//!    columns), the linear map `A = G·Vᵗ·(V·Vᵗ)⁻¹` is the least-squares
//!    solution of `A·V = G`. A singular `V·Vᵗ`, a singular `A`, or a
//!    transformed base different from the target base rejects the
//!    permutation.
//! 3. **Domain classes.** Every transformed source function is matched
//!    against the target functions with the same set of piece domains. A
//!    function without candidates, or a target function claimed by none,
//!    rejects the permutation. Candidates whose pieces do not differ by one
//!    uniform constant and one uniform linear offset are dropped.
//! 4. **Function relabeling.** Bijections choosing one candidate per function
//!    are enumerated; a bijection is accepted when the constant offsets sum
//!    to zero and the linear offsets are multiples `β_i·v` of one shared
//!    direction `v` with `Σ β_i = 0`.
//!
//! Failures inside the search (degenerate fits, singular maps, mismatched
//! classes) only reject the current candidate. The whole search can be bounded
//! with [`SearchConfig::max_candidates`].
//!
//! # Examples
//!
//! ```
//! use cdp_rs::affine::AffineFunction;
//! use cdp_rs::cdp::Cdp;
//! use cdp_rs::matrix::Matrix;
//! use cdp_rs::piecewise::PiecewiseAffineFunction;
//! use cdp_rs::polytope::Polytope;
//! use cdp_rs::types::{int, point, points};
//!
//! let base = Polytope::new(points([[-1], [1]])).unwrap();
//! let f = PiecewiseAffineFunction::new(vec![
//!     AffineFunction::new(vec![int(1), int(1)], Polytope::new(points([[-1], [0]])).unwrap()).unwrap(),
//!     AffineFunction::new(vec![int(1), int(-1)], Polytope::new(points([[0], [1]])).unwrap()).unwrap(),
//! ])
//! .unwrap();
//! let g = PiecewiseAffineFunction::new(vec![
//!     AffineFunction::new(vec![int(1), int(1)], base.clone()).unwrap(),
//! ])
//! .unwrap();
//! let cdp = Cdp::new(vec![f, g], base).unwrap();
//!
//! let other = cdp
//!     .clone()
//!     .sheared(&[int(2), int(-2)], &point([1]))
//!     .unwrap()
//!     .transformed(&Matrix::diagonal([-1]))
//!     .unwrap();
//! assert!(cdp.equal(&other));
//! ```

use log::{debug, info, trace};
use num_traits::Zero;

use crate::cdp::Cdp;
use crate::error::CdpError;
use crate::matrix::Matrix;
use crate::types::{is_zero_vector, Point, Rational};

/// Limits for the equivalence search.
///
/// # Examples
///
/// ```
/// use cdp_rs::equivalence::SearchConfig;
///
/// let unbounded = SearchConfig::default();
/// assert_eq!(unbounded.max_candidates, None);
///
/// let bounded = SearchConfig { max_candidates: Some(1000) };
/// ```
#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    /// Maximum number of candidates (fitted vertex permutations plus tested
    /// function mappings) to examine before giving up (default: unbounded).
    pub max_candidates: Option<u64>,
}

/// Counters describing how much of the search space was visited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Complete vertex permutations that passed the adjacency pruning.
    pub permutations: u64,
    /// Permutations whose vertices do not span the ambient space.
    pub degenerate_fits: u64,
    /// Permutations whose fitted map is singular or misses the target base.
    pub rejected_transforms: u64,
    /// Permutations without a consistent assignment of domain classes.
    pub class_failures: u64,
    /// Complete function mappings tested.
    pub mappings: u64,
}

/// Data proving an equivalence: applying it to the source CDP reproduces the
/// target CDP up to the order of functions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness {
    /// Source vertex `permutation[i]` is mapped onto target vertex `i`.
    pub permutation: Vec<usize>,
    /// The linear change of coordinates on the base.
    pub transform: Matrix,
    /// Source function `i` is mapped onto target function `mapping[i]`.
    pub mapping: Vec<usize>,
    /// Per-function translation, summing to zero.
    pub translation: Vec<Rational>,
    /// Per-function shear weights, summing to zero.
    pub shear: Vec<Rational>,
    /// Shared shear direction.
    pub direction: Point,
}

impl Witness {
    /// Transforms, translates and shears `cdp` as recorded.
    pub fn apply(&self, cdp: &Cdp) -> Result<Cdp, CdpError> {
        cdp.clone()
            .transformed(&self.transform)?
            .translated(&self.translation)?
            .sheared(&self.shear, &self.direction)
    }
}

/// Result of an equivalence search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The CDPs are equivalent, as shown by the witness.
    Equivalent(Witness),
    /// Every candidate was examined and none fits.
    NotEquivalent,
    /// The candidate budget ran out before the search finished.
    BudgetExhausted,
}

impl Outcome {
    /// Whether a witness was found.
    pub fn is_equivalent(&self) -> bool {
        matches!(self, Outcome::Equivalent(_))
    }
}

/// Decides whether `target` is equivalent to `source`, searching exhaustively.
pub fn equal(source: &Cdp, target: &Cdp) -> bool {
    find_equivalence(source, target, &SearchConfig::default()).0.is_equivalent()
}

/// Searches for a witness of equivalence within the given limits.
pub fn find_equivalence(source: &Cdp, target: &Cdp, config: &SearchConfig) -> (Outcome, SearchStats) {
    if let Some(reason) = quick_reject(source, target) {
        debug!("not equivalent: {}", reason);
        return (Outcome::NotEquivalent, SearchStats::default());
    }

    debug!(
        "searching equivalence: {} vertices, {} functions, dimension {}",
        source.vertex_count(),
        source.function_count(),
        source.dim()
    );
    let mut search = Search {
        source,
        target,
        target_vertices: Matrix::from_columns(target.base().vertices()),
        config,
        stats: SearchStats::default(),
        candidates: 0,
    };
    let k = source.vertex_count();
    let outcome = search
        .permutations(&mut Vec::with_capacity(k), &mut vec![false; k])
        .unwrap_or(Outcome::NotEquivalent);
    match &outcome {
        Outcome::Equivalent(w) => info!(
            "equivalent: permutation {:?}, transform {}, mapping {:?}",
            w.permutation, w.transform, w.mapping
        ),
        Outcome::NotEquivalent => debug!("not equivalent: search space exhausted ({:?})", search.stats),
        Outcome::BudgetExhausted => debug!("search budget exhausted ({:?})", search.stats),
    }
    (outcome, search.stats)
}

fn quick_reject(source: &Cdp, target: &Cdp) -> Option<&'static str> {
    if source.vertex_count() != target.vertex_count() {
        Some("vertex counts differ")
    } else if source.function_count() != target.function_count() {
        Some("function counts differ")
    } else if source.dim() != target.dim() {
        Some("base dimensions differ")
    } else if source.base().edges().len() != target.base().edges().len() {
        Some("edge counts differ")
    } else {
        None
    }
}

impl Cdp {
    /// Whether `other` is equivalent to this CDP. See [`equal`].
    pub fn equal(&self, other: &Cdp) -> bool {
        equal(self, other)
    }

    /// See [`find_equivalence`].
    pub fn find_equivalence(&self, other: &Cdp, config: &SearchConfig) -> (Outcome, SearchStats) {
        find_equivalence(self, other, config)
    }
}

/// A target function that a transformed source function may be mapped onto,
/// with the uniform offsets between the two.
#[derive(Debug, Clone)]
struct PairFit {
    target: usize,
    alpha: Rational,
    delta: Point,
}

/// A fitted vertex permutation under examination.
struct Candidate<'p> {
    permutation: &'p [usize],
    transform: Matrix,
    classes: Vec<Vec<PairFit>>,
}

struct Search<'a> {
    source: &'a Cdp,
    target: &'a Cdp,
    target_vertices: Matrix,
    config: &'a SearchConfig,
    stats: SearchStats,
    candidates: u64,
}

impl Search<'_> {
    /// Spends one unit of budget; false when there is none left.
    fn spend(&mut self) -> bool {
        if let Some(max) = self.config.max_candidates {
            if self.candidates >= max {
                return false;
            }
        }
        self.candidates += 1;
        true
    }

    /// Extends the partial permutation; `Some` stops the whole search.
    fn permutations(&mut self, perm: &mut Vec<usize>, used: &mut [bool]) -> Option<Outcome> {
        let pos = perm.len();
        if pos == used.len() {
            return self.try_permutation(perm);
        }
        for c in 0..used.len() {
            if used[c] {
                continue;
            }
            let consistent = perm
                .iter()
                .enumerate()
                .all(|(p, &v)| self.source.adjacent(c, v) == self.target.adjacent(pos, p));
            if !consistent {
                continue;
            }
            used[c] = true;
            perm.push(c);
            let outcome = self.permutations(perm, used);
            perm.pop();
            used[c] = false;
            if outcome.is_some() {
                return outcome;
            }
        }
        None
    }

    fn try_permutation(&mut self, perm: &[usize]) -> Option<Outcome> {
        if !self.spend() {
            return Some(Outcome::BudgetExhausted);
        }
        self.stats.permutations += 1;
        trace!("trying vertex permutation {:?}", perm);

        let columns: Vec<Point> = perm.iter().map(|&i| self.source.base().vertex(i).clone()).collect();
        let v = Matrix::from_columns(&columns);
        let vt = v.transpose();
        let Some(gram_inverse) = v.mul(&vt).inverse() else {
            debug!("permutation {:?}: vertices do not span the space, skipping", perm);
            self.stats.degenerate_fits += 1;
            return None;
        };
        let transform = self.target_vertices.mul(&vt).mul(&gram_inverse);

        let transformed = match self.source.clone().transformed(&transform) {
            Ok(cdp) => cdp,
            Err(e) => {
                trace!("permutation {:?}: fitted map {} rejected: {}", perm, transform, e);
                self.stats.rejected_transforms += 1;
                return None;
            }
        };
        if transformed.base() != self.target.base() {
            trace!("permutation {:?}: fitted map {} misses the target base", perm, transform);
            self.stats.rejected_transforms += 1;
            return None;
        }

        let Some(classes) = self.classes(&transformed) else {
            trace!("permutation {:?}: domain classes do not match", perm);
            self.stats.class_failures += 1;
            return None;
        };

        let candidate = Candidate {
            permutation: perm,
            transform,
            classes,
        };
        let m = self.source.function_count();
        let mut chosen = Vec::with_capacity(m);
        self.mappings(&candidate, &mut chosen, &mut vec![false; m])
    }

    /// Candidate targets for every transformed source function, or `None` if
    /// some function (on either side) can have no partner.
    fn classes(&self, transformed: &Cdp) -> Option<Vec<Vec<PairFit>>> {
        let sources = transformed.psi_list();
        let targets = self.target.psi_list();

        let mut claimed = vec![false; targets.len()];
        let mut classes = Vec::with_capacity(sources.len());
        for f in sources {
            let members: Vec<usize> = (0..targets.len()).filter(|&j| f.domains_match(&targets[j])).collect();
            if members.is_empty() {
                return None;
            }
            for &j in &members {
                claimed[j] = true;
            }
            let fits: Vec<PairFit> = members
                .into_iter()
                .filter_map(|j| {
                    Some(PairFit {
                        target: j,
                        alpha: f.can_be_translated(&targets[j])?,
                        delta: f.can_be_sheared(&targets[j])?,
                    })
                })
                .collect();
            classes.push(fits);
        }
        if claimed.contains(&false) {
            return None;
        }
        if classes.iter().any(Vec::is_empty) {
            trace!("some function admits no uniform translation and shear");
            return None;
        }
        Some(classes)
    }

    /// Assigns distinct targets to the source functions one by one.
    fn mappings<'c>(
        &mut self,
        candidate: &'c Candidate<'_>,
        chosen: &mut Vec<&'c PairFit>,
        used: &mut [bool],
    ) -> Option<Outcome> {
        let i = chosen.len();
        if i == candidate.classes.len() {
            if !self.spend() {
                return Some(Outcome::BudgetExhausted);
            }
            self.stats.mappings += 1;
            return self.check_mapping(candidate, chosen).map(Outcome::Equivalent);
        }
        for fit in &candidate.classes[i] {
            if used[fit.target] {
                continue;
            }
            used[fit.target] = true;
            chosen.push(fit);
            let outcome = self.mappings(candidate, chosen, used);
            chosen.pop();
            used[fit.target] = false;
            if outcome.is_some() {
                return outcome;
            }
        }
        None
    }

    /// Checks the zero-sum constraints of a complete mapping.
    fn check_mapping(&self, candidate: &Candidate<'_>, chosen: &[&PairFit]) -> Option<Witness> {
        let translation: Vec<Rational> = chosen.iter().map(|fit| fit.alpha.clone()).collect();
        let total = translation.iter().fold(Rational::zero(), |acc, a| acc + a);
        if !total.is_zero() {
            trace!("mapping rejected: translations sum to {}", total);
            return None;
        }

        let n = self.source.dim();
        let direction = chosen
            .iter()
            .map(|fit| &fit.delta)
            .find(|delta| !is_zero_vector(delta))
            .cloned()
            .unwrap_or_else(|| vec![Rational::zero(); n]);
        let shear = chosen
            .iter()
            .map(|fit| shear_weight(&fit.delta, &direction))
            .collect::<Option<Vec<Rational>>>()?;
        let total = shear.iter().fold(Rational::zero(), |acc, b| acc + b);
        if !total.is_zero() {
            trace!("mapping rejected: shear weights sum to {}", total);
            return None;
        }

        Some(Witness {
            permutation: candidate.permutation.to_vec(),
            transform: candidate.transform.clone(),
            mapping: chosen.iter().map(|fit| fit.target).collect(),
            translation,
            shear,
            direction,
        })
    }
}

/// The `beta` with `delta == beta · direction`, if any.
fn shear_weight(delta: &[Rational], direction: &[Rational]) -> Option<Rational> {
    let Some(k) = direction.iter().position(|x| !x.is_zero()) else {
        return is_zero_vector(delta).then(Rational::zero);
    };
    let beta = &delta[k] / &direction[k];
    let fits = delta.iter().zip(direction).all(|(d, v)| *d == &beta * v);
    fits.then_some(beta)
}
