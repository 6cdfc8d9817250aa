//! Dense matrices over exact rationals.
//!
//! Matrices follow the column-vector convention: a matrix `A` acts on a point
//! `x` as `A·x`. All elimination is exact (Gauss-Jordan over [`Rational`]).

use std::fmt;
use std::ops::{Index, IndexMut};

use num_traits::{One, Zero};

use crate::types::{int, Point, Rational};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<Rational>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![Rational::zero(); rows * cols],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m[(i, i)] = Rational::one();
        }
        m
    }

    /// Builds a matrix from its rows.
    ///
    /// # Panics
    ///
    /// Panics if the rows have different lengths.
    pub fn from_rows(rows: Vec<Point>) -> Self {
        let cols = rows.first().map_or(0, Vec::len);
        Self::from_rows_with_cols(rows, cols)
    }

    /// Same as [`Matrix::from_rows`], but keeps the column count when there are no rows.
    pub fn from_rows_with_cols(rows: Vec<Point>, cols: usize) -> Self {
        let nrows = rows.len();
        let mut data = Vec::with_capacity(nrows * cols);
        for row in rows {
            assert_eq!(row.len(), cols, "All rows must have the same length");
            data.extend(row);
        }
        Self { rows: nrows, cols, data }
    }

    /// Builds a matrix whose columns are the given points.
    pub fn from_columns(columns: &[Point]) -> Self {
        let rows = columns.first().map_or(0, Vec::len);
        let mut m = Self::zeros(rows, columns.len());
        for (j, column) in columns.iter().enumerate() {
            assert_eq!(column.len(), rows, "All columns must have the same length");
            for (i, x) in column.iter().enumerate() {
                m[(i, j)] = x.clone();
            }
        }
        m
    }

    /// Builds a matrix from integer rows.
    pub fn from_integers<R, I>(rows: R) -> Self
    where
        R: IntoIterator<Item = I>,
        I: IntoIterator<Item = i64>,
    {
        Self::from_rows(rows.into_iter().map(|row| row.into_iter().map(int).collect()).collect())
    }

    /// Square diagonal matrix with the given integer entries.
    pub fn diagonal<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        let entries: Vec<i64> = entries.into_iter().collect();
        let mut m = Self::zeros(entries.len(), entries.len());
        for (i, &x) in entries.iter().enumerate() {
            m[(i, i)] = int(x);
        }
        m
    }

    pub fn nrows(&self) -> usize {
        self.rows
    }

    pub fn ncols(&self) -> usize {
        self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn row(&self, i: usize) -> &[Rational] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn column(&self, j: usize) -> Point {
        (0..self.rows).map(|i| self[(i, j)].clone()).collect()
    }

    pub fn transpose(&self) -> Self {
        let mut t = Self::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                t[(j, i)] = self[(i, j)].clone();
            }
        }
        t
    }

    /// Matrix-matrix product `self · other`.
    ///
    /// # Panics
    ///
    /// Panics if the inner dimensions differ.
    pub fn mul(&self, other: &Matrix) -> Matrix {
        assert_eq!(self.cols, other.rows, "Inner dimensions must agree");
        let mut result = Self::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = &self[(i, k)];
                if a.is_zero() {
                    continue;
                }
                for j in 0..other.cols {
                    result[(i, j)] += a * &other[(k, j)];
                }
            }
        }
        result
    }

    /// Matrix-vector product `self · v`.
    ///
    /// # Panics
    ///
    /// Panics if `v.len() != self.ncols()`.
    pub fn mul_vec(&self, v: &[Rational]) -> Point {
        assert_eq!(self.cols, v.len(), "Vector length must match column count");
        (0..self.rows)
            .map(|i| self.row(i).iter().zip(v).fold(Rational::zero(), |acc, (a, x)| acc + a * x))
            .collect()
    }

    /// Reduced row echelon form, together with the pivot columns.
    fn rref(&self) -> (Matrix, Vec<usize>) {
        let mut m = self.clone();
        let mut pivots = Vec::new();
        let mut r = 0;
        for c in 0..m.cols {
            if r == m.rows {
                break;
            }
            let Some(p) = (r..m.rows).find(|&i| !m[(i, c)].is_zero()) else {
                continue;
            };
            m.swap_rows(r, p);
            let pivot = m[(r, c)].clone();
            for j in c..m.cols {
                m[(r, j)] /= &pivot;
            }
            for i in 0..m.rows {
                if i != r && !m[(i, c)].is_zero() {
                    let factor = m[(i, c)].clone();
                    for j in c..m.cols {
                        let delta = &factor * &m[(r, j)];
                        m[(i, j)] -= delta;
                    }
                }
            }
            pivots.push(c);
            r += 1;
        }
        (m, pivots)
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for j in 0..self.cols {
            self.data.swap(a * self.cols + j, b * self.cols + j);
        }
    }

    pub fn rank(&self) -> usize {
        self.rref().1.len()
    }

    /// Indices of a maximal set of linearly independent columns.
    pub fn pivot_columns(&self) -> Vec<usize> {
        self.rref().1
    }

    /// Basis of the null space `{x : self·x = 0}`.
    pub fn null_space(&self) -> Vec<Point> {
        let (r, pivots) = self.rref();
        let free: Vec<usize> = (0..self.cols).filter(|c| !pivots.contains(c)).collect();
        free.iter()
            .map(|&f| {
                let mut v = vec![Rational::zero(); self.cols];
                v[f] = Rational::one();
                for (row, &p) in pivots.iter().enumerate() {
                    v[p] = -r[(row, f)].clone();
                }
                v
            })
            .collect()
    }

    /// Inverse via Gauss-Jordan elimination, or `None` if singular or not square.
    pub fn inverse(&self) -> Option<Matrix> {
        if !self.is_square() {
            return None;
        }
        let n = self.rows;
        if n == 0 {
            return Some(Self::zeros(0, 0));
        }
        let mut augmented = Self::zeros(n, 2 * n);
        for i in 0..n {
            for j in 0..n {
                augmented[(i, j)] = self[(i, j)].clone();
            }
            augmented[(i, n + i)] = Rational::one();
        }
        let (r, pivots) = augmented.rref();
        if pivots.len() < n || pivots[n - 1] >= n {
            return None;
        }
        let mut inv = Self::zeros(n, n);
        for i in 0..n {
            for j in 0..n {
                inv[(i, j)] = r[(i, n + j)].clone();
            }
        }
        Some(inv)
    }

    pub fn is_invertible(&self) -> bool {
        self.is_square() && self.rank() == self.rows
    }

    /// Determinant of a square matrix, or `None` if not square.
    pub fn determinant(&self) -> Option<Rational> {
        if !self.is_square() {
            return None;
        }
        let mut m = self.clone();
        let mut det = Rational::one();
        for c in 0..m.cols {
            let Some(p) = (c..m.rows).find(|&i| !m[(i, c)].is_zero()) else {
                return Some(Rational::zero());
            };
            if p != c {
                m.swap_rows(c, p);
                det = -det;
            }
            let pivot = m[(c, c)].clone();
            det *= &pivot;
            for i in c + 1..m.rows {
                let factor = &m[(i, c)] / &pivot;
                for j in c..m.cols {
                    let delta = &factor * &m[(c, j)];
                    m[(i, j)] -= delta;
                }
            }
        }
        Some(det)
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = Rational;

    fn index(&self, (i, j): (usize, usize)) -> &Rational {
        &self.data[i * self.cols + j]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut Rational {
        &mut self.data[i * self.cols + j]
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for i in 0..self.rows {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "[")?;
            for (j, x) in self.row(i).iter().enumerate() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", x)?;
            }
            write!(f, "]")?;
        }
        write!(f, "]")
    }
}
