//! Matrices.
//! See the module documentation for [`crate::vector`].
//! The same thing applies here.
//!
//! The rows are stored as separate [`OwnedVector`]s, so exchanging two rows
//! (which is what the reduction does all the time) only exchanges the
//! handles and doesn't copy any (possibly huge) entries.

use std::{
    fmt::Debug,
    ops::{Index, IndexMut},
};

use itertools::iproduct;

use crate::{
    error::{LllError, Result},
    rings::Ring,
    vector::OwnedVector,
};

/// A dense matrix that owns its entries.
pub struct OwnedMatrix<R: Ring> {
    rows: Vec<OwnedVector<R>>,
    cols: usize,
}

impl<R: Ring> OwnedMatrix<R> {
    /// Returns an r×c zero matrix.
    pub fn zero(r: usize, c: usize) -> Self {
        Self {
            rows: (0..r).map(|_| OwnedVector::zero(c)).collect(),
            cols: c,
        }
    }

    /// Returns an nxn identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zero(n, n);
        for i in 0..n {
            m[(i, i)] = R::one();
        }
        m
    }

    /// Creates a matrix from an iterator in row-major order.
    pub fn from_iter<I: Iterator<Item = R::Element>>(r: usize, c: usize, mut iter: I) -> Self {
        let rows = (0..r)
            .map(|_| OwnedVector::from_iter(iter.by_ref().take(c)))
            .collect::<Vec<_>>();
        assert!(
            rows.iter().all(|row| row.dim() == c),
            "The iterator needs to return at least r * c items."
        );
        Self { rows, cols: c }
    }

    /// Creates a matrix from slice of rows. Panics if the rows have
    /// different lengths, see [`Self::try_from_rows`] for a fallible version.
    pub fn from_rows<U, V>(rows: &[U]) -> Self
    where
        U: AsRef<[V]>,
        V: Into<R::Element> + Clone,
    {
        let rows = rows
            .iter()
            .map(|r| r.as_ref().iter().map(|e| e.clone().into()).collect())
            .collect();
        match Self::try_from_rows(rows) {
            Ok(m) => m,
            Err(e) => panic!("{e}"),
        }
    }

    /// Creates a matrix from rows of ring elements.
    /// Fails if the rows don't all have the same length.
    pub fn try_from_rows(rows: Vec<Vec<R::Element>>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != cols) {
            return Err(LllError::RaggedRows {
                row,
                expected: cols,
                found: r.len(),
            });
        }

        Ok(Self {
            rows: rows.into_iter().map(OwnedVector::from_raw_entries).collect(),
            cols,
        })
    }

    /// Creates a matrix from row vectors of dimension `cols`.
    pub fn from_row_vectors(rows: Vec<OwnedVector<R>>, cols: usize) -> Self {
        assert!(rows.iter().all(|r| r.dim() == cols));
        Self { rows, cols }
    }

    /// Returns the number of rows.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Returns the number of columns.
    pub fn num_cols(&self) -> usize {
        self.cols
    }

    /// Is the matrix square?
    pub fn is_square(&self) -> bool {
        self.num_rows() == self.num_cols()
    }

    /// Returns a reference to the row `r`.
    pub fn row(&self, r: usize) -> &OwnedVector<R> {
        &self.rows[r]
    }

    /// Returns a mutable reference to the row `r`.
    pub fn row_mut(&mut self, r: usize) -> &mut OwnedVector<R> {
        &mut self.rows[r]
    }

    /// Returns an iterator over the entries of column `c`.
    pub fn col(&self, c: usize) -> impl DoubleEndedIterator<Item = &R::Element> {
        self.rows.iter().map(move |r| &r[c])
    }

    /// Returns a reference to an entry.
    pub fn entry(&self, r: usize, c: usize) -> &R::Element {
        &self.rows[r][c]
    }

    /// Returns a mutable reference to an entry.
    pub fn entry_mut(&mut self, r: usize, c: usize) -> &mut R::Element {
        &mut self.rows[r][c]
    }

    /// Returns an iterator over the rows.
    pub fn rows(&self) -> std::slice::Iter<'_, OwnedVector<R>> {
        self.rows.iter()
    }

    /// Returns an iterator over the rows.
    pub fn rows_mut(&mut self) -> std::slice::IterMut<'_, OwnedVector<R>> {
        self.rows.iter_mut()
    }

    /// Returns an iterator over the entries in row-major order.
    pub fn entries_row_major(&self) -> impl Iterator<Item = &R::Element> {
        self.rows().flat_map(|r| r.iter())
    }

    /// Call a function on each entry and return the resulting matrix.
    pub fn transform<U: Ring, F: FnMut(&R::Element) -> U::Element>(
        &self,
        mut f: F,
    ) -> OwnedMatrix<U> {
        OwnedMatrix {
            rows: self.rows().map(|r| r.transform(&mut f)).collect(),
            cols: self.cols,
        }
    }

    /// Like [`Self::transform`], but the function can fail.
    /// The error also receives the row and column of the entry.
    pub fn try_transform<U, E, F>(&self, mut f: F) -> std::result::Result<OwnedMatrix<U>, E>
    where
        U: Ring,
        F: FnMut(usize, usize, &R::Element) -> std::result::Result<U::Element, E>,
    {
        let rows = self
            .rows()
            .enumerate()
            .map(|(i, row)| {
                row.iter()
                    .enumerate()
                    .map(|(j, e)| f(i, j, e))
                    .collect::<std::result::Result<Vec<_>, E>>()
                    .map(OwnedVector::from_raw_entries)
            })
            .collect::<std::result::Result<Vec<_>, E>>()?;
        Ok(OwnedMatrix {
            rows,
            cols: self.cols,
        })
    }

    /// Swap two rows. This only exchanges the row handles.
    pub fn swap_rows(&mut self, i: usize, j: usize) {
        self.rows.swap(i, j);
    }

    /// Swap two columns.
    pub fn swap_columns(&mut self, i: usize, j: usize) {
        if i == j {
            return;
        }

        for r in self.rows_mut() {
            r.as_slice_mut().swap(i, j);
        }
    }

    /// Returns a mutable references to two rows of the matrix. Panics if the
    /// indices are the same.
    pub fn get_rows_mut(&mut self, i: usize, j: usize) -> (&mut OwnedVector<R>, &mut OwnedVector<R>) {
        assert_ne!(i, j, "Tried to mutably borrow the same row twice.");
        if i < j {
            let (l, h) = self.rows.split_at_mut(j);
            (&mut l[i], &mut h[0])
        } else {
            let (l, h) = self.rows.split_at_mut(i);
            (&mut h[0], &mut l[j])
        }
    }

    /// Creates an owned matrix that is the transpose of the current matrix.
    pub fn transposed(&self) -> Self {
        Self::from_iter(
            self.num_cols(),
            self.num_rows(),
            iproduct!(0..self.num_cols(), 0..self.num_rows()).map(|(c, r)| self[(r, c)].clone()),
        )
    }

    /// Subtract a scaled row from another row. N -= M * c.
    /// `m` and `n` can not be equal.
    pub fn row_multiply_sub(&mut self, n: usize, m: usize, c: &R::Element, r: &R) {
        let (n, m) = self.get_rows_mut(n, m);
        n.mul_sub_assign(c, m, r);
    }

    /// Add a scaled column to another column. N += M * c.
    /// `m` and `n` can not be equal.
    pub fn col_multiply_add(&mut self, n: usize, m: usize, c: &R::Element, r: &R) {
        assert_ne!(m, n);
        for row in self.rows_mut() {
            let (s, t) = if n < m {
                let (l, h) = row.as_slice_mut().split_at_mut(m);
                (&mut l[n], &h[0])
            } else {
                let (l, h) = row.as_slice_mut().split_at_mut(n);
                (&mut h[0], &l[m])
            };
            r.mul_add_assign(s, t, c);
        }
    }

    /// Subtract a scaled column from another column. N -= M * c.
    /// `m` and `n` can not be equal.
    pub fn col_multiply_sub(&mut self, n: usize, m: usize, c: &R::Element, r: &R) {
        self.col_multiply_add(n, m, &r.neg(c.clone()), r);
    }

    /// Multiply two matrices.
    pub fn mul(&self, rhs: &Self, ring: &R) -> Self {
        assert_eq!(self.num_cols(), rhs.num_rows());
        let r = self.num_rows();
        let c = rhs.num_cols();
        let iter = iproduct!(0..r, 0..c).map(|(r, c)| {
            self.row(r)
                .iter()
                .zip(rhs.col(c))
                .fold(R::zero(), |acc, (a, b)| ring.mul_add(acc, a, b))
        });
        Self::from_iter(r, c, iter)
    }

    /// Computes `self * rhsᵀ`, i.e. the matrix of dot products of the rows.
    pub fn mul_transposed(&self, rhs: &Self, ring: &R) -> Self {
        assert_eq!(self.num_cols(), rhs.num_cols());
        let iter = iproduct!(0..self.num_rows(), 0..rhs.num_rows())
            .map(|(i, j)| self.row(i).dot(rhs.row(j), ring));
        Self::from_iter(self.num_rows(), rhs.num_rows(), iter)
    }
}

impl<R: Ring> Index<usize> for OwnedMatrix<R> {
    type Output = OwnedVector<R>;

    fn index(&self, index: usize) -> &Self::Output {
        self.row(index)
    }
}

impl<R: Ring> IndexMut<usize> for OwnedMatrix<R> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        self.row_mut(index)
    }
}

impl<R: Ring> Index<(usize, usize)> for OwnedMatrix<R> {
    type Output = R::Element;

    fn index(&self, (r, c): (usize, usize)) -> &Self::Output {
        self.entry(r, c)
    }
}

impl<R: Ring> IndexMut<(usize, usize)> for OwnedMatrix<R> {
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut Self::Output {
        self.entry_mut(r, c)
    }
}

impl<R: Ring> PartialEq for OwnedMatrix<R> {
    fn eq(&self, other: &Self) -> bool {
        self.num_rows() == other.num_rows()
            && self.num_cols() == other.num_cols()
            && self.rows().zip(other.rows()).all(|(a, b)| a.as_slice() == b.as_slice())
    }
}

impl<R: Ring> Clone for OwnedMatrix<R> {
    fn clone(&self) -> Self {
        Self {
            rows: self.rows.clone(),
            cols: self.cols,
        }
    }
}

impl<R: Ring> Debug for OwnedMatrix<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.rows()).finish()
    }
}
