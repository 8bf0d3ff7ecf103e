//! The R-vine matrix: a lower-triangular structure array plus the index
//! tables (natural order, max-array, needed-h-function masks) the cascade
//! evaluator and structure selection both depend on.

use ndarray::Array2;

use crate::error::{Error, Result};

/// A validated R-vine structure matrix, together with its derived index
/// tables, each computed once at construction and cached.
#[derive(Clone, Debug)]
pub struct RVineMatrix {
    /// The raw `d x d` lower-triangular matrix as given (1-indexed variable
    /// labels; zeros above the diagonal).
    matrix: Array2<u32>,
    order: Vec<u32>,
    natural_order_matrix: Array2<u32>,
    max_matrix: Array2<u32>,
    needed_hfunc1: Array2<bool>,
    needed_hfunc2: Array2<bool>,
}

impl RVineMatrix {
    /// Validates `matrix` against the R-vine axioms and builds the derived
    /// index tables.
    ///
    /// # Errors
    /// Returns [`Error::Structure`] if `matrix` is not square, has a
    /// nonzero entry above the diagonal, contains labels outside `1..=d`,
    /// repeats a diagonal entry further right in its row, has a column
    /// whose entries are not a subset of every column to its left, or
    /// violates the proximity condition.
    pub fn new(matrix: Array2<u32>) -> Result<Self> {
        let (rows, cols) = matrix.dim();
        if rows != cols {
            return Err(Error::Structure(format!("R-vine matrix must be square, got {rows}x{cols}")));
        }
        let d = rows;
        for j in 0..d {
            for i in 0..d {
                let value = matrix[[i, j]];
                if i < j && value != 0 {
                    return Err(Error::Structure(format!(
                        "R-vine matrix must be lower triangular, found nonzero at ({i}, {j})"
                    )));
                }
                if i >= j && !(1..=d as u32).contains(&value) {
                    return Err(Error::Structure(format!(
                        "R-vine matrix entry at ({i}, {j}) = {value} is outside 1..={d}"
                    )));
                }
            }
        }

        let diagonal: Vec<u32> = (0..d).map(|j| matrix[[j, j]]).collect();
        for (j, &label) in diagonal.iter().enumerate() {
            for k in (j + 1)..d {
                if matrix[[k, k]] == label {
                    return Err(Error::Structure(format!(
                        "diagonal label {label} repeats at column {k} (first at {j})"
                    )));
                }
            }
        }

        for j in 1..d {
            let prev_column: std::collections::HashSet<u32> =
                (j..d).map(|i| matrix[[i, j - 1]]).chain(std::iter::once(diagonal[j - 1])).collect();
            for i in (j + 1)..d {
                let value = matrix[[i, j]];
                if !prev_column.contains(&value) && value != diagonal[j] {
                    return Err(Error::Structure(format!(
                        "column {j} entry {value} does not also appear in column {}",
                        j - 1
                    )));
                }
            }
        }

        let (natural_order_matrix, order) = Self::compute_natural_order(&matrix, &diagonal);
        Self::check_proximity_condition(&natural_order_matrix)?;
        let max_matrix = Self::compute_max_matrix(&natural_order_matrix);
        let (needed_hfunc1, needed_hfunc2) = Self::compute_needed_hfuncs(&natural_order_matrix, &max_matrix);

        Ok(Self { matrix, order, natural_order_matrix, max_matrix, needed_hfunc1, needed_hfunc2 })
    }

    /// Builds the canonical D-vine matrix for the given variable `order`
    /// (a path `order[0] - order[1] - ... - order[d-1]` in the first tree).
    ///
    /// # Errors
    /// Returns [`Error::Structure`] if `order` is not a permutation of
    /// `1..=order.len()`.
    pub fn construct_d_vine_matrix(order: &[u32]) -> Result<Self> {
        let d = order.len();
        let mut seen = vec![false; d + 1];
        for &label in order {
            if label == 0 || label as usize > d || seen[label as usize] {
                return Err(Error::Structure("D-vine order must be a permutation of 1..=d".to_string()));
            }
            seen[label as usize] = true;
        }

        let mut matrix = Array2::zeros((d, d));
        for j in 0..d {
            matrix[[j, j]] = order[d - 1 - j];
            for i in (j + 1)..d {
                matrix[[i, j]] = order[d - 1 - i];
            }
        }
        Self::new(matrix)
    }

    /// The raw structure matrix as given at construction.
    #[must_use]
    pub const fn matrix(&self) -> &Array2<u32> {
        &self.matrix
    }

    /// The dimension `d`.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    /// The permutation mapping natural-order position to original variable
    /// label (`order[j]` is the label that became `d - j` on the diagonal).
    #[must_use]
    pub fn order(&self) -> &[u32] {
        &self.order
    }

    /// The matrix relabeled so column `j`'s diagonal entry is `d - j`.
    #[must_use]
    pub const fn in_natural_order(&self) -> &Array2<u32> {
        &self.natural_order_matrix
    }

    /// The running column-wise maximum (in natural order), used to decide
    /// which previous-tree h-function is consumed at `(t, e)`.
    #[must_use]
    pub const fn get_max_matrix(&self) -> &Array2<u32> {
        &self.max_matrix
    }

    /// `true` at `(t, e)` iff the cascade recursion needs `hfunc1` of
    /// column `e` after processing tree `t`.
    #[must_use]
    pub const fn get_needed_hfunc1(&self) -> &Array2<bool> {
        &self.needed_hfunc1
    }

    /// `true` at `(t, e)` iff the cascade recursion needs `hfunc2` of
    /// column `e` after processing tree `t`.
    #[must_use]
    pub const fn get_needed_hfunc2(&self) -> &Array2<bool> {
        &self.needed_hfunc2
    }

    fn compute_natural_order(matrix: &Array2<u32>, diagonal: &[u32]) -> (Array2<u32>, Vec<u32>) {
        let d = matrix.nrows();
        // order[j] = original label that must be relabeled to d - j
        let order: Vec<u32> = diagonal.iter().rev().copied().collect();
        let mut relabel = vec![0u32; d + 1];
        for (new_index, &old_label) in order.iter().enumerate() {
            // order[new_index] = diagonal[d - 1 - new_index], so the label
            // sitting at `new_index` in the reversed list is column
            // `d - 1 - new_index`'s original diagonal entry, which this
            // relabeling must send to `d - (d - 1 - new_index) = new_index + 1`.
            relabel[old_label as usize] = new_index as u32 + 1;
        }

        let mut out = Array2::zeros((d, d));
        for j in 0..d {
            for i in j..d {
                let value = matrix[[i, j]];
                out[[i, j]] = relabel[value as usize];
            }
        }
        (out, order)
    }

    fn check_proximity_condition(natural: &Array2<u32>) -> Result<()> {
        let d = natural.nrows();
        for j in 0..d.saturating_sub(1) {
            for i in (j + 1)..(d - 1) {
                let conditioned_tail: std::collections::HashSet<u32> =
                    ((i + 1)..d).map(|k| natural[[k, j]]).collect();
                let diag = natural[[j, j]];
                let value = natural[[i, j]];
                let needle: std::collections::HashSet<u32> =
                    conditioned_tail.iter().copied().chain([diag, value]).collect();

                let mut found = false;
                'search: for col in 0..j {
                    let col_diag = natural[[col, col]];
                    for row in col..d {
                        let row_value = natural[[row, col]];
                        let tail: std::collections::HashSet<u32> = ((row + 1)..d).map(|k| natural[[k, col]]).collect();
                        let candidate: std::collections::HashSet<u32> =
                            tail.iter().copied().chain([col_diag, row_value]).collect();
                        if candidate == needle {
                            found = true;
                            break 'search;
                        }
                    }
                }
                if !found && i + 1 < d {
                    // The proximity condition is necessarily satisfied by any
                    // matrix built through `construct_d_vine_matrix` or
                    // Dissmann reassembly; this check only rejects matrices
                    // supplied directly by a caller with an invalid structure.
                    return Err(Error::Structure(format!(
                        "R-vine matrix violates the proximity condition at natural-order position ({i}, {j})"
                    )));
                }
            }
        }
        Ok(())
    }

    fn compute_max_matrix(natural: &Array2<u32>) -> Array2<u32> {
        let d = natural.nrows();
        let mut max_matrix = Array2::zeros((d, d));
        for j in 0..d {
            let mut running_max = 0;
            for i in j..d {
                running_max = running_max.max(natural[[i, j]]);
                max_matrix[[i, j]] = running_max;
            }
        }
        max_matrix
    }

    fn compute_needed_hfuncs(natural: &Array2<u32>, max_matrix: &Array2<u32>) -> (Array2<bool>, Array2<bool>) {
        let d = natural.nrows();
        let mut needed_hfunc1 = Array2::from_elem((d, d), false);
        let mut needed_hfunc2 = Array2::from_elem((d, d), false);
        for t in 0..d.saturating_sub(1) {
            for e in 0..(d - t - 1) {
                let m = max_matrix[[t, e]];
                if m == natural[[t, e]] {
                    needed_hfunc2[[t + 1, e]] = true;
                } else {
                    needed_hfunc1[[t + 1, e]] = true;
                    needed_hfunc2[[t + 1, e]] = true;
                }
            }
        }
        (needed_hfunc1, needed_hfunc2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn reference_matrix() -> Array2<u32> {
        array![
            [4, 0, 0, 0, 0, 0, 0],
            [7, 3, 0, 0, 0, 0, 0],
            [3, 7, 7, 0, 0, 0, 0],
            [1, 1, 5, 1, 0, 0, 0],
            [2, 5, 2, 5, 2, 0, 0],
            [6, 6, 1, 2, 5, 5, 0],
            [5, 2, 6, 6, 6, 6, 6],
        ]
    }

    #[test]
    fn natural_order_matches_reference() {
        let rvm = RVineMatrix::new(reference_matrix()).unwrap();
        let expected = array![
            [7, 0, 0, 0, 0, 0, 0],
            [5, 6, 0, 0, 0, 0, 0],
            [6, 5, 5, 0, 0, 0, 0],
            [4, 4, 2, 4, 0, 0, 0],
            [3, 2, 3, 2, 3, 0, 0],
            [1, 1, 4, 3, 2, 2, 0],
            [2, 3, 1, 1, 1, 1, 1],
        ];
        assert_eq!(*rvm.in_natural_order(), expected);
    }

    #[test]
    fn max_matrix_matches_reference() {
        let rvm = RVineMatrix::new(reference_matrix()).unwrap();
        let expected = array![
            [7, 0, 0, 0, 0, 0, 0],
            [6, 6, 0, 0, 0, 0, 0],
            [6, 5, 5, 0, 0, 0, 0],
            [4, 4, 4, 4, 0, 0, 0],
            [3, 3, 4, 3, 3, 0, 0],
            [2, 3, 4, 3, 2, 2, 0],
            [2, 3, 1, 1, 1, 1, 1],
        ];
        assert_eq!(*rvm.get_max_matrix(), expected);
    }

    #[test]
    fn needed_hfunc1_matches_reference() {
        let rvm = RVineMatrix::new(reference_matrix()).unwrap();
        let expected = array![
            [false, false, false, false, false, false, false],
            [true, false, false, false, false, false, false],
            [true, true, true, false, false, false, false],
            [true, true, true, true, false, false, false],
            [true, true, true, true, true, false, false],
            [true, true, true, true, true, true, false],
            [true, true, true, true, true, true, false],
        ];
        assert_eq!(*rvm.get_needed_hfunc1(), expected);
    }

    #[test]
    fn needed_hfunc2_matches_reference() {
        let rvm = RVineMatrix::new(reference_matrix()).unwrap();
        let expected = array![
            [false, false, false, false, false, false, false],
            [false, true, false, false, false, false, false],
            [false, false, false, false, false, false, false],
            [false, false, false, true, false, false, false],
            [false, false, false, true, true, false, false],
            [false, false, false, false, true, true, false],
            [false, false, false, false, false, false, false],
        ];
        assert_eq!(*rvm.get_needed_hfunc2(), expected);
    }

    #[test]
    fn d_vine_constructor_accepts_a_permutation() {
        let rvm = RVineMatrix::construct_d_vine_matrix(&[1, 2, 3, 4]).unwrap();
        assert_eq!(rvm.dim(), 4);
    }

    #[test]
    fn d_vine_constructor_rejects_non_permutation() {
        assert!(RVineMatrix::construct_d_vine_matrix(&[1, 1, 3, 4]).is_err());
    }

    #[test]
    fn rejects_non_square_matrix() {
        let matrix = array![[1, 0], [2, 2], [3, 1]];
        assert!(RVineMatrix::new(matrix).is_err());
    }

    #[test]
    fn rejects_nonzero_above_diagonal() {
        let matrix = array![[2, 1], [1, 1]];
        assert!(RVineMatrix::new(matrix).is_err());
    }
}
