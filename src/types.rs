/**
 * ShowReco
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use fnv::FnvHashSet;

/// Term-frequency vector, one entry per vocabulary column
pub type DenseVector = Vec<u32>;

/// Set of item ids liked by a single user (or of user ids liking a single item)
pub type LikeSet = FnvHashSet<u32>;

/// Rows are indexed by dense user (or item) index
pub type SparseBinaryMatrix = Vec<LikeSet>;

pub fn new_dense_vector(dimensions: usize) -> DenseVector {
    vec![0; dimensions]
}

pub fn new_like_set() -> LikeSet {
    FnvHashSet::with_capacity_and_hasher(10, Default::default())
}

pub fn new_sparse_binary_matrix(num_rows: usize) -> SparseBinaryMatrix {
    vec![FnvHashSet::with_capacity_and_hasher(0, Default::default()); num_rows]
}

/// Read access to the rows of a preference matrix. Lets the evaluation swap in a reduced
/// row for a single user without touching the shared matrix.
pub trait LikesView {
    fn row(&self, index: u32) -> &LikeSet;
}

impl LikesView for SparseBinaryMatrix {
    fn row(&self, index: u32) -> &LikeSet {
        &self[index as usize]
    }
}

/// A preference matrix where the row of exactly one user is replaced.
pub struct Overlay<'a> {
    pub base: &'a SparseBinaryMatrix,
    pub index: u32,
    pub replacement: &'a LikeSet,
}

impl<'a> LikesView for Overlay<'a> {
    fn row(&self, index: u32) -> &LikeSet {
        if index == self.index {
            self.replacement
        } else {
            &self.base[index as usize]
        }
    }
}

#[cfg(test)]
mod tests {

    use crate::types;
    use crate::types::{LikesView, Overlay};

    #[test]
    fn overlay_replaces_single_row() {
        let mut matrix = types::new_sparse_binary_matrix(2);
        matrix[0].insert(1);
        matrix[0].insert(2);
        matrix[1].insert(3);

        let mut reduced = types::new_like_set();
        reduced.insert(2);

        let overlay = Overlay { base: &matrix, index: 0, replacement: &reduced };

        assert_eq!(overlay.row(0).len(), 1);
        assert!(overlay.row(1).contains(&3));
        assert_eq!(matrix.row(0).len(), 2);
    }
}
