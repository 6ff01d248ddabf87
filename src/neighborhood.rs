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

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::trace;

use crate::error::SimilarityError;
use crate::similarity;
use crate::types::LikesView;
use crate::vectors::FeatureMatrix;

/// Number of neighbors used for recommendations unless configured otherwise
pub const DEFAULT_NUM_NEIGHBORS: usize = 10;

/// Pairwise similarity between two users, identified by their dense index.
pub trait UserSimilarity {
    fn similarity(&self, user: u32, other_user: u32) -> Result<f64, SimilarityError>;
}

/// Cosine similarity of the users' like-sets
pub struct LikeSetCosine<'a, V: LikesView> {
    pub likes: &'a V,
}

impl<'a, V: LikesView> UserSimilarity for LikeSetCosine<'a, V> {
    fn similarity(&self, user: u32, other_user: u32) -> Result<f64, SimilarityError> {
        similarity::set_cosine(self.likes.row(user), self.likes.row(other_user))
    }
}

/// Cosine similarity of the users' term-frequency vectors. A `replaced` vector stands in for
/// the stored row of its user.
pub struct FeatureCosine<'a> {
    pub features: &'a FeatureMatrix,
    pub replaced: Option<(u32, &'a [u32])>,
}

impl<'a> FeatureCosine<'a> {
    fn row(&self, user: u32) -> &[u32] {
        match self.replaced {
            Some((replaced_user, vector)) if replaced_user == user => vector,
            _ => self.features.row(user),
        }
    }
}

impl<'a> UserSimilarity for FeatureCosine<'a> {
    fn similarity(&self, user: u32, other_user: u32) -> Result<f64, SimilarityError> {
        similarity::vector_cosine(self.row(user), self.row(other_user))
    }
}

/// A candidate user and its similarity to the target user
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct Neighbor {
    pub user: u32,
    pub score: f64,
}

/// Ordering for our max-heap: better neighbors compare as smaller, so the heap's top is the
/// worst neighbor kept so far. Equal scores are broken by user index, lower index first.
fn cmp_reverse(neighbor_a: &Neighbor, neighbor_b: &Neighbor) -> Ordering {
    match neighbor_a.score.partial_cmp(&neighbor_b.score) {
        Some(Ordering::Less) => Ordering::Greater,
        Some(Ordering::Greater) => Ordering::Less,
        _ => neighbor_a.user.cmp(&neighbor_b.user),
    }
}

impl Eq for Neighbor {}

impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_reverse(self, other)
    }
}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(cmp_reverse(self, other))
    }
}

/// The `k` candidates most similar to `target`, best first. The target itself, candidates
/// with a non-positive score and candidates whose similarity is undefined are left out.
pub fn nearest_neighbors<S: UserSimilarity>(
    similarity: &S,
    target: u32,
    candidates: &[u32],
    k: usize,
) -> Vec<Neighbor> {

    if k == 0 {
        return Vec::new();
    }

    let mut heap: BinaryHeap<Neighbor> = BinaryHeap::with_capacity(k.min(candidates.len()));

    for candidate in candidates.iter() {

        if *candidate == target {
            continue;
        }

        let score = match similarity.similarity(target, *candidate) {
            Ok(score) => score,
            Err(error) => {
                trace!(target_user = target, candidate = *candidate, %error, "Skipping candidate");
                continue;
            },
        };

        if score <= 0.0 {
            continue;
        }

        let neighbor = Neighbor { user: *candidate, score };

        if heap.len() < k {
            heap.push(neighbor);
        } else if let Some(mut top) = heap.peek_mut() {
            if neighbor < *top {
                *top = neighbor;
            }
        }
    }

    heap.into_sorted_vec()
}
