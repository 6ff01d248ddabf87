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

use crate::error::SimilarityError;
use crate::types::LikeSet;

/// Cosine similarity of two sets, interpreted as binary vectors:
/// `|A ∩ B| / (sqrt(|A|) * sqrt(|B|))`.
///
/// An empty set has no direction, we report this instead of returning a made-up score.
pub fn set_cosine(a: &LikeSet, b: &LikeSet) -> Result<f64, SimilarityError> {

    if a.is_empty() || b.is_empty() {
        return Err(SimilarityError::DegenerateInput);
    }

    let (smaller, larger) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let num_common = smaller.iter().filter(|item| larger.contains(item)).count();

    Ok(num_common as f64 / ((a.len() as f64).sqrt() * (b.len() as f64).sqrt()))
}

/// Cosine similarity of two term-frequency vectors: `dot(u, v) / (||u|| * ||v||)`.
pub fn vector_cosine(u: &[u32], v: &[u32]) -> Result<f64, SimilarityError> {

    if u.len() != v.len() {
        return Err(SimilarityError::DimensionMismatch { left: u.len(), right: v.len() });
    }

    let mut dot: u64 = 0;
    let mut squared_norm_u: u64 = 0;
    let mut squared_norm_v: u64 = 0;

    for (ui, vi) in u.iter().zip(v.iter()) {
        let (ui, vi) = (*ui as u64, *vi as u64);
        dot += ui * vi;
        squared_norm_u += ui * ui;
        squared_norm_v += vi * vi;
    }

    if squared_norm_u == 0 || squared_norm_v == 0 {
        return Err(SimilarityError::DegenerateInput);
    }

    Ok(dot as f64 / ((squared_norm_u as f64).sqrt() * (squared_norm_v as f64).sqrt()))
}
