/*
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

//! Repeated random holdout evaluation. Every trial draws a test cohort, hides part of each
//! test user's likes, recommends from the nearest neighbors among the remaining users and
//! scores the recommendations against the hidden and the visible likes.
//!
//! Trials only read the shared preference matrix. A test user's reduced likes live in an
//! `Overlay` for the duration of that user's evaluation, so trials can run in parallel and no
//! restore step is needed.

use std::sync::Mutex;
use std::time::Instant;

use fnv::FnvHashSet;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use scoped_pool::Pool;
use serde_derive::Serialize;
use tracing::{debug, info};

use crate::content::ContentModel;
use crate::error::{Error, Result};
use crate::neighborhood::{self, FeatureCosine, LikeSetCosine, Neighbor};
use crate::recommend;
use crate::types;
use crate::types::{LikeSet, LikesView, Overlay, SparseBinaryMatrix};

#[derive(Debug, Clone)]
pub struct EvaluationConfig {
    /// Number of independent trials
    pub trials: usize,
    /// Fraction of the eligible users drawn as test cohort per trial
    pub test_fraction: f64,
    /// Fraction of a test user's likes hidden during its evaluation
    pub holdout_fraction: f64,
    pub num_neighbors: usize,
    /// Trial `t` draws its randomness from a generator seeded with `seed + t`
    pub seed: u64,
    pub num_threads: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        EvaluationConfig {
            trials: 10,
            test_fraction: 0.3,
            holdout_fraction: 0.5,
            num_neighbors: neighborhood::DEFAULT_NUM_NEIGHBORS,
            seed: 0,
            num_threads: num_cpus::get(),
        }
    }
}

impl EvaluationConfig {

    pub fn validate(&self) -> Result<()> {
        if self.trials == 0 {
            return Err(Error::InvalidConfig(String::from("at least one trial is required")));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction <= 1.0) {
            return Err(Error::InvalidConfig(
                format!("test fraction {} is not in (0, 1]", self.test_fraction)));
        }
        if !(self.holdout_fraction > 0.0 && self.holdout_fraction <= 1.0) {
            return Err(Error::InvalidConfig(
                format!("holdout fraction {} is not in (0, 1]", self.holdout_fraction)));
        }
        Ok(())
    }
}

/// Computes the neighborhood of a target user, reading like-sets through `likes`.
pub trait NeighborhoodModel: Sync {
    fn neighbors<V: LikesView>(
        &self,
        likes: &V,
        target: u32,
        candidates: &[u32],
        k: usize,
    ) -> Vec<Neighbor>;
}

/// Neighbors by like-set overlap. Applied to an inverted matrix this is item-based CF.
pub struct Collaborative;

impl NeighborhoodModel for Collaborative {
    fn neighbors<V: LikesView>(
        &self,
        likes: &V,
        target: u32,
        candidates: &[u32],
        k: usize,
    ) -> Vec<Neighbor> {
        neighborhood::nearest_neighbors(&LikeSetCosine { likes }, target, candidates, k)
    }
}

/// Neighbors by feature similarity. The target is vectorized from the curated likes it has in
/// `likes`, so the genres of hidden shows do not count. Candidates keep their stored vectors.
impl NeighborhoodModel for ContentModel {
    fn neighbors<V: LikesView>(
        &self,
        likes: &V,
        target: u32,
        candidates: &[u32],
        k: usize,
    ) -> Vec<Neighbor> {
        let target_vector = self.vectorize(target, likes.row(target));
        let similarity = FeatureCosine {
            features: self.features(),
            replaced: Some((target, target_vector.as_slice())),
        };
        neighborhood::nearest_neighbors(&similarity, target, candidates, k)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scores {
    pub precision: f64,
    pub recall: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialReport {
    pub trial: usize,
    pub num_test_users: usize,
    pub precision: f64,
    pub recall: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub trials: Vec<TrialReport>,
}

/// Harmonic mean of precision and recall, zero if both are zero
pub fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    }
}

/// Rows with at least `min_likes` entries
pub fn eligible_rows(likes: &SparseBinaryMatrix, min_likes: usize) -> Vec<u32> {
    likes.iter()
        .enumerate()
        .filter(|&(_, row)| row.len() >= min_likes)
        .map(|(index, _)| index as u32)
        .collect()
}

/// Scores recommendations against the visible and the hidden likes of a user. Empty
/// recommendations score zero.
pub fn score(recommended: &LikeSet, remaining: &LikeSet, held_out: &LikeSet) -> Scores {

    if recommended.is_empty() {
        return Scores { precision: 0.0, recall: 0.0 };
    }

    let num_hits_held_out = recommended.iter().filter(|item| held_out.contains(item)).count();
    let num_hits_remaining = recommended.iter().filter(|item| remaining.contains(item)).count();

    let precision = (num_hits_held_out + num_hits_remaining) as f64 / recommended.len() as f64;
    let recall = if held_out.is_empty() {
        0.0
    } else {
        num_hits_held_out as f64 / held_out.len() as f64
    };

    Scores { precision, recall }
}

fn num_to_sample(fraction: f64, population: usize) -> usize {
    ((fraction * population as f64).ceil() as usize).min(population)
}

/// Splits a user's likes into a uniformly sampled held-out part and the remainder.
pub fn hold_out<R: Rng>(likes: &LikeSet, fraction: f64, rng: &mut R) -> (LikeSet, LikeSet) {

    let mut known: Vec<u32> = likes.iter().cloned().collect();
    known.sort();

    let held_out: LikeSet = known
        .choose_multiple(rng, num_to_sample(fraction, known.len()))
        .cloned()
        .collect();

    let mut remaining = types::new_like_set();
    remaining.extend(known.into_iter().filter(|item| !held_out.contains(item)));

    (remaining, held_out)
}

/// Evaluates a single test user against the candidate pool.
pub fn evaluate_user<M: NeighborhoodModel, R: Rng>(
    model: &M,
    likes: &SparseBinaryMatrix,
    candidates: &[u32],
    user: u32,
    config: &EvaluationConfig,
    rng: &mut R,
) -> Scores {

    let (remaining, held_out) = hold_out(&likes[user as usize], config.holdout_fraction, rng);

    let view = Overlay { base: likes, index: user, replacement: &remaining };

    let neighbors = model.neighbors(&view, user, candidates, config.num_neighbors);
    let recommended = recommend::recommend(&view, &neighbors);

    score(&recommended, &remaining, &held_out)
}

/// Runs one trial: draws the test cohort and averages the scores of its users.
pub fn run_trial<M: NeighborhoodModel>(
    model: &M,
    likes: &SparseBinaryMatrix,
    eligible: &[u32],
    config: &EvaluationConfig,
    trial: usize,
) -> TrialReport {

    let start = Instant::now();
    let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(trial as u64));

    let mut test_users: Vec<u32> = rand::seq::index::sample(
            &mut rng, eligible.len(), num_to_sample(config.test_fraction, eligible.len()))
        .into_iter()
        .map(|position| eligible[position])
        .collect();
    test_users.sort();

    let test_set: FnvHashSet<u32> = test_users.iter().cloned().collect();
    let candidates: Vec<u32> = eligible.iter()
        .cloned()
        .filter(|user| !test_set.contains(user))
        .collect();

    let mut aggregated_precision = 0.0;
    let mut aggregated_recall = 0.0;

    for user in test_users.iter() {
        let scores = evaluate_user(model, likes, &candidates, *user, config, &mut rng);
        aggregated_precision += scores.precision;
        aggregated_recall += scores.recall;
    }

    let num_test_users = test_users.len();
    let (precision, recall) = if num_test_users > 0 {
        (aggregated_precision / num_test_users as f64, aggregated_recall / num_test_users as f64)
    } else {
        (0.0, 0.0)
    };

    debug!(
        trial,
        num_test_users,
        precision,
        recall,
        millis = start.elapsed().as_millis() as u64,
        "Finished trial"
    );

    TrialReport { trial, num_test_users, precision, recall }
}

/// Runs all trials, in parallel if configured, and averages their results.
pub fn evaluate<M: NeighborhoodModel>(
    model: &M,
    likes: &SparseBinaryMatrix,
    eligible: &[u32],
    config: &EvaluationConfig,
) -> Result<Report> {

    config.validate()?;

    if eligible.is_empty() {
        return Err(Error::NoEligibleUsers);
    }

    let start = Instant::now();

    let mut slots: Vec<Mutex<Option<TrialReport>>> = Vec::with_capacity(config.trials);
    for _ in 0..config.trials {
        slots.push(Mutex::new(None));
    }

    let pool = Pool::new(config.num_threads.max(1));

    pool.scoped(|scope| {
        for (trial, slot) in slots.iter().enumerate() {
            scope.execute(move || {
                let report = run_trial(model, likes, eligible, config, trial);
                let mut slot = slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                *slot = Some(report);
            });
        }
    });

    pool.shutdown();

    let trials: Vec<TrialReport> = slots.into_iter()
        .filter_map(|slot| slot.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner()))
        .collect();

    let num_trials = trials.len() as f64;
    let precision = trials.iter().map(|trial| trial.precision).sum::<f64>() / num_trials;
    let recall = trials.iter().map(|trial| trial.recall).sum::<f64>() / num_trials;

    info!(
        trials = trials.len(),
        eligible = eligible.len(),
        precision,
        recall,
        millis = start.elapsed().as_millis() as u64,
        "Finished evaluation"
    );

    Ok(Report { precision, recall, f1: f1(precision, recall), trials })
}

/// Collaborative filtering over the rows of `likes`, for rows with at least two likes.
pub fn evaluate_collaborative(
    likes: &SparseBinaryMatrix,
    config: &EvaluationConfig,
) -> Result<Report> {
    let eligible = eligible_rows(likes, 2);
    evaluate(&Collaborative, likes, &eligible, config)
}

/// Content-based filtering over the users matching at least one curated show.
pub fn evaluate_content_based(model: &ContentModel, config: &EvaluationConfig) -> Result<Report> {
    let eligible = model.eligible_users();
    evaluate(model, model.curated_likes(), &eligible, config)
}

#[cfg(test)]
mod tests {

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::catalog::Preferences;
    use crate::content::ContentModel;
    use crate::curated::{CuratedCatalog, CuratedShow};
    use crate::error::Error;
    use crate::evaluation::{self, Collaborative, EvaluationConfig, NeighborhoodModel, Scores};
    use crate::neighborhood::Neighbor;
    use crate::normalize::{Normalizer, NormalizerConfig, UserRecord};
    use crate::types::{LikeSet, LikesView, Overlay, SparseBinaryMatrix};

    fn set(items: &[u32]) -> LikeSet {
        items.iter().cloned().collect()
    }

    fn likes(rows: &[&[u32]]) -> SparseBinaryMatrix {
        rows.iter().map(|row| set(row)).collect()
    }

    fn config(seed: u64, num_threads: usize) -> EvaluationConfig {
        EvaluationConfig { seed, num_threads, ..Default::default() }
    }

    /// Never finds any neighbor
    struct Isolated;

    impl NeighborhoodModel for Isolated {
        fn neighbors<V: LikesView>(&self, _: &V, _: u32, _: &[u32], _: usize) -> Vec<Neighbor> {
            Vec::new()
        }
    }

    fn corpus() -> SparseBinaryMatrix {
        likes(&[
            &[0, 1, 2, 3],
            &[0, 1, 2],
            &[1, 2, 3, 4],
            &[0, 3, 5],
            &[4, 5, 6],
            &[2, 5, 6, 7],
            &[0, 1, 7],
            &[3, 4, 6, 7],
            &[9],
            &[1, 6, 8],
        ])
    }

    #[test]
    fn scoring() {
        let recommended = set(&[1, 2, 3, 4]);
        let scores = evaluation::score(&recommended, &set(&[1]), &set(&[2, 5]));

        assert_eq!(scores, Scores { precision: 0.5, recall: 0.5 });
    }

    #[test]
    fn empty_recommendations_score_zero() {
        let scores = evaluation::score(&set(&[]), &set(&[1]), &set(&[2]));
        assert_eq!(scores, Scores { precision: 0.0, recall: 0.0 });
    }

    #[test]
    fn f1_guards_against_zero() {
        assert_eq!(evaluation::f1(0.0, 0.0), 0.0);
        assert!((evaluation::f1(0.5, 0.25) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn hold_out_splits_half_rounded_up() {
        let mut rng = StdRng::seed_from_u64(42);
        let likes = set(&[1, 2, 3, 4, 5]);

        let (remaining, held_out) = evaluation::hold_out(&likes, 0.5, &mut rng);

        assert_eq!(held_out.len(), 3);
        assert_eq!(remaining.len(), 2);
        assert!(remaining.is_disjoint(&held_out));

        let restored: LikeSet = remaining.union(&held_out).cloned().collect();
        assert_eq!(restored, likes);
    }

    #[test]
    fn user_without_neighbors_scores_zero() {
        let likes = corpus();
        let mut rng = StdRng::seed_from_u64(1);

        let scores = evaluation::evaluate_user(&Isolated, &likes, &[1, 2], 0, &config(0, 1), &mut rng);

        assert_eq!(scores, Scores { precision: 0.0, recall: 0.0 });
    }

    #[test]
    fn evaluation_leaves_preferences_untouched() {
        let likes = corpus();
        let before = likes.clone();

        let report = evaluation::evaluate_collaborative(&likes, &config(7, 2)).unwrap();

        assert_eq!(likes, before);
        assert_eq!(report.trials.len(), 10);
    }

    #[test]
    fn eligibility_requires_two_likes() {
        assert_eq!(evaluation::eligible_rows(&corpus(), 2), vec![0, 1, 2, 3, 4, 5, 6, 7, 9]);
    }

    #[test]
    fn trials_draw_test_cohorts_of_configured_size() {
        let likes = corpus();
        let eligible = evaluation::eligible_rows(&likes, 2);

        let report = evaluation::run_trial(&Collaborative, &likes, &eligible, &config(3, 1), 0);

        // ceil(0.3 * 9)
        assert_eq!(report.num_test_users, 3);
    }

    #[test]
    fn reports_are_reproducible_across_thread_counts() {
        let likes = corpus();

        let sequential = evaluation::evaluate_collaborative(&likes, &config(11, 1)).unwrap();
        let parallel = evaluation::evaluate_collaborative(&likes, &config(11, 4)).unwrap();

        assert_eq!(sequential, parallel);
        assert!(sequential.precision >= 0.0 && sequential.precision <= 1.0);
        assert!(sequential.recall >= 0.0 && sequential.recall <= 1.0);
        assert!((sequential.f1 - evaluation::f1(sequential.precision, sequential.recall)).abs()
            < 1e-12);
    }

    #[test]
    fn no_eligible_users_is_an_error() {
        let likes = likes(&[&[1], &[2]]);

        match evaluation::evaluate_collaborative(&likes, &config(0, 1)) {
            Err(Error::NoEligibleUsers) => {},
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let likes = corpus();
        let config = EvaluationConfig { trials: 0, ..config(0, 1) };

        assert!(evaluation::evaluate_collaborative(&likes, &config).is_err());
    }

    #[test]
    fn neighbors_are_found_from_the_remaining_likes() {
        // User 0 shares item 0 with user 1 and item 1 with user 2. Whichever item is hidden,
        // only the user sharing the visible one is a neighbor, so the hidden item is never
        // recommended.
        let likes = likes(&[&[0, 1], &[0, 2], &[1, 3]]);
        let config = EvaluationConfig { holdout_fraction: 0.5, ..config(0, 1) };

        for seed in 0..8 {
            let mut rng = StdRng::seed_from_u64(seed);
            let scores =
                evaluation::evaluate_user(&Collaborative, &likes, &[1, 2], 0, &config, &mut rng);

            assert_eq!(scores, Scores { precision: 0.5, recall: 0.0 });
        }
    }

    #[test]
    fn hiding_all_likes_leaves_no_neighbors() {
        let likes = likes(&[&[0, 1], &[0, 2], &[1, 3]]);
        let config = EvaluationConfig { holdout_fraction: 1.0, ..config(0, 1) };
        let mut rng = StdRng::seed_from_u64(5);

        let scores =
            evaluation::evaluate_user(&Collaborative, &likes, &[1, 2], 0, &config, &mut rng);

        assert_eq!(scores, Scores { precision: 0.0, recall: 0.0 });
    }

    #[test]
    fn hidden_shows_do_not_shape_content_neighbors() {
        let normalizer = Normalizer::new(NormalizerConfig::default()).unwrap();

        let catalog = CuratedCatalog::new(vec![
            CuratedShow::from_columns("wire", "crime", &normalizer),
            CuratedShow::from_columns("lost", "scifi", &normalizer),
        ]);

        let records: Vec<_> = vec![("alice", "lost, wire", "N/A"), ("bob", "N/A", "crime")]
            .into_iter()
            .map(|(id, tv, about)| UserRecord {
                id: id.to_owned(),
                tv: Some(tv.to_owned()),
                about: Some(about.to_owned()),
                ..Default::default()
            })
            .map(|record| normalizer.normalize(&record))
            .collect();

        let preferences = Preferences::from_records(&records);
        let model = ContentModel::build(&records, &preferences, &catalog, &normalizer);

        let alice = preferences.user_index("alice").unwrap();
        let bob = preferences.user_index("bob").unwrap();

        let full = model.neighbors(model.curated_likes(), alice, &[bob], 10);
        assert_eq!(full.len(), 1);
        assert_eq!(full[0].user, bob);

        let lost = model.curated_shows().id("lost").unwrap();
        let remaining = set(&[lost]);
        let view = Overlay { base: model.curated_likes(), index: alice, replacement: &remaining };

        assert!(model.neighbors(&view, alice, &[bob], 10).is_empty());
    }
}
