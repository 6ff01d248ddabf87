//! Neighborhood-based TV show recommendations from user profiles, with two strategies:
//! collaborative filtering on shared likes (user- or item-based) and content-based filtering
//! on term-frequency profiles. Both are evaluated with repeated random holdout.

use std::time::Instant;

use tracing::info;

pub mod types;
pub mod error;
pub mod normalize;
pub mod catalog;
pub mod curated;
pub mod vectors;
pub mod similarity;
pub mod neighborhood;
pub mod recommend;
pub mod content;
pub mod evaluation;
pub mod io;

mod usage_tests;

use crate::catalog::Preferences;
use crate::content::ContentModel;
use crate::curated::CuratedCatalog;
use crate::normalize::{NormalizedRecord, Normalizer, UserRecord};

/// Normalizes all records and builds the user/item preferences from them. The normalized
/// records are returned as well, the content model needs their feature bags.
pub fn preferences(
    records: &[UserRecord],
    normalizer: &Normalizer,
) -> (Preferences, Vec<NormalizedRecord>) {

    let start = Instant::now();

    let normalized: Vec<NormalizedRecord> = records.iter()
        .map(|record| normalizer.normalize(record))
        .collect();

    let num_skipped_fields: usize = normalized.iter()
        .map(|record| record.diagnostics.len())
        .sum();

    let preferences = Preferences::from_records(&normalized);

    info!(
        users = preferences.num_users(),
        items = preferences.num_items(),
        interactions = preferences.num_interactions(),
        skipped_fields = num_skipped_fields,
        millis = start.elapsed().as_millis() as u64,
        "Built preferences"
    );

    (preferences, normalized)
}

/// Everything content-based filtering needs, built in one go from the raw records.
pub fn content_model(
    records: &[UserRecord],
    normalizer: &Normalizer,
    catalog: &CuratedCatalog,
) -> (Preferences, ContentModel) {
    let (preferences, normalized) = preferences(records, normalizer);
    let model = ContentModel::build(&normalized, &preferences, catalog, normalizer);

    (preferences, model)
}
