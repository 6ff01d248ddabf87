//! Content-based model: per-user feature bags from profile text, liked-item titles and the
//! genres of matching curated shows, projected onto a frozen vocabulary.

use std::time::Instant;

use tracing::info;

use crate::catalog::{ItemCatalog, Preferences};
use crate::curated::CuratedCatalog;
use crate::normalize::{NormalizedRecord, Normalizer};
use crate::types;
use crate::types::{DenseVector, LikeSet, SparseBinaryMatrix};
use crate::vectors::{FeatureMatrix, Vocabulary};

pub struct ContentModel {
    curated_shows: ItemCatalog,
    curated_likes: SparseBinaryMatrix,
    /// Profile terms and liked-item title words per user index
    profile_bags: Vec<Vec<String>>,
    /// Genre terms per curated show id
    show_genres: Vec<Vec<String>>,
    vocabulary: Vocabulary,
    features: FeatureMatrix,
}

impl ContentModel {

    /// `records` must be the records `preferences` was built from.
    pub fn build(
        records: &[NormalizedRecord],
        preferences: &Preferences,
        catalog: &CuratedCatalog,
        normalizer: &Normalizer,
    ) -> Self {

        let start = Instant::now();

        let num_users = preferences.num_users();
        let mut profile_bags: Vec<Vec<String>> = vec![Vec::new(); num_users];

        for record in records {
            if let Some(user_index) = preferences.user_index(&record.user) {
                profile_bags[user_index as usize].extend(record.features.iter().cloned());
            }
        }

        let mut curated_shows = ItemCatalog::new();
        let mut curated_likes = types::new_sparse_binary_matrix(num_users);
        let mut show_genres: Vec<Vec<String>> = Vec::new();

        for (user_index, bag) in profile_bags.iter_mut().enumerate() {

            let mut liked_items: Vec<u32> =
                preferences.likes_of(user_index as u32).iter().cloned().collect();
            liked_items.sort();

            for item_index in liked_items {
                let item_name = preferences.items().name(item_index);

                bag.extend(normalizer.words(item_name));

                for show in catalog.matching(item_name) {
                    let curated_index = curated_shows.intern(&show.key());
                    if curated_index as usize == show_genres.len() {
                        show_genres.push(show.genre_tokens()
                            .into_iter()
                            .filter(|genre| !normalizer.is_noise(genre))
                            .collect());
                    }
                    curated_likes[user_index].insert(curated_index);
                }
            }
        }

        let bags: Vec<Vec<String>> = profile_bags.iter()
            .zip(curated_likes.iter())
            .map(|(profile_bag, liked_shows)| feature_bag(profile_bag, &show_genres, liked_shows))
            .collect();

        let vocabulary = Vocabulary::build(&bags);
        let features = FeatureMatrix::new(&vocabulary, &bags);

        info!(
            users = num_users,
            curated_shows = curated_shows.len(),
            vocabulary = vocabulary.len(),
            millis = start.elapsed().as_millis() as u64,
            "Built content model"
        );

        ContentModel {
            curated_shows,
            curated_likes,
            profile_bags,
            show_genres,
            vocabulary,
            features,
        }
    }

    /// Feature vector of a user as if `liked_shows` were its curated likes. Columns follow the
    /// frozen vocabulary.
    pub fn vectorize(&self, user_index: u32, liked_shows: &LikeSet) -> DenseVector {
        let profile_bag = &self.profile_bags[user_index as usize];
        let bag = feature_bag(profile_bag, &self.show_genres, liked_shows);
        self.vocabulary.vectorize(&bag)
    }

    pub fn curated_shows(&self) -> &ItemCatalog {
        &self.curated_shows
    }

    pub fn curated_likes(&self) -> &SparseBinaryMatrix {
        &self.curated_likes
    }

    pub fn curated_likes_of(&self, user_index: u32) -> &LikeSet {
        &self.curated_likes[user_index as usize]
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn features(&self) -> &FeatureMatrix {
        &self.features
    }

    /// Users matching at least one curated show, in index order
    pub fn eligible_users(&self) -> Vec<u32> {
        self.curated_likes.iter()
            .enumerate()
            .filter(|&(_, liked_shows)| !liked_shows.is_empty())
            .map(|(user_index, _)| user_index as u32)
            .collect()
    }
}

/// Profile terms plus the genres of every liked curated show, once per show
fn feature_bag(
    profile_bag: &[String],
    show_genres: &[Vec<String>],
    liked_shows: &LikeSet,
) -> Vec<String> {

    let mut liked_shows: Vec<u32> = liked_shows.iter().cloned().collect();
    liked_shows.sort();

    let mut bag = profile_bag.to_vec();
    for show in liked_shows {
        bag.extend(show_genres[show as usize].iter().cloned());
    }
    bag
}
