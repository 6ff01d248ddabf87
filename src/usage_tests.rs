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

#[cfg(test)]
mod tests {

    use crate::curated::{CuratedCatalog, CuratedShow};
    use crate::evaluation::{self, EvaluationConfig};
    use crate::neighborhood::{self, LikeSetCosine};
    use crate::normalize::{Normalizer, NormalizerConfig, UserRecord};
    use crate::recommend;
    use crate::types::LikeSet;

    fn user(id: &str, tv: &str, about: &str) -> UserRecord {
        UserRecord {
            id: String::from(id),
            tv: Some(String::from(tv)),
            about: Some(String::from(about)),
            gender: Some(String::from("N/A")),
            ..Default::default()
        }
    }

    #[test]
    fn programmatic_usage() {

        /* Our input data comprises of user profiles, where the `tv` field lists the shows a
           user likes. Identifiers are opaque strings, anonymized upstream. */
        let records = vec![
            user("a", "X, Y, Z", "i watch everything"),
            user("b", "X, Y", "sitcoms mostly"),
            user("c", "Z", "N/A"),
        ];

        /* The normalizer lowercases and splits the profile fields. Stopwords and patterns are
           configuration, nothing is read from fixed paths. */
        let normalizer = Normalizer::new(NormalizerConfig::default()).unwrap();

        /* Internally, we use consecutive integer ids for users and shows. */
        let (preferences, _) = crate::preferences(&records, &normalizer);

        assert_eq!(preferences.num_users(), 3);
        assert_eq!(preferences.num_items(), 3);

        let a = preferences.user_index("a").unwrap();
        let b = preferences.user_index("b").unwrap();
        let c = preferences.user_index("c").unwrap();

        /* The neighbors of a are ranked by the cosine similarity of their like-sets. */
        let similarity = LikeSetCosine { likes: preferences.likes() };
        let neighbors = neighborhood::nearest_neighbors(&similarity, a, &[b, c], 2);

        assert_eq!(neighbors.len(), 2);
        assert_eq!(neighbors[0].user, b);
        assert!((neighbors[0].score - 2.0 / 6f64.sqrt()).abs() < 1e-9);
        assert_eq!(neighbors[1].user, c);
        assert!((neighbors[1].score - 1.0 / 3f64.sqrt()).abs() < 1e-9);

        /* Recommendations are the union of the neighbors' likes. */
        let recommended = recommend::recommend(preferences.likes(), &neighbors);

        let mut names: Vec<&str> = recommended.iter()
            .map(|item| preferences.items().name(*item))
            .collect();
        names.sort();
        assert_eq!(names, vec!["x", "y", "z"]);
    }

    #[test]
    fn end_to_end_evaluation() {

        let records = vec![
            user("u1", "lost, the wire, friends", "drama fan"),
            user("u2", "lost, the wire", "crime drama"),
            user("u3", "friends, seinfeld, the office", "comedy"),
            user("u4", "seinfeld, the office", "comedy sitcoms"),
            user("u5", "lost, heroes", "scifi drama"),
            user("u6", "heroes, the wire, lost", "scifi"),
            user("u7", "the office, friends", "comedy"),
            user("u8", "heroes", "N/A"),
        ];

        let stopwords = vec![String::from("the")].into_iter().collect();
        let normalizer = Normalizer::new(NormalizerConfig { stopwords, ..Default::default() })
            .unwrap();

        let catalog = CuratedCatalog::new(vec![
            CuratedShow::from_columns("lost", "drama,scifi", &normalizer),
            CuratedShow::from_columns("the wire", "crime,drama", &normalizer),
            CuratedShow::from_columns("seinfeld", "comedi", &normalizer),
            CuratedShow::from_columns("the office", "comedi", &normalizer),
        ]);

        let (preferences, model) = crate::content_model(&records, &normalizer, &catalog);
        let before: Vec<LikeSet> = preferences.likes().clone();

        let config = EvaluationConfig { trials: 5, seed: 2012, num_threads: 2, ..Default::default() };

        let user_based = evaluation::evaluate_collaborative(preferences.likes(), &config).unwrap();
        let item_based = evaluation::evaluate_collaborative(&preferences.liked_by(), &config).unwrap();
        let content_based = evaluation::evaluate_content_based(&model, &config).unwrap();

        for report in &[&user_based, &item_based, &content_based] {
            assert_eq!(report.trials.len(), 5);
            assert!(report.precision >= 0.0 && report.precision <= 1.0);
            assert!(report.recall >= 0.0 && report.recall <= 1.0);
            assert!(report.f1 >= 0.0 && report.f1 <= 1.0);
        }

        /* There is no metadata for "heroes", so u8 is not part of the content-based
           evaluation, but still takes part in collaborative filtering. */
        let u8_index = preferences.user_index("u8").unwrap();
        assert!(!model.eligible_users().contains(&u8_index));

        assert_eq!(preferences.likes(), &before);
    }
}
