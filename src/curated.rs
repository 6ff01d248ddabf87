//! Externally supplied show metadata, used to map free-form liked-item names onto shows with
//! known genres.

use fnv::FnvHashSet;

use crate::normalize::Normalizer;

#[derive(Debug, Clone, PartialEq)]
pub struct CuratedShow {
    pub title: Vec<String>,
    pub genres: Vec<String>,
}

impl CuratedShow {

    /// Builds a show from its (already stemmed) title and genre columns. Stopwords are removed
    /// from both.
    pub fn from_columns(title: &str, genres: &str, normalizer: &Normalizer) -> Self {
        CuratedShow {
            title: terms(title, normalizer),
            genres: terms(genres, normalizer),
        }
    }

    /// Identity of the show within the curated id space
    pub fn key(&self) -> String {
        self.title.concat()
    }

    /// A show matches a liked item if any of its title terms occurs among the item's name
    /// tokens.
    pub fn matches(&self, name_tokens: &FnvHashSet<&str>) -> bool {
        self.title.iter().any(|term| name_tokens.contains(term.as_str()))
    }

    /// Genre terms may themselves be comma separated lists.
    pub fn genre_tokens(&self) -> Vec<String> {
        self.genres.iter()
            .flat_map(|genre| genre.split(','))
            .filter(|genre| !genre.is_empty())
            .map(String::from)
            .collect()
    }
}

fn terms(column: &str, normalizer: &Normalizer) -> Vec<String> {
    column.split_whitespace()
        .map(|term| term.to_lowercase())
        .filter(|term| !normalizer.is_stopword(term))
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct CuratedCatalog {
    shows: Vec<CuratedShow>,
}

impl CuratedCatalog {

    pub fn new(shows: Vec<CuratedShow>) -> Self {
        CuratedCatalog { shows }
    }

    pub fn len(&self) -> usize {
        self.shows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shows.is_empty()
    }

    pub fn shows(&self) -> &[CuratedShow] {
        &self.shows
    }

    /// All curated shows matching a liked-item name, in catalog order.
    pub fn matching<'a>(&'a self, item_name: &str) -> Vec<&'a CuratedShow> {
        let name_tokens: FnvHashSet<&str> = item_name.split_whitespace().collect();

        self.shows.iter()
            .filter(|show| show.matches(&name_tokens))
            .collect()
    }
}
