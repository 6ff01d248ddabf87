use std::collections::BTreeSet;

use fnv::FnvHashMap;

use crate::types;
use crate::types::DenseVector;

/// Frozen mapping from feature terms to vector columns. Terms are sorted before columns are
/// assigned, so the same bags always produce the same layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    terms: Vec<String>,
    columns: FnvHashMap<String, u32>,
}

impl Vocabulary {

    pub fn build<'a, I, B>(bags: I) -> Self
        where I: IntoIterator<Item=&'a B>, B: AsRef<[String]> + 'a {

        let mut distinct: BTreeSet<&str> = BTreeSet::new();
        for bag in bags {
            distinct.extend(bag.as_ref().iter().map(|term| term.as_str()));
        }

        let terms: Vec<String> = distinct.into_iter().map(String::from).collect();

        let mut columns = FnvHashMap::with_capacity_and_hasher(terms.len(), Default::default());
        for (column, term) in terms.iter().enumerate() {
            columns.insert(term.clone(), column as u32);
        }

        Vocabulary { terms, columns }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn column(&self, term: &str) -> Option<u32> {
        self.columns.get(term).cloned()
    }

    pub fn term(&self, column: u32) -> &str {
        &self.terms[column as usize]
    }

    /// Term-frequency vector of a bag. Terms outside the vocabulary are ignored.
    pub fn vectorize(&self, bag: &[String]) -> DenseVector {
        let mut vector = types::new_dense_vector(self.len());

        for term in bag {
            if let Some(column) = self.columns.get(term) {
                vector[*column as usize] += 1;
            }
        }

        vector
    }
}

/// One term-frequency vector per user index, all of vocabulary length.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    rows: Vec<DenseVector>,
}

impl FeatureMatrix {

    pub fn new<'a, I, B>(vocabulary: &Vocabulary, bags: I) -> Self
        where I: IntoIterator<Item=&'a B>, B: AsRef<[String]> + 'a {

        let rows = bags.into_iter()
            .map(|bag| vocabulary.vectorize(bag.as_ref()))
            .collect();

        FeatureMatrix { rows }
    }

    pub fn row(&self, user_index: u32) -> &DenseVector {
        &self.rows[user_index as usize]
    }

    pub fn rows(&self) -> &[DenseVector] {
        &self.rows
    }
}
