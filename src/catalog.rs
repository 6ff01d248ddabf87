use fnv::FnvHashMap;

use crate::normalize::NormalizedRecord;
use crate::types;
use crate::types::{LikeSet, SparseBinaryMatrix};

/// Bijective mapping between item names and dense ids. Ids are handed out in order of first
/// observation, starting at 0, and never change afterwards.
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    item_dict: FnvHashMap<String, u32>,
    item_names: Vec<String>,
}

impl ItemCatalog {

    pub fn new() -> Self {
        ItemCatalog {
            item_dict: FnvHashMap::with_capacity_and_hasher(100, Default::default()),
            item_names: Vec::with_capacity(100),
        }
    }

    /// Returns the id of `name`, assigning the next free one if the name is new.
    pub fn intern(&mut self, name: &str) -> u32 {
        if let Some(item_index) = self.item_dict.get(name) {
            return *item_index;
        }

        let item_index = self.item_names.len() as u32;
        self.item_dict.insert(name.to_owned(), item_index);
        self.item_names.push(name.to_owned());

        item_index
    }

    pub fn id(&self, name: &str) -> Option<u32> {
        self.item_dict.get(name).cloned()
    }

    pub fn name(&self, item_index: u32) -> &str {
        &self.item_names[item_index as usize]
    }

    pub fn len(&self) -> usize {
        self.item_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_names.is_empty()
    }
}

/// Users, the items they like, and the mapping between both and their dense ids.
#[derive(Debug, Clone, Default)]
pub struct Preferences {
    user_dict: FnvHashMap<String, u32>,
    items: ItemCatalog,
    likes: SparseBinaryMatrix,
}

impl Preferences {

    pub fn num_users(&self) -> usize {
        self.user_dict.len()
    }

    pub fn num_items(&self) -> usize {
        self.items.len()
    }

    pub fn num_interactions(&self) -> usize {
        self.likes.iter().map(|row| row.len()).sum()
    }

    pub fn user_index(&self, name: &str) -> Option<u32> {
        self.user_dict.get(name).cloned()
    }

    pub fn items(&self) -> &ItemCatalog {
        &self.items
    }

    pub fn likes(&self) -> &SparseBinaryMatrix {
        &self.likes
    }

    pub fn likes_of(&self, user_index: u32) -> &LikeSet {
        &self.likes[user_index as usize]
    }

    /// Adds a user's liked items, creating the user if needed. Returns the user's index.
    pub fn add(&mut self, user: &str, liked_items: &[String]) -> u32 {

        let user_index = match self.user_dict.get(user) {
            Some(user_index) => *user_index,
            None => {
                let user_index = self.user_dict.len() as u32;
                self.user_dict.insert(user.to_owned(), user_index);
                self.likes.push(types::new_like_set());
                user_index
            },
        };

        for item in liked_items {
            let item_index = self.items.intern(item);
            self.likes[user_index as usize].insert(item_index);
        }

        user_index
    }

    /// Inverts the preferences into an item-indexed matrix of user indices.
    pub fn liked_by(&self) -> SparseBinaryMatrix {
        let mut liked_by = types::new_sparse_binary_matrix(self.num_items());

        for (user_index, liked_items) in self.likes.iter().enumerate() {
            for item_index in liked_items.iter() {
                liked_by[*item_index as usize].insert(user_index as u32);
            }
        }

        liked_by
    }

    /// Dense 0/1 user x item matrix, for external serialization.
    pub fn binary_matrix(&self) -> Vec<Vec<u8>> {
        self.likes.iter()
            .map(|liked_items| {
                let mut row = vec![0; self.num_items()];
                for item_index in liked_items.iter() {
                    row[*item_index as usize] = 1;
                }
                row
            })
            .collect()
    }
}

impl Preferences {

    /// Builds the preferences in one pass, before any similarity is computed.
    pub fn from_records<'a, I>(records: I) -> Self where I: IntoIterator<Item=&'a NormalizedRecord> {
        let mut preferences = Preferences::default();

        for record in records {
            preferences.add(&record.user, &record.liked_items);
        }

        preferences
    }
}
