use std::cmp::Ordering;
use std::collections::BinaryHeap;

use fnv::FnvHashMap;

use crate::neighborhood::Neighbor;
use crate::types;
use crate::types::{LikeSet, LikesView};

/// Union of the items liked by the neighbors. An empty neighborhood recommends nothing.
pub fn recommend<V: LikesView>(likes: &V, neighbors: &[Neighbor]) -> LikeSet {

    let mut recommended = types::new_like_set();

    for neighbor in neighbors.iter() {
        recommended.extend(likes.row(neighbor.user).iter().cloned());
    }

    recommended
}

#[derive(PartialEq,Eq,Debug)]
struct CountedItem {
    item: u32,
    count: u32,
}

/// Higher counts compare as smaller, so the max-heap keeps the weakest item on top. Equal
/// counts prefer the lower item id.
impl Ord for CountedItem {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.count.cmp(&other.count) {
            Ordering::Equal => self.item.cmp(&other.item),
            ordering => ordering.reverse(),
        }
    }
}

impl PartialOrd for CountedItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

/// The `num_items_to_recommend` items liked by most neighbors, excluding items in `history`.
pub fn top_items<V: LikesView>(
    likes: &V,
    history: &LikeSet,
    neighbors: &[Neighbor],
    num_items_to_recommend: usize,
) -> Vec<u32> {

    if num_items_to_recommend == 0 {
        return Vec::new();
    }

    let mut item_counts: FnvHashMap<u32, u32> =
        FnvHashMap::with_capacity_and_hasher(10, Default::default());

    for neighbor in neighbors.iter() {
        for item in likes.row(neighbor.user).iter() {
            if !history.contains(item) {
                *item_counts.entry(*item).or_insert(0) += 1;
            }
        }
    }

    let mut heap = BinaryHeap::with_capacity(num_items_to_recommend);

    for (item, count) in item_counts.into_iter() {
        let counted_item = CountedItem { item, count };

        if heap.len() < num_items_to_recommend {
            heap.push(counted_item);
        } else if let Some(mut top) = heap.peek_mut() {
            if counted_item < *top {
                *top = counted_item;
            }
        }
    }

    heap.into_sorted_vec()
        .into_iter()
        .map(|counted_item| counted_item.item)
        .collect()
}
