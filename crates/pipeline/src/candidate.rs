use catalog::{Catalog, ItemId};

/// A catalog item under consideration for a recommendation list
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Canonical catalog row
    pub index: usize,
    pub item_id: ItemId,
    /// Ranking score; its meaning depends on the strategy
    pub score: f32,
}

impl Candidate {
    pub fn new(index: usize, item_id: ItemId, score: f32) -> Self {
        Self {
            index,
            item_id,
            score,
        }
    }

    /// Every catalog item, in catalog order, with a zero score
    pub fn all(catalog: &Catalog) -> Vec<Candidate> {
        catalog
            .items()
            .iter()
            .enumerate()
            .map(|(index, item)| Candidate::new(index, item.id, 0.0))
            .collect()
    }
}
