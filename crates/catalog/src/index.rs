//! Catalog building, lookup and indexing logic.
//!
//! - Primary indices (items by position and id, ratings by user and item)
//! - Title resolution with a documented duplicate-title policy
//! - Aggregate rating statistics per item

use crate::error::{CatalogError, Result};
use crate::parser;
use crate::types::*;
use rayon::prelude::*;
use std::path::Path;
use tracing::{info, warn};

impl Catalog {
    /// Creates a new, empty Catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from already-cleaned items and ratings.
    ///
    /// Items keep the order they are given in. Ratings are validated against
    /// the items and item statistics are computed before returning.
    pub fn from_parts(items: Vec<Item>, ratings: Vec<Rating>) -> Result<Self> {
        let mut catalog = Catalog::new();
        for item in items {
            catalog.insert_item(item)?;
        }
        for rating in ratings {
            catalog.insert_rating(rating);
        }
        catalog.validate()?;
        catalog.compute_item_stats();
        Ok(catalog)
    }

    /// Load a catalog from a directory holding `items.dat` and `ratings.dat`.
    ///
    /// Both files are parsed in parallel. Rating rows with missing or
    /// unparseable fields are dropped; everything else must be valid.
    pub fn load_from_files(data_dir: &Path, text_source: TextSource) -> Result<Self> {
        info!("Loading catalog from {:?}", data_dir);

        let items_path = data_dir.join("items.dat");
        let ratings_path = data_dir.join("ratings.dat");

        let (items, ratings) = rayon::join(
            || parser::parse_items(&items_path, text_source),
            || parser::parse_ratings(&ratings_path),
        );
        let items = items?;
        let (ratings, dropped) = ratings?;

        if dropped > 0 {
            warn!("Dropped {} incomplete rating rows", dropped);
        }
        info!("Parsed {} items, {} ratings", items.len(), ratings.len());

        let catalog = Self::from_parts(items, ratings)?;
        info!("Catalog successfully built and validated");
        Ok(catalog)
    }

    // Getters

    /// Number of items in the catalog
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All items in canonical order
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Item at a canonical row index
    pub fn item_at(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    /// Get an item by id
    pub fn get_item(&self, id: ItemId) -> Option<&Item> {
        self.index_of(id).map(|idx| &self.items[idx])
    }

    /// Row index of an item id
    pub fn index_of(&self, id: ItemId) -> Option<usize> {
        self.id_index.get(&id).copied()
    }

    /// Item ids in canonical order
    pub fn item_ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|item| item.id).collect()
    }

    /// Descriptive text of every item, in canonical order
    pub fn texts(&self) -> Vec<&str> {
        self.items.iter().map(Item::text).collect()
    }

    /// Descriptive text of every item derived with `source`, in canonical order
    pub fn texts_for(&self, source: TextSource) -> Vec<String> {
        self.items.iter().map(|item| item.text_for(source)).collect()
    }

    /// The full rating log in insertion order
    pub fn ratings(&self) -> &[Rating] {
        &self.ratings
    }

    /// Get all ratings made by a user
    ///
    /// Returns an empty slice if user has no ratings
    pub fn get_user_ratings(&self, user_id: UserId) -> &[Rating] {
        self.user_ratings
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get all ratings for an item
    pub fn get_item_ratings(&self, item_id: ItemId) -> &[Rating] {
        self.item_ratings
            .get(&item_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Whether the user appears anywhere in the rating log
    pub fn has_user(&self, user_id: UserId) -> bool {
        self.user_ratings.contains_key(&user_id)
    }

    /// Distinct user ids in ascending order
    pub fn user_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.user_ratings.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Get precomputed statistics for an item
    pub fn get_item_stats(&self, item_id: ItemId) -> Option<&ItemStats> {
        self.item_stats.get(&item_id)
    }

    /// Mean observed rating of an item, 0.0 when it has never been rated
    pub fn mean_rating(&self, item_id: ItemId) -> f32 {
        self.get_item_stats(item_id)
            .map(|s| s.mean_rating)
            .unwrap_or(0.0)
    }

    /// Number of ratings an item has received
    pub fn rating_count(&self, item_id: ItemId) -> u32 {
        self.get_item_stats(item_id)
            .map(|s| s.rating_count)
            .unwrap_or(0)
    }

    /// Get counts for debugging/validation: (items, users, ratings)
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.items.len(), self.user_ratings.len(), self.ratings.len())
    }

    // Title resolution

    /// Exact title lookup.
    ///
    /// Duplicate titles resolve to the earliest item in catalog order.
    pub fn index_of_title(&self, title: &str) -> Option<usize> {
        self.title_index.get(title).copied()
    }

    /// Resolve a user-supplied title to a row index.
    ///
    /// Tries an exact match first, then the first item in catalog order whose
    /// title contains `title` case-insensitively. Blank input never matches.
    pub fn resolve_title(&self, title: &str) -> Option<usize> {
        if title.trim().is_empty() {
            return None;
        }
        if let Some(idx) = self.index_of_title(title) {
            return Some(idx);
        }
        let needle = title.to_lowercase();
        self.items
            .iter()
            .position(|item| item.title().to_lowercase().contains(&needle))
    }

    /// Search titles case-insensitively.
    ///
    /// Exact (case-insensitive) matches come first, then substring matches,
    /// each group in catalog order.
    pub fn search_titles(&self, query: &str, limit: usize) -> Vec<&Item> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut exact = Vec::new();
        let mut partial = Vec::new();
        for item in &self.items {
            let title = item.title().to_lowercase();
            if title == needle {
                exact.push(item);
            } else if title.contains(&needle) {
                partial.push(item);
            }
        }

        exact.extend(partial);
        exact.truncate(limit);
        exact
    }

    // Mutators - used while the catalog is being assembled

    /// Append an item, returning its row index
    pub fn insert_item(&mut self, item: Item) -> Result<usize> {
        if self.id_index.contains_key(&item.id) {
            return Err(CatalogError::DuplicateItem { id: item.id });
        }
        let idx = self.items.len();
        self.id_index.insert(item.id, idx);
        self.title_index
            .entry(item.title().to_string())
            .or_insert(idx);
        self.items.push(item);
        Ok(idx)
    }

    /// Insert a rating and update indices.
    ///
    /// The item's mean and count are updated in place so they stay current
    /// after the catalog has been built.
    pub fn insert_rating(&mut self, rating: Rating) {
        let stats = self.item_stats.entry(rating.item_id).or_insert(ItemStats {
            mean_rating: 0.0,
            rating_count: 0,
        });
        stats.rating_count += 1;
        stats.mean_rating += (rating.value - stats.mean_rating) / stats.rating_count as f32;

        self.user_ratings
            .entry(rating.user_id)
            .or_default()
            .push(rating);
        self.item_ratings
            .entry(rating.item_id)
            .or_default()
            .push(rating);
        self.ratings.push(rating);
    }

    /// Recompute mean rating and rating count for every rated item from the
    /// full per-item rating lists
    pub fn compute_item_stats(&mut self) {
        self.item_stats = self
            .item_ratings
            .par_iter()
            .map(|(&item_id, ratings)| {
                let rating_count = ratings.len() as u32;
                let mean_rating = if rating_count > 0 {
                    let total: f32 = ratings.iter().map(|r| r.value).sum();
                    total / rating_count as f32
                } else {
                    0.0
                };
                (
                    item_id,
                    ItemStats {
                        mean_rating,
                        rating_count,
                    },
                )
            })
            .collect();
    }

    /// Validate data integrity
    ///
    /// Every rating must reference a known item and lie in [0.5, 5.0].
    pub fn validate(&self) -> Result<()> {
        for rating in &self.ratings {
            if !self.id_index.contains_key(&rating.item_id) {
                return Err(CatalogError::MissingReference {
                    entity: "Item".to_string(),
                    id: rating.item_id,
                });
            }
            if !rating.value.is_finite() || rating.value < MIN_RATING || rating.value > MAX_RATING {
                return Err(CatalogError::InvalidValue {
                    field: "rating".to_string(),
                    value: rating.value.to_string(),
                });
            }
        }
        Ok(())
    }
}
