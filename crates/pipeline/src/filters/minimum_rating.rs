//! Filter to ensure a minimum quality threshold.
//!
//! Removes items whose mean observed rating falls below a floor. Items
//! nobody has rated count as a mean of 0.0.

use crate::candidate::Candidate;
use crate::traits::Filter;
use anyhow::Result;
use catalog::Catalog;

/// Removes candidates below quality thresholds.
///
/// ## Algorithm
/// For each candidate:
/// 1. Look up its mean rating and rating count in the catalog
/// 2. Keep it if mean >= min_avg_rating and count >= min_count
pub struct MinimumRatingFilter {
    min_avg_rating: f32,
    min_count: u32,
}

impl MinimumRatingFilter {
    /// Keep items whose mean rating is at least `min_avg_rating`
    pub fn new(min_avg_rating: f32) -> Self {
        Self {
            min_avg_rating,
            min_count: 0,
        }
    }

    /// Also require at least `min_count` ratings (default: 0)
    pub fn with_min_count(mut self, min_count: u32) -> Self {
        self.min_count = min_count;
        self
    }
}

impl Filter for MinimumRatingFilter {
    fn name(&self) -> &str {
        "MinimumRatingFilter"
    }

    fn apply(&self, candidates: Vec<Candidate>, catalog: &Catalog) -> Result<Vec<Candidate>> {
        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| {
                catalog.mean_rating(candidate.item_id) >= self.min_avg_rating
                    && catalog.rating_count(candidate.item_id) >= self.min_count
            })
            .collect();

        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{Item, Rating, TextSource};

    fn create_test_catalog() -> Catalog {
        let items = vec![
            Item::new(1, "High Rated Movie", ["Drama"], "", TextSource::Genres),
            Item::new(2, "Low Rated Movie", ["Drama"], "", TextSource::Genres),
            Item::new(3, "Few Ratings Movie", ["Drama"], "", TextSource::Genres),
            Item::new(4, "Unrated Movie", ["Drama"], "", TextSource::Genres),
        ];

        let mut ratings = Vec::new();
        for i in 0..20 {
            ratings.push(Rating {
                user_id: i,
                item_id: 1,
                value: 4.5,
                timestamp: 1000000,
            });
            ratings.push(Rating {
                user_id: i + 100,
                item_id: 2,
                value: 2.0,
                timestamp: 1000000,
            });
        }
        for i in 0..5 {
            ratings.push(Rating {
                user_id: i + 200,
                item_id: 3,
                value: 4.5,
                timestamp: 1000000,
            });
        }

        Catalog::from_parts(items, ratings).unwrap()
    }

    #[test]
    fn test_minimum_rating_filter() {
        let catalog = create_test_catalog();
        let filter = MinimumRatingFilter::new(3.5);

        let filtered = filter.apply(Candidate::all(&catalog), &catalog).unwrap();
        let ids: Vec<_> = filtered.iter().map(|c| c.item_id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_minimum_count() {
        let catalog = create_test_catalog();
        let filter = MinimumRatingFilter::new(3.5).with_min_count(10);

        let filtered = filter.apply(Candidate::all(&catalog), &catalog).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].item_id, 1);
    }

    #[test]
    fn test_zero_floor_keeps_unrated() {
        let catalog = create_test_catalog();
        let filter = MinimumRatingFilter::new(0.0);

        let filtered = filter.apply(Candidate::all(&catalog), &catalog).unwrap();
        assert_eq!(filtered.len(), 4);
    }
}
