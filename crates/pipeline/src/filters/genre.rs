//! Filter to keep only items tagged with a given genre.

use crate::candidate::Candidate;
use crate::traits::Filter;
use anyhow::Result;
use catalog::Catalog;

/// Keeps candidates whose genre set contains `genre`, case-insensitively.
///
/// Candidates whose row is not in the catalog are dropped.
pub struct GenreFilter {
    genre: String,
}

impl GenreFilter {
    pub fn new(genre: impl Into<String>) -> Self {
        Self {
            genre: genre.into(),
        }
    }
}

impl Filter for GenreFilter {
    fn name(&self) -> &str {
        "GenreFilter"
    }

    fn apply(&self, candidates: Vec<Candidate>, catalog: &Catalog) -> Result<Vec<Candidate>> {
        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| {
                catalog
                    .item_at(candidate.index)
                    .is_some_and(|item| item.has_genre(&self.genre))
            })
            .collect();
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{Item, TextSource};

    fn create_test_catalog() -> Catalog {
        Catalog::from_parts(
            vec![
                Item::new(1, "Action Movie", ["Action", "Adventure"], "", TextSource::Genres),
                Item::new(2, "Drama Movie", ["Drama"], "", TextSource::Genres),
                Item::new(3, "Sci-Fi Movie", ["Sci-Fi", "Action"], "", TextSource::Genres),
            ],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn test_genre_filter_keeps_order() {
        let catalog = create_test_catalog();
        let filter = GenreFilter::new("ACTION");

        let filtered = filter.apply(Candidate::all(&catalog), &catalog).unwrap();
        let ids: Vec<_> = filtered.iter().map(|c| c.item_id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_genre_filter_no_match() {
        let catalog = create_test_catalog();
        let filter = GenreFilter::new("Western");

        let filtered = filter.apply(Candidate::all(&catalog), &catalog).unwrap();
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_genre_filter_drops_unknown_rows() {
        let catalog = create_test_catalog();
        let filter = GenreFilter::new("Drama");

        let candidates = vec![Candidate::new(1, 2, 0.0), Candidate::new(42, 99, 0.0)];
        let filtered = filter.apply(candidates, &catalog).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].item_id, 2);
    }
}
