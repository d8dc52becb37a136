//! # Catalog Crate
//!
//! Holds the item records and the rating log the recommender works from.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Item, Rating, Catalog, ItemStats)
//! - **parser**: Parse `::`-delimited .dat files into Rust structs
//! - **index**: Build the catalog, resolve titles, aggregate rating stats
//! - **error**: Error types for catalog assembly
//!
//! ## Example Usage
//!
//! ```ignore
//! use catalog::{Catalog, TextSource};
//! use std::path::Path;
//!
//! let catalog = Catalog::load_from_files(Path::new("data"), TextSource::TitleGenres)?;
//!
//! let idx = catalog.resolve_title("Toy Story").unwrap();
//! let item = catalog.item_at(idx).unwrap();
//! println!("{} has {} ratings", item.title(), catalog.rating_count(item.id));
//! ```

pub mod error;
pub mod index;
pub mod parser;
pub mod types;

pub use error::{CatalogError, Result};
pub use types::{
    Catalog, Item, ItemId, ItemStats, MAX_RATING, MIN_RATING, Rating, TextSource, UserId,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_creation() {
        let catalog = Catalog::new();
        let (items, users, ratings) = catalog.counts();

        assert_eq!(items, 0);
        assert_eq!(users, 0);
        assert_eq!(ratings, 0);
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_item_text_follows_source() {
        let genres = ["Comedy", "Animation"];
        let item = Item::new(1, "Toy Story (1995)", genres, "toys", TextSource::Genres);
        assert_eq!(item.text(), "Animation Comedy");

        let item = Item::new(1, "Toy Story (1995)", genres, "toys", TextSource::TitleGenres);
        assert_eq!(item.text(), "Toy Story (1995) Animation Comedy");

        let item = Item::new(1, "Toy Story (1995)", genres, "toys", TextSource::Description);
        assert_eq!(item.text(), "toys");

        let item = Item::new(1, "Toy Story (1995)", genres, "toys", TextSource::All);
        assert_eq!(item.text(), "Toy Story (1995) Animation Comedy toys");
    }

    #[test]
    fn test_item_text_rebuilt_on_change() {
        let mut item = Item::new(1, "Old", ["Drama"], "", TextSource::TitleGenres);
        item.set_title("New");
        assert_eq!(item.text(), "New Drama");

        item.set_genres(["Horror", " ", "Thriller"]);
        assert_eq!(item.genres().len(), 2);
        assert_eq!(item.text(), "New Horror Thriller");

        item.set_text_source(TextSource::Description);
        assert_eq!(item.text(), "");
        item.set_description("a haunted house");
        assert_eq!(item.text(), "a haunted house");
    }

    #[test]
    fn test_has_genre_case_insensitive() {
        let item = Item::new(1, "Alien", ["Sci-Fi", "Horror"], "", TextSource::Genres);
        assert!(item.has_genre("sci-fi"));
        assert!(item.has_genre("HORROR"));
        assert!(!item.has_genre("Sci"));

        let item = Item::new(2, "Amélie", ["Comédie", "Romance"], "", TextSource::Genres);
        assert!(item.has_genre("COMÉDIE"));
        assert!(item.has_genre(" comédie "));
        assert!(!item.has_genre("COMEDIE"));
    }

    #[test]
    fn test_text_for_leaves_item_untouched() {
        let item = Item::new(1, "Alien", ["Horror", "Sci-Fi"], "in space", TextSource::TitleGenres);
        assert_eq!(item.text_for(TextSource::Genres), "Horror Sci-Fi");
        assert_eq!(item.text_for(TextSource::All), "Alien Horror Sci-Fi in space");
        assert_eq!(item.text(), "Alien Horror Sci-Fi");
    }

    #[test]
    fn test_insert_rating() {
        let mut catalog = Catalog::new();
        catalog
            .insert_item(Item::new(1193, "Cuckoo's Nest", ["Drama"], "", TextSource::Genres))
            .unwrap();

        catalog.insert_rating(Rating {
            user_id: 1,
            item_id: 1193,
            value: 5.0,
            timestamp: 978300760,
        });

        assert_eq!(catalog.get_user_ratings(1).len(), 1);
        assert_eq!(catalog.get_item_ratings(1193).len(), 1);
        assert_eq!(catalog.ratings().len(), 1);
        assert_eq!(catalog.rating_count(1193), 1);
        assert!((catalog.mean_rating(1193) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_insert_rating_after_build_refreshes_stats() {
        let items = vec![Item::new(1, "Heat", ["Crime"], "", TextSource::Genres)];
        let ratings = vec![Rating { user_id: 1, item_id: 1, value: 4.0, timestamp: 1 }];
        let mut catalog = Catalog::from_parts(items, ratings).unwrap();
        assert_eq!(catalog.rating_count(1), 1);

        catalog.insert_rating(Rating { user_id: 2, item_id: 1, value: 2.0, timestamp: 2 });
        assert_eq!(catalog.rating_count(1), 2);
        assert!((catalog.mean_rating(1) - 3.0).abs() < 1e-6);
        assert!(catalog.has_user(2));
    }
}
