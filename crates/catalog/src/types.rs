//! Core domain types for the movie catalog.
//!
//! - Type aliases for domain clarity (UserId, ItemId)
//! - `Item`, whose descriptive `text` is derived and kept in sync
//! - `Rating`, one row of the rating log
//! - `Catalog`, the ordered item store plus rating indices

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a user in the rating log
pub type UserId = u32;

/// Unique identifier for an item (movie) in the catalog
pub type ItemId = u32;

/// Lowest rating value accepted in the log
pub const MIN_RATING: f32 = 0.5;

/// Highest rating value accepted in the log
pub const MAX_RATING: f32 = 5.0;

// =============================================================================
// Item
// =============================================================================

/// Which item fields feed the derived `text` used for vectorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    /// Genre names only
    Genres,
    /// Title followed by genre names
    #[default]
    TitleGenres,
    /// Free-text description only
    Description,
    /// Title, genres and description
    All,
}

/// A movie in the catalog.
///
/// `text` is never set directly: it is rebuilt from title, genres and
/// description whenever one of them changes through a setter.
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    pub id: ItemId,
    title: String,
    genres: BTreeSet<String>,
    description: String,
    text_source: TextSource,
    text: String,
}

impl Item {
    pub fn new<I, S>(
        id: ItemId,
        title: impl Into<String>,
        genres: I,
        description: impl Into<String>,
        text_source: TextSource,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut item = Self {
            id,
            title: title.into(),
            genres: normalize_genres(genres),
            description: description.into(),
            text_source,
            text: String::new(),
        };
        item.rebuild_text();
        item
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn genres(&self) -> &BTreeSet<String> {
        &self.genres
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn text_source(&self) -> TextSource {
        self.text_source
    }

    /// The derived descriptive text fed to the vectorizer
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Case-insensitive genre membership test, Unicode-aware
    pub fn has_genre(&self, genre: &str) -> bool {
        let wanted = genre.trim().to_lowercase();
        self.genres.iter().any(|g| g.to_lowercase() == wanted)
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.rebuild_text();
    }

    pub fn set_genres<I, S>(&mut self, genres: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.genres = normalize_genres(genres);
        self.rebuild_text();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
        self.rebuild_text();
    }

    pub fn set_text_source(&mut self, text_source: TextSource) {
        self.text_source = text_source;
        self.rebuild_text();
    }

    /// Descriptive text this item would carry under `source`.
    ///
    /// Lets a caller vectorize with a different source without touching the
    /// stored item.
    pub fn text_for(&self, source: TextSource) -> String {
        let genres = self
            .genres
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");

        let parts: Vec<&str> = match source {
            TextSource::Genres => vec![&genres],
            TextSource::TitleGenres => vec![&self.title, &genres],
            TextSource::Description => vec![&self.description],
            TextSource::All => vec![&self.title, &genres, &self.description],
        };

        parts
            .into_iter()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn rebuild_text(&mut self) {
        self.text = self.text_for(self.text_source);
    }
}

/// Trim genre names and drop blanks
fn normalize_genres<I, S>(genres: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    genres
        .into_iter()
        .map(|g| g.as_ref().trim().to_string())
        .filter(|g| !g.is_empty())
        .collect()
}

// =============================================================================
// Rating Type
// =============================================================================

/// A single rating from a user for an item
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub item_id: ItemId,
    /// Rating value from 0.5 to 5.0
    pub value: f32,
    /// Unix timestamp when rating was made
    pub timestamp: i64,
}

// =============================================================================
// Statistics Types
// =============================================================================

/// Precomputed rating statistics for an item
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemStats {
    pub mean_rating: f32,
    pub rating_count: u32,
}

// =============================================================================
// Catalog
// =============================================================================

/// Ordered item store plus the rating log.
///
/// The position of an item in `items` is its canonical row index; the
/// similarity matrix and every ranking tie-break use that order.
#[derive(Debug, Default)]
pub struct Catalog {
    pub(crate) items: Vec<Item>,
    /// Item id -> row index
    pub(crate) id_index: HashMap<ItemId, usize>,
    /// Exact title -> first row index carrying that title
    pub(crate) title_index: HashMap<String, usize>,

    pub(crate) ratings: Vec<Rating>,
    pub(crate) user_ratings: HashMap<UserId, Vec<Rating>>,
    pub(crate) item_ratings: HashMap<ItemId, Vec<Rating>>,

    pub(crate) item_stats: HashMap<ItemId, ItemStats>,
}
