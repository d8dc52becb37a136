//! Parser for catalog data files.
//!
//! - items.dat: itemId::title::genres[::description]
//! - ratings.dat: userId::itemId::rating::timestamp
//!
//! Item rows must carry a valid id; missing text fields become empty
//! strings. Rating rows with any missing or unparseable field are dropped.

use crate::error::{CatalogError, Result};
use crate::types::*;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

const ITEMS_FILE: &str = "items.dat";

/// Read a file with ISO-8859-1 encoding (Latin-1)
///
/// MovieLens-style dumps are Latin-1, not UTF-8. Every byte maps directly
/// to the Unicode code point of the same value.
fn read_lines_latin1(path: &Path) -> Result<Vec<String>> {
    let mut file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => CatalogError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => CatalogError::IoError(e),
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let content: String = bytes.iter().map(|&b| b as char).collect();

    Ok(content.lines().map(|s| s.to_string()).collect())
}

/// Parse the items.dat file
pub fn parse_items(path: &Path, text_source: TextSource) -> Result<Vec<Item>> {
    let lines = read_lines_latin1(path)?;
    let mut items = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let line_trimmed = line.trim();
        if line_trimmed.is_empty() {
            continue;
        }
        items.push(parse_item_line(line_trimmed, idx + 1, text_source)?);
    }

    Ok(items)
}

/// Parse one items.dat row
///
/// The title often includes the year in parentheses: "Toy Story (1995)".
/// Genres are pipe-separated: "Animation|Children's|Comedy".
pub fn parse_item_line(line: &str, line_no: usize, text_source: TextSource) -> Result<Item> {
    let mut parts = line.splitn(4, "::");

    let item_id = parts.next().unwrap_or_default().trim();
    let id: ItemId = item_id.parse().map_err(|e| CatalogError::ParseError {
        file: ITEMS_FILE.to_string(),
        line: line_no,
        reason: format!("Invalid itemId '{}': {}", item_id, e),
    })?;

    let title = parts.next().unwrap_or_default().trim();
    let genres = parts.next().unwrap_or_default();
    let description = parts.next().unwrap_or_default().trim();

    Ok(Item::new(
        id,
        title,
        parse_genres(genres),
        description,
        text_source,
    ))
}

/// Parse the ratings.dat file
///
/// Returns the clean ratings and the number of rows dropped.
pub fn parse_ratings(path: &Path) -> Result<(Vec<Rating>, usize)> {
    let lines = read_lines_latin1(path)?;
    let mut ratings = Vec::new();
    let mut dropped = 0;

    for line in &lines {
        let line_trimmed = line.trim();
        if line_trimmed.is_empty() {
            continue;
        }
        match parse_rating_line(line_trimmed) {
            Some(rating) => ratings.push(rating),
            None => dropped += 1,
        }
    }
    Ok((ratings, dropped))
}

/// Parse one ratings.dat row, `None` if any field is missing or malformed
pub fn parse_rating_line(line: &str) -> Option<Rating> {
    let mut parts = line.split("::").map(str::trim);

    let user_id = parts.next().filter(|s| !s.is_empty())?.parse().ok()?;
    let item_id = parts.next().filter(|s| !s.is_empty())?.parse().ok()?;
    let value: f32 = parts.next().filter(|s| !s.is_empty())?.parse().ok()?;
    let timestamp = parts.next().filter(|s| !s.is_empty())?.parse().ok()?;

    if !value.is_finite() {
        return None;
    }

    Some(Rating {
        user_id,
        item_id,
        value,
        timestamp,
    })
}

/// Split a pipe-separated genre string, dropping blanks
///
/// Example: "Action|Adventure|Sci-Fi" -> ["Action", "Adventure", "Sci-Fi"]
pub fn parse_genres(s: &str) -> Vec<&str> {
    s.split('|')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .collect()
}
