use catalog::{Catalog, TextSource};
use std::path::PathBuf;
use std::time::Instant;

fn main() {
    let data_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"));

    println!("Loading catalog from {}...\n", data_dir.display());

    let start = Instant::now();
    let catalog = Catalog::load_from_files(&data_dir, TextSource::TitleGenres)
        .expect("Failed to load catalog");
    let elapsed = start.elapsed();

    let (items, users, ratings) = catalog.counts();

    println!("=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Items: {}", items);
    println!("Users: {}", users);
    println!("Ratings: {}", ratings);
    println!(
        "\nPerformance: {:.0} ratings/second",
        ratings as f64 / elapsed.as_secs_f64()
    );

    let unrated = catalog
        .items()
        .iter()
        .filter(|item| catalog.rating_count(item.id) == 0)
        .count();
    println!("Cold-start items (no ratings): {}", unrated);
}
