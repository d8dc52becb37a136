use anyhow::{Context, Result, bail};
use catalog::{Catalog, TextSource, UserId};
use clap::{Parser, Subcommand};
use colored::Colorize;
use content::StopWordSet;
use engine::{
    EngineConfig, HybridMode, LazyContext, PredictorKind, Recommendation, Recommender,
    RecommenderContext, SampleMode, Strategy,
};
use predictor::{ItemMeanPredictor, LatentFactorModel, rmse, train_test_split};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::info;

/// movie-recs - content, collaborative and genre movie recommendations
#[derive(Parser)]
#[command(name = "movie-recs")]
#[command(about = "Movie recommendations from item similarity and rating prediction", long_about = None)]
struct Cli {
    /// Directory holding items.dat and ratings.dat
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// JSON engine config; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct Overrides {
    /// genres | title_genres | description | all
    #[arg(long, value_parser = parse_setting::<TextSource>)]
    text_source: Option<TextSource>,

    /// english | none
    #[arg(long, value_parser = parse_setting::<StopWordSet>)]
    stop_words: Option<StopWordSet>,

    /// latent_factor | item_mean
    #[arg(long, value_parser = parse_setting::<PredictorKind>)]
    predictor: Option<PredictorKind>,

    /// ordered | random
    #[arg(long, value_parser = parse_setting::<SampleMode>)]
    sample_mode: Option<SampleMode>,

    /// concat | rerank
    #[arg(long, value_parser = parse_setting::<HybridMode>)]
    hybrid_mode: Option<HybridMode>,

    /// Rerank pool size as a multiple of the limit
    #[arg(long)]
    pool_multiplier: Option<usize>,

    /// Latent factors per user and item
    #[arg(long)]
    factors: Option<usize>,

    /// Training epochs
    #[arg(long)]
    epochs: Option<usize>,

    /// Seed for factor initialization and genre sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Abort training after this many milliseconds
    #[arg(long)]
    train_budget_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Movies similar to a title
    Content {
        /// Title to match (exact, then case-insensitive substring)
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Movies in a genre
    Genre {
        #[arg(long)]
        genre: String,

        #[arg(long, default_value = "10")]
        limit: usize,

        /// Keep only movies whose mean rating reaches this floor, best first
        #[arg(long)]
        min_rating: Option<f32>,
    },

    /// Movies a user is predicted to rate highest
    Collaborative {
        #[arg(long)]
        user_id: UserId,

        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Content similarity combined with a user's ratings
    Hybrid {
        #[arg(long)]
        title: String,

        #[arg(long)]
        user_id: UserId,

        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Most-rated movies
    Popular {
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Movies matching free-text keywords
    Text {
        #[arg(long)]
        query: String,

        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Search for movies by title
    Search {
        /// Case-insensitive title fragment
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Held-out RMSE of the rating predictors
    Evaluate {
        /// Fraction of ratings held out for testing
        #[arg(long, default_value = "0.2")]
        test_ratio: f32,
    },

    /// Concurrent query benchmark against one shared context
    Benchmark {
        /// Number of queries to issue
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Queries in flight at once
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = resolve_config(cli.config.as_deref(), &cli.overrides)?;

    println!("Loading dataset from {}...", cli.data_dir.display());
    let start = Instant::now();
    let catalog = Arc::new(
        Catalog::load_from_files(&cli.data_dir, config.text_source.unwrap_or_default())
            .context("Failed to load dataset")?,
    );
    let (items, users, ratings) = catalog.counts();
    println!(
        "{} Loaded {} movies, {} users, {} ratings in {:.2?}",
        "✓".green(),
        items,
        users,
        ratings,
        start.elapsed()
    );

    match cli.command {
        Commands::Search { title, limit } => handle_search(&catalog, &title, limit, cli.json)?,
        Commands::Evaluate { test_ratio } => handle_evaluate(&catalog, &config, test_ratio)?,
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(catalog, config, requests, concurrent).await?,
        query => {
            let recommender = build_recommender(catalog, config)?;
            let recommendations = run_query(&recommender, query)?;
            print_recommendations(&recommender, &recommendations, cli.json)?;
        }
    }

    Ok(())
}

/// Parse a config enum from its snake_case name
fn parse_setting<T: DeserializeOwned>(value: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| format!("unrecognized value '{}'", value))
}

/// Config file (or defaults), then flag overrides, then validation
fn resolve_config(path: Option<&Path>, overrides: &Overrides) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    if let Some(text_source) = overrides.text_source {
        config = config.with_text_source(text_source);
    }
    if let Some(stop_words) = overrides.stop_words {
        config = config.with_stop_words(stop_words);
    }
    if let Some(predictor) = overrides.predictor {
        config = config.with_predictor(predictor);
    }
    if let Some(mode) = overrides.sample_mode {
        config = config.with_sample_mode(mode);
    }
    if let Some(mode) = overrides.hybrid_mode {
        config = config.with_hybrid_mode(mode);
    }
    if let Some(multiplier) = overrides.pool_multiplier {
        config = config.with_pool_multiplier(multiplier);
    }
    if let Some(factors) = overrides.factors {
        config.factors.factors = factors;
    }
    if let Some(epochs) = overrides.epochs {
        config.factors.epochs = epochs;
    }
    if let Some(seed) = overrides.seed {
        config.factors.seed = seed;
        config = config.with_sample_seed(seed);
    }
    if let Some(budget) = overrides.train_budget_ms {
        config.factors.time_budget_ms = Some(budget);
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn build_recommender(catalog: Arc<Catalog>, config: EngineConfig) -> Result<Recommender> {
    let start = Instant::now();
    let context =
        RecommenderContext::build(catalog, config).context("Failed to build recommender")?;
    println!("{} Built recommender in {:.2?}", "✓".green(), start.elapsed());
    Ok(Recommender::new(Arc::new(context)))
}

fn run_query(recommender: &Recommender, command: Commands) -> Result<Vec<Recommendation>> {
    let recommendations = match command {
        Commands::Content { title, limit } => recommender.content(&title, limit)?,
        Commands::Genre {
            genre,
            limit,
            min_rating,
        } => recommender.genre(&genre, limit, min_rating)?,
        Commands::Collaborative { user_id, limit } => {
            recommender.collaborative(user_id, limit)?
        }
        Commands::Hybrid {
            title,
            user_id,
            limit,
        } => recommender.hybrid(&title, user_id, limit)?,
        Commands::Popular { limit } => recommender.popular(limit)?,
        Commands::Text { query, limit } => recommender.similar_to_text(&query, limit)?,
        Commands::Search { .. } | Commands::Evaluate { .. } | Commands::Benchmark { .. } => {
            bail!("not a recommendation query")
        }
    };
    Ok(recommendations)
}

/// Handle the 'search' command
fn handle_search(catalog: &Catalog, title: &str, limit: usize, json: bool) -> Result<()> {
    let matches = catalog.search_titles(title, limit);

    if json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }

    println!("{}", format!("Search results for '{}':", title).bold().blue());
    if matches.is_empty() {
        println!("  {}", "No matching titles".yellow());
    }
    for item in matches {
        println!(
            "{}: {} [{}] avg {:.2} ({} ratings)",
            item.id,
            item.title(),
            genre_list(item.genres().iter()),
            catalog.mean_rating(item.id),
            catalog.rating_count(item.id)
        );
    }
    Ok(())
}

/// Handle the 'evaluate' command
fn handle_evaluate(catalog: &Catalog, config: &EngineConfig, test_ratio: f32) -> Result<()> {
    let (train, test) = train_test_split(catalog.ratings(), test_ratio, config.factors.seed)
        .context("Failed to split ratings")?;
    println!(
        "Split ratings: {} train, {} test",
        train.len(),
        test.len()
    );

    let start = Instant::now();
    let baseline = ItemMeanPredictor::train(&train).context("Failed to train baseline")?;
    let model =
        LatentFactorModel::train(&train, &config.factors).context("Failed to train model")?;
    info!("Trained both predictors in {:.2?}", start.elapsed());

    println!("{}", "Held-out RMSE:".bold().blue());
    for (name, score) in [
        ("ItemMeanPredictor", rmse(&baseline, &test)),
        ("LatentFactorModel", rmse(&model, &test)),
    ] {
        match score {
            Some(score) => println!("  {:<20} {:.4}", name, score),
            None => println!("  {:<20} {}", name, "n/a (empty test set)".yellow()),
        }
    }
    println!("  {:<20} {:.4}", "(train RMSE)", model.train_rmse());
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    catalog: Arc<Catalog>,
    config: EngineConfig,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    if requests == 0 || concurrent == 0 {
        bail!("requests and concurrent must both be greater than zero");
    }

    let titles: Vec<String> = catalog.items().iter().map(|i| i.title().to_string()).collect();
    let users = catalog.user_ids();
    if titles.is_empty() || users.is_empty() {
        bail!("benchmark needs at least one movie and one rating");
    }

    // Every task races for the same lazily built context
    let lazy = Arc::new(LazyContext::new({
        let catalog = Arc::clone(&catalog);
        move || RecommenderContext::build(Arc::clone(&catalog), config.clone())
    }));

    let queries: Vec<(String, UserId, bool)> = {
        let mut rng = rand::rng();
        (0..requests)
            .map(|_| {
                let title = titles.choose(&mut rng).cloned().unwrap_or_default();
                let user = users.choose(&mut rng).copied().unwrap_or_default();
                (title, user, rng.random_bool(0.5))
            })
            .collect()
    };

    let semaphore = Arc::new(Semaphore::new(concurrent));
    let wall = Instant::now();
    let mut handles = Vec::with_capacity(requests);
    for (title, user_id, content_query) in queries {
        let permit = Arc::clone(&semaphore).acquire_owned().await?;
        let lazy = Arc::clone(&lazy);
        handles.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let recommender = Recommender::new(lazy.get()?);
            let start = Instant::now();
            if content_query {
                recommender.content(&title, 10)?;
            } else {
                recommender.collaborative(user_id, 10)?;
            }
            Ok::<_, anyhow::Error>(start.elapsed())
        }));
    }

    let mut timings: Vec<Duration> = Vec::with_capacity(handles.len());
    for handle in handles {
        timings.push(handle.await.context("Benchmark task panicked")??);
    }
    let wall_time = wall.elapsed();

    timings.sort();
    let total: Duration = timings.iter().sum();
    let avg = total / timings.len() as u32;
    let percentile = |p: f32| timings[((timings.len() as f32 * p) as usize).min(timings.len() - 1)];

    println!("{}", "Benchmark results:".bold().blue());
    println!("Wall time: {:.2?} (includes one context build)", wall_time);
    println!("Average latency: {:.2?}", avg);
    println!("P50 latency: {:.2?}", percentile(0.50));
    println!("P95 latency: {:.2?}", percentile(0.95));
    println!("P99 latency: {:.2?}", percentile(0.99));
    println!(
        "Throughput: {:.2} queries/second",
        requests as f64 / wall_time.as_secs_f64()
    );
    Ok(())
}

fn genre_list<'a>(genres: impl Iterator<Item = &'a String>) -> String {
    genres.map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Helper function to format and print recommendations
fn print_recommendations(
    recommender: &Recommender,
    recommendations: &[Recommendation],
    json: bool,
) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(recommendations)?);
        return Ok(());
    }

    println!("{}", "Movie Recommendations:".bold().blue());
    if recommendations.is_empty() {
        println!("  {}", "No recommendations".yellow());
        return Ok(());
    }

    let catalog = recommender.context().catalog();
    for (rank, rec) in recommendations.iter().enumerate() {
        let genres = catalog
            .get_item(rec.item_id)
            .map(|item| genre_list(item.genres().iter()))
            .unwrap_or_default();
        println!(
            "{}. {} [{}] - {}: {:.2}",
            (rank + 1).to_string().green(),
            rec.title,
            genres,
            score_label(rec.strategy, recommender),
            rec.score
        );
    }
    Ok(())
}

fn score_label(strategy: Strategy, recommender: &Recommender) -> &'static str {
    match strategy {
        Strategy::Content => "similarity",
        Strategy::Genre => "mean rating",
        Strategy::Collaborative => "predicted",
        Strategy::Popular => "ratings",
        Strategy::Hybrid => match recommender.context().config().hybrid_mode {
            HybridMode::Concat => "score",
            HybridMode::Rerank => "mean rating",
        },
    }
}
