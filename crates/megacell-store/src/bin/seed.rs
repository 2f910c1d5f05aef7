//! # Seed Data Generator
//!
//! Populates a development database with sample cells and prints their
//! reports.
//!
//! ## Usage
//! ```bash
//! # Seed the database named by the engine config (or MEGACELL_DB_PATH)
//! cargo run -p megacell-store --bin seed
//!
//! # Specify database and config paths
//! cargo run -p megacell-store --bin seed -- --db ./data/cells.db --config ./megacell.toml
//! ```
//!
//! ## Generated Cells
//! - `bulk-ores`: direct 1k cell holding a handful of ore types
//! - `mixed-drops`: direct 4k cell, inverted partition, many small stacks
//! - `iron-family`: compacting 4k cell seeded on iron ingots
//! - `gold-void`: compacting 1k cell with an overflow-void upgrade

use std::env;
use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::EnvFilter;

use megacell_core::{
    Actionable, CellVariant, CompressionRecipe, Host, ItemKey, KeyAmount, PartitionConfig,
    PartitionPolicy, RecipeDecomposer, UpgradeFlags,
};
use megacell_store::{Database, EngineConfig, StoredCell};

const COBBLESTONE: ItemKey = ItemKey::new(4);
const COAL: ItemKey = ItemKey::new(263);
const REDSTONE: ItemKey = ItemKey::new(331);
const IRON_NUGGET: ItemKey = ItemKey::new(452);
const IRON_INGOT: ItemKey = ItemKey::new(265);
const IRON_BLOCK: ItemKey = ItemKey::new(42);
const GOLD_NUGGET: ItemKey = ItemKey::new(371);
const GOLD_INGOT: ItemKey = ItemKey::new(266);
const GOLD_BLOCK: ItemKey = ItemKey::new(41);

/// Recipes used when the config file defines none.
const SAMPLE_RECIPES: &[CompressionRecipe] = &[
    CompressionRecipe::new(IRON_NUGGET, IRON_INGOT, 9),
    CompressionRecipe::new(IRON_INGOT, IRON_BLOCK, 9),
    CompressionRecipe::new(GOLD_NUGGET, GOLD_INGOT, 9),
    CompressionRecipe::new(GOLD_INGOT, GOLD_BLOCK, 9),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut db_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("MegaCell Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>       Database file path (default: from config)");
                println!("  -c, --config <PATH>   Engine config file (default: platform config dir)");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = EngineConfig::load(config_path)?;
    if let Some(path) = db_path {
        config.database.path = path;
    }
    if config.recipes.is_empty() {
        config.recipes = SAMPLE_RECIPES.to_vec();
    }

    println!("MegaCell Seed Data Generator");
    println!("============================");
    println!("Database: {}", config.database.path.display());
    println!("Cell kind: {} (multiplier {})", config.cell.name, config.cell.multiplier);
    println!();

    let db = Database::new(config.db_config()).await?;
    let repo = db.cells();

    let existing = repo.count().await?;
    if existing > 0 {
        println!("Database already has {} cells", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let channel = config.channel();
    let policy = PartitionPolicy;
    let decomposer: RecipeDecomposer = config.decomposer();
    let host = Host::new(&channel, &policy).with_decomposer(&decomposer);
    let kind = &config.cell;
    let big_tier = kind.tiers.len().saturating_sub(1).min(1);

    let mut cells = vec![
        (
            StoredCell::new("bulk-ores", CellVariant::Direct, 0),
            vec![
                KeyAmount::new(COBBLESTONE, 4_000_000_000_000),
                KeyAmount::new(COAL, 250_000_000),
                KeyAmount::new(REDSTONE, 1_000_000),
            ],
        ),
        (
            StoredCell::new("mixed-drops", CellVariant::Direct, big_tier)
                .with_partition(PartitionConfig::from_keys([COBBLESTONE]))
                .with_upgrades(UpgradeFlags {
                    inverted: true,
                    ..Default::default()
                }),
            (1000..1040)
                .map(|id| KeyAmount::new(ItemKey::new(id), i64::from(id)))
                .chain([KeyAmount::new(COBBLESTONE, 64)])
                .collect(),
        ),
        (
            StoredCell::new("iron-family", CellVariant::Compacting, big_tier)
                .with_partition(PartitionConfig::from_keys([IRON_INGOT])),
            vec![
                KeyAmount::new(IRON_NUGGET, 40),
                KeyAmount::new(IRON_BLOCK, 3),
                KeyAmount::new(IRON_INGOT, 17),
            ],
        ),
        (
            StoredCell::new("gold-void", CellVariant::Compacting, 0)
                .with_partition(PartitionConfig::from_keys([GOLD_BLOCK]))
                .with_upgrades(UpgradeFlags {
                    overflow_void: true,
                    ..Default::default()
                }),
            vec![KeyAmount::new(GOLD_BLOCK, i64::MAX)],
        ),
    ];

    for (stored, stacks) in cells.iter_mut() {
        let label = stored.label.clone();
        {
            let mut inventory = stored.open(kind, host)?;
            for stack in stacks.iter() {
                let rejected = inventory.inject(*stack, Actionable::Modulate);
                info!(
                    cell = %label,
                    key = %stack.key,
                    requested = stack.amount,
                    rejected = rejected.map_or(0, |r| r.amount),
                    "Seeded stack"
                );
            }
        }
        repo.insert(&*stored).await?;
        println!("✓ Created {} ({})", stored.label, stored.variant);
    }

    println!();
    println!("Reports");
    println!("-------");
    for mut stored in repo.list(100).await? {
        let report = stored.open(kind, host)?.report();
        println!("{} [{}]", stored.label, stored.id);
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    db.close().await;
    Ok(())
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - Default: `info,megacell=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,megacell=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
