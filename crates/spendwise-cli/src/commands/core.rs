//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `resolve_db_path` - Pick the database path from flag or config
//! - `expense_filter` - Turn filter arguments into an `ExpenseFilter`
//! - `cmd_init` - Initialize the database
//! - `cmd_status` - Show database and oracle status

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use spendwise_core::db::CATEGORIES_KEY;
use spendwise_core::models::default_categories;
use spendwise_core::{
    AIClient, CategoryOracle, CategoryStore, Config, Database, ExpenseBook, ExpenseFilter,
    RandomIds, RuleStore, Storage,
};

/// Database file used when neither `--db` nor config names one
pub const DEFAULT_DB_PATH: &str = "spendwise.db";

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

/// Priority: --db flag > SPENDWISE_DB / config.toml > spendwise.db
pub fn resolve_db_path(flag: Option<&Path>, config: &Config) -> PathBuf {
    flag.map(Path::to_path_buf)
        .or_else(|| config.db.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH))
}

/// Shared storage handle for core components
pub fn storage(db: &Database) -> Arc<dyn Storage> {
    Arc::new(db.clone())
}

pub fn category_store(db: &Database) -> CategoryStore {
    CategoryStore::new(storage(db), Arc::new(RandomIds))
}

pub fn expense_book(db: &Database) -> ExpenseBook {
    ExpenseBook::new(storage(db), Arc::new(RandomIds))
}

/// Expense filter options shared by list, reports and CSV export
#[derive(Debug, Default, Clone)]
pub struct FilterArgs {
    pub search: Option<String>,
    pub category: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Validate filter arguments against the category list and parse dates
pub fn expense_filter(categories: &CategoryStore, args: &FilterArgs) -> Result<ExpenseFilter> {
    Ok(ExpenseFilter {
        search: args.search.clone(),
        category_id: args
            .category
            .as_deref()
            .map(|c| resolve_category_arg(categories, c))
            .transpose()?,
        from: args.from.as_deref().map(parse_date).transpose()?,
        to: args.to.as_deref().map(parse_date).transpose()?,
    })
}

/// Parse a YYYY-MM-DD date argument
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}' (use YYYY-MM-DD)", value))
}

/// Resolve a category argument (id or name) to a category id
pub fn resolve_category_arg(categories: &CategoryStore, value: &str) -> Result<String> {
    categories
        .find(value)
        .map(|c| c.id)
        .ok_or_else(|| anyhow::anyhow!("Category not found: {}", value))
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path, no_encrypt)?;

    if db.get_raw(CATEGORIES_KEY)?.is_none() {
        db.save_categories(&default_categories())
            .context("Failed to seed categories")?;
        println!("   Seeded default categories");
    }

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Add an expense: spendwise add 12.50 \"Blue Cafe\"");
    println!("  2. See where it goes: spendwise dashboard");

    Ok(())
}

pub async fn cmd_status(db: &Database, oracle: Option<AIClient>) -> Result<()> {
    use spendwise_core::db::DB_KEY_ENV;

    println!();
    println!("📊 SpendWise Status");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Database: {}", db.path());

    if let Ok(metadata) = std::fs::metadata(db.path()) {
        let size_kb = metadata.len() as f64 / 1024.0;
        if size_kb < 1024.0 {
            println!("   Size: {:.1} KB", size_kb);
        } else {
            println!("   Size: {:.1} MB", size_kb / 1024.0);
        }
    }

    if db.is_encrypted() {
        println!("   🔒 Encryption: ENABLED ({}=***)", DB_KEY_ENV);
    } else {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    }

    println!();
    println!("   Stored collections: {}", db.collection_count()?);
    println!("   Expenses: {}", expense_book(db).list().len());
    println!("   Categories: {}", category_store(db).list().len());
    println!("   Rules: {}", RuleStore::new(storage(db)).list().len());

    println!();
    match oracle {
        Some(client) => {
            println!("   🤖 Oracle: {} @ {}", client.model(), client.host());
            if client.health_check().await {
                println!("   ✅ Oracle is reachable");
            } else {
                println!("   ❌ Oracle is not reachable (rules only until it is)");
            }
        }
        None => {
            println!("   🤖 Oracle: not configured (rules only)");
            println!("      💡 Set GEMINI_API_KEY or AI_BACKEND to enable suggestions");
        }
    }

    println!();
    Ok(())
}
