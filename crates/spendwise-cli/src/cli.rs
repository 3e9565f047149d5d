//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use spendwise_core::analytics::MAX_DAILY_WINDOW;

/// SpendWise - Track expenses and learn how you categorize them
#[derive(Parser)]
#[command(name = "spendwise")]
#[command(about = "Personal expense tracker with learned categorization", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path (default: SPENDWISE_DB, config.toml, then spendwise.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set SPENDWISE_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Show database, encryption and oracle status
    Status,

    /// Add an expense
    Add {
        /// Amount spent (positive)
        amount: f64,

        /// Merchant as shown on the receipt
        merchant: String,

        /// Category id or name (suggested from rules/oracle if omitted)
        #[arg(short, long)]
        category: Option<String>,

        /// Date (YYYY-MM-DD, default: today)
        #[arg(short, long)]
        date: Option<String>,

        /// Payment method (cash, credit, debit, transfer, wallet)
        #[arg(short, long)]
        payment: Option<String>,

        /// Free-form notes
        #[arg(short, long)]
        notes: Option<String>,

        /// Receipt image file to attach
        #[arg(long)]
        receipt: Option<PathBuf>,
    },

    /// Edit an existing expense
    Edit {
        /// Expense id
        id: String,

        #[arg(short, long)]
        amount: Option<f64>,

        #[arg(short, long)]
        merchant: Option<String>,

        /// Category id or name
        #[arg(short, long)]
        category: Option<String>,

        /// Date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,

        #[arg(short, long)]
        payment: Option<String>,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Delete an expense
    Delete {
        /// Expense id
        id: String,
    },

    /// List expenses (newest date first)
    List {
        /// Text to find in merchant or notes
        #[arg(short, long)]
        search: Option<String>,

        /// Category id or name
        #[arg(short, long)]
        category: Option<String>,

        /// Start date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        to: Option<String>,

        /// Maximum number of expenses to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the suggested category for a merchant
    Suggest {
        merchant: String,
    },

    /// Manage categorization rules
    Rules {
        #[command(subcommand)]
        action: Option<RulesAction>,
    },

    /// Manage categories
    Categories {
        #[command(subcommand)]
        action: Option<CategoriesAction>,
    },

    /// Show headline statistics and the latest expenses
    Dashboard {
        /// Only this category (id or name)
        #[arg(short, long)]
        category: Option<String>,

        /// Start date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        to: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show spend per category
    Breakdown {
        /// Only this category (id or name)
        #[arg(short, long)]
        category: Option<String>,

        /// Start date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        to: Option<String>,

        /// Row order: category (list order) or amount (largest first)
        #[arg(long, default_value = "category")]
        sort: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show spend per day for recent days
    Daily {
        /// Number of days (default: config, then 7)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_DAILY_WINDOW as i64))]
        days: Option<u32>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show spend per calendar month (all years combined)
    Monthly {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export expenses or a full backup
    Export {
        #[command(subcommand)]
        action: ExportAction,
    },

    /// Restore a JSON backup (replaces expenses, categories and rules)
    Restore {
        /// Backup file (.json or .json.gz)
        file: PathBuf,
    },

    /// Set the local user
    Login {
        email: String,

        #[arg(long)]
        name: Option<String>,
    },

    /// Clear the local user
    Logout,

    /// Show the local user
    Whoami,
}

#[derive(Subcommand)]
pub enum RulesAction {
    /// List rules in match order
    List,

    /// Delete a rule
    Delete {
        /// Rule id
        id: String,
    },

    /// Teach a merchant → category rule directly
    Learn {
        merchant: String,

        /// Category id or name
        category: String,
    },
}

#[derive(Subcommand)]
pub enum CategoriesAction {
    /// List categories
    List,

    /// Add a custom category
    Add {
        name: String,
    },
}

#[derive(Subcommand)]
pub enum ExportAction {
    /// Export expenses as CSV (newest date first)
    Csv {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Text to find in merchant or notes
        #[arg(short, long)]
        search: Option<String>,

        /// Category id or name
        #[arg(short, long)]
        category: Option<String>,

        /// Start date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        to: Option<String>,
    },

    /// Export a full JSON backup
    Backup {
        /// Output file (.json or .json.gz)
        #[arg(short, long)]
        output: PathBuf,
    },
}
