//! SpendWise Core Library
//!
//! Shared functionality for the SpendWise expense tracker:
//! - Collection store (SQLite-backed key/value collections behind a `Storage` port)
//! - Rule store and rule learner for merchant → category rules
//! - Categorization resolver (rules first, optional AI oracle fallback)
//! - Expense book with validation and learn-on-save
//! - Aggregation engine for dashboard statistics and chart series
//! - CSV export and JSON backups
//! - Pluggable category oracle backends (Gemini, OpenAI-compatible, Ollama, mock)

pub mod ai;
pub mod analytics;
pub mod categories;
pub mod config;
pub mod db;
pub mod error;
pub mod expenses;
pub mod export;
pub mod ids;
pub mod models;
pub mod resolver;
pub mod rules;
pub mod session;
pub mod storage;

/// Test utilities including mock oracle server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{AIClient, CategoryOracle, MockBackend, OracleVerdict};
pub use analytics::{Analytics, CategoryTotal, DailyPoint, MonthlyPoint, TopCategory};
pub use categories::CategoryStore;
pub use config::{Config, OracleBackendKind, OracleConfig};
pub use db::Database;
pub use error::{Error, Result};
pub use expenses::{ExpenseBook, ExpenseFilter};
pub use export::{Backup, RestoreStats};
pub use ids::{IdGenerator, RandomIds, SequentialIds};
pub use models::{
    CategorizationRule, Category, DashboardStats, Expense, NewExpense, PaymentMethod, User,
};
pub use resolver::{ExpenseDraft, LookupTicket, Resolution, Resolver};
pub use rules::{LearnOutcome, RuleLearner, RuleStore};
pub use session::Session;
pub use storage::Storage;
