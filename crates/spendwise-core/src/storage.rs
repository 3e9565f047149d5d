//! Persistence port
//!
//! The categorization and analytics components never touch a concrete store.
//! They are handed an `Arc<dyn Storage>` and read/write whole collections
//! through it. `Database` is the production implementation.

use crate::error::Result;
use crate::models::{CategorizationRule, Category, Expense, User};

/// Per-collection get/save over a local store
///
/// `get_*` returns the stored sequence in stored order, an empty sequence when
/// the collection has never been written, and the built-in categories when the
/// category collection is absent. `save_*` overwrites the whole collection.
pub trait Storage: Send + Sync {
    fn get_expenses(&self) -> Result<Vec<Expense>>;
    fn save_expenses(&self, expenses: &[Expense]) -> Result<()>;

    fn get_categories(&self) -> Result<Vec<Category>>;
    fn save_categories(&self, categories: &[Category]) -> Result<()>;

    fn get_rules(&self) -> Result<Vec<CategorizationRule>>;
    fn save_rules(&self, rules: &[CategorizationRule]) -> Result<()>;

    fn get_user(&self) -> Result<Option<User>>;
    fn set_user(&self, user: Option<&User>) -> Result<()>;
}

/// Read a collection, falling back to `fallback` when the store cannot supply it
///
/// Used by components that must keep working on a corrupt or unavailable store.
pub(crate) fn read_or<T>(
    collection: &str,
    result: Result<Vec<T>>,
    fallback: impl FnOnce() -> Vec<T>,
) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(collection, error = %e, "Failed to read collection, using fallback");
            fallback()
        }
    }
}
