//! Category list management
//!
//! The built-in categories are seeded when the collection is absent. Users
//! may add custom categories; nothing is ever deleted, so expense and rule
//! references stay resolvable unless the store is edited by hand.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::{Error, Result};
use crate::ids::IdGenerator;
use crate::models::{default_categories, Category, UNKNOWN_CATEGORY_NAME};
use crate::storage::{read_or, Storage};

/// Icon assigned to user-created categories
pub const CUSTOM_CATEGORY_ICON: &str = "MoreHorizontal";

pub struct CategoryStore {
    storage: Arc<dyn Storage>,
    ids: Arc<dyn IdGenerator>,
}

impl CategoryStore {
    pub fn new(storage: Arc<dyn Storage>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { storage, ids }
    }

    /// All categories in canonical (stored) order
    pub fn list(&self) -> Vec<Category> {
        read_or("categories", self.storage.get_categories(), default_categories)
    }

    pub fn get(&self, id: &str) -> Option<Category> {
        self.list().into_iter().find(|c| c.id == id)
    }

    /// Display name for a category id, "Unknown" if it does not resolve
    pub fn name_of(&self, id: &str) -> String {
        name_of(&self.list(), id)
    }

    /// Look up a category by id or by name (case-insensitive)
    pub fn find(&self, id_or_name: &str) -> Option<Category> {
        let categories = self.list();
        categories
            .iter()
            .find(|c| c.id == id_or_name)
            .or_else(|| {
                categories
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(id_or_name.trim()))
            })
            .cloned()
    }

    /// Create a custom category with a generated id and a color derived from its name
    pub fn add_custom(&self, name: &str) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("Category name cannot be empty".into()));
        }

        let mut categories = self.storage.get_categories()?;
        let category = Category {
            id: format!("cat-{}", self.ids.next_id()),
            name: name.to_string(),
            color: color_for(name),
            icon: CUSTOM_CATEGORY_ICON.to_string(),
            is_custom: true,
        };
        categories.push(category.clone());
        self.storage.save_categories(&categories)?;

        info!(id = %category.id, name = %category.name, "Added custom category");
        Ok(category)
    }
}

/// Display name for `id` within `categories`
pub fn name_of(categories: &[Category], id: &str) -> String {
    categories
        .iter()
        .find(|c| c.id == id)
        .map(|c| c.name.clone())
        .unwrap_or_else(|| UNKNOWN_CATEGORY_NAME.to_string())
}

/// Stable chart color for a custom category name
pub fn color_for(name: &str) -> String {
    let digest = Sha256::digest(name.to_lowercase().as_bytes());
    format!("#{}", &hex::encode(digest)[..6])
}
