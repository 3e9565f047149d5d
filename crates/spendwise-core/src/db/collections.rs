//! Collection storage: one JSON document per collection

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::Database;
use crate::error::Result;
use crate::models::{default_categories, CategorizationRule, Category, Expense, User};
use crate::storage::Storage;

pub const EXPENSES_KEY: &str = "spendwise_expenses";
pub const CATEGORIES_KEY: &str = "spendwise_categories";
pub const RULES_KEY: &str = "spendwise_rules";
pub const USER_KEY: &str = "spendwise_user";

impl Database {
    fn load_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_raw(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn store_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.put_raw(key, &raw)
    }
}

impl Storage for Database {
    fn get_expenses(&self) -> Result<Vec<Expense>> {
        Ok(self.load_json(EXPENSES_KEY)?.unwrap_or_default())
    }

    fn save_expenses(&self, expenses: &[Expense]) -> Result<()> {
        self.store_json(EXPENSES_KEY, expenses)
    }

    fn get_categories(&self) -> Result<Vec<Category>> {
        Ok(self
            .load_json(CATEGORIES_KEY)?
            .unwrap_or_else(default_categories))
    }

    fn save_categories(&self, categories: &[Category]) -> Result<()> {
        self.store_json(CATEGORIES_KEY, categories)
    }

    fn get_rules(&self) -> Result<Vec<CategorizationRule>> {
        Ok(self.load_json(RULES_KEY)?.unwrap_or_default())
    }

    fn save_rules(&self, rules: &[CategorizationRule]) -> Result<()> {
        self.store_json(RULES_KEY, rules)
    }

    fn get_user(&self) -> Result<Option<User>> {
        self.load_json(USER_KEY)
    }

    fn set_user(&self, user: Option<&User>) -> Result<()> {
        match user {
            Some(user) => self.store_json(USER_KEY, user),
            None => self.remove_raw(USER_KEY),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::PaymentMethod;
    use chrono::NaiveDate;

    fn expense(id: &str, amount: f64) -> Expense {
        Expense {
            id: id.to_string(),
            amount,
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            category_id: "cat-food".to_string(),
            merchant: "Deli".to_string(),
            payment_method: PaymentMethod::Cash,
            notes: None,
            receipt_image: None,
            created_at: 1,
        }
    }

    #[test]
    fn test_absent_collections_have_defaults() {
        let db = Database::in_memory().unwrap();
        assert!(db.get_expenses().unwrap().is_empty());
        assert!(db.get_rules().unwrap().is_empty());
        assert!(db.get_user().unwrap().is_none());
        assert_eq!(db.get_categories().unwrap(), default_categories());
    }

    #[test]
    fn test_expenses_round_trip_in_order() {
        let db = Database::in_memory().unwrap();
        let items = vec![expense("b", 2.0), expense("a", 1.0)];
        db.save_expenses(&items).unwrap();
        assert_eq!(db.get_expenses().unwrap(), items);
    }

    #[test]
    fn test_save_is_full_overwrite() {
        let db = Database::in_memory().unwrap();
        db.save_expenses(&[expense("a", 1.0), expense("b", 2.0)])
            .unwrap();
        db.save_expenses(&[expense("c", 3.0)]).unwrap();
        let stored = db.get_expenses().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, "c");
    }

    #[test]
    fn test_saved_empty_categories_stay_empty() {
        let db = Database::in_memory().unwrap();
        db.save_categories(&[]).unwrap();
        assert!(db.get_categories().unwrap().is_empty());
    }

    #[test]
    fn test_user_set_and_clear() {
        let db = Database::in_memory().unwrap();
        let user = User {
            id: "user-1".into(),
            email: "sam@example.com".into(),
            name: "Sam".into(),
        };
        db.set_user(Some(&user)).unwrap();
        assert_eq!(db.get_user().unwrap(), Some(user));
        db.set_user(None).unwrap();
        assert!(db.get_user().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_collection_is_reported() {
        let db = Database::in_memory().unwrap();
        db.put_raw(RULES_KEY, "{not json").unwrap();
        assert!(matches!(db.get_rules(), Err(Error::Json(_))));
    }
}
