//! Expense book: validated create/update/delete with learn-on-save
//!
//! Saving an expense persists it first and then teaches the rule learner the
//! merchant → category pair. The two writes are independent; a failed learn
//! is logged and the saved expense stands.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::ids::IdGenerator;
use crate::models::{Expense, NewExpense};
use crate::resolver::ExpenseDraft;
use crate::rules::RuleLearner;
use crate::storage::{read_or, Storage};

/// Criteria for listing expenses
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    /// Case-insensitive text matched against merchant and notes
    pub search: Option<String>,
    pub category_id: Option<String>,
    /// Inclusive lower date bound
    pub from: Option<NaiveDate>,
    /// Inclusive upper date bound
    pub to: Option<NaiveDate>,
}

impl ExpenseFilter {
    pub fn matches(&self, expense: &Expense) -> bool {
        if let Some(ref search) = self.search {
            let needle = search.trim().to_lowercase();
            if !needle.is_empty() {
                let in_merchant = expense.merchant.to_lowercase().contains(&needle);
                let in_notes = expense
                    .notes
                    .as_deref()
                    .map(|n| n.to_lowercase().contains(&needle))
                    .unwrap_or(false);
                if !in_merchant && !in_notes {
                    return false;
                }
            }
        }
        if let Some(ref category_id) = self.category_id {
            if &expense.category_id != category_id {
                return false;
            }
        }
        if self.from.is_some_and(|from| expense.date < from) {
            return false;
        }
        if self.to.is_some_and(|to| expense.date > to) {
            return false;
        }
        true
    }
}

pub struct ExpenseBook {
    storage: Arc<dyn Storage>,
    ids: Arc<dyn IdGenerator>,
    learner: RuleLearner,
}

impl ExpenseBook {
    pub fn new(storage: Arc<dyn Storage>, ids: Arc<dyn IdGenerator>) -> Self {
        let learner = RuleLearner::new(storage.clone(), ids.clone());
        Self {
            storage,
            ids,
            learner,
        }
    }

    /// All expenses in stored order (empty when the store cannot be read)
    pub fn list(&self) -> Vec<Expense> {
        read_or("expenses", self.storage.get_expenses(), Vec::new)
    }

    pub fn get(&self, id: &str) -> Option<Expense> {
        self.list().into_iter().find(|e| e.id == id)
    }

    /// Expenses matching `filter`, newest date first
    pub fn filtered(&self, filter: &ExpenseFilter) -> Vec<Expense> {
        let mut expenses: Vec<Expense> = self
            .list()
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect();
        expenses.sort_by(|a, b| b.date.cmp(&a.date));
        expenses
    }

    /// The `n` most recently created expenses (ties: most recently stored first)
    pub fn recent(&self, n: usize) -> Vec<Expense> {
        let mut expenses = self.list();
        expenses.reverse();
        expenses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        expenses.truncate(n);
        expenses
    }

    /// Validate and store a new expense, then learn from it
    pub fn create(&self, input: NewExpense) -> Result<Expense> {
        let amount = validate(&input)?;
        let mut expenses = self.storage.get_expenses()?;

        let expense = Expense {
            id: self.ids.next_id(),
            amount,
            date: input.date,
            category_id: input.category_id,
            merchant: input.merchant,
            payment_method: input.payment_method,
            notes: input.notes,
            receipt_image: input.receipt_image,
            created_at: Utc::now().timestamp_millis(),
        };
        expenses.push(expense.clone());
        self.storage.save_expenses(&expenses)?;
        info!(id = %expense.id, merchant = %expense.merchant, amount, "Added expense");

        self.learn(&expense.merchant, &expense.category_id);
        Ok(expense)
    }

    /// Replace an existing expense, keeping its id and creation time
    ///
    /// Learns only when the category changed.
    pub fn update(&self, id: &str, input: NewExpense) -> Result<Expense> {
        let amount = validate(&input)?;
        let mut expenses = self.storage.get_expenses()?;

        let slot = expenses
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| Error::NotFound(format!("Expense {}", id)))?;

        let category_changed = slot.category_id != input.category_id;
        let updated = Expense {
            id: slot.id.clone(),
            amount,
            date: input.date,
            category_id: input.category_id,
            merchant: input.merchant,
            payment_method: input.payment_method,
            notes: input.notes,
            receipt_image: input.receipt_image,
            created_at: slot.created_at,
        };
        *slot = updated.clone();
        self.storage.save_expenses(&expenses)?;
        info!(id = %updated.id, "Updated expense");

        if category_changed {
            self.learn(&updated.merchant, &updated.category_id);
        }
        Ok(updated)
    }

    /// Save a form draft as a new expense or as an edit of its original
    pub fn submit(&self, draft: ExpenseDraft) -> Result<Expense> {
        match draft.into_parts() {
            (fields, Some(original)) => self.update(&original.id, fields),
            (fields, None) => self.create(fields),
        }
    }

    /// Delete an expense. Returns false if no such expense exists.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut expenses = self.storage.get_expenses()?;
        let before = expenses.len();
        expenses.retain(|e| e.id != id);
        if expenses.len() == before {
            return Ok(false);
        }
        self.storage.save_expenses(&expenses)?;
        info!(id, "Deleted expense");
        Ok(true)
    }

    fn learn(&self, merchant: &str, category_id: &str) {
        if let Err(e) = self.learner.learn(merchant, category_id) {
            warn!(merchant, category = category_id, error = %e, "Failed to learn rule from expense");
        }
    }
}

/// Check required fields. Returns the amount.
fn validate(input: &NewExpense) -> Result<f64> {
    let amount = input
        .amount
        .ok_or_else(|| Error::Validation("Amount is required".into()))?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::Validation(format!(
            "Amount must be a positive number, got {}",
            amount
        )));
    }
    if input.merchant.trim().is_empty() {
        return Err(Error::Validation("Merchant is required".into()));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, EXPENSES_KEY, RULES_KEY};
    use crate::ids::SequentialIds;
    use crate::models::PaymentMethod;
    use crate::rules::RuleStore;

    fn setup() -> (Arc<Database>, ExpenseBook) {
        let db = Arc::new(Database::in_memory().unwrap());
        let book = ExpenseBook::new(db.clone(), Arc::new(SequentialIds::new("e")));
        (db, book)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn input(amount: f64, merchant: &str, category: &str, date: NaiveDate) -> NewExpense {
        NewExpense {
            amount: Some(amount),
            date,
            category_id: category.into(),
            merchant: merchant.into(),
            payment_method: PaymentMethod::Cash,
            notes: None,
            receipt_image: None,
        }
    }

    #[test]
    fn test_create_assigns_id_and_learns() {
        let (db, book) = setup();
        let expense = book
            .create(input(12.5, "Blue Cafe", "cat-food", day(5)))
            .unwrap();
        assert_eq!(expense.id, "e1");
        assert!(expense.created_at > 0);
        assert_eq!(book.list(), vec![expense]);

        let rules = RuleStore::new(db).list();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].keyword, "Blue Cafe");
        assert_eq!(rules[0].category_id, "cat-food");
    }

    #[test]
    fn test_validation() {
        let (_db, book) = setup();
        let mut missing = input(1.0, "Shop", "cat-shop", day(1));
        missing.amount = None;
        for bad in [
            missing,
            input(0.0, "Shop", "cat-shop", day(1)),
            input(-3.0, "Shop", "cat-shop", day(1)),
            input(f64::NAN, "Shop", "cat-shop", day(1)),
            input(5.0, "   ", "cat-shop", day(1)),
        ] {
            assert!(matches!(book.create(bad), Err(Error::Validation(_))));
        }
        assert!(book.list().is_empty());
    }

    #[test]
    fn test_update_preserves_identity() {
        let (_db, book) = setup();
        let original = book.create(input(10.0, "Deli", "cat-food", day(2))).unwrap();
        let updated = book
            .update(&original.id, input(11.0, "Deli & Co", "cat-food", day(3)))
            .unwrap();

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(updated.amount, 11.0);
        assert_eq!(book.list().len(), 1);
    }

    #[test]
    fn test_update_learns_only_on_category_change() {
        let (db, book) = setup();
        let rules = RuleStore::new(db.clone());
        let original = book.create(input(10.0, "Deli", "cat-food", day(2))).unwrap();

        // Same category, new merchant: nothing new learned
        book.update(&original.id, input(10.0, "Deli Two", "cat-food", day(2)))
            .unwrap();
        assert_eq!(rules.list().len(), 1);

        book.update(&original.id, input(10.0, "Deli Two", "cat-shop", day(2)))
            .unwrap();
        let learned = rules.find_by_keyword("Deli Two").unwrap();
        assert_eq!(learned.category_id, "cat-shop");
    }

    #[test]
    fn test_update_unknown_id() {
        let (_db, book) = setup();
        assert!(matches!(
            book.update("nope", input(1.0, "X", "cat-other", day(1))),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_delete() {
        let (_db, book) = setup();
        let e = book.create(input(1.0, "X", "cat-other", day(1))).unwrap();
        assert!(book.delete(&e.id).unwrap());
        assert!(!book.delete(&e.id).unwrap());
        assert!(book.get(&e.id).is_none());
    }

    #[test]
    fn test_learn_failure_does_not_fail_save() {
        let (db, book) = setup();
        db.put_raw(RULES_KEY, "broken").unwrap();
        let saved = book.create(input(3.0, "Kiosk", "cat-food", day(1))).unwrap();
        assert_eq!(book.get(&saved.id), Some(saved));
    }

    #[test]
    fn test_corrupt_expenses_refuse_writes() {
        let (db, book) = setup();
        db.put_raw(EXPENSES_KEY, "broken").unwrap();
        assert!(book.list().is_empty());
        assert!(book.create(input(3.0, "Kiosk", "cat-food", day(1))).is_err());
        assert_eq!(db.get_raw(EXPENSES_KEY).unwrap().as_deref(), Some("broken"));
    }

    #[test]
    fn test_filter_and_sort() {
        let (_db, book) = setup();
        book.create(input(1.0, "Blue Cafe", "cat-food", day(1))).unwrap();
        book.create(input(2.0, "Bookshop", "cat-edu", day(3))).unwrap();
        let mut with_note = input(3.0, "Corner Store", "cat-food", day(2));
        with_note.notes = Some("coffee beans".into());
        book.create(with_note).unwrap();

        let all = book.filtered(&ExpenseFilter::default());
        let dates: Vec<_> = all.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![day(3), day(2), day(1)]);

        let food = book.filtered(&ExpenseFilter {
            category_id: Some("cat-food".into()),
            ..Default::default()
        });
        assert_eq!(food.len(), 2);

        let search = book.filtered(&ExpenseFilter {
            search: Some("COFFEE".into()),
            ..Default::default()
        });
        assert_eq!(search.len(), 1);
        assert_eq!(search[0].merchant, "Corner Store");

        let window = book.filtered(&ExpenseFilter {
            from: Some(day(2)),
            to: Some(day(2)),
            ..Default::default()
        });
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_recent() {
        let (_db, book) = setup();
        for (i, m) in ["A", "B", "C"].iter().enumerate() {
            book.create(input(1.0 + i as f64, m, "cat-other", day(1))).unwrap();
        }
        let recent = book.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].merchant, "C");
        assert_eq!(recent[1].merchant, "B");
    }

    #[test]
    fn test_submit_draft() {
        let (_db, book) = setup();
        let mut draft = ExpenseDraft::new(day(4));
        draft.set_amount(Some(9.0));
        draft.set_merchant("Cinema");
        draft.set_category("cat-ent");
        let created = book.submit(draft).unwrap();

        let mut edit = ExpenseDraft::edit(&created);
        edit.set_amount(Some(10.0));
        let updated = book.submit(edit).unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(book.list().len(), 1);
        assert_eq!(book.list()[0].amount, 10.0);
    }
}
