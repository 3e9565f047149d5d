//! Export functionality for expenses and full backups
//!
//! Supports:
//! - Expense CSV export (one row per expense, category shown by name)
//! - Full JSON backup export/restore of expenses, categories and rules
//!
//! Backup files ending in `.gz` are gzip-compressed.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::categories::name_of;
use crate::error::{Error, Result};
use crate::models::{CategorizationRule, Category, Expense};
use crate::storage::Storage;

/// CSV header row
pub const CSV_HEADER: [&str; 6] = [
    "Date",
    "Merchant",
    "Category",
    "Amount",
    "Payment Method",
    "Notes",
];

/// Render expenses as CSV, in the order given
pub fn expenses_csv(expenses: &[Expense], categories: &[Category]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for expense in expenses {
        writer.write_record([
            expense.date.format("%Y-%m-%d").to_string(),
            expense.merchant.clone(),
            name_of(categories, &expense.category_id),
            expense.amount.to_string(),
            expense.payment_method.as_str().to_string(),
            expense.notes.clone().unwrap_or_default(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::InvalidData(format!("Failed to flush CSV: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| Error::InvalidData(format!("CSV is not UTF-8: {}", e)))
}

/// Full backup document: `{expenses, categories, rules}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub expenses: Vec<Expense>,
    pub categories: Vec<Category>,
    pub rules: Vec<CategorizationRule>,
}

/// Counts of restored records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RestoreStats {
    pub expenses: usize,
    pub categories: usize,
    pub rules: usize,
}

impl Backup {
    /// Snapshot the store. Read failures are errors, not empty collections.
    pub fn collect(storage: &dyn Storage) -> Result<Self> {
        Ok(Self {
            expenses: storage.get_expenses()?,
            categories: storage.get_categories()?,
            rules: storage.get_rules()?,
        })
    }

    /// Replace all three collections with the backup contents
    pub fn restore(&self, storage: &dyn Storage) -> Result<RestoreStats> {
        storage.save_categories(&self.categories)?;
        storage.save_rules(&self.rules)?;
        storage.save_expenses(&self.expenses)?;

        let stats = RestoreStats {
            expenses: self.expenses.len(),
            categories: self.categories.len(),
            rules: self.rules.len(),
        };
        info!(
            expenses = stats.expenses,
            categories = stats.categories,
            rules = stats.rules,
            "Restored backup"
        );
        Ok(stats)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a backup document. All three keys are required.
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Write the backup to `path` (gzip when the name ends in `.gz`)
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = self.to_json_pretty()?;
        let writer = BufWriter::new(File::create(path)?);

        if is_gzip(path) {
            let mut encoder = GzEncoder::new(writer, Compression::default());
            encoder.write_all(json.as_bytes())?;
            encoder.finish()?.flush()?;
        } else {
            let mut writer = writer;
            writer.write_all(json.as_bytes())?;
            writer.flush()?;
        }

        info!("Wrote backup to {}", path.display());
        Ok(())
    }

    /// Read a backup from `path` (gzip when the name ends in `.gz`)
    pub fn read_from(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let mut raw = String::new();

        if is_gzip(path) {
            GzDecoder::new(reader).read_to_string(&mut raw)?;
        } else {
            let mut reader = reader;
            reader.read_to_string(&mut raw)?;
        }

        Self::from_json(&raw)
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{default_categories, PaymentMethod};
    use chrono::NaiveDate;

    fn expense(amount: f64, merchant: &str, category: &str, notes: Option<&str>) -> Expense {
        Expense {
            id: merchant.to_lowercase(),
            amount,
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            category_id: category.into(),
            merchant: merchant.into(),
            payment_method: PaymentMethod::CreditCard,
            notes: notes.map(String::from),
            receipt_image: None,
            created_at: 1,
        }
    }

    #[test]
    fn test_csv_format() {
        let csv = expenses_csv(
            &[
                expense(12.5, "Blue Cafe", "cat-food", None),
                expense(40.0, "Shoe Shop", "cat-shop", Some("boots")),
            ],
            &default_categories(),
        )
        .unwrap();

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Date,Merchant,Category,Amount,Payment Method,Notes");
        assert_eq!(lines[1], "2024-01-05,Blue Cafe,Food & Drinks,12.5,Credit Card,");
        assert_eq!(lines[2], "2024-01-05,Shoe Shop,Shopping,40,Credit Card,boots");
    }

    #[test]
    fn test_csv_quotes_when_needed() {
        let csv = expenses_csv(
            &[expense(3.0, "Smith, Jones & Co", "cat-gone", Some("said \"hi\""))],
            &default_categories(),
        )
        .unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(
            row,
            "2024-01-05,\"Smith, Jones & Co\",Unknown,3,Credit Card,\"said \"\"hi\"\"\""
        );
    }

    #[test]
    fn test_csv_empty_has_header_only() {
        let csv = expenses_csv(&[], &default_categories()).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn test_backup_json_keys() {
        let db = Database::in_memory().unwrap();
        db.save_expenses(&[expense(1.0, "A", "cat-food", None)]).unwrap();
        let backup = Backup::collect(&db).unwrap();
        let json: serde_json::Value = serde_json::from_str(&backup.to_json_pretty().unwrap()).unwrap();

        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 3);
        assert_eq!(json["expenses"][0]["categoryId"], "cat-food");
        assert_eq!(json["categories"].as_array().unwrap().len(), 11);
        assert!(json["rules"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_restore_replaces_collections() {
        let source = Database::in_memory().unwrap();
        source
            .save_expenses(&[expense(2.0, "B", "cat-shop", None)])
            .unwrap();
        let backup = Backup::collect(&source).unwrap();

        let target = Database::in_memory().unwrap();
        target
            .save_expenses(&[expense(9.0, "Old", "cat-food", None)])
            .unwrap();
        let stats = backup.restore(&target).unwrap();

        assert_eq!(stats.expenses, 1);
        assert_eq!(stats.categories, 11);
        assert_eq!(Backup::collect(&target).unwrap(), backup);
    }

    #[test]
    fn test_missing_key_is_rejected() {
        assert!(matches!(
            Backup::from_json(r#"{"expenses": [], "rules": []}"#),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_file_round_trip_plain_and_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let backup = Backup {
            expenses: vec![expense(5.0, "C", "cat-ent", Some("n"))],
            categories: default_categories(),
            rules: vec![],
        };

        for name in ["backup.json", "backup.json.gz"] {
            let path = dir.path().join(name);
            backup.write_to(&path).unwrap();
            assert_eq!(Backup::read_from(&path).unwrap(), backup);
        }

        let gz = std::fs::read(dir.path().join("backup.json.gz")).unwrap();
        assert_eq!(&gz[..2], &[0x1f, 0x8b]);
    }
}
