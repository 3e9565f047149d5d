//! Export, backup and restore command implementations

use std::path::Path;

use anyhow::{Context, Result};
use spendwise_core::export::expenses_csv;
use spendwise_core::{Backup, Database};

use super::{category_store, expense_book, expense_filter, FilterArgs};

/// Write the filtered expenses, newest date first, as CSV
pub fn cmd_export_csv(db: &Database, filter: &FilterArgs, output: Option<&Path>) -> Result<()> {
    let categories = category_store(db);
    let expenses = expense_book(db).filtered(&expense_filter(&categories, filter)?);
    let csv = expenses_csv(&expenses, &categories.list())?;

    match output {
        Some(path) => {
            std::fs::write(path, csv)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✅ Exported {} expenses to {}", expenses.len(), path.display());
        }
        None => print!("{}", csv),
    }

    Ok(())
}

pub fn cmd_export_backup(db: &Database, output: &Path) -> Result<()> {
    let backup = Backup::collect(db).context("Failed to read collections")?;
    backup.write_to(output)?;

    println!("✅ Backup written to {}", output.display());
    println!(
        "   {} expenses, {} categories, {} rules",
        backup.expenses.len(),
        backup.categories.len(),
        backup.rules.len()
    );
    Ok(())
}

pub fn cmd_restore(db: &Database, file: &Path) -> Result<()> {
    let backup = Backup::read_from(file)
        .with_context(|| format!("Failed to read backup {}", file.display()))?;
    let stats = backup.restore(db)?;

    println!("✅ Restored backup from {}", file.display());
    println!(
        "   {} expenses, {} categories, {} rules",
        stats.expenses, stats.categories, stats.rules
    );
    Ok(())
}
