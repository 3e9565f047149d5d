//! Category command implementations

use anyhow::Result;
use spendwise_core::Database;

use super::category_store;

pub fn cmd_categories_list(db: &Database) -> Result<()> {
    let categories = category_store(db).list();

    println!();
    println!("🗂️  Categories");
    println!("   ─────────────────────────────────────────────────────────────");
    for category in &categories {
        let custom = if category.is_custom { " (custom)" } else { "" };
        println!(
            "   • {:<20} {:<14} [{}]{}",
            category.name, category.id, category.color, custom
        );
    }

    Ok(())
}

pub fn cmd_categories_add(db: &Database, name: &str) -> Result<()> {
    let category = category_store(db).add_custom(name)?;
    println!(
        "✅ Created category '{}' (id: {}, color: {})",
        category.name, category.id, category.color
    );
    Ok(())
}
