//! Report command implementations

use anyhow::Result;
use chrono::Utc;
use spendwise_core::analytics::{rank_by_amount, MAX_DAILY_WINDOW};
use spendwise_core::{Analytics, Database, Expense};

use super::{bar, category_store, expense_book, expense_filter, storage, truncate, FilterArgs};

const BAR_WIDTH: usize = 30;
const RECENT_COUNT: usize = 5;

/// Analytics restricted to the filter arguments
fn filtered_analytics(db: &Database, filter: &FilterArgs) -> Result<Analytics> {
    let filter = expense_filter(&category_store(db), filter)?;
    Ok(Analytics::new(storage(db)).with_filter(filter))
}

/// Most recently created expenses that pass the filter
pub fn recent_expenses(db: &Database, filter: &FilterArgs) -> Result<Vec<Expense>> {
    let filter = expense_filter(&category_store(db), filter)?;
    Ok(expense_book(db)
        .recent(usize::MAX)
        .into_iter()
        .filter(|e| filter.matches(e))
        .take(RECENT_COUNT)
        .collect())
}

pub fn cmd_dashboard(db: &Database, filter: &FilterArgs, json: bool) -> Result<()> {
    let stats = filtered_analytics(db, filter)?.dashboard();
    let recent = recent_expenses(db, filter)?;

    if json {
        let output = serde_json::json!({ "stats": stats, "recent": recent });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!();
    println!("📊 Dashboard");
    println!("   ─────────────────────────────────────");
    println!("   Total spend:          {:>12.2}", stats.total_spend);
    println!("   Average per day:      {:>12.2}", stats.avg_daily);
    println!("   Top category:         {:>12}", stats.top_category);
    println!("   Biggest transaction:  {:>12.2}", stats.biggest_transaction);

    if !recent.is_empty() {
        let categories = category_store(db);
        println!();
        println!("🕒 Recent expenses");
        println!("   ─────────────────────────────────────────────────────────────");
        for expense in &recent {
            println!(
                "   {}  {:<24} {:<16} {:>10.2}",
                expense.date,
                truncate(&expense.merchant, 24),
                truncate(&categories.name_of(&expense.category_id), 16),
                expense.amount
            );
        }
    }

    Ok(())
}

pub fn cmd_breakdown(db: &Database, filter: &FilterArgs, sort: &str, json: bool) -> Result<()> {
    let mut rows = filtered_analytics(db, filter)?.breakdown();
    match sort.to_lowercase().as_str() {
        "category" => {}
        "amount" => rank_by_amount(&mut rows),
        other => anyhow::bail!("Unknown sort '{}' (use category or amount)", other),
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No spending recorded yet.");
        return Ok(());
    }

    let max = rows.iter().map(|r| r.amount).fold(0.0, f64::max);
    let total: f64 = rows.iter().map(|r| r.amount).sum();

    println!();
    println!("🍩 Spend by category");
    println!("   ─────────────────────────────────────────────────────────────");
    for row in &rows {
        println!(
            "   {:<18} {:>10.2} {:>5.1}%  {}",
            row.name,
            row.amount,
            row.amount / total * 100.0,
            bar(row.amount, max, BAR_WIDTH)
        );
    }

    Ok(())
}

pub fn cmd_daily(db: &Database, days: u32, json: bool) -> Result<()> {
    let days = days.min(MAX_DAILY_WINDOW);
    let series = Analytics::new(storage(db)).daily(days, Utc::now().date_naive());

    if json {
        println!("{}", serde_json::to_string_pretty(&series)?);
        return Ok(());
    }

    let max = series.iter().map(|p| p.amount).fold(0.0, f64::max);

    println!();
    println!("📈 Last {} days", days);
    println!("   ─────────────────────────────────────────────────────────────");
    for point in &series {
        println!(
            "   {} {}  {:>10.2}  {}",
            point.label,
            point.date,
            point.amount,
            bar(point.amount, max, BAR_WIDTH)
        );
    }

    Ok(())
}

pub fn cmd_monthly(db: &Database, json: bool) -> Result<()> {
    let series = Analytics::new(storage(db)).monthly();

    if json {
        println!("{}", serde_json::to_string_pretty(&series)?);
        return Ok(());
    }

    let max = series.iter().map(|p| p.amount).fold(0.0, f64::max);

    println!();
    println!("📅 Spend by month (all years)");
    println!("   ─────────────────────────────────────────────────────────────");
    for point in &series {
        println!(
            "   {}  {:>10.2}  {}",
            point.label,
            point.amount,
            bar(point.amount, max, BAR_WIDTH)
        );
    }

    Ok(())
}
