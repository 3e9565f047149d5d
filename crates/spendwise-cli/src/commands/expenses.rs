//! Expense command implementations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::Engine;
use chrono::Utc;
use spendwise_core::models::PaymentMethod;
use spendwise_core::{AIClient, Database, ExpenseDraft, Resolution, Resolver};

use super::{
    category_store, expense_book, expense_filter, parse_date, resolve_category_arg, storage,
    truncate, FilterArgs,
};

/// Field values given on the command line for add/edit
#[derive(Debug, Default)]
pub struct ExpenseInput {
    pub amount: Option<f64>,
    pub merchant: Option<String>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub payment: Option<String>,
    pub notes: Option<String>,
    pub receipt: Option<PathBuf>,
}

/// Encode a receipt image file as a data URL
pub fn receipt_data_url(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read receipt {}", path.display()))?;
    let mime = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    };
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{};base64,{}", mime, encoded))
}

/// Copy command-line fields into a draft (everything except category)
fn fill_draft(draft: &mut ExpenseDraft, input: &ExpenseInput) -> Result<()> {
    if input.amount.is_some() {
        draft.set_amount(input.amount);
    }
    if let Some(ref merchant) = input.merchant {
        draft.set_merchant(merchant);
    }
    if let Some(ref date) = input.date {
        draft.set_date(parse_date(date)?);
    }
    if let Some(ref payment) = input.payment {
        let method: PaymentMethod = payment.parse().map_err(anyhow::Error::msg)?;
        draft.set_payment_method(method);
    }
    if let Some(ref notes) = input.notes {
        let notes = notes.trim();
        draft.set_notes((!notes.is_empty()).then(|| notes.to_string()));
    }
    if let Some(ref receipt) = input.receipt {
        draft.set_receipt_image(Some(receipt_data_url(receipt)?));
    }
    Ok(())
}

/// Look up a category for the draft's merchant and apply it if still current
async fn suggest_into(draft: &mut ExpenseDraft, resolver: &Resolver) -> Resolution {
    let Some(ticket) = draft.begin_lookup() else {
        return Resolution::Unresolved;
    };
    let resolution = resolver.resolve(ticket.merchant()).await;
    draft.apply(&ticket, &resolution);
    resolution
}

fn print_suggestion(resolution: &Resolution, name: &str) {
    match resolution {
        Resolution::Rule { rule_id, .. } => {
            println!("   📏 Category from rule {}: {}", rule_id, name)
        }
        Resolution::Oracle { .. } => println!("   🤖 Category suggested by oracle: {}", name),
        Resolution::Unresolved => {}
    }
}

pub async fn cmd_add(db: &Database, oracle: Option<AIClient>, input: ExpenseInput) -> Result<()> {
    let categories = category_store(db);
    let mut draft = ExpenseDraft::new(Utc::now().date_naive());
    fill_draft(&mut draft, &input)?;

    let resolution = match input.category {
        Some(ref category) => {
            draft.set_category(&resolve_category_arg(&categories, category)?);
            Resolution::Unresolved
        }
        None => suggest_into(&mut draft, &Resolver::new(storage(db), oracle)).await,
    };
    print_suggestion(&resolution, &categories.name_of(&draft.fields().category_id));

    let expense = expense_book(db)
        .submit(draft)
        .context("Failed to add expense")?;

    println!(
        "✅ Added {:.2} at {} → {} (id: {})",
        expense.amount,
        expense.merchant,
        categories.name_of(&expense.category_id),
        expense.id
    );
    Ok(())
}

pub async fn cmd_edit(
    db: &Database,
    oracle: Option<AIClient>,
    id: &str,
    input: ExpenseInput,
) -> Result<()> {
    let book = expense_book(db);
    let categories = category_store(db);
    let existing = book
        .get(id)
        .ok_or_else(|| anyhow::anyhow!("Expense not found: {}", id))?;

    let mut draft = ExpenseDraft::edit(&existing);
    fill_draft(&mut draft, &input)?;

    let resolution = match input.category {
        Some(ref category) => {
            draft.set_category(&resolve_category_arg(&categories, category)?);
            Resolution::Unresolved
        }
        // Only looks up when the merchant actually changed
        None => suggest_into(&mut draft, &Resolver::new(storage(db), oracle)).await,
    };
    print_suggestion(&resolution, &categories.name_of(&draft.fields().category_id));

    let expense = book.submit(draft).context("Failed to update expense")?;
    println!(
        "✅ Updated {}: {:.2} at {} → {}",
        expense.id,
        expense.amount,
        expense.merchant,
        categories.name_of(&expense.category_id)
    );
    Ok(())
}

pub fn cmd_delete(db: &Database, id: &str) -> Result<()> {
    if expense_book(db).delete(id)? {
        println!("🗑️  Deleted expense {}", id);
        Ok(())
    } else {
        anyhow::bail!("Expense not found: {}", id)
    }
}

/// Filter arguments for `list`
#[derive(Debug, Default)]
pub struct ListArgs {
    pub filter: FilterArgs,
    pub limit: usize,
    pub json: bool,
}

pub fn cmd_list(db: &Database, args: ListArgs) -> Result<()> {
    let categories = category_store(db);
    let filter = expense_filter(&categories, &args.filter)?;

    let mut expenses = expense_book(db).filtered(&filter);
    let total = expenses.len();
    expenses.truncate(args.limit);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&expenses)?);
        return Ok(());
    }

    if expenses.is_empty() {
        println!("No expenses found. Add one with: spendwise add <amount> <merchant>");
        return Ok(());
    }

    println!();
    println!("💸 Expenses ({} of {})", expenses.len(), total);
    println!("   ─────────────────────────────────────────────────────────────────────");
    for expense in &expenses {
        println!(
            "   {}  {:<24} {:<16} {:>10.2}  {}",
            expense.date,
            truncate(&expense.merchant, 24),
            truncate(&categories.name_of(&expense.category_id), 16),
            expense.amount,
            expense.id
        );
    }

    Ok(())
}
