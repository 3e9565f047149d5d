//! Aggregation engine for dashboard statistics and chart series
//!
//! Everything here is a pure function of the expense and category lists.
//! `Analytics` is a thin loader over the `Storage` port that feeds them.
//!
//! Category ordering: ties and chart rows follow the canonical category list
//! order. Expenses whose category id no longer resolves are ranked after every
//! known category, ordered by id, and displayed as "Unknown".

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::expenses::ExpenseFilter;
use crate::models::{
    default_categories, Category, DashboardStats, Expense, UNKNOWN_CATEGORY_NAME,
};
use crate::storage::{read_or, Storage};

/// Chart color for category ids that no longer resolve
pub const UNKNOWN_CATEGORY_COLOR: &str = "#9CA3AF";

/// Longest daily trend window (about ten years); larger requests are clamped
pub const MAX_DAILY_WINDOW: u32 = 3660;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Highest-spend category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopCategory {
    pub id: String,
    pub name: String,
    pub amount: f64,
}

/// One row of the category breakdown chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub id: String,
    pub name: String,
    pub color: String,
    pub amount: f64,
}

/// One day of the daily trend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    /// Short weekday name ("Mon")
    pub label: String,
    pub amount: f64,
}

/// One calendar month (all years combined)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPoint {
    /// 1 = January
    pub month: u32,
    pub label: String,
    pub amount: f64,
}

/// Sum of all amounts
pub fn total_spend(expenses: &[Expense]) -> f64 {
    expenses.iter().map(|e| e.amount).sum()
}

/// Total divided by the number of distinct dates with spending
///
/// Days without expenses do not count. Zero for an empty list.
pub fn average_daily_spend(expenses: &[Expense]) -> f64 {
    let days: HashSet<NaiveDate> = expenses.iter().map(|e| e.date).collect();
    if days.is_empty() {
        return 0.0;
    }
    total_spend(expenses) / days.len() as f64
}

/// Largest single amount, zero for an empty list
pub fn biggest_transaction(expenses: &[Expense]) -> f64 {
    expenses.iter().map(|e| e.amount).fold(0.0, f64::max)
}

/// Sum per category id (only ids that occur)
pub fn per_category_totals(expenses: &[Expense]) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for expense in expenses {
        *totals.entry(expense.category_id.clone()).or_insert(0.0) += expense.amount;
    }
    totals
}

/// Category totals in display order: canonical list first, then dangling ids
fn ordered_totals<'a>(
    totals: &'a BTreeMap<String, f64>,
    categories: &'a [Category],
) -> impl Iterator<Item = (&'a str, Option<&'a Category>, f64)> + 'a {
    let known = categories
        .iter()
        .filter_map(move |c| totals.get(&c.id).map(|amount| (c.id.as_str(), Some(c), *amount)));
    let dangling = totals
        .iter()
        .filter(move |(id, _)| !categories.iter().any(|c| &c.id == *id))
        .map(|(id, amount)| (id.as_str(), None, *amount));
    known.chain(dangling)
}

/// Category with the highest total; ties go to the earlier category
pub fn top_category(expenses: &[Expense], categories: &[Category]) -> Option<TopCategory> {
    let totals = per_category_totals(expenses);
    let mut best: Option<(&str, Option<&Category>, f64)> = None;
    for entry in ordered_totals(&totals, categories) {
        if best.map_or(true, |(_, _, amount)| entry.2 > amount) {
            best = Some(entry);
        }
    }
    best.map(|(id, category, amount)| TopCategory {
        id: id.to_string(),
        name: category
            .map(|c| c.name.clone())
            .unwrap_or_else(|| UNKNOWN_CATEGORY_NAME.to_string()),
        amount,
    })
}

/// Chart rows per category, excluding categories with zero spend
pub fn category_breakdown(expenses: &[Expense], categories: &[Category]) -> Vec<CategoryTotal> {
    let totals = per_category_totals(expenses);
    ordered_totals(&totals, categories)
        .filter(|(_, _, amount)| *amount != 0.0)
        .map(|(id, category, amount)| match category {
            Some(c) => CategoryTotal {
                id: id.to_string(),
                name: c.name.clone(),
                color: c.color.clone(),
                amount,
            },
            None => CategoryTotal {
                id: id.to_string(),
                name: UNKNOWN_CATEGORY_NAME.to_string(),
                color: UNKNOWN_CATEGORY_COLOR.to_string(),
                amount,
            },
        })
        .collect()
}

/// Reorder breakdown rows largest amount first; equal amounts keep their order
pub fn rank_by_amount(rows: &mut [CategoryTotal]) {
    rows.sort_by(|a, b| b.amount.total_cmp(&a.amount));
}

/// Spend per day for the `window_days` days ending at `today`, oldest first
///
/// Days without expenses are present with zero. The window is clamped to
/// `MAX_DAILY_WINDOW`, and days before the earliest representable date are
/// skipped.
pub fn daily_series(expenses: &[Expense], window_days: u32, today: NaiveDate) -> Vec<DailyPoint> {
    let mut per_day: HashMap<NaiveDate, f64> = HashMap::new();
    for expense in expenses {
        *per_day.entry(expense.date).or_insert(0.0) += expense.amount;
    }

    (0..window_days.min(MAX_DAILY_WINDOW) as i64)
        .rev()
        .filter_map(|offset| today.checked_sub_signed(Duration::days(offset)))
        .map(|date| DailyPoint {
            date,
            label: date.format("%a").to_string(),
            amount: per_day.get(&date).copied().unwrap_or(0.0),
        })
        .collect()
}

/// Spend per calendar month, January to December, years conflated
pub fn monthly_series(expenses: &[Expense]) -> Vec<MonthlyPoint> {
    let mut buckets = [0.0f64; 12];
    for expense in expenses {
        buckets[expense.date.month0() as usize] += expense.amount;
    }
    buckets
        .iter()
        .zip(MONTH_LABELS)
        .enumerate()
        .map(|(i, (amount, label))| MonthlyPoint {
            month: i as u32 + 1,
            label: label.to_string(),
            amount: *amount,
        })
        .collect()
}

/// Headline dashboard numbers
pub fn dashboard_stats(expenses: &[Expense], categories: &[Category]) -> DashboardStats {
    if expenses.is_empty() {
        return DashboardStats::default();
    }
    let top_category = match top_category(expenses, categories) {
        Some(top) => top.name,
        None => DashboardStats::default().top_category,
    };
    DashboardStats {
        total_spend: total_spend(expenses),
        avg_daily: average_daily_spend(expenses),
        top_category,
        biggest_transaction: biggest_transaction(expenses),
    }
}

/// Loads collections from storage and runs the aggregations over them
pub struct Analytics {
    storage: Arc<dyn Storage>,
    filter: Option<ExpenseFilter>,
}

impl Analytics {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            filter: None,
        }
    }

    /// Restrict every computation to expenses matching `filter`
    pub fn with_filter(mut self, filter: ExpenseFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    fn expenses(&self) -> Vec<Expense> {
        let expenses = read_or("expenses", self.storage.get_expenses(), Vec::new);
        match self.filter {
            Some(ref filter) => expenses.into_iter().filter(|e| filter.matches(e)).collect(),
            None => expenses,
        }
    }

    fn categories(&self) -> Vec<Category> {
        read_or("categories", self.storage.get_categories(), default_categories)
    }

    pub fn dashboard(&self) -> DashboardStats {
        dashboard_stats(&self.expenses(), &self.categories())
    }

    pub fn top_category(&self) -> Option<TopCategory> {
        top_category(&self.expenses(), &self.categories())
    }

    pub fn breakdown(&self) -> Vec<CategoryTotal> {
        category_breakdown(&self.expenses(), &self.categories())
    }

    pub fn daily(&self, window_days: u32, today: NaiveDate) -> Vec<DailyPoint> {
        daily_series(&self.expenses(), window_days, today)
    }

    pub fn monthly(&self) -> Vec<MonthlyPoint> {
        monthly_series(&self.expenses())
    }
}
