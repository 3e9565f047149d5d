//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Init, status and shared utilities (open_db, filters, argument parsing)
//! - `categories` - Category list and custom categories
//! - `expenses` - Add, edit, delete and list expenses
//! - `export` - CSV export, JSON backup and restore
//! - `reports` - Dashboard, breakdown, daily and monthly series
//! - `rules` - Categorization rules and merchant suggestions
//! - `user` - Local user login/logout

pub mod categories;
pub mod core;
pub mod expenses;
pub mod export;
pub mod reports;
pub mod rules;
pub mod user;

// Re-export command functions for main.rs
pub use categories::*;
pub use core::*;
pub use expenses::*;
pub use export::*;
pub use reports::*;
pub use rules::*;
pub use user::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Horizontal bar scaled against `max`
pub fn bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let len = ((value / max) * width as f64).round() as usize;
    "█".repeat(len.max(1))
}
