//! Domain models for SpendWise
//!
//! Field names serialize in camelCase so stored collections and JSON backups
//! stay compatible with existing `{expenses, categories, rules}` documents.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Category id used when nothing better is known
pub const FALLBACK_CATEGORY_ID: &str = "cat-other";

/// Display name for category references that no longer resolve
pub const UNKNOWN_CATEGORY_NAME: &str = "Unknown";

/// Ids of the built-in categories, in canonical order
pub const BUILTIN_CATEGORY_IDS: [&str; 11] = [
    "cat-food",
    "cat-ent",
    "cat-shop",
    "cat-trans",
    "cat-housing",
    "cat-utils",
    "cat-health",
    "cat-edu",
    "cat-travel",
    "cat-subs",
    "cat-other",
];

/// A spending category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Hex color for charts (e.g., "#EF4444")
    pub color: String,
    /// Icon identifier understood by the front end
    pub icon: String,
    /// True for user-created categories
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_custom: bool,
}

impl Category {
    fn builtin(id: &str, name: &str, color: &str, icon: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
            icon: icon.to_string(),
            is_custom: false,
        }
    }
}

/// The categories seeded on first run
pub fn default_categories() -> Vec<Category> {
    vec![
        Category::builtin("cat-food", "Food & Drinks", "#EF4444", "Utensils"),
        Category::builtin("cat-ent", "Entertainment", "#8B5CF6", "Film"),
        Category::builtin("cat-shop", "Shopping", "#EC4899", "ShoppingBag"),
        Category::builtin("cat-trans", "Transportation", "#F59E0B", "Car"),
        Category::builtin("cat-housing", "Housing", "#3B82F6", "Home"),
        Category::builtin("cat-utils", "Utilities", "#10B981", "Zap"),
        Category::builtin("cat-health", "Health", "#EF4444", "HeartPulse"),
        Category::builtin("cat-edu", "Education", "#6366F1", "BookOpen"),
        Category::builtin("cat-travel", "Travel", "#06B6D4", "Plane"),
        Category::builtin("cat-subs", "Subscriptions", "#6B7280", "Repeat"),
        Category::builtin("cat-other", "Other", "#9CA3AF", "MoreHorizontal"),
    ]
}

/// How an expense was paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentMethod {
    #[serde(rename = "Cash")]
    Cash,
    #[serde(rename = "Credit Card")]
    CreditCard,
    #[default]
    #[serde(rename = "Debit Card")]
    DebitCard,
    #[serde(rename = "Bank Transfer")]
    BankTransfer,
    #[serde(rename = "Digital Wallet")]
    DigitalWallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::CreditCard => "Credit Card",
            Self::DebitCard => "Debit Card",
            Self::BankTransfer => "Bank Transfer",
            Self::DigitalWallet => "Digital Wallet",
        }
    }

    pub fn all() -> &'static [PaymentMethod] {
        &[
            Self::Cash,
            Self::CreditCard,
            Self::DebitCard,
            Self::BankTransfer,
            Self::DigitalWallet,
        ]
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "cash" => Ok(Self::Cash),
            "creditcard" | "credit" => Ok(Self::CreditCard),
            "debitcard" | "debit" => Ok(Self::DebitCard),
            "banktransfer" | "transfer" => Ok(Self::BankTransfer),
            "digitalwallet" | "wallet" => Ok(Self::DigitalWallet),
            _ => Err(format!("Unknown payment method: {}", s)),
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    /// Non-negative, currency-agnostic
    pub amount: f64,
    pub date: NaiveDate,
    /// Not enforced against the category list; dangling ids render as "Unknown"
    pub category_id: String,
    /// Stored verbatim as typed
    pub merchant: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Opaque encoded image (usually a base64 data URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_image: Option<String>,
    /// Unix milliseconds, only used for recency ordering
    pub created_at: i64,
}

/// User input for creating or replacing an expense (before validation)
#[derive(Debug, Clone, Default)]
pub struct NewExpense {
    pub amount: Option<f64>,
    pub date: NaiveDate,
    pub category_id: String,
    pub merchant: String,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub receipt_image: Option<String>,
}

impl NewExpense {
    /// Form defaults: today, "Other", debit card
    pub fn new(date: NaiveDate) -> Self {
        Self {
            amount: None,
            date,
            category_id: FALLBACK_CATEGORY_ID.to_string(),
            merchant: String::new(),
            payment_method: PaymentMethod::DebitCard,
            notes: None,
            receipt_image: None,
        }
    }
}

impl From<&Expense> for NewExpense {
    fn from(expense: &Expense) -> Self {
        Self {
            amount: Some(expense.amount),
            date: expense.date,
            category_id: expense.category_id.clone(),
            merchant: expense.merchant.clone(),
            payment_method: expense.payment_method,
            notes: expense.notes.clone(),
            receipt_image: expense.receipt_image.clone(),
        }
    }
}

/// A learned or user-defined keyword → category association
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizationRule {
    pub id: String,
    /// Matched case-insensitively as a substring of the merchant
    pub keyword: String,
    pub category_id: String,
}

impl CategorizationRule {
    /// Whether this rule fires for the given merchant text
    pub fn matches(&self, merchant: &str) -> bool {
        if self.keyword.trim().is_empty() {
            return false;
        }
        merchant
            .to_lowercase()
            .contains(&self.keyword.to_lowercase())
    }

    /// Whether this rule's keyword is the same as `keyword`, ignoring case
    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.keyword.to_lowercase() == keyword.to_lowercase()
    }
}

/// The local user (no real authentication)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
}

/// Headline numbers for the dashboard (derived, never stored)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_spend: f64,
    pub avg_daily: f64,
    /// Category name, "N/A" when there are no expenses
    pub top_category: String,
    pub biggest_transaction: f64,
}

impl Default for DashboardStats {
    fn default() -> Self {
        Self {
            total_spend: 0.0,
            avg_daily: 0.0,
            top_category: "N/A".to_string(),
            biggest_transaction: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_categories_match_builtin_ids() {
        let ids: Vec<String> = default_categories().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, BUILTIN_CATEGORY_IDS);
    }

    #[test]
    fn test_payment_method_serde_uses_display_names() {
        let json = serde_json::to_string(&PaymentMethod::BankTransfer).unwrap();
        assert_eq!(json, "\"Bank Transfer\"");
        let parsed: PaymentMethod = serde_json::from_str("\"Digital Wallet\"").unwrap();
        assert_eq!(parsed, PaymentMethod::DigitalWallet);
    }

    #[test]
    fn test_payment_method_from_str() {
        assert_eq!("credit-card".parse::<PaymentMethod>(), Ok(PaymentMethod::CreditCard));
        assert_eq!("Debit Card".parse::<PaymentMethod>(), Ok(PaymentMethod::DebitCard));
        assert_eq!("cash".parse::<PaymentMethod>(), Ok(PaymentMethod::Cash));
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_expense_json_shape() {
        let json = r#"{
            "id": "abc123",
            "amount": 12.5,
            "date": "2024-01-05",
            "categoryId": "cat-food",
            "merchant": "Blue Cafe",
            "paymentMethod": "Cash",
            "createdAt": 1704412800000
        }"#;
        let expense: Expense = serde_json::from_str(json).unwrap();
        assert_eq!(expense.category_id, "cat-food");
        assert_eq!(expense.date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert!(expense.notes.is_none());

        let out = serde_json::to_string(&expense).unwrap();
        assert!(out.contains("\"categoryId\":\"cat-food\""));
        assert!(out.contains("\"date\":\"2024-01-05\""));
        assert!(!out.contains("receiptImage"));
    }

    #[test]
    fn test_rule_matches_substring_case_insensitive() {
        let rule = CategorizationRule {
            id: "r1".into(),
            keyword: "cafe".into(),
            category_id: "cat-food".into(),
        };
        assert!(rule.matches("Blue Cafe Co"));
        assert!(rule.matches("CAFE"));
        assert!(!rule.matches("Coffee House"));
    }

    #[test]
    fn test_blank_keyword_never_matches() {
        let rule = CategorizationRule {
            id: "r1".into(),
            keyword: "  ".into(),
            category_id: "cat-food".into(),
        };
        assert!(!rule.matches("anything"));
    }

    #[test]
    fn test_custom_flag_omitted_for_builtins() {
        let json = serde_json::to_string(&default_categories()[0]).unwrap();
        assert!(!json.contains("isCustom"));
    }
}
