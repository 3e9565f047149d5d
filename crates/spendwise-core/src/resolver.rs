//! Categorization resolver
//!
//! Resolution order for a merchant:
//! 1. Blank merchant → unresolved, nothing consulted
//! 2. First stored rule whose keyword occurs in the merchant (case-insensitive)
//! 3. One oracle request restricted to the built-in category ids
//! 4. Otherwise unresolved, and the caller keeps whatever category it has
//!
//! Oracle failures and invalid answers never surface as errors.
//!
//! `ExpenseDraft` guards form state against late oracle answers: every
//! merchant edit starts a new generation, and a resolution is only applied
//! if its `LookupTicket` still belongs to the current generation.

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::ai::{parse_category_response, AIClient, CategoryOracle, OracleVerdict};
use crate::models::{Expense, NewExpense, PaymentMethod, BUILTIN_CATEGORY_IDS};
use crate::rules::RuleStore;
use crate::storage::Storage;

/// Outcome of resolving a merchant to a category
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A stored rule matched
    Rule { category_id: String, rule_id: String },
    /// The oracle returned a valid category id
    Oracle { category_id: String },
    /// No suggestion
    Unresolved,
}

impl Resolution {
    pub fn category_id(&self) -> Option<&str> {
        match self {
            Resolution::Rule { category_id, .. } | Resolution::Oracle { category_id } => {
                Some(category_id)
            }
            Resolution::Unresolved => None,
        }
    }

    /// Short label for display ("rule", "oracle", "none")
    pub fn source(&self) -> &'static str {
        match self {
            Resolution::Rule { .. } => "rule",
            Resolution::Oracle { .. } => "oracle",
            Resolution::Unresolved => "none",
        }
    }
}

/// Resolves merchants to categories using rules, then the optional oracle
#[derive(Clone)]
pub struct Resolver {
    rules: RuleStore,
    oracle: Option<AIClient>,
}

impl Resolver {
    pub fn new(storage: Arc<dyn Storage>, oracle: Option<AIClient>) -> Self {
        Self {
            rules: RuleStore::new(storage),
            oracle,
        }
    }

    /// Whether an oracle is configured
    pub fn has_oracle(&self) -> bool {
        self.oracle.is_some()
    }

    /// Resolve a merchant to a category suggestion
    pub async fn resolve(&self, merchant: &str) -> Resolution {
        if merchant.trim().is_empty() {
            return Resolution::Unresolved;
        }

        if let Some(rule) = self.rules.find_match(merchant) {
            return Resolution::Rule {
                category_id: rule.category_id,
                rule_id: rule.id,
            };
        }

        let Some(ref oracle) = self.oracle else {
            debug!(merchant, "No rule matched and no oracle configured");
            return Resolution::Unresolved;
        };

        let start = Instant::now();
        let raw = match oracle.suggest_category(merchant, &BUILTIN_CATEGORY_IDS).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(merchant, model = oracle.model(), error = %e, "Oracle request failed");
                return Resolution::Unresolved;
            }
        };
        let latency_ms = start.elapsed().as_millis() as u64;

        match parse_category_response(&raw, &BUILTIN_CATEGORY_IDS) {
            OracleVerdict::Valid(category_id) => {
                debug!(merchant, category = %category_id, latency_ms, "Oracle suggested category");
                Resolution::Oracle { category_id }
            }
            OracleVerdict::Invalid(raw) => {
                warn!(merchant, response = %raw, latency_ms, "Discarding invalid oracle response");
                Resolution::Unresolved
            }
        }
    }
}

/// Snapshot of the merchant a lookup was started for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    generation: u64,
    merchant: String,
}

impl LookupTicket {
    pub fn merchant(&self) -> &str {
        &self.merchant
    }
}

/// Expense form state with stale-suggestion protection
#[derive(Debug, Clone)]
pub struct ExpenseDraft {
    fields: NewExpense,
    original: Option<Expense>,
    generation: u64,
}

impl ExpenseDraft {
    /// Blank form for a new expense
    pub fn new(date: NaiveDate) -> Self {
        Self {
            fields: NewExpense::new(date),
            original: None,
            generation: 0,
        }
    }

    /// Form pre-filled from an existing expense
    pub fn edit(expense: &Expense) -> Self {
        Self {
            fields: NewExpense::from(expense),
            original: Some(expense.clone()),
            generation: 0,
        }
    }

    pub fn fields(&self) -> &NewExpense {
        &self.fields
    }

    /// The expense being edited, if any
    pub fn original(&self) -> Option<&Expense> {
        self.original.as_ref()
    }

    pub fn into_parts(self) -> (NewExpense, Option<Expense>) {
        (self.fields, self.original)
    }

    pub fn set_amount(&mut self, amount: Option<f64>) {
        self.fields.amount = amount;
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.fields.date = date;
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.fields.payment_method = method;
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.fields.notes = notes;
    }

    pub fn set_receipt_image(&mut self, receipt_image: Option<String>) {
        self.fields.receipt_image = receipt_image;
    }

    /// Change the merchant. Any lookup in flight becomes stale.
    pub fn set_merchant(&mut self, merchant: &str) {
        self.fields.merchant = merchant.to_string();
        self.generation += 1;
    }

    /// Pick a category by hand. Any lookup in flight becomes stale.
    pub fn set_category(&mut self, category_id: &str) {
        self.fields.category_id = category_id.to_string();
        self.generation += 1;
    }

    /// Start a lookup for the current merchant
    ///
    /// Returns None for a blank merchant, and when editing an expense whose
    /// merchant is unchanged (the stored category stays).
    pub fn begin_lookup(&self) -> Option<LookupTicket> {
        let merchant = self.fields.merchant.trim();
        if merchant.is_empty() {
            return None;
        }
        if let Some(ref original) = self.original {
            if original.merchant == self.fields.merchant {
                return None;
            }
        }
        Some(LookupTicket {
            generation: self.generation,
            merchant: self.fields.merchant.clone(),
        })
    }

    /// Whether `ticket` still belongs to the current form state
    pub fn is_current(&self, ticket: &LookupTicket) -> bool {
        ticket.generation == self.generation && ticket.merchant == self.fields.merchant
    }

    /// Apply a resolution if its lookup is still current
    ///
    /// Returns true when the category was changed.
    pub fn apply(&mut self, ticket: &LookupTicket, resolution: &Resolution) -> bool {
        if !self.is_current(ticket) {
            debug!(merchant = %ticket.merchant, "Discarding stale category suggestion");
            return false;
        }
        match resolution.category_id() {
            Some(category_id) => {
                self.fields.category_id = category_id.to_string();
                true
            }
            None => false,
        }
    }
}
