//! Rule store and rule learner for merchant categorization
//!
//! Rules are kept in stored order. Resolution scans that order and the first
//! rule whose keyword is contained in the merchant text wins.
//!
//! Learning is asymmetric on purpose: the learner looks up an existing rule by
//! *exact* (case-insensitive) keyword equality with the full merchant string,
//! while resolution matches *substrings*. A rule learned from "Starbucks"
//! therefore also fires for "Starbucks Reserve".

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::Result;
use crate::ids::IdGenerator;
use crate::models::CategorizationRule;
use crate::storage::{read_or, Storage};

/// Ordered keyword → category rules backed by the `Storage` port
#[derive(Clone)]
pub struct RuleStore {
    storage: Arc<dyn Storage>,
}

impl RuleStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// All rules in stored order (empty when the store cannot be read)
    pub fn list(&self) -> Vec<CategorizationRule> {
        read_or("rules", self.storage.get_rules(), Vec::new)
    }

    /// First rule, in stored order, whose keyword occurs in `merchant`
    pub fn find_match(&self, merchant: &str) -> Option<CategorizationRule> {
        first_match(&self.list(), merchant).cloned()
    }

    /// Rule whose keyword equals `keyword`, ignoring case
    pub fn find_by_keyword(&self, keyword: &str) -> Option<CategorizationRule> {
        self.list().into_iter().find(|r| r.has_keyword(keyword))
    }

    /// Append a rule or replace the one with the same id, then persist
    pub fn upsert(&self, rule: CategorizationRule) -> Result<()> {
        let mut rules = self.storage.get_rules()?;
        match rules.iter_mut().find(|r| r.id == rule.id) {
            Some(existing) => *existing = rule,
            None => rules.push(rule),
        }
        self.storage.save_rules(&rules)
    }

    /// Delete a rule by id. Returns false if no such rule exists.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut rules = self.storage.get_rules()?;
        let before = rules.len();
        rules.retain(|r| r.id != id);
        if rules.len() == before {
            return Ok(false);
        }
        self.storage.save_rules(&rules)?;
        info!(rule_id = id, "Deleted categorization rule");
        Ok(true)
    }
}

/// First rule in `rules` that matches `merchant`
pub fn first_match<'a>(
    rules: &'a [CategorizationRule],
    merchant: &str,
) -> Option<&'a CategorizationRule> {
    let hit = rules.iter().find(|r| r.matches(merchant));
    if let Some(rule) = hit {
        debug!(
            "Rule '{}' matched merchant '{}' → {}",
            rule.keyword, merchant, rule.category_id
        );
    }
    hit
}

/// What `RuleLearner::learn` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LearnOutcome {
    /// A new rule was appended
    Created { rule_id: String },
    /// An existing rule for the same keyword now points at a new category
    Updated { rule_id: String },
    /// The existing rule already held this category
    Unchanged { rule_id: String },
    /// Nothing to learn from (blank merchant or category)
    Skipped,
}

/// Turns user category decisions into rules (upsert by keyword)
pub struct RuleLearner {
    storage: Arc<dyn Storage>,
    ids: Arc<dyn IdGenerator>,
}

impl RuleLearner {
    pub fn new(storage: Arc<dyn Storage>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { storage, ids }
    }

    /// Record that `merchant` belongs to `category_id`
    ///
    /// The keyword is the merchant text exactly as typed. An existing rule
    /// with the same keyword (ignoring case) is updated in place, keeping its
    /// position; otherwise a new rule is appended. Last write wins.
    pub fn learn(&self, merchant: &str, category_id: &str) -> Result<LearnOutcome> {
        if merchant.trim().is_empty() || category_id.trim().is_empty() {
            return Ok(LearnOutcome::Skipped);
        }

        let mut rules = self.storage.get_rules()?;

        let outcome = match rules.iter_mut().find(|r| r.has_keyword(merchant)) {
            Some(rule) if rule.category_id == category_id => {
                return Ok(LearnOutcome::Unchanged {
                    rule_id: rule.id.clone(),
                });
            }
            Some(rule) => {
                info!(
                    keyword = %rule.keyword,
                    from = %rule.category_id,
                    to = %category_id,
                    "Updated learned rule"
                );
                rule.category_id = category_id.to_string();
                LearnOutcome::Updated {
                    rule_id: rule.id.clone(),
                }
            }
            None => {
                let rule = CategorizationRule {
                    id: self.ids.next_id(),
                    keyword: merchant.to_string(),
                    category_id: category_id.to_string(),
                };
                info!(keyword = %rule.keyword, category = %rule.category_id, "Learned new rule");
                let rule_id = rule.id.clone();
                rules.push(rule);
                LearnOutcome::Created { rule_id }
            }
        };

        self.storage.save_rules(&rules)?;
        Ok(outcome)
    }
}
