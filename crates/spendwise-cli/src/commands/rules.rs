//! Rule and suggestion command implementations

use std::sync::Arc;

use anyhow::Result;
use spendwise_core::{
    AIClient, CategoryOracle, Database, LearnOutcome, RandomIds, Resolution, Resolver,
    RuleLearner, RuleStore,
};

use super::{category_store, resolve_category_arg, storage, truncate};

pub fn cmd_rules_list(db: &Database) -> Result<()> {
    let rules = RuleStore::new(storage(db)).list();
    let categories = category_store(db);

    if rules.is_empty() {
        println!("No rules yet. Rules are learned when you save expenses.");
        return Ok(());
    }

    println!();
    println!("📏 Rules (first match wins)");
    println!("   ─────────────────────────────────────────────────────────────");
    for (i, rule) in rules.iter().enumerate() {
        println!(
            "   {:>3}. {:<28} → {:<16} ({})",
            i + 1,
            truncate(&rule.keyword, 28),
            categories.name_of(&rule.category_id),
            rule.id
        );
    }

    Ok(())
}

pub fn cmd_rules_delete(db: &Database, id: &str) -> Result<()> {
    if RuleStore::new(storage(db)).delete(id)? {
        println!("🗑️  Deleted rule {}", id);
        Ok(())
    } else {
        anyhow::bail!("Rule not found: {}", id)
    }
}

pub fn cmd_rules_learn(db: &Database, merchant: &str, category: &str) -> Result<()> {
    let categories = category_store(db);
    let category_id = resolve_category_arg(&categories, category)?;
    let learner = RuleLearner::new(storage(db), Arc::new(RandomIds));

    match learner.learn(merchant, &category_id)? {
        LearnOutcome::Created { rule_id } => {
            println!("✅ Created rule {}: {} → {}", rule_id, merchant, categories.name_of(&category_id))
        }
        LearnOutcome::Updated { rule_id } => {
            println!("✅ Updated rule {}: {} → {}", rule_id, merchant, categories.name_of(&category_id))
        }
        LearnOutcome::Unchanged { rule_id } => {
            println!("   Rule {} already maps {} to {}", rule_id, merchant, categories.name_of(&category_id))
        }
        LearnOutcome::Skipped => anyhow::bail!("Merchant cannot be empty"),
    }

    Ok(())
}

pub async fn cmd_suggest(db: &Database, oracle: Option<AIClient>, merchant: &str) -> Result<()> {
    let categories = category_store(db);
    if let Some(ref client) = oracle {
        println!("   🤖 Oracle: {} @ {}", client.model(), client.host());
    }

    let resolver = Resolver::new(storage(db), oracle);
    match resolver.resolve(merchant).await {
        Resolution::Rule {
            category_id,
            rule_id,
        } => println!(
            "📏 {} → {} (rule {})",
            merchant,
            categories.name_of(&category_id),
            rule_id
        ),
        Resolution::Oracle { category_id } => println!(
            "🤖 {} → {} (oracle)",
            merchant,
            categories.name_of(&category_id)
        ),
        Resolution::Unresolved => {
            println!("❓ No suggestion for {}", merchant);
            if !resolver.has_oracle() {
                println!("   💡 Tip: Set GEMINI_API_KEY or AI_BACKEND for oracle suggestions");
            }
        }
    }

    Ok(())
}
