//! SpendWise CLI - Personal expense tracker
//!
//! Usage:
//!   spendwise init                        Initialize database
//!   spendwise status                      Database and oracle status
//!   spendwise add 12.50 "Blue Cafe"       Add an expense (category suggested)
//!   spendwise dashboard                   Headline statistics
//!   spendwise export backup -o out.json   Full JSON backup

mod cli;
mod commands;


use anyhow::{Context, Result};
use clap::Parser;
use spendwise_core::{AIClient, Config};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;
use commands::{ExpenseInput, FilterArgs, ListArgs};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = Config::load().context("Failed to load configuration")?;
    let db_path = commands::resolve_db_path(cli.db.as_deref(), &config);

    let db = commands::open_db(&db_path, cli.no_encrypt)?;
    let oracle = || AIClient::from_config(&config.oracle);

    match cli.command {
        Commands::Init => commands::cmd_init(&db_path, cli.no_encrypt),
        Commands::Status => commands::cmd_status(&db, oracle()).await,
        Commands::Add {
            amount,
            merchant,
            category,
            date,
            payment,
            notes,
            receipt,
        } => {
            let input = ExpenseInput {
                amount: Some(amount),
                merchant: Some(merchant),
                category,
                date,
                payment,
                notes,
                receipt,
            };
            commands::cmd_add(&db, oracle(), input).await
        }
        Commands::Edit {
            id,
            amount,
            merchant,
            category,
            date,
            payment,
            notes,
        } => {
            let input = ExpenseInput {
                amount,
                merchant,
                category,
                date,
                payment,
                notes,
                receipt: None,
            };
            commands::cmd_edit(&db, oracle(), &id, input).await
        }
        Commands::Delete { id } => commands::cmd_delete(&db, &id),
        Commands::List {
            search,
            category,
            from,
            to,
            limit,
            json,
        } => commands::cmd_list(
            &db,
            ListArgs {
                filter: FilterArgs {
                    search,
                    category,
                    from,
                    to,
                },
                limit,
                json,
            },
        ),
        Commands::Suggest { merchant } => commands::cmd_suggest(&db, oracle(), &merchant).await,
        Commands::Rules { action } => match action {
            None | Some(RulesAction::List) => commands::cmd_rules_list(&db),
            Some(RulesAction::Delete { id }) => commands::cmd_rules_delete(&db, &id),
            Some(RulesAction::Learn { merchant, category }) => {
                commands::cmd_rules_learn(&db, &merchant, &category)
            }
        },
        Commands::Categories { action } => match action {
            None | Some(CategoriesAction::List) => commands::cmd_categories_list(&db),
            Some(CategoriesAction::Add { name }) => commands::cmd_categories_add(&db, &name),
        },
        Commands::Dashboard {
            category,
            from,
            to,
            json,
        } => {
            let filter = FilterArgs {
                search: None,
                category,
                from,
                to,
            };
            commands::cmd_dashboard(&db, &filter, json)
        }
        Commands::Breakdown {
            category,
            from,
            to,
            sort,
            json,
        } => {
            let filter = FilterArgs {
                search: None,
                category,
                from,
                to,
            };
            commands::cmd_breakdown(&db, &filter, &sort, json)
        }
        Commands::Daily { days, json } => {
            let days = days.unwrap_or_else(|| config.daily_window_days());
            commands::cmd_daily(&db, days, json)
        }
        Commands::Monthly { json } => commands::cmd_monthly(&db, json),
        Commands::Export { action } => match action {
            ExportAction::Csv {
                output,
                search,
                category,
                from,
                to,
            } => {
                let filter = FilterArgs {
                    search,
                    category,
                    from,
                    to,
                };
                commands::cmd_export_csv(&db, &filter, output.as_deref())
            }
            ExportAction::Backup { output } => commands::cmd_export_backup(&db, &output),
        },
        Commands::Restore { file } => commands::cmd_restore(&db, &file),
        Commands::Login { email, name } => commands::cmd_login(&db, &email, name.as_deref()),
        Commands::Logout => commands::cmd_logout(&db),
        Commands::Whoami => commands::cmd_whoami(&db),
    }
}
