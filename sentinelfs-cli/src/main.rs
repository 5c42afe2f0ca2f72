//! SentinelFS CLI - commodity supply-risk monitoring from the terminal

#![deny(warnings)]

// Global invariants enforced:
// - Deterministic output ordering
// - Every run recomputes scores and alerts from the source CSV

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use sentinelfs_core::report::{
    render_actions_text, render_alerts_text, render_drilldown_text, render_logs_text,
    render_overview_text, render_signals_text,
};
use sentinelfs_core::{
    build_drilldown, build_overview, build_signals, dispatch, generate_alerts_with_rules,
    load_and_resolve, open_store, render_json, ActionStatus, Command, CommandOutcome, NewAction,
    ResolvedConfig, Session, SignalCache,
};

#[derive(Parser)]
#[command(name = "sentinelfs")]
#[command(about = "Commodity supply-risk monitoring: composite scoring, ranked alerts, scenario shocks, and action tracking")]
#[command(version = env!("SENTINELFS_VERSION"))]
struct Cli {
    /// Path to config file (default: auto-discover)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show KPIs, ranked alerts, and recent notifications
    Overview {
        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// List ranked alerts
    Alerts {
        /// Show only top N alerts
        #[arg(long)]
        top: Option<usize>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Show the latest observation per commodity and market
    Signals {
        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Show driver scores and projections for one commodity
    Drilldown {
        /// Commodity name
        commodity: String,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Simulate a Red Sea disruption for one commodity
    Shock {
        /// Commodity name
        commodity: String,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Manage mitigation actions
    Action {
        #[command(subcommand)]
        action: ActionCmd,
    },
    /// Show or append decision log entries
    Log {
        /// Maximum entries to show
        #[arg(long)]
        limit: Option<u32>,

        /// Append a decision note instead of listing
        #[arg(long)]
        add: Option<String>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Validate and print the resolved configuration
    ConfigCheck,
}

#[derive(Subcommand)]
enum ActionCmd {
    /// Add a mitigation action
    Add {
        /// Action title
        title: String,

        /// Owner (defaults to Ops)
        #[arg(long, default_value = "")]
        owner: String,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: String,

        /// Initial status
        #[arg(long, default_value = "Open")]
        status: String,

        /// Free-form notes
        #[arg(long, default_value = "")]
        notes: String,

        /// Expected risk impact
        #[arg(long, default_value = "")]
        impact: String,

        /// Commodity scope (defaults to All)
        #[arg(long, default_value = "")]
        commodity: String,
    },
    /// List actions ordered by due date
    List {
        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Update an action's status or notes
    Update {
        /// Action id
        id: i64,

        /// New status
        #[arg(long)]
        status: Option<String>,

        /// New notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete an action
    Delete {
        /// Action id
        id: i64,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let start_dir = std::env::current_dir()?;
    let config = load_and_resolve(cli.config.as_deref(), &start_dir)
        .context("failed to load configuration")?;
    if let Some(path) = &config.config_path {
        eprintln!("Using config: {}", path.display());
    }

    match cli.command {
        Commands::Overview { format } => {
            let session = new_session(&config)?;
            let overview = build_overview(&session, &config);
            match format {
                OutputFormat::Text => print!("{}", render_overview_text(&overview)),
                OutputFormat::Json => println!("{}", render_json(&overview)),
            }
        }
        Commands::Alerts { top, format } => {
            let session = new_session(&config)?;
            let mut alerts =
                generate_alerts_with_rules(session.signals(), &config.thresholds, &config.triggers);
            if let Some(n) = top {
                alerts.truncate(n);
            }
            match format {
                OutputFormat::Text => print!("{}", render_alerts_text(&alerts)),
                OutputFormat::Json => println!("{}", render_json(&alerts)),
            }
        }
        Commands::Signals { format } => {
            let session = new_session(&config)?;
            let rows = build_signals(&session);
            match format {
                OutputFormat::Text => print!("{}", render_signals_text(&rows)),
                OutputFormat::Json => println!("{}", render_json(&rows)),
            }
        }
        Commands::Drilldown { commodity, format } => {
            let session = new_session(&config)?;
            let drilldown = build_drilldown(&session, &config, &commodity)?;
            match format {
                OutputFormat::Text => print!("{}", render_drilldown_text(&drilldown)),
                OutputFormat::Json => println!("{}", render_json(&drilldown)),
            }
        }
        Commands::Shock { commodity, format } => {
            let store = open_store(&config)?;
            let mut session = new_session(&config)?;
            dispatch(
                &mut session,
                &store,
                &config,
                Command::SimulateShock {
                    commodity: commodity.clone(),
                },
            )?;

            let drilldown = build_drilldown(&session, &config, &commodity)?;
            match format {
                OutputFormat::Text => print!("{}", render_drilldown_text(&drilldown)),
                OutputFormat::Json => println!("{}", render_json(&drilldown)),
            }
        }
        Commands::Action { action } => handle_action(action, &config)?,
        Commands::Log { limit, add, format } => {
            let store = open_store(&config)?;

            if let Some(message) = add {
                let mut session = empty_session(&config);
                dispatch(
                    &mut session,
                    &store,
                    &config,
                    Command::LogDecision { message },
                )?;
                println!("Decision logged.");
            } else {
                let entries = store.list_decision_logs(limit.unwrap_or(config.log_limit))?;
                match format {
                    OutputFormat::Text => print!("{}", render_logs_text(&entries)),
                    OutputFormat::Json => println!("{}", render_json(&entries)),
                }
            }
        }
        Commands::ConfigCheck => print_config(&config),
    }

    Ok(())
}

fn handle_action(action: ActionCmd, config: &ResolvedConfig) -> Result<()> {
    let store = open_store(config)?;

    match action {
        ActionCmd::Add {
            title,
            owner,
            due,
            status,
            notes,
            impact,
            commodity,
        } => {
            let action = NewAction {
                title,
                owner,
                due_date: parse_due_date(&due)?,
                status: parse_status(&status)?,
                notes,
                expected_risk_impact: impact,
                commodity,
            };

            let mut session = empty_session(config);
            let outcome = dispatch(&mut session, &store, config, Command::AddAction { action })?;
            if let CommandOutcome::ActionAdded { id } = outcome {
                println!("Added action #{id}");
            }
        }
        ActionCmd::List { format } => {
            let actions = store.list_actions()?;
            match format {
                OutputFormat::Text => print!("{}", render_actions_text(&actions)),
                OutputFormat::Json => println!("{}", render_json(&actions)),
            }
        }
        ActionCmd::Update { id, status, notes } => {
            let status = status.as_deref().map(parse_status).transpose()?;

            let mut session = empty_session(config);
            match dispatch(
                &mut session,
                &store,
                config,
                Command::UpdateAction { id, status, notes },
            )? {
                CommandOutcome::ActionUpdated { found: true } => println!("Updated action #{id}"),
                _ => println!("Action #{id} not found"),
            }
        }
        ActionCmd::Delete { id } => {
            let mut session = empty_session(config);
            match dispatch(&mut session, &store, config, Command::DeleteAction { id })? {
                CommandOutcome::ActionDeleted { removed: true } => println!("Deleted action #{id}"),
                _ => println!("Action #{id} not found"),
            }
        }
    }

    Ok(())
}

fn print_config(config: &ResolvedConfig) {
    if let Some(path) = &config.config_path {
        println!("Config valid: {}", path.display());
    } else {
        println!("No config file found. Using defaults.");
    }
    println!();
    println!("Paths:");
    println!("  signals: {}", config.signals_path.display());
    println!("  seed actions: {}", config.seed_actions_path.display());
    println!("  database: {}", config.db_path.display());
    println!();
    println!("Weights:");
    println!("  supply: {}", config.weights.supply);
    println!("  logistics: {}", config.weights.logistics);
    println!("  climate: {}", config.weights.climate);
    println!("  geopolitical: {}", config.weights.geopolitical);
    println!();
    println!("Thresholds:");
    println!("  medium: {}", config.thresholds.medium_min);
    println!("  high: {}", config.thresholds.high_min);
    println!("  critical: {}", config.thresholds.critical_min);
    println!();
    println!("Triggers:");
    println!("  composite_min: {}", config.triggers.composite_min);
    println!("  price_move_min: {}", config.triggers.price_move_min);
    println!();
    println!("Limits:");
    println!("  cache_ttl: {}s", config.cache_ttl.as_secs());
    println!("  feed_limit: {}", config.feed_limit);
    println!("  log_limit: {}", config.log_limit);
}

/// Session seeded with signals fetched through the cache
fn new_session(config: &ResolvedConfig) -> Result<Session> {
    let mut cache = SignalCache::new(config.cache_ttl);
    sentinelfs_core::new_session(&mut cache, config)
}

/// Session without signals, for commands that only touch the store
fn empty_session(config: &ResolvedConfig) -> Session {
    Session::new(Vec::new(), config.feed_limit)
}

fn parse_status(raw: &str) -> Result<ActionStatus> {
    ActionStatus::parse(raw).ok_or_else(|| {
        anyhow::anyhow!("invalid status: {raw} (expected Open, In Progress, Blocked, or Done)")
    })
}

fn parse_due_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid due date: {raw} (expected YYYY-MM-DD)"))
}
