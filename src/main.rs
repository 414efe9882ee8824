use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use gauntlet_planner::{
    MatchOutcome, OverrideStore, PairId, PlannerConfig, PlannerSession, SyncPairCatalog,
};

#[derive(Parser, Debug)]
#[command(name = "gauntlet-planner", version, about = "Resolve sheet clears to owned sync pairs and plan gauntlet rounds")]
struct Cli {
    /// JSON config file (CLI flags win over its values)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Sync pair catalog JSON
    #[arg(long, value_name = "FILE", global = true)]
    catalog: Option<PathBuf>,

    /// Ownership export JSON ({"dex|pokemon": "level|..."})
    #[arg(long, value_name = "FILE", global = true)]
    pairs: Option<PathBuf>,

    /// Clears payload (.json from the extractor, or a raw .csv sheet export)
    #[arg(long, value_name = "FILE", global = true)]
    clears: Option<PathBuf>,

    /// Override store (SQLite)
    #[arg(long, value_name = "FILE", global = true)]
    overrides: Option<PathBuf>,

    /// Extra alt-tag rules (JSON array), appended after the built-in rules
    #[arg(long = "alt-tags", value_name = "FILE", global = true)]
    alt_tags: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve every row and print the planned rounds
    Plan,
    /// Print unmatched / ambiguous / not-owned labels
    Diagnose,
    /// Resolve one label and show which tier concluded
    Resolve {
        #[arg(long)]
        label: String,
    },
    /// Bind a sheet label to a sync pair
    Bind {
        #[arg(long)]
        label: String,
        /// Pair id as DEX|POKEMON
        #[arg(long)]
        pair: PairId,
    },
    /// Remove one binding
    Unbind {
        #[arg(long)]
        label: String,
    },
    /// Remove every binding
    UnbindAll,
    /// List bindings (and optionally the change history)
    Overrides {
        #[arg(long)]
        events: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    match &cli.command {
        Command::Plan => run_plan(&config)?,
        Command::Diagnose => run_diagnose(&config)?,
        Command::Resolve { label } => run_resolve(&config, label)?,
        Command::Bind { label, pair } => run_bind(&config, label, pair)?,
        Command::Unbind { label } => run_unbind(&config, label)?,
        Command::UnbindAll => run_unbind_all(&config)?,
        Command::Overrides { events } => run_overrides(&config, *events)?,
    }

    Ok(())
}

/// Config file first, then CLI flags on top
fn resolve_config(cli: &Cli) -> Result<PlannerConfig> {
    let mut config = match &cli.config {
        Some(path) => PlannerConfig::from_file(path)?,
        None => PlannerConfig::default(),
    };

    if let Some(path) = &cli.catalog {
        config.catalog_path = Some(path.clone());
    }
    if let Some(path) = &cli.pairs {
        config.pairs_path = Some(path.clone());
    }
    if let Some(path) = &cli.clears {
        config.clears_path = Some(path.clone());
    }
    if let Some(path) = &cli.overrides {
        config.overrides_db = Some(path.clone());
    }
    if let Some(path) = &cli.alt_tags {
        config.alt_tag_rules_path = Some(path.clone());
    }

    Ok(config)
}

fn open_store(config: &PlannerConfig) -> Result<OverrideStore> {
    let Some(path) = &config.overrides_db else {
        bail!("No override store configured (use --overrides or \"overrides_db\")");
    };
    OverrideStore::open(path)
}

/// Catalog → roster → overrides → payload, in that order
fn load_session(config: &PlannerConfig) -> Result<PlannerSession> {
    let mut session = PlannerSession::from_config(config)?;

    let catalog_path = config
        .catalog_path
        .as_ref()
        .context("No catalog configured (use --catalog or \"catalog_path\")")?;
    println!("📂 Loading catalog...");
    session.load_catalog(catalog_path)?;
    println!("✓ {} sync pairs in catalog", session.catalog().len());

    if let Some(pairs_path) = &config.pairs_path {
        println!("\n🎒 Loading owned pairs...");
        let summary = session.load_roster(pairs_path)?;
        println!("✓ {} owned pairs loaded", summary.loaded);
        if summary.missing > 0 {
            println!("⚠️  {} export keys not in catalog", summary.missing);
        }
    } else {
        println!("\n⚠️  No owned pairs file; every match will be reported as not owned");
    }

    if config.overrides_db.is_some() {
        let ledger = open_store(config)?.load()?;
        if !ledger.is_empty() {
            println!("\n📌 {} manual overrides", ledger.len());
        }
        session.set_ledger(ledger);
    }

    let clears_path = config
        .clears_path
        .as_ref()
        .context("No clears payload configured (use --clears or \"clears_path\")")?;
    println!("\n⚔️  Loading clears...");
    session.load_payload(clears_path)?;
    let bosses: Vec<&str> = session.buckets().bosses().map(String::as_str).collect();
    println!(
        "✓ {} clears across {} bosses: {}",
        session.buckets().clear_count(),
        bosses.len(),
        bosses.join(", ")
    );

    Ok(session)
}

fn run_plan(config: &PlannerConfig) -> Result<()> {
    println!("🗺️  Gauntlet Planner - Round Drafting");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let session = load_session(config)?;
    let rounds = session.plan()?;

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if rounds.is_empty() {
        println!("❌ No complete rounds could be built.");
        return Ok(());
    }

    for (i, round) in rounds.iter().enumerate() {
        println!("\n🏁 Round {} (score {:.2})", i + 1, round.score);
        for clear in round.by_investment() {
            let manual = if clear.manual { " 📌" } else { "" };
            println!(
                "   {:<16} {} - {}{}",
                clear.boss,
                session.pair_name(&clear.pair_id),
                clear.investment,
                manual
            );
        }
    }

    println!("\n✅ {} rounds drafted", rounds.len());

    let unresolved = session.report().unresolved_count();
    if unresolved > 0 {
        println!("⚠️  {} labels unresolved (run `diagnose`)", unresolved);
    }

    Ok(())
}

fn run_diagnose(config: &PlannerConfig) -> Result<()> {
    println!("🔍 Gauntlet Planner - Resolution Diagnostics");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let session = load_session(config)?;
    let report = session.report();

    println!("\n❓ Unmatched: {}", report.unmatched.len());
    for (label, count) in &report.unmatched {
        println!("   {} ({} rows)", label, count);
    }

    println!("\n🔀 Ambiguous: {}", report.ambiguous.len());
    for (label, names) in &report.ambiguous {
        let shown: Vec<&str> = names.iter().take(3).map(String::as_str).collect();
        println!("   {} → {}", label, shown.join("; "));
    }

    println!("\n🚫 Not owned: {}", report.not_owned.len());
    for (label, info) in &report.not_owned {
        match &info.cheapest {
            Some(cheapest) => println!(
                "   {} ({}) cheapest: {} {}",
                label, info.display_name, cheapest.boss, cheapest.investment
            ),
            None => println!("   {} ({})", label, info.display_name),
        }
    }

    if !report.skipped_overrides.is_empty() {
        println!("\n📌 Overrides skipped (pair not owned): {}", report.skipped_overrides.join(", "));
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "✓ {} rows matched, {} manual clears, {} unresolved labels",
        report.matched_rows,
        report.manual_clears,
        report.unresolved_count()
    );

    Ok(())
}

fn run_resolve(config: &PlannerConfig, label: &str) -> Result<()> {
    let mut session = PlannerSession::from_config(config)?;

    let catalog_path = config
        .catalog_path
        .as_ref()
        .context("No catalog configured (use --catalog or \"catalog_path\")")?;
    session.load_catalog(catalog_path)?;
    if let Some(pairs_path) = &config.pairs_path {
        session.load_roster(pairs_path)?;
    }

    let (tier, outcome) = session.resolve_traced(label);
    let tier = tier.map(|t| t.name()).unwrap_or("none");

    println!("🔎 \"{}\" (tier: {})", label, tier);
    match &outcome {
        MatchOutcome::Match(entry) => println!("✓ Owned: {}", session.pair_name(&entry.id)),
        MatchOutcome::NotOwned(entry) => {
            println!("🚫 Not owned: {}", session.pair_name(&entry.id))
        }
        MatchOutcome::Ambiguous(candidates) => {
            println!("🔀 Ambiguous between {} pairs:", candidates.len());
            for entry in candidates {
                println!("   {} {}", entry.id, session.pair_name(&entry.id));
            }
        }
        MatchOutcome::Unmatched => println!("❓ No pair matches"),
        MatchOutcome::Empty => println!("⚠️  Label is empty after normalization"),
    }

    Ok(())
}

fn run_bind(config: &PlannerConfig, label: &str, pair: &PairId) -> Result<()> {
    if let Some(catalog_path) = &config.catalog_path {
        let catalog = SyncPairCatalog::from_file(catalog_path)?;
        match catalog.get(pair) {
            Some(entry) => println!("✓ {} → {}", label, entry.display_name()),
            None => bail!("Pair {} not found in catalog", pair),
        }
    } else {
        println!("⚠️  No catalog configured; binding {} unchecked", pair);
    }

    let store = open_store(config)?;
    store.save_binding(label, pair)?;
    println!("📌 Bound \"{}\" to {}", label, pair);

    Ok(())
}

fn run_unbind(config: &PlannerConfig, label: &str) -> Result<()> {
    let store = open_store(config)?;
    if store.remove_binding(label)? {
        println!("✓ Removed binding for \"{}\"", label);
    } else {
        println!("⚠️  No binding for \"{}\"", label);
    }
    Ok(())
}

fn run_unbind_all(config: &PlannerConfig) -> Result<()> {
    let store = open_store(config)?;
    let removed = store.clear()?;
    println!("✓ Removed {} bindings", removed);
    Ok(())
}

fn run_overrides(config: &PlannerConfig, show_events: bool) -> Result<()> {
    let store = open_store(config)?;
    let ledger = store.load()?;

    println!("📌 Manual overrides: {}", ledger.len());
    for (label, pair_id) in ledger.list() {
        println!("   {} → {}", label, pair_id);
    }

    if show_events {
        let events = store.events(None)?;
        println!("\n📜 History ({} events)", events.len());
        for event in events {
            println!(
                "   {} {:<7} {} {}",
                event.timestamp.format("%Y-%m-%d %H:%M:%S"),
                event.action.as_str(),
                event.label.as_deref().unwrap_or("*"),
                event.pair_id.as_deref().unwrap_or("")
            );
        }
    }

    Ok(())
}
