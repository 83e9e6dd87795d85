mod commands;
mod logging;
mod progress;

use std::fs::File;
use std::io;
use std::path::Path;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clipkeep_core::config::{load_configuration, load_configuration_from};
use clipkeep_core::storage::Store;
use clipkeep_core::{AppConfig, PassSummary, RetentionEngine, Scheduler, SilentReporter};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use progress::CliReporter;
use serde_json::json;
use tracing::{error, info, warn};

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let args = Cli::parse();

    let config = match args.config.as_deref() {
        Some(path) => load_configuration_from(path),
        None => load_configuration(),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let result = match args.command {
        Some(Commands::Run { dry_run }) => run_once(config, dry_run),
        Some(Commands::Plan { json }) => run_plan(config, json),
        Some(Commands::Scan { json }) => run_scan(config, json),
        Some(Commands::Watch) => run_watch(config),
        Some(Commands::Audit { limit, csv }) => run_audit(&config, limit, csv.as_deref()),
        Some(Commands::Lock { path }) => run_lock(&config, &path),
        Some(Commands::Unlock { path }) => run_unlock(&config, &path),
        Some(Commands::Locks) => run_list_locks(&config),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:#?}", config);
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = result {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

fn open_store(config: &AppConfig) -> Result<Arc<Store>> {
    let store = Store::open(&config.db_path)
        .with_context(|| format!("opening database {}", config.db_path))?;
    Ok(Arc::new(store))
}

fn build_engine(config: AppConfig) -> Result<RetentionEngine> {
    let store = open_store(&config)?;
    let engine = RetentionEngine::new(config, store.clone(), store)
        .context("invalid retention configuration")?;
    Ok(engine)
}

fn run_once(mut config: AppConfig, dry_run: bool) -> Result<()> {
    config.retention.dry_run |= dry_run;
    let engine = build_engine(config)?;
    let reporter = CliReporter::new();
    let summary = engine.run_pass(&reporter)?;

    println!();
    print_summary(&summary);
    if summary.failed() > 0 {
        for (path, err) in &summary.report.failed {
            warn!("  {} {}: {}", "✗".red(), path.display(), err);
        }
    }
    Ok(())
}

fn print_summary(summary: &PassSummary) {
    info!(
        "Scan: {}, Total: {}, {} clips scanned, {} rejected",
        format!("{:.2}s", summary.scan_duration.as_secs_f64()).green(),
        format!("{:.2}s", summary.total_duration.as_secs_f64()).green(),
        summary.clips_scanned,
        summary.rejected_entries,
    );
    if !summary.report.would_delete.is_empty() {
        info!(
            "[dry run] {} clips would be deleted",
            format!("{}", summary.report.would_delete.len()).yellow(),
        );
    }
    info!(
        "{} deleted ({} bytes), {} failed, {} skipped (locked), {} skipped (quota)",
        format!("{}", summary.deleted()).red(),
        format!("{}", summary.report.bytes_freed).red(),
        format!("{}", summary.failed()).yellow(),
        format!("{}", summary.skipped_locked()).cyan(),
        format!("{}", summary.skipped_quota()).cyan(),
    );
    if summary.capped > 0 {
        info!(
            "{} candidates deferred by the per-pass deletion cap",
            format!("{}", summary.capped).yellow()
        );
    }
    for warning in &summary.warnings {
        warn!("{}", warning.to_string().yellow());
    }
}

fn run_plan(config: AppConfig, json: bool) -> Result<()> {
    let engine = build_engine(config)?;
    let plan = if json {
        engine.plan(&SilentReporter)?
    } else {
        engine.plan(&CliReporter::new())?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&plan.decision)?);
        return Ok(());
    }

    for clip in &plan.decision.to_delete {
        println!(
            "{}  {}  {}",
            clip.captured_at.format("%Y-%m-%d %H:%M"),
            clip.species.cyan(),
            clip.path.display()
        );
    }
    info!(
        "{} clips ({} bytes) would be deleted, {} held by locks, {} held by species quotas",
        format!("{}", plan.decision.to_delete.len()).red(),
        plan.decision.bytes_to_free(),
        plan.decision.skipped_locked,
        plan.decision.skipped_quota,
    );
    if let Some(usage) = plan.disk_usage {
        info!(
            "Disk: {:.1}% free of {} bytes",
            usage.free_ratio() * 100.0,
            usage.total_bytes
        );
    }
    for warning in plan.decision.warnings() {
        warn!("{}", warning.to_string().yellow());
    }
    Ok(())
}

fn run_scan(config: AppConfig, json: bool) -> Result<()> {
    let engine = build_engine(config)?;
    let inventory = engine.scan()?;

    if json {
        let rejected: Vec<_> = inventory
            .rejected
            .iter()
            .map(|entry| {
                json!({
                    "path": entry.path,
                    "error": entry.error.to_string(),
                })
            })
            .collect();
        let output = json!({
            "root": inventory.root,
            "scanned_at": inventory.scanned_at,
            "total_bytes": inventory.total_bytes(),
            "clips": inventory.clips,
            "rejected": rejected,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for clip in &inventory.clips {
        println!(
            "{}  {:>3}%  {:<24} {}",
            clip.captured_at.format("%Y-%m-%d %H:%M"),
            clip.confidence_percent,
            clip.species.cyan(),
            clip.path.display()
        );
    }
    for entry in &inventory.rejected {
        println!("{} {}: {}", "skipped".yellow(), entry.path.display(), entry.error);
    }
    info!(
        "{} clips ({} bytes), {} rejected entries",
        format!("{}", inventory.clips.len()).green(),
        inventory.total_bytes(),
        format!("{}", inventory.rejected.len()).yellow(),
    );
    Ok(())
}

fn run_watch(config: AppConfig) -> Result<()> {
    let engine = Arc::new(build_engine(config)?);
    let interval = engine.settings().interval;

    let handle = Scheduler::spawn_with(
        Arc::clone(&engine),
        interval,
        Arc::new(SilentReporter),
        print_summary,
    )?;
    info!(
        "Watching {} every {:?}. Press Enter to stop.",
        engine.config().scan_root.display(),
        interval
    );

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;

    info!("Stopping scheduler...");
    handle.shutdown();
    Ok(())
}

fn run_audit(config: &AppConfig, limit: i64, csv_path: Option<&Path>) -> Result<()> {
    let store = open_store(config)?;
    let db = store.db()?;
    let entries = db.recent_deletions(limit)?;

    if let Some(path) = csv_path {
        let file =
            File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let mut writer = csv::Writer::from_writer(file);
        for entry in &entries {
            writer.serialize(entry)?;
        }
        writer.flush()?;
        info!(
            "Exported {} audit entries to {}",
            entries.len(),
            path.display()
        );
        return Ok(());
    }

    for entry in &entries {
        println!("{}  {}", entry.deleted_at.dimmed(), entry.filename);
    }
    info!(
        "Showing {} of {} deletions",
        entries.len(),
        db.deletion_count()?
    );
    Ok(())
}

fn run_lock(config: &AppConfig, path: &str) -> Result<()> {
    let store = open_store(config)?;
    store.db()?.insert_locked_clip(path)?;
    info!("Locked {}", path.green());
    Ok(())
}

fn run_unlock(config: &AppConfig, path: &str) -> Result<()> {
    let store = open_store(config)?;
    if store.db()?.remove_locked_clip(path)? {
        info!("Unlocked {}", path);
    } else {
        warn!("{} was not locked", path);
    }
    Ok(())
}

fn run_list_locks(config: &AppConfig) -> Result<()> {
    let store = open_store(config)?;
    let locks = store.db()?.list_locked_clips()?;
    for lock in &locks {
        println!("{}  {}", lock.locked_at.dimmed(), lock.clip_path);
    }
    info!("{} reviewer locks", locks.len());
    Ok(())
}
