use anyhow::Result;
use std::process;

use lemon_core::models::{SyncReport, SyncStatus};
use lemon_core::query::MenuQuery;
use lemon_core::store::LocalStore;
use lemon_core::sync::SyncEngine;

use super::helpers::{print_menu_table, profile_badge, selection_from};

fn print_sync_status(report: &SyncReport) {
    let cycle = report.cycle;
    match report.status {
        SyncStatus::Applied => {
            let stored = report.entries.len();
            let fetched = report.fetched;
            let dups = report.discarded_duplicates;
            eprintln!("Synced menu (cycle {cycle}): {stored} items from {fetched} records, {dups} duplicates dropped");
        }
        SyncStatus::Failed => {
            eprintln!("Menu sync failed (cycle {cycle}); the local menu may be empty until the next sync");
        }
        SyncStatus::Superseded => {
            eprintln!("Menu sync (cycle {cycle}) was superseded by a newer sync");
        }
    }
}

pub(crate) async fn cmd_sync(engine: &SyncEngine, json: bool) -> Result<()> {
    let report = engine.sync().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_sync_status(&report);
        if !report.entries.is_empty() {
            print_menu_table(&report.entries);
        }
    }

    if !report.is_applied() {
        process::exit(2);
    }
    Ok(())
}

/// The home screen: optionally refresh from the remote menu, then show the
/// cached menu filtered by the selected categories.
pub(crate) async fn cmd_menu(
    engine: &SyncEngine,
    categories: &[String],
    sync: bool,
    json: bool,
) -> Result<()> {
    let selection = selection_from(categories)?;
    let store = engine.store();

    if sync {
        let report = engine.sync().await;
        if !json {
            print_sync_status(&report);
        }
    }

    let mut query = MenuQuery::new(store.clone());
    let visible = query.set_selection(selection).await;

    if json {
        println!("{}", serde_json::to_string_pretty(visible)?);
        return Ok(());
    }

    if let Some(badge) = profile_badge(&store.profile_summary().await) {
        println!("Little Lemon {badge}\n");
    }

    if visible.is_empty() {
        eprintln!("No menu items cached. Run `lemon sync` to fetch the menu.");
        process::exit(2);
    }

    print_menu_table(visible);
    Ok(())
}

pub(crate) async fn cmd_search(
    store: &LocalStore,
    text: &str,
    categories: &[String],
    json: bool,
) -> Result<()> {
    let selection = selection_from(categories)?;
    let results = store.search(text, selection.as_filter()).await;

    if results.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No menu items match '{text}'");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_menu_table(&results);
    }

    Ok(())
}

pub(crate) async fn cmd_duplicates(store: &LocalStore, json: bool) -> Result<()> {
    let dups = store.duplicate_names().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&dups)?);
        return Ok(());
    }

    if dups.is_empty() {
        println!("No duplicates found ({} items cached)", store.count().await);
        return Ok(());
    }

    for dup in &dups {
        let name = &dup.name;
        let count = dup.count;
        println!("{name}: {count} rows");
    }
    Ok(())
}
