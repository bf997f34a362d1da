//! SyncGrid - organize bookmarks into a tab/folder grid.
//!
//! Keeps groups of bookmarks under one managed folder of a bookmark store,
//! reorders them with drag-and-drop semantics, writes verified backups and
//! mirrors the tree into a user-chosen folder.
//!
//! Quick start:
//!   syncgrid add-group Work             # Create a group
//!   syncgrid add <group> Docs <url>     # Add a bookmark
//!   syncgrid list                       # Show the grid
//!   syncgrid search rust                # Find links by title or URL
//!   syncgrid export                     # Write a backup
//!   syncgrid sync connect ~/Drive/SG    # Mirror into a cloud-synced folder

mod application;
mod cli;
mod domain;
mod infrastructure;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use application::{
    backup_filename, export_data, format_document_summary, format_group_list, format_json,
    format_restore, format_search, format_sync_outcome, format_sync_status, format_table,
    format_tree, load_groups, read_import_file, to_pretty_json, validate_import, AutoSync,
    BookmarkService, DropOutcome, FolderMirror, OutcomeHook, OutputFormat, ReorderEngine,
    RestoreService, SyncOutcome, TreeWatcher,
};
use cli::{Cli, Commands, SyncAction};
use domain::{AppConfig, BookmarkStore, DropIntent, NodeChanges, Permission, SyncDirectory};
use infrastructure::{
    config_file_path, ensure_config_exists, load_config, LocalDirectory, SettingsStore,
    SqliteBookmarkStore,
};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Main application logic.
async fn run(cli: Cli) -> anyhow::Result<()> {
    let format = cli.output_format().map_err(anyhow::Error::msg)?;
    let config = load_config().context("Failed to load configuration")?;

    match cli.command {
        Commands::List => cmd_list(&config, format).await,
        Commands::Groups => {
            let groups = bookmarks(&config)?.groups().await?;
            println!("{}", format_group_list(&groups));
            Ok(())
        }
        Commands::Search { text } => {
            let hits = bookmarks(&config)?.search(&text).await?;
            println!("{}", format_search(&hits));
            Ok(())
        }
        Commands::AddGroup { title, parent } => {
            let node = bookmarks(&config)?
                .create_group(&title, parent.as_deref())
                .await?;
            println!("{} Created group {} [{}]", "✓".green().bold(), node.title.cyan(), node.id);
            Ok(())
        }
        Commands::Add { group, title, url } => {
            let node = bookmarks(&config)?.add_bookmark(&group, &title, &url).await?;
            println!("{} Added {} [{}]", "✓".green().bold(), node.title.cyan(), node.id);
            Ok(())
        }
        Commands::Rename { id, title } => {
            bookmarks(&config)?.rename_group(&id, &title).await?;
            println!("{} Renamed {id} to {}", "✓".green().bold(), title.cyan());
            Ok(())
        }
        Commands::Edit { id, title, url } => {
            if title.is_none() && url.is_none() {
                bail!("Nothing to change: pass --title and/or --url");
            }
            let node = bookmarks(&config)?
                .update_bookmark(&id, NodeChanges { title, url })
                .await?;
            println!("{} Updated {} [{}]", "✓".green().bold(), node.title.cyan(), node.id);
            Ok(())
        }
        Commands::Remove { id } => cmd_remove(&config, &id).await,
        Commands::Move {
            source,
            target,
            intent,
            at,
        } => cmd_move(&config, &source, &target, intent, at).await,
        Commands::MoveTo { id, group, index } => {
            let node = bookmarks(&config)?.move_into(&id, &group, index).await?;
            println!(
                "{} Moved {} into {group} (now at index {})",
                "✓".green().bold(),
                node.title.cyan(),
                node.index
            );
            Ok(())
        }
        Commands::Export { output } => cmd_export(&config, output.as_deref()).await,
        Commands::Import { file, dry_run } => cmd_import(&config, &file, dry_run).await,
        Commands::Sync { action } => match action {
            SyncAction::Now => cmd_sync_now(&config).await,
            SyncAction::Connect { dir } => cmd_sync_connect(&config, dir).await,
            SyncAction::Disconnect => {
                open_settings(&config)?.update(|mut s| {
                    s.sync_directory = None;
                    s
                })?;
                println!("{} Sync folder disconnected", "✓".green().bold());
                Ok(())
            }
            SyncAction::Status => cmd_sync_status(&config).await,
            SyncAction::Watch => cmd_sync_watch(&config).await,
        },
        Commands::Paths => cmd_paths(&config),
    }
}

fn open_store(config: &AppConfig) -> anyhow::Result<Arc<SqliteBookmarkStore>> {
    let path = config.store_db_path();
    let store = SqliteBookmarkStore::open(&path)
        .with_context(|| format!("Failed to open bookmark store at {}", path.display()))?;
    Ok(Arc::new(store))
}

fn open_settings(config: &AppConfig) -> anyhow::Result<Arc<SettingsStore>> {
    let store = SettingsStore::open(&config.store_db_path()).context("Failed to open settings")?;
    Ok(Arc::new(store))
}

fn bookmarks(config: &AppConfig) -> anyhow::Result<BookmarkService> {
    Ok(BookmarkService::new(open_store(config)?))
}

/// List groups command.
async fn cmd_list(config: &AppConfig, format: OutputFormat) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let groups = load_groups(store.as_ref()).await?;

    let output = match format {
        OutputFormat::Tree => format_tree(&groups),
        OutputFormat::Table => format_table(&groups),
        OutputFormat::Json => format_json(&groups)?,
    };

    println!("{output}");
    Ok(())
}

/// Remove a bookmark, or a whole group.
async fn cmd_remove(config: &AppConfig, id: &str) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let node = store.get(id).await?;
    let service = BookmarkService::new(store);

    if node.is_folder() {
        service.delete_group(id).await?;
        println!("{} Deleted group {}", "✓".green().bold(), node.title.cyan());
    } else {
        service.remove_bookmark(id).await?;
        println!("{} Removed {}", "✓".green().bold(), node.title.cyan());
    }
    Ok(())
}

/// Drop `source` on its sibling `target`.
async fn cmd_move(
    config: &AppConfig,
    source: &str,
    target: &str,
    intent: Option<DropIntent>,
    at: Option<f64>,
) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let source_node = store.get(source).await?;
    let target_node = store.get(target).await?;

    let Some(folder) = source_node.parent_id.clone() else {
        bail!("{source} has no parent folder");
    };

    let intent = match (intent, at) {
        (Some(intent), _) => intent,
        (None, Some(fraction)) => DropIntent::from_pointer(target_node.kind(), fraction, 1.0),
        (None, None) => DropIntent::Before,
    };

    let mut engine = ReorderEngine::new(store, folder);
    let gesture = engine.drag_start(source, source_node.kind());
    if !engine.hover(gesture, target, target_node.kind(), intent) {
        engine.cancel(gesture);
        bail!(
            "Cannot drop {} {intent} {} {}",
            source_node.title,
            target_node.kind(),
            target_node.title
        );
    }

    match engine.drop(gesture).await? {
        DropOutcome::Moved { node, .. } => println!(
            "{} Moved {} {intent} {} (now at index {})",
            "✓".green().bold(),
            node.title.cyan(),
            target_node.title.cyan(),
            node.index
        ),
        DropOutcome::Cancelled | DropOutcome::Stale => {
            println!("{} Nothing moved: {target} is not a sibling of {source}", "!".yellow().bold());
        }
    }
    Ok(())
}

/// Write a backup document.
async fn cmd_export(config: &AppConfig, output: Option<&Path>) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let groups = load_groups(store.as_ref()).await?;
    let doc = export_data(&groups)?;
    let json = to_pretty_json(&doc)?;

    let path = match output {
        Some(path) if !path.is_dir() => path.to_path_buf(),
        Some(dir) => dir.join(backup_filename(Utc::now())),
        None => config.exports_dir().join(backup_filename(Utc::now())),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;

    println!("{}", format_document_summary(&doc));
    println!("{} Exported to {}", "✓".green().bold(), path.display());
    Ok(())
}

/// Validate a backup and restore it.
async fn cmd_import(config: &AppConfig, file: &Path, dry_run: bool) -> anyhow::Result<()> {
    let text = read_import_file(file)?;
    let doc = validate_import(&text)
        .with_context(|| format!("{} was rejected", file.display()))?;

    println!("{}", format_document_summary(doc.document()));

    if dry_run {
        println!("{} Document is valid (dry run, nothing changed)", "✓".green().bold());
        return Ok(());
    }

    let result = RestoreService::new(open_store(config)?).restore(doc).await?;
    println!("{}", format_restore(&result));
    Ok(())
}

/// The connected sync folder, or an error telling how to connect one.
fn sync_directory(settings: &SettingsStore) -> anyhow::Result<PathBuf> {
    match settings.load()?.sync_directory {
        Some(dir) => Ok(dir),
        None => bail!("No sync folder connected. Run 'syncgrid sync connect <dir>' first."),
    }
}

/// Persist `last_synced_at` after a successful sync.
fn record_outcome(settings: &SettingsStore, outcome: &SyncOutcome) {
    if let SyncOutcome::Synced { synced_at } = outcome {
        if let Err(e) = settings.update(|s| s.synced_at(*synced_at)) {
            tracing::warn!(error = %e, "Failed to record sync time");
        }
    }
}

async fn cmd_sync_now(config: &AppConfig) -> anyhow::Result<()> {
    let settings = open_settings(config)?;
    let dir = sync_directory(&settings)?;

    let groups = load_groups(open_store(config)?.as_ref()).await?;
    let mirror = FolderMirror::new(Arc::new(LocalDirectory::new(dir)));
    let outcome = mirror.sync(&groups).await;
    record_outcome(&settings, &outcome);

    println!("{}", format_sync_outcome(&outcome));
    match outcome {
        SyncOutcome::Synced { .. } | SyncOutcome::Coalesced => Ok(()),
        SyncOutcome::NoPermission => bail!("Cannot write to {}", mirror.directory_name()),
        SyncOutcome::Failed { reason } => bail!("Sync failed: {reason}"),
    }
}

async fn cmd_sync_status(config: &AppConfig) -> anyhow::Result<()> {
    let settings = open_settings(config)?.load()?;

    let files = match &settings.sync_directory {
        Some(dir) => LocalDirectory::new(dir.clone())
            .list_files()
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to list sync folder");
                Vec::new()
            }),
        None => Vec::new(),
    };

    println!("{}", format_sync_status(&settings, &files));
    Ok(())
}

async fn cmd_sync_connect(config: &AppConfig, dir: PathBuf) -> anyhow::Result<()> {
    let directory = LocalDirectory::new(dir);
    if directory.request_permission().await != Permission::Granted {
        bail!("Cannot write to {}", directory.path().display());
    }

    let path = std::fs::canonicalize(directory.path())
        .with_context(|| format!("Failed to resolve {}", directory.path().display()))?;

    open_settings(config)?.update(|mut s| {
        s.sync_directory = Some(path.clone());
        s
    })?;

    println!(
        "{} Sync folder set to {} ({})",
        "✓".green().bold(),
        directory.name().cyan(),
        path.display()
    );
    Ok(())
}

/// Follow the store and sync until Ctrl-C.
async fn cmd_sync_watch(config: &AppConfig) -> anyhow::Result<()> {
    if !config.sync.enabled {
        bail!("Auto-sync is disabled in {}", config_file_path().display());
    }

    let settings = open_settings(config)?;
    let dir = sync_directory(&settings)?;
    let store = open_store(config)?;

    let watcher = TreeWatcher::spawn(store).await?;
    let mirror = Arc::new(FolderMirror::new(Arc::new(LocalDirectory::new(dir))));

    let hook: OutcomeHook = {
        let settings = settings.clone();
        Arc::new(move |outcome: &SyncOutcome| {
            record_outcome(&settings, outcome);
            println!("{}", format_sync_outcome(outcome));
        })
    };

    let scheduler = AutoSync::spawn(mirror.clone(), watcher.subscribe(), &config.sync, hook);
    scheduler.trigger();

    println!(
        "{} Watching {} groups, syncing to {} (Ctrl-C to stop)",
        "👀".bold(),
        watcher.current().len(),
        mirror.directory_name().cyan()
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    scheduler.shutdown().await;
    Ok(())
}

/// Show data and configuration paths command.
fn cmd_paths(config: &AppConfig) -> anyhow::Result<()> {
    let config_path = ensure_config_exists()?;

    println!("{}", "📂 SyncGrid Paths".bold());
    println!();
    println!("  {} {}", "data:".green(), config.data_dir().display());
    println!("  {} {}", "config:".green(), config_path.display());
    println!("  {} {}", "store:".green(), config.store_db_path().display());
    println!("  {} {}", "exports:".green(), config.exports_dir().display());

    Ok(())
}

/// Setup tracing/logging based on verbosity level.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
