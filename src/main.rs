//! NotebookLM Exporter - extract conversations and Studio documents to Markdown.
//!
//! All commands run against a saved page snapshot: `export` pulls the
//! conversation, `export-studio` walks the Studio panel flow for one
//! item, `inspect` shows what the extractor would find, and `watch`
//! exercises the reconciliation loop.

use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use nlm_exporter::application::{
    navigator::{item_title, SELECTED_VALUE},
    resolve, resolve_all, ExportOrchestrator, MarkdownAssembler, MessageExtractor, Reconciler,
    StudioNavigator, SELECT_MARKER_ATTR,
};
use nlm_exporter::cli::{Cli, Commands};
use nlm_exporter::domain::{AppConfig, Document, ExportError};
use nlm_exporter::infrastructure::{
    load_config, load_config_from_file, load_snapshot, DirectorySink, DomMarkdownConverter,
};

fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {e:#}", "Error:".red().bold());
        std::process::exit(1);
    }
}

/// Main application logic.
fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => load_config_from_file(path)?,
        None => load_config()?,
    };

    // The document tree is !Send; everything runs on one thread.
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let local = tokio::task::LocalSet::new();

    match cli.command {
        Commands::Export { snapshot, output } => {
            local.block_on(&rt, cmd_export(config, &snapshot, output))?;
        }
        Commands::ExportStudio {
            snapshot,
            item,
            output,
        } => {
            local.block_on(&rt, cmd_export_studio(config, &snapshot, item, output))?;
        }
        Commands::Inspect { snapshot, json } => {
            cmd_inspect(&config, &snapshot, json)?;
        }
        Commands::Watch { snapshot, duration } => {
            local.block_on(&rt, cmd_watch(config, &snapshot, duration))?;
        }
        Commands::Selectors => {
            cmd_selectors(&config)?;
        }
    }

    Ok(())
}

/// Export the conversation from a snapshot.
async fn cmd_export(
    config: AppConfig,
    snapshot: &PathBuf,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let doc = load_snapshot(snapshot)?;
    let dir = output.unwrap_or_else(|| config.output_dir());

    let orchestrator = ExportOrchestrator::new(
        config,
        Box::new(DomMarkdownConverter::new()),
        Box::new(DirectorySink::new(dir.clone())),
    );
    let saved = orchestrator.export_conversation(&doc).await?;

    println!(
        "{} Exported {} ({} bytes) to {}",
        "✓".green().bold(),
        saved.filename.cyan(),
        saved.bytes,
        dir.display()
    );
    Ok(())
}

/// Export one Studio item: inject selection markers, mark the requested
/// item, then run the full navigation episode.
async fn cmd_export_studio(
    config: AppConfig,
    snapshot: &PathBuf,
    index: usize,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let doc = load_snapshot(snapshot)?;
    let dir = output.unwrap_or_else(|| config.output_dir());

    // One reconciliation pass gives every item its selection marker.
    let mut reconciler = Reconciler::new(config.selectors.clone(), config.timing);
    reconciler.reconcile(&doc);
    select_item(&doc, &config, index)?;

    let navigator = StudioNavigator::new(config.selectors.clone(), config.timing);
    let assembler = MarkdownAssembler::new(&config.export.source_label, &config.export.file_prefix);
    let sink = DirectorySink::new(dir.clone());
    let saved = navigator
        .export_selected(&doc, &assembler, &DomMarkdownConverter::new(), &sink)
        .await?;

    println!(
        "{} Exported {} ({} bytes) to {}",
        "✓".green().bold(),
        saved.filename.cyan(),
        saved.bytes,
        dir.display()
    );
    Ok(())
}

/// Toggle the selection marker on the `index`-th Studio item.
fn select_item(doc: &Document, config: &AppConfig, index: usize) -> anyhow::Result<()> {
    let panel = resolve(&config.selectors.studio_panel, doc.root())
        .ok_or(ExportError::ContainerNotFound)?;
    let list = resolve(&config.selectors.studio_item_list, &panel).unwrap_or_else(|| Rc::clone(&panel));
    let items = resolve_all(&config.selectors.studio_item, &list);

    let item = items.get(index).ok_or_else(|| {
        ExportError::config(format!(
            "item index {index} out of range, {} item(s) found",
            items.len()
        ))
    })?;
    let marker = item
        .descendants()
        .into_iter()
        .find(|n| n.has_attr(SELECT_MARKER_ATTR))
        .ok_or_else(|| ExportError::config("item has no selection marker"))?;
    marker.set_attr("data-selected", SELECTED_VALUE);
    Ok(())
}

/// JSON shape of the `inspect` report.
#[derive(serde::Serialize)]
struct InspectReport {
    url: String,
    messages: Vec<InspectMessage>,
    stats: Option<nlm_exporter::domain::ExtractionStats>,
    studio_items: Vec<String>,
}

#[derive(serde::Serialize)]
struct InspectMessage {
    role: nlm_exporter::domain::Role,
    chars: usize,
    preview: String,
}

/// Show what the extractor finds in a snapshot: messages, roles and
/// Studio items.
fn cmd_inspect(config: &AppConfig, snapshot: &PathBuf, json: bool) -> anyhow::Result<()> {
    let doc = load_snapshot(snapshot)?;

    if json {
        let mut report = InspectReport {
            url: doc.url(),
            messages: Vec::new(),
            stats: None,
            studio_items: Vec::new(),
        };
        if let Some(container) = resolve(&config.selectors.main_container, doc.root()) {
            let extractor = MessageExtractor::new(config.selectors.clone());
            let (transcript, stats) = extractor.extract(&container);
            report.stats = Some(stats);
            for unit in &transcript {
                let text = unit.text();
                report.messages.push(InspectMessage {
                    role: unit.role,
                    chars: text.chars().count(),
                    preview: text.chars().take(60).collect(),
                });
            }
        }
        if let Some(panel) = resolve(&config.selectors.studio_panel, doc.root()) {
            let list = resolve(&config.selectors.studio_item_list, &panel)
                .unwrap_or_else(|| Rc::clone(&panel));
            for item in resolve_all(&config.selectors.studio_item, &list) {
                report.studio_items.push(item_title(&item));
            }
        }
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match resolve(&config.selectors.main_container, doc.root()) {
        Some(container) => {
            let extractor = MessageExtractor::new(config.selectors.clone());
            let (transcript, stats) = extractor.extract(&container);

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "Role", "Chars", "Preview"]);
            for (i, unit) in transcript.iter().enumerate() {
                let text = unit.text();
                let preview: String = text.chars().take(60).collect();
                table.add_row(vec![
                    Cell::new(i + 1),
                    Cell::new(unit.role),
                    Cell::new(text.chars().count()),
                    Cell::new(preview),
                ]);
            }
            println!("{table}");
            println!();
            println!(
                "{} {} candidates, {} extracted ({} user / {} assistant), {} duplicate(s) and {} short item(s) dropped",
                "Messages:".bold(),
                stats.candidates_seen,
                stats.extracted,
                stats.user_messages.to_string().cyan(),
                stats.assistant_messages.to_string().green(),
                stats.duplicates_dropped,
                stats.short_dropped,
            );
        }
        None => println!("{} no conversation container found", "!".yellow().bold()),
    }

    println!();
    match resolve(&config.selectors.studio_panel, doc.root()) {
        Some(panel) => {
            let list = resolve(&config.selectors.studio_item_list, &panel)
                .unwrap_or_else(|| Rc::clone(&panel));
            let items = resolve_all(&config.selectors.studio_item, &list);
            println!("{} {} item(s)", "Studio:".bold(), items.len());
            for (i, item) in items.iter().enumerate() {
                println!("  {}. {}", i, item_title(item));
            }
        }
        None => println!("{} no Studio panel found", "!".yellow().bold()),
    }

    Ok(())
}

/// Run the reconciliation loop against a snapshot for a bounded time.
async fn cmd_watch(config: AppConfig, snapshot: &PathBuf, duration_secs: u64) -> anyhow::Result<()> {
    let doc = load_snapshot(snapshot)?;

    let mut reconciler = Reconciler::new(config.selectors.clone(), config.timing);
    let outcome = reconciler.reconcile(&doc);
    println!(
        "{} initial pass: {} control(s), {} selection marker(s) added",
        "✓".green().bold(),
        outcome.export_controls_added,
        outcome.select_markers_added,
    );

    let _ = tokio::time::timeout(Duration::from_secs(duration_secs), reconciler.run(doc)).await;
    println!("{} watch finished after {duration_secs}s", "✓".green().bold());
    Ok(())
}

/// Print the active selector chains as TOML.
fn cmd_selectors(config: &AppConfig) -> anyhow::Result<()> {
    let rendered = toml::to_string_pretty(&config.selectors)
        .map_err(|e| ExportError::config(format!("Failed to serialize selectors: {e}")))?;
    println!("{rendered}");
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
