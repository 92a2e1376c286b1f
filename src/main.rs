// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging, load settings, open the database
// 3. Dispatch to the appropriate subcommand handler
// 4. Print results and exit with the proper code
//    (0 = clean, 1 = broken links found, 2 = error)
// =============================================================================

mod cli;

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, warn, LevelFilter};
use sqlx::SqlitePool;

use cli::{CacheCommand, Cli, Commands, OmitCommand, ResultsCommand};
use link_notifier::cache::{CacheStore, SqliteCache};
use link_notifier::checker::{decode_markup_href, taxonomy, LinkClassifier, OmitKind, Omissions, StatusRecord, StatusType};
use link_notifier::config::{Settings, SiteConfig};
use link_notifier::db;
use link_notifier::notify::NotifierSet;
use link_notifier::omit_store::OmitStore;
use link_notifier::results::{
    Author, DirectorySource, FlaggedResult, ReverifyOutcome, ResultManager, ScanMethod, SourceContent,
    SqliteResults, UnmanagedSource,
};
use link_notifier::scan::{parse_url_list, ScanReport, Scanner};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Everything the commands need, opened once
struct App {
    config: Arc<SiteConfig>,
    cache: CacheStore,
    classifier: Arc<LinkClassifier>,
    results: Arc<ResultManager>,
    omits: OmitStore,
    sources: Box<dyn SourceContent>,
}

impl App {
    async fn open(config: Arc<SiteConfig>) -> Result<Self> {
        let pool: SqlitePool = db::init_pool(&config.database_path)
            .await
            .with_context(|| format!("Opening database {}", config.database_path.display()))?;

        let cache = CacheStore::new(Arc::new(SqliteCache::new(pool.clone())), config.cache_ttl_seconds);
        // Expired rows go on start; a disabled cache is emptied
        if let Err(e) = cache.purge_expired().await {
            warn!("Cache purge failed: {}", e);
        }

        let omits = OmitStore::new(pool.clone());
        let omissions = omits
            .merge_into(Omissions::from_config(&config))
            .await?;

        let classifier = LinkClassifier::new(config.clone(), cache.clone())
            .context("Failed to build HTTP client")?
            .with_omissions(omissions);

        let results = ResultManager::new(Arc::new(SqliteResults::new(pool)), config.clone());

        let sources: Box<dyn SourceContent> = match &config.content_root {
            Some(root) => Box::new(DirectorySource::new(root)),
            None => Box::new(UnmanagedSource),
        };

        Ok(Self {
            config,
            cache,
            classifier: Arc::new(classifier),
            results: Arc::new(results),
            omits,
            sources,
        })
    }

    fn scanner(&self) -> Result<Scanner> {
        let notifier = NotifierSet::from_config(&self.config)?;
        Scanner::new(self.classifier.clone(), self.results.clone(), notifier)
    }
}

// Returns:
//   Ok(0) = nothing broken
//   Ok(1) = broken links found
//   Err   = something went wrong (exit code 2)
async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = Settings::load(cli.config.as_deref())?;
    let config = Arc::new(settings.into_site_config()?);
    debug!("Site {} ({} non-HTTP schemes)", config.site_url, config.url_schemes.len());

    let app = App::open(config).await?;

    match cli.command {
        Commands::Check { href, json } => handle_check(&app, &href, json).await,
        Commands::Scan { url, json } => {
            let report = app.scanner()?.scan_url(&url, ScanMethod::SingleScan).await?;
            print_reports(&[report], json)
        }
        Commands::Visit {
            source,
            file,
            author,
            json,
        } => {
            let html = read_input(file.as_deref())?;
            let report = app
                .scanner()?
                .scan_page(&source, &html, ScanMethod::Visit, Author::from_id(author))
                .await;
            print_reports(&[report], json)
        }
        Commands::MultiScan { file, json } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Reading {}", file.display()))?;
            let urls = parse_url_list(&text);
            println!("🔍 Scanning {} page(s)", urls.len());
            let reports = app.scanner()?.multi_scan(&urls).await;
            print_reports(&reports, json)
        }
        Commands::Results(command) => handle_results(&app, command).await,
        Commands::Omit(command) => handle_omit(&app, command).await,
        Commands::Cache(command) => handle_cache(&app, command).await,
    }
}

// RUST_LOG wins when set; otherwise info, or debug with --verbose
fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level)
        .filter_module("html5ever", LevelFilter::Error)
        .filter_module("selectors", LevelFilter::Warn)
        .filter_module("sqlx", LevelFilter::Warn)
        .filter_module("hyper", LevelFilter::Info)
        .filter_module("reqwest", LevelFilter::Info)
        .parse_env("RUST_LOG");
    let _ = builder.try_init();
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("Reading {}", path.display())),
        None => {
            let mut html = String::new();
            std::io::stdin()
                .read_to_string(&mut html)
                .context("Reading HTML from stdin")?;
            Ok(html)
        }
    }
}

async fn handle_check(app: &App, href: &str, json: bool) -> Result<i32> {
    let status = app.classifier.check_link(&decode_markup_href(href)).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print_status_table(std::slice::from_ref(&status));
    }
    Ok(exit_code_for(status.status_type == StatusType::Broken))
}

async fn handle_results(app: &App, command: ResultsCommand) -> Result<i32> {
    match command {
        ResultsCommand::List { json } => {
            let results = app.results.list().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                print_results_table(&results);
            }
            Ok(0)
        }
        ResultsCommand::Clear { id } => {
            if app.results.clear(id).await? {
                println!("🗑️  Cleared result #{}", id);
                Ok(0)
            } else {
                anyhow::bail!("No result with id {}", id)
            }
        }
        ResultsCommand::Rescan { id } => {
            let outcomes = match id {
                Some(id) => vec![(id, app.results.reverify(id, &app.classifier, app.sources.as_ref()).await?)],
                None => {
                    app.results
                        .reverify_all(&app.classifier, app.sources.as_ref())
                        .await?
                }
            };

            let mut still_broken = false;
            for (id, outcome) in &outcomes {
                match outcome {
                    ReverifyOutcome::Removed(status) => {
                        println!("✅ #{} removed: {} ({})", id, status.link, status.text)
                    }
                    ReverifyOutcome::Updated { new_id, status } => {
                        still_broken |= status.status_type == StatusType::Broken;
                        println!("🔁 #{} is now #{}: {} {} {}", id, new_id, status.status_type, status.code, status.link)
                    }
                    ReverifyOutcome::Unchanged(status) => {
                        still_broken |= status.status_type == StatusType::Broken;
                        println!("❌ #{} unchanged: {} {} {}", id, status.status_type, status.code, status.link)
                    }
                    ReverifyOutcome::NotFound => println!("⚠️  #{} not found", id),
                }
            }
            Ok(exit_code_for(still_broken))
        }
        ResultsCommand::Replace { id, new_link } => {
            app.results.replace(id, &new_link, app.sources.as_ref()).await?;
            println!("✏️  Replaced result #{} with {}", id, new_link);
            Ok(0)
        }
        ResultsCommand::DeleteSource { url } => {
            let removed = app.results.delete_source(&url, app.sources.as_ref()).await?;
            println!("🗑️  Deleted {} and {} result(s)", url, removed);
            Ok(0)
        }
    }
}

// Persists the omission, then re-checks existing results so the ones it
// covers are cleared.
async fn handle_omit(app: &App, command: OmitCommand) -> Result<i32> {
    let (kind, value) = match command {
        OmitCommand::Link(args) => (OmitKind::Link, args.value),
        OmitCommand::Page(args) => (OmitKind::Page, args.value),
    };

    if app.omits.add(kind, &value).await? {
        println!("🙈 Omitted {} {}", kind.as_str(), value);
    } else {
        println!("🙈 {} {} was already omitted", kind.as_str(), value);
    }

    let mut omissions = app.classifier.omissions().clone();
    omissions.add(kind, value);
    let classifier = LinkClassifier::new(app.config.clone(), app.cache.clone())?.with_omissions(omissions);

    let outcomes = app
        .results
        .reverify_all(&classifier, app.sources.as_ref())
        .await?;
    let removed = outcomes
        .iter()
        .filter(|(_, outcome)| matches!(outcome, ReverifyOutcome::Removed(_)))
        .count();
    if removed > 0 {
        println!("   {} existing result(s) cleared", removed);
    }
    Ok(0)
}

async fn handle_cache(app: &App, command: CacheCommand) -> Result<i32> {
    match command {
        CacheCommand::Purge => {
            let removed = app.cache.purge_expired().await?;
            println!("🧹 Purged {} expired cache entr{}", removed, if removed == 1 { "y" } else { "ies" });
        }
        CacheCommand::Destroy => {
            app.cache.destroy().await?;
            println!("🧹 Cache emptied");
        }
    }
    Ok(0)
}

fn exit_code_for(broken: bool) -> i32 {
    if broken {
        1
    } else {
        0
    }
}

// Prints scan reports either as a table or JSON
fn print_reports(reports: &[ScanReport], json: bool) -> Result<i32> {
    if json {
        println!("{}", serde_json::to_string_pretty(reports)?);
    } else {
        for report in reports {
            print_report(report);
        }
    }

    Ok(exit_code_for(reports.iter().any(|r| r.broken > 0)))
}

fn print_report(report: &ScanReport) {
    println!("\n🔍 {} ({})", report.source_url, report.method.as_str());
    if report.skipped {
        println!("🙈 Page is omitted, nothing scanned");
        return;
    }

    let statuses: Vec<StatusRecord> = report.links.iter().map(|l| l.status.clone()).collect();
    print_status_table(&statuses);

    println!("📊 Summary:");
    println!("   ✅ Good: {}", report.good);
    println!("   ⚠️  Warning: {}", report.warning);
    println!("   ❌ Broken: {}", report.broken);
    println!("   🙈 Omitted: {}", report.omitted);
    println!("   💾 Newly recorded: {}", report.stored);
    println!(
        "   ⏱️  Results were generated in {:.2} seconds ({:.2}/link)",
        report.seconds, report.seconds_per_link
    );
}

fn print_status_table(statuses: &[StatusRecord]) {
    println!("{:<60} {:<10} {:<6} {:<30}", "URL", "STATUS", "CODE", "MESSAGE");
    println!("{}", "=".repeat(108));

    for status in statuses {
        println!(
            "{:<60} {:<10} {:<6} {:<30}",
            truncate(&status.link, 57),
            format_status(status.status_type),
            format_code(status.code),
            status.text
        );
    }
    println!();
}

fn print_results_table(results: &[FlaggedResult]) {
    if results.is_empty() {
        println!("✅ No broken or warning links on record");
        return;
    }

    println!(
        "{:<6} {:<50} {:<10} {:<6} {:<8} {:<40}",
        "ID", "URL", "STATUS", "CODE", "WHERE", "SOURCE"
    );
    println!("{}", "=".repeat(125));
    for r in results {
        println!(
            "{:<6} {:<50} {:<10} {:<6} {:<8} {:<40}",
            r.id,
            truncate(&r.link, 47),
            format_status(r.status_type),
            format_code(r.code),
            r.location.as_str(),
            truncate(&r.source_url, 40)
        );
    }
    println!("\n📋 Total: {}", results.len());
}

fn format_status(status_type: StatusType) -> String {
    match status_type {
        StatusType::Good => "✅ good".to_string(),
        StatusType::Warning => "⚠️  warning".to_string(),
        StatusType::Broken => "❌ broken".to_string(),
        StatusType::Omitted => "🙈 omitted".to_string(),
        StatusType::NotApplicable => "➖ n/a".to_string(),
    }
}

// Real HTTP codes are marked so they can be looked up; the 0 and 666
// sentinels are ours and have no reference page.
fn format_code(code: u16) -> String {
    if taxonomy::has_reference_link(code) {
        code.to_string()
    } else {
        format!("({code})")
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}
