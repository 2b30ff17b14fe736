mod analyzer;
mod config;
mod model;
mod normalizer;
mod notifier;
mod parser;
mod reporter;
mod scraper;
mod storage;
mod utils;

use analyzer::position::resolve_holdings;
use analyzer::{Analyzer, AnalyzerImpl};
use chrono::Utc;
use clap::Parser as _;
use config::{load_config, AppConfig};
use model::{PositionSignal, Recommendation, ScrapeRequest, ScraperError};
use normalizer::normalize_all;
use notifier::TelegramNotifier;
use parser::{NgxParser, Parser};
use reporter::{build_report, save_report, CycleReport};
use crate::scraper::{Scraper, ScraperImpl};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use storage::{MemoryStore, SnapshotStore, SqliteStore};
use tokio::sync::{Mutex, Notify};
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

const DEBUG_HTML_DIR: &str = "logs/html";

#[derive(Debug, clap::Parser)]
#[command(name = "ngx-tracker", about = "NGX equities tracking agent")]
struct Args {
    /// Path to the JSON configuration file.
    #[arg(long, default_value = "config.json")]
    config: String,

    /// Run a single cycle and exit.
    #[arg(long)]
    once: bool,

    /// Minutes between cycles; overrides the configured interval.
    #[arg(long, value_name = "MINUTES")]
    interval: Option<u64>,

    /// Keep snapshots in memory and send no notifications.
    #[arg(long)]
    dry_run: bool,
}

/// Collaborators shared by every cycle.
struct Tracker<Sc, S> {
    config: Arc<AppConfig>,
    scraper: Sc,
    parser: NgxParser,
    analyzer: Arc<AnalyzerImpl>,
    storage: Arc<Mutex<S>>,
    notifier: Option<Arc<TelegramNotifier>>,
    debug_dir: PathBuf,
}

/// What a completed cycle produced.
struct CycleOutcome {
    snapshots_used: usize,
    recommendations: Vec<Recommendation>,
    positions: Vec<PositionSignal>,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("😱 Panic occurred: {:?}", panic_info);
    }));

    let args = Args::parse();

    let config: Arc<AppConfig> = match load_config(&args.config) {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };
    let interval_secs = args
        .interval
        .map(|minutes| minutes * 60)
        .unwrap_or(config.check_interval_seconds);

    let scraper = match ScraperImpl::new(std::time::Duration::from_secs(60)) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return;
        }
    };
    let parser = match NgxParser::new() {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to build parser: {}", e);
            return;
        }
    };
    let analyzer = Arc::new(AnalyzerImpl::new(config.scoring.clone()));
    let refresh_notify = Arc::new(Notify::new());

    if args.dry_run {
        info!("Dry run: snapshots stay in memory and notifications are off.");
        let tracker = Tracker {
            storage: Arc::new(Mutex::new(MemoryStore::new(config.retention_limit))),
            config,
            scraper,
            parser,
            analyzer,
            notifier: None,
            debug_dir: PathBuf::from(DEBUG_HTML_DIR),
        };
        run_loop(&tracker, args.once, interval_secs, &refresh_notify).await;
        return;
    }

    let storage = match SqliteStore::new(&config.database_path, config.retention_limit) {
        Ok(s) => Arc::new(Mutex::new(s)),
        Err(e) => {
            error!("Failed to initialize storage: {}", e);
            return;
        }
    };

    let notifier = match &config.telegram {
        Some(telegram) => match TelegramNotifier::new(
            telegram,
            storage.clone(),
            config.clone(),
            analyzer.clone(),
            refresh_notify.clone(),
        ) {
            Ok(n) => Some(Arc::new(n)),
            Err(e) => {
                warn!("Telegram disabled: {}", e);
                None
            }
        },
        None => {
            info!("No Telegram configuration; notifications disabled.");
            None
        }
    };

    if let Some(notifier) = &notifier {
        if !args.once {
            if let Err(e) = notifier.set_my_commands().await {
                warn!("Registering bot commands failed: {:?}", e);
            }
            TelegramNotifier::spawn_listener(notifier.clone());
        }
    }

    let tracker = Tracker {
        config,
        scraper,
        parser,
        analyzer,
        storage,
        notifier,
        debug_dir: PathBuf::from(DEBUG_HTML_DIR),
    };
    run_loop(&tracker, args.once, interval_secs, &refresh_notify).await;
}

/// Runs cycles until Ctrl-C, or once when `once` is set.
async fn run_loop<Sc: Scraper, S: SnapshotStore>(
    tracker: &Tracker<Sc, S>,
    once: bool,
    interval_secs: u64,
    refresh_notify: &Notify,
) {
    info!(
        "Retaining up to {} snapshot(s).",
        tracker.storage.lock().await.retention_limit()
    );

    loop {
        if let Some(outcome) = run_cycle(tracker).await {
            info!(
                "Cycle produced {} recommendation(s) and {} position signal(s) from {} snapshot(s).",
                outcome.recommendations.len(),
                outcome.positions.len(),
                outcome.snapshots_used
            );
        }

        if once {
            info!("--once flag set. Exiting after first run.");
            break;
        }

        info!("Waiting for timer ({}s) or manual refresh...", interval_secs);
        tokio::select! {
            _ = sleep(Duration::from_secs(interval_secs)) => {
                info!("Timer triggered.");
            }
            _ = refresh_notify.notified() => {
                info!("Manual refresh triggered.");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Agent stopped by user.");
                break;
            }
        }
    }
}

/// One fetch, store, analyze and report pass. Every failure is logged and
/// ends or degrades this cycle only; `None` means the cycle was skipped.
async fn run_cycle<Sc: Scraper, S: SnapshotStore>(tracker: &Tracker<Sc, S>) -> Option<CycleOutcome> {
    let cfg = &tracker.config;
    info!("Starting NGX data fetch and analysis...");

    let request = ScrapeRequest {
        url: cfg.source_url.clone(),
    };
    let html = match tracker.scraper.fetch(&request).await {
        Ok(html) => html,
        Err(ScraperError::InvalidResponse { status, body }) => {
            warn!("Source responded with status {}", status);
            log_and_save_html(&tracker.debug_dir, &body, "invalid-response");
            return None;
        }
        Err(e) => {
            warn!("Scraper error: {}", e);
            return None;
        }
    };

    let captured_at = Utc::now();
    let raw_quotes = match tracker.parser.parse(&html, captured_at) {
        Ok(quotes) => quotes,
        Err(e) => {
            warn!("Parse error: {}", e);
            log_and_save_html(&tracker.debug_dir, &html, "parse-error");
            return None;
        }
    };

    let snapshot = normalize_all(raw_quotes, captured_at);
    if snapshot.is_empty() {
        error!("No data returned from the NGX website. Skipping this cycle.");
        log_and_save_html(&tracker.debug_dir, &html, "empty");
        return None;
    }
    info!("Captured {} stocks.", snapshot.quotes.len());

    let current = snapshot.quotes.clone();
    let snapshots = {
        let mut storage = tracker.storage.lock().await;
        if let Err(e) = storage.append(snapshot) {
            warn!("Snapshot save failed: {}", e);
        }
        storage.recent(cfg.history_window)
    };
    info!("Loaded {} historical snapshot(s) for trend analysis.", snapshots.len());

    let analyzer = &tracker.analyzer;
    let gainers = analyzer.top_gainers(&current, cfg.movers_count);
    let losers = analyzer.top_losers(&current, cfg.movers_count);
    let recommendations = analyzer.recommend(&current, &snapshots, cfg.recommendation_count);

    let resolved = resolve_holdings(&current, &cfg.portfolio);
    let positions: Vec<_> = resolved
        .matched
        .iter()
        .map(|(holding, quote)| analyzer.evaluate(holding, quote, &snapshots))
        .collect();

    let report = build_report(&CycleReport {
        generated_at: captured_at,
        quotes: &current,
        gainers: &gainers,
        losers: &losers,
        recommendations: &recommendations,
        positions: &positions,
        missing_holdings: &resolved.missing,
        snapshots_used: snapshots.len(),
    });
    println!("{}", report);
    if let Err(e) = save_report(&report, &cfg.reports_dir, captured_at) {
        warn!("Failed to save report: {}", e);
    }

    if let Some(notifier) = &tracker.notifier {
        notifier.dispatch_alerts(&positions, &recommendations).await;
    }

    info!("Analysis cycle complete.");
    Some(CycleOutcome {
        snapshots_used: snapshots.len(),
        recommendations,
        positions,
    })
}

/// Saves the fetched HTML for debugging when a page cannot be used.
fn log_and_save_html(folder: &Path, html: &str, reason: &str) {
    if html.is_empty() {
        return;
    }
    if let Err(e) = fs::create_dir_all(folder) {
        warn!("Failed to create debug folder: {}", e);
        return;
    }
    let filename = folder.join(format!("debug-{}-{}.html", reason, Utc::now().format("%Y%m%d_%H%M%S")));
    if let Err(e) = fs::write(&filename, html) {
        warn!("Failed to write debug HTML: {}", e);
    } else {
        info!("Saved debug HTML: {}", filename.display());
    }
}
