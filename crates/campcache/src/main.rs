//! campcache - lists National Park Service campgrounds.
//!
//! Shows the cached campground list immediately, fetches the current list
//! from the NPS API once in the background, and re-renders when the cache
//! has been replaced. Works offline from the last successful fetch.

mod config;
mod presenter;

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use campcache_core::{
    Campground, CampgroundStore, ParksClient, SyncOrchestrator, SyncSession,
};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

use config::Config;
use presenter::ListPresenter;

// ============================================================================
// Constants
// ============================================================================

/// Log file name prefix inside `<cache_dir>/logs`
const LOG_FILE_PREFIX: &str = "campcache.log";

const USAGE: &str = "\
Usage: campcache [--offline] [--json]

Lists National Park Service campgrounds from the local cache and refreshes
the cache from the NPS API once per run.

Options:
  --offline   Show the cached list without contacting the API
  --json      Print the final list as JSON instead of text rows
  -h, --help  Show this help

Environment:
  NPS_API_KEY          API key (overrides config.json)
  CAMPCACHE_BASE_URL   API base URL (overrides config.json)
  RUST_LOG             Log filter for stderr (default: warn)";

#[derive(Debug, Default, PartialEq, Eq)]
struct CliOptions {
    offline: bool,
    json: bool,
    help: bool,
}

impl CliOptions {
    fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = Self::default();
        for arg in args {
            match arg.as_ref() {
                "--offline" => options.offline = true,
                "--json" => options.json = true,
                "-h" | "--help" => options.help = true,
                other => anyhow::bail!("Unknown argument: {}\n\n{}", other, USAGE),
            }
        }
        Ok(options)
    }
}

/// Initialize the tracing subscriber for logging.
///
/// Stderr gets `RUST_LOG` (default `warn`); a daily rolling file under
/// `log_dir` always records `info` and above. The returned guard flushes
/// the file writer on drop.
fn init_tracing(log_dir: &Path) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = fmt::layer().with_writer(io::stderr).with_filter(filter);

    let (file_layer, guard) = match std::fs::create_dir_all(log_dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(LevelFilter::INFO);
            (Some(layer), Some(guard))
        }
        Err(e) => {
            eprintln!("Warning: file logging disabled ({}): {}", log_dir.display(), e);
            (None, None)
        }
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let options = CliOptions::parse(std::env::args().skip(1))?;
    if options.help {
        println!("{}", USAGE);
        return Ok(());
    }

    // Config problems are reported once logging is up
    let (config, config_error) = match Config::load() {
        Ok(c) => (c, None),
        Err(e) => (Config::default(), Some(e)),
    };
    let config = config.with_env_overrides();

    let cache_dir = config.cache_dir()?;
    let _log_guard = init_tracing(&cache_dir.join("logs"));
    info!("campcache starting");
    if let Some(e) = config_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }

    let store = CampgroundStore::open(&cache_dir)
        .with_context(|| format!("Failed to open campground cache in {}", cache_dir.display()))?;
    let cache_info = store.cache_info();

    let offline = options.offline || config.offline_mode;
    let mut session = if offline {
        // The client is never used offline, so a missing key is fine
        let client = ParksClient::new(config.api_key.clone().unwrap_or_default())?;
        SyncOrchestrator::new(client, store).activate_offline()
    } else {
        let client = match config.api_base_url.as_deref() {
            Some(base) => ParksClient::with_base_url(base, config.api_key()?),
            None => ParksClient::new(config.api_key()?),
        }
        .context("Failed to create NPS API client")?;
        SyncOrchestrator::new(client, store).activate()
    };

    if options.json {
        print_json(&mut session).await?;
    } else {
        let mut presenter = ListPresenter::new(io::stdout().lock());
        run_presenter(&mut session, &mut presenter, cache_info.as_ref())
            .await
            .context("Failed to write campground list")?;
    }

    info!("campcache shutting down");
    Ok(())
}

/// Mirror the feed into the presenter until the sync cycle has ended.
async fn run_presenter<W: io::Write>(
    session: &mut SyncSession,
    presenter: &mut ListPresenter<W>,
    cache_info: Option<&campcache_core::CachedData<usize>>,
) -> io::Result<()> {
    let mut status_open = true;
    loop {
        tokio::select! {
            Some(snapshot) = session.feed.next() => presenter.show(&snapshot)?,
            changed = session.status.changed(), if status_open => {
                status_open = changed.is_ok();
                let status = session.status.borrow_and_update().clone();
                presenter.show_status(&status, cache_info)?;
                if status.is_terminal() || !status_open {
                    break;
                }
            }
            else => break,
        }
    }

    // The cache is replaced before the status flips, so its last snapshot
    // may still be waiting in the feed
    let latest = session.feed.current();
    if !presenter.is_showing(&latest) {
        presenter.show(&latest)?;
    }
    Ok(())
}

/// Wait for the sync to settle, then print the cached list as JSON.
async fn print_json(session: &mut SyncSession) -> Result<()> {
    let status = session.settled().await;
    if let Some(failure) = status.failure() {
        eprintln!("Warning: {}; printing cached list", failure.message);
    }

    let campgrounds: Vec<Campground> = session
        .feed
        .current()
        .iter()
        .map(|record| record.to_campground())
        .collect();
    println!("{}", serde_json::to_string_pretty(&campgrounds)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options() {
        let none: [&str; 0] = [];
        assert_eq!(CliOptions::parse(none).unwrap(), CliOptions::default());

        let options = CliOptions::parse(["--offline", "--json"]).unwrap();
        assert!(options.offline);
        assert!(options.json);
        assert!(!options.help);

        assert!(CliOptions::parse(["-h"]).unwrap().help);
    }

    #[test]
    fn test_parse_rejects_unknown_flag() {
        let err = CliOptions::parse(["--refresh"]).unwrap_err();
        assert!(err.to_string().starts_with("Unknown argument: --refresh"));
    }

    #[tokio::test]
    async fn test_offline_presenter_shows_cache_once() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CampgroundStore::open(tmp.path()).unwrap();
        store
            .replace_all(vec![campcache_core::CampgroundRecord {
                name: "Cottonwood".to_string(),
                description: "Joshua Tree south entrance".to_string(),
                lat_long: "lat:33.7458, long:-115.8247".to_string(),
                image_url: None,
            }])
            .await
            .unwrap();
        let info = store.cache_info();

        let client = ParksClient::new("").unwrap();
        let mut session = SyncOrchestrator::new(client, store).activate_offline();
        let mut presenter = ListPresenter::new(Vec::new());
        run_presenter(&mut session, &mut presenter, info.as_ref())
            .await
            .unwrap();

        let output = String::from_utf8(presenter.into_inner()).unwrap();
        assert_eq!(output.matches("── 1 campground ──").count(), 1);
        assert!(output.contains("Cottonwood"));
        assert!(output.contains("● Offline, cached just now"));
    }
}
