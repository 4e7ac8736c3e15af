use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use street_scout::api::{NseUniverse, YahooProvider};
use street_scout::clock::SystemClock;
use street_scout::config::{AppConfig, DEFAULT_CONFIG_FILE};
use street_scout::persistence::SnapshotCache;
use street_scout::scanner::Scanner;
use street_scout::scheduler::{IntervalTicker, ScanCoordinator, Scheduler};
use street_scout::server::{self, AppState};
use street_scout::state::SharedState;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "street-scout")]
#[command(about = "NSE small/mid cap screener with a live JSON API")]
struct Args {
    /// Config file (TOML); missing file means defaults
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: String,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Skip the saved cache and run a full scan at startup
    #[arg(long)]
    ignore_cache: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = AppConfig::load(&args.config)
        .with_context(|| format!("failed to load config from {}", args.config))?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    setup_logging(&config.log.filter);

    tracing::info!("🚀 Street Scout starting");
    tracing::info!(
        "   Market cap window: ₹{}-{} Cr | refresh every {}s | cache {}",
        config.scan.mcap_min_cr,
        config.scan.mcap_max_cr,
        config.refresh.interval_secs,
        config.cache.path.display()
    );

    let provider = Arc::new(YahooProvider::new(&config.provider)?);
    let universe = Arc::new(NseUniverse::new(&config.provider)?);
    let scanner = Scanner::new(provider, universe, config.scan.clone());

    let clock = Arc::new(SystemClock);
    let state = SharedState::new();

    let coordinator = Arc::new(ScanCoordinator::new(
        scanner,
        SnapshotCache::from_config(&config.cache),
        state,
        clock,
        config.refresh.price_delay(),
    ));

    let scheduler_task = {
        let coordinator = coordinator.clone();
        let ticker = IntervalTicker::new(config.refresh.interval());
        let ignore_cache = args.ignore_cache;
        tokio::spawn(async move {
            Scheduler::new(coordinator)
                .ignore_cache(ignore_cache)
                .run(ticker)
                .await;
        })
    };

    let addr = config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("❌ Cannot bind {}: {}", addr, e);
            return Err(e).with_context(|| format!("failed to bind {}", addr));
        }
    };
    let app = server::router(AppState::new(coordinator), config.server.index_file.clone());

    tokio::select! {
        result = server::serve(listener, app) => {
            if let Err(e) = result {
                tracing::error!("❌ HTTP server failed: {}", e);
                return Err(e.into());
            }
        }
        result = scheduler_task => {
            tracing::error!("Scheduler exited: {:?}", result);
        }
    }

    tracing::info!("👋 Street Scout stopped");
    Ok(())
}

fn setup_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
