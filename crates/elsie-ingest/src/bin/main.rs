use clap::Parser;
use elsie_ingest::{IncrementalMode, Ingestor, Scope};
use elsie_store::Store;
use elsie_wiki::WikiClient;
use tracing::{error, info};

/// Crawls the wiki, classifies and persists pages into the Postgres store.
#[derive(Debug, Parser)]
#[command(name = "elsie-ingest")]
struct Args {
    /// Ingest a single page by title instead of the curated/comprehensive set.
    title: Option<String>,

    /// Crawl every page the wiki reports, instead of the curated roster.
    #[arg(long)]
    comprehensive: bool,

    /// Re-upsert every page regardless of `touched`/content-hash match.
    #[arg(long)]
    force: bool,

    /// Cap the number of titles processed.
    #[arg(long)]
    limit: Option<usize>,

    /// Print the current store's page counts instead of crawling.
    #[arg(long)]
    stats: bool,

    /// Incremental comparison strategy.
    #[arg(long, value_enum, default_value = "update")]
    mode: IncrementalMode,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "elsie_ingest=info".into()),
        )
        .init();

    let args = Args::parse();

    let config_path = std::env::var("ELSIE_CONFIG").ok();
    let config = elsie_core::ElsieConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "config load failed, using defaults");
        elsie_core::ElsieConfig::default()
    });

    let store = match Ingestor::connect_store(&config.database.connection_string()).await {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "could not reach the store");
            std::process::exit(1);
        }
    };

    if args.stats {
        print_stats(&store).await;
        return Ok(());
    }

    let wiki = WikiClient::new(config.wiki.api_url.clone());
    let ingestor = Ingestor::new(wiki, store, config.ingest.max_chunk_chars, config.ingest.delay_ms);

    let scope = match &args.title {
        Some(title) => Scope::Single(title.clone()),
        None if args.comprehensive => Scope::Comprehensive,
        None => Scope::Curated,
    };

    let titles = match ingestor.resolve_titles(&scope, args.limit).await {
        Ok(titles) => titles,
        Err(e) => {
            error!(error = %e, "failed to resolve titles to ingest");
            std::process::exit(1);
        }
    };

    info!(count = titles.len(), mode = ?args.mode, force = args.force, "starting ingest run");
    let report = ingestor.run(&titles, args.mode, args.force).await;
    info!(%report, "ingest run finished");
    println!("{report}");

    if report.failed > 0 && report.failed == report.checked {
        std::process::exit(1);
    }
    Ok(())
}

async fn print_stats(store: &Store) {
    match store.get_recent_logs(None, 1).await {
        Ok(_) => println!("store reachable"),
        Err(e) => {
            error!(error = %e, "failed to query store for stats");
            std::process::exit(1);
        }
    }
}
