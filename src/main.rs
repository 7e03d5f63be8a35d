use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use hestia::agents::coordinator::Coordinator;
use hestia::agents::general::GeneralStage;
use hestia::agents::geo::MapboxGeocoder;
use hestia::agents::research::ResearchStage;
use hestia::agents::scoping::ScopingStage;
use hestia::agents::scrape::McpScraper;
use hestia::agents::{llm, search};
use hestia::cli::Cli;
use hestia::config::Settings;
use hestia::relay::health::HealthHandler;
use hestia::relay::RelayState;
use hestia::session::SessionStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hestia=info,tower_http=info".into()),
        )
        .init();

    // Load configuration
    let cli = Cli::parse();
    let settings = Settings::new_with_cli(&cli)?;
    let host = settings.server.host.clone();
    let port = settings.server.port;

    info!("Starting Hestia on {}:{}", host, port);

    // Required collaborators; a missing API key is fatal here
    let llm = llm::create_provider(&settings.llm)?;
    let search = search::create_provider(&settings.search)?;
    info!("LLM provider ready (model: {})", llm.model());

    // Optional enrichment collaborators
    let geocoder = MapboxGeocoder::from_settings(&settings.geo);
    if geocoder.is_none() {
        info!("No geocoding token configured, map enrichment disabled");
    }
    let scraper = McpScraper::from_settings(&settings.scrape);
    if scraper.is_none() {
        info!("No scraper token configured, listing images disabled");
    }

    // Wire the pipeline
    let sessions = Arc::new(SessionStore::new(settings.session.max_turns));
    let coordinator = Arc::new(Coordinator::new(
        sessions,
        ScopingStage::new(llm.clone()),
        GeneralStage::new(llm.clone(), search.clone(), settings.research.max_results),
        ResearchStage::new(
            llm,
            search,
            geocoder.clone(),
            scraper,
            settings.research.clone(),
        ),
    ));

    let state = RelayState {
        coordinator,
        geocoder,
    };
    let app = hestia::create_app(state, Arc::new(HealthHandler::new()));

    // Start server
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
