// WikiStack Server

use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use wikistack::{app_state::AppState, config::Config, wiki_interface::create_wiki_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log.filter))
        .init();

    // Initialize application state
    let app_state = AppState::new(config.clone()).await?;

    let app = create_wiki_router(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr = config.server_address();
    tracing::info!("WikiStack starting on http://{}", addr);
    tracing::info!("  GET  /                         - All pages");
    tracing::info!("  GET  /wiki/add                 - Add a page");
    tracing::info!("  POST /wiki/                    - Create a page");
    tracing::info!("  GET  /wiki/search?search=tag   - Pages with a tag");
    tracing::info!("  GET  /wiki/{{url_title}}         - Read a page");
    tracing::info!("  GET  /wiki/{{url_title}}/similar - Pages sharing a tag");
    tracing::info!("  GET  /users                    - Authors");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
