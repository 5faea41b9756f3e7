
use quill::config::AppConfig;
use quill::util::env::load_dotenv;
use quill::{create_app, AppState};
use tokio::net::TcpListener;
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or(format!("{}=debug", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    debug!("Config:\n {:#?}", config);
    info!("Starting {} v{}", config.app_name, config.app_version);

    let app_state = AppState::new(config).await?;

    let config = app_state.config.clone();
    if config.db.auto_migrate {
        debug!("Migrating database...");
        app_state.db.migrate().await?;
    }

    let addr = config.http.addr();
    let app = create_app(app_state)?;
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
