use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studydesk::api::router;
use studydesk::config::{AppConfig, DataSource};
use studydesk::records::RecordHttpClient;
use studydesk::services::Services;
use studydesk::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "studydesk=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::new_from_env()?;

    let services = match &config.data_source {
        DataSource::Mock => {
            info!("serving the bundled seed dataset");
            Services::mock()?
        }
        DataSource::Remote(record_config) => {
            info!("proxying to record store at {}", record_config.base_url);
            let client = RecordHttpClient::new(record_config.clone())?;
            Services::remote(Arc::new(client))
        }
    };

    let addr = config.bind_addr;
    let app = router(AppState::new(services, config));

    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
