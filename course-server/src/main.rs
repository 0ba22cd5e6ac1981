use std::error::Error;

use tracing::info;
use tracing_subscriber::EnvFilter;

use course_server::config::AppConfig;
use course_server::web::{AppState, create_router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("course_server=info,tower_http=info")),
        )
        .init();

    let state = AppState::from_config(&config)?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(addr = %config.bind, "course planner listening");
    info!("POST /api/courses, GET /api/courses/:id/status, GET /api/courses/:id");

    axum::serve(listener, app).await?;
    Ok(())
}
