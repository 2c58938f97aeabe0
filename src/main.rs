use std::sync::Arc;

use rides::config::AppConfig;
use rides::error::AppError;
use rides::routes::create_router;
use rides::services::supabase::SupabaseClient;
use rides::state::AppState;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = AppConfig::from_env()?;
    let supabase = SupabaseClient::new(&config)?;
    info!(
        backend = %config.supabase_url,
        redirect = %config.auth_redirect_path,
        "supabase client ready"
    );

    let state = AppState::new(
        config.clone(),
        Arc::new(supabase.clone()),
        Arc::new(supabase),
    );

    let app = create_router(state);

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,rides=debug,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
