//! Catalog panel server binary.
//!
//! Serves the session actions and the `/api/*` relay in front of the catalog
//! backend. Settings come from the environment (see `ApiConfig::from_env`);
//! command-line flags override them.

use std::net::SocketAddr;

use clap::Parser;
use panel_api::AppState;
use panel_api::config::ApiConfig;
use tracing::info;
use url::Url;

/// CLI arguments for the panel server.
#[derive(Parser, Debug)]
#[command(name = "panel_server", about = "Catalog panel server")]
struct Args {
    /// Address to listen on, overriding `BIND_ADDR`.
    #[arg(long)]
    bind: Option<String>,

    /// Catalog backend base URL, overriding `BACKEND_URL`.
    #[arg(long)]
    backend_url: Option<Url>,

    /// Backend subscription key.
    #[arg(long, env = "SUBSCRIPTION_KEY", hide_env_values = true)]
    subscription_key: Option<String>,

    /// Trust `x-forwarded-for` / `x-real-ip`, overriding `TRUST_PROXY_HEADERS`.
    #[arg(long)]
    trust_proxy_headers: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,panel_api=debug,panel_client=debug")
            }),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env()?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(backend_url) = args.backend_url {
        config.backend_url = backend_url;
    }
    if let Some(key) = args.subscription_key.filter(|k| !k.trim().is_empty()) {
        config.subscription_key = Some(key);
    }
    if args.trust_proxy_headers {
        config.trust_proxy_headers = true;
    }

    info!(
        backend = %config.backend_url,
        locales = ?config.supported_locales,
        subscription_key = config.subscription_key.is_some(),
        trust_proxy_headers = config.trust_proxy_headers,
        "starting panel_server"
    );

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config)?;
    state.sessions.spawn_cleanup_task();
    let app = panel_api::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %listener.local_addr()?, "panel listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown requested");
    })
    .await?;

    Ok(())
}
