use lawdesk::db::Storage;
use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = &lawdesk::config::CONFIG;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        listen_addr = %cfg.basic.listen_addr,
        database_url = %cfg.basic.database_url,
        loglevel = %cfg.basic.loglevel,
        allow_registration = cfg.basic.allow_registration,
        assistant_mode = ?cfg.assistant.mode,
        assistant_model = cfg.assistant.active_model(),
        proxy = %cfg.assistant.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
    );

    let storage = Storage::connect(&cfg.basic.database_url).await?;
    if cfg.basic.seed_demo_users {
        warn!("seeding demo accounts; disable basic.seed_demo_users in production");
        storage.seed_demo_users().await?;
    }

    let state = lawdesk::LawdeskState::new(storage, cfg)?;
    state.assistant.restore_settings().await?;
    let app = lawdesk::lawdesk_router(state);

    let listener = TcpListener::bind(&cfg.basic.listen_addr).await?;
    info!("HTTP server listening on {}", cfg.basic.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for shutdown signal");
            }
            info!("shutting down");
        })
        .await?;
    Ok(())
}
