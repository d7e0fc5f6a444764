use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deadline_tracker::api::router;
use deadline_tracker::auth::JwtKeys;
use deadline_tracker::clock::{Clock, SystemClock};
use deadline_tracker::config::AppConfig;
use deadline_tracker::db;
use deadline_tracker::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "deadline_tracker=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let args: Vec<String> = std::env::args().collect();

    // deadline-tracker issue-token <user_id> <email>
    if args.get(1).map(|s| s.as_str()) == Some("issue-token") {
        return issue_token(&config, &args[2..]);
    }

    serve(config).await
}

fn issue_token(config: &AppConfig, args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let (user_id, email) = match args {
        [user_id, email] => (user_id, email),
        _ => return Err("usage: deadline-tracker issue-token <user_id> <email>".into()),
    };

    let keys = JwtKeys::new(&config.jwt_secret, config.jwt_ttl);
    let token = keys.issue(user_id, email, SystemClock.now())?;
    println!("{}", token);
    Ok(())
}

async fn serve(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let pool = db::connect(&config.database_url).await?;
    db::migrate(&pool).await?;

    let state = AppState {
        db: pool,
        jwt: Arc::new(JwtKeys::new(&config.jwt_secret, config.jwt_ttl)),
        clock: Arc::new(SystemClock),
    };

    let app = router(state, &config.cors_origins);

    info!("listening on http://{}", config.bind_addr);
    info!("allowed origins: {:?}", config.cors_origins);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("SIGINT received, shutting down"),
        _ = terminate => info!("SIGTERM received, shutting down"),
    }
}
