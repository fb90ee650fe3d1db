use axum::{middleware, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use retailnet_api::{
    api_v1_routes,
    auth::{auth_middleware, AuthConfig, AuthService},
    config::{init_tracing, load_config},
    db,
    handlers::AppServices,
    jobs, mailer,
    mailer::Mailer,
    message_queue::{InMemoryMessageQueue, MessageQueue},
    scheduler, AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    init_tracing(&config.log_level, config.log_json);
    info!(environment = %config.environment, "Starting RetailNet API");

    let db = Arc::new(db::establish_connection_from_app_config(&config).await?);

    let queue: Arc<dyn MessageQueue> = Arc::new(InMemoryMessageQueue::default());

    let mailer: Arc<dyn Mailer> = match mailer::SmtpMailer::from_config(&config.mail)? {
        Some(smtp) => {
            info!("SMTP mailer configured");
            Arc::new(smtp)
        }
        None => {
            info!("SMTP not configured; outbound email is logged and dropped");
            Arc::new(mailer::NoopMailer)
        }
    };

    let services = AppServices::new(db.clone(), queue.clone(), mailer);

    jobs::start_worker(
        queue.clone(),
        services.debt.clone(),
        services.qr_cards.clone(),
    );
    if config.scheduler_enabled {
        scheduler::start(services.debt.clone());
    } else {
        info!("debt scheduler disabled by configuration");
    }

    let auth_service = Arc::new(AuthService::new(AuthConfig::new(
        config.jwt_secret.clone(),
        config.jwt_issuer.clone(),
        config.jwt_audience.clone(),
    )));

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        services,
        queue,
    });

    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest(
            "/api/v1",
            api_v1_routes().layer(middleware::from_fn_with_state(
                auth_service,
                auth_middleware,
            )),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "retailnet-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> impl IntoResponse {
    match state.db.ping().await {
        Ok(()) => Json(json!({"status": "ok"})).into_response(),
        Err(e) => {
            error!("health check database ping failed: {}", e);
            (
                axum::http::StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "degraded"})),
            )
                .into_response()
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
