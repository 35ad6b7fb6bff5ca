use {
    audit_trail::{
        adapters::records::RecordService,
        config::{AuditSettings, ServerSettings},
        domain::store::AuditStore,
        infra::{memory::InMemoryAuditStore, postgres::audit_repo::PgAuditStore},
        services::capture::HookFactory,
    },
    axum::{
        Router,
        extract::DefaultBodyLimit,
        http::StatusCode,
        routing::get,
    },
    sqlx::postgres::PgPoolOptions,
    std::{env, net::SocketAddr, sync::Arc, time::Duration},
    tokio::signal,
    tower_http::timeout::TimeoutLayer,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();
    let settings = AuditSettings::from_env().expect("invalid audit settings");
    let server = ServerSettings::from_env().expect("invalid server settings");

    let store: Arc<dyn AuditStore> = match env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(20)
                .acquire_timeout(Duration::from_secs(3))
                .connect(&database_url)
                .await
                .expect("failed to connect to database");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .expect("failed to run migrations");
            Arc::new(PgAuditStore::new(pool))
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set, audit records are kept in memory");
            Arc::new(InMemoryAuditStore::new())
        }
    };

    let hooks = HookFactory::new(store, settings);

    let app = Router::new()
        .route("/", get(|| async { "ok" }))
        .merge(audit_trail::app(RecordService::new(), &hooks))
        .layer(DefaultBodyLimit::max(server.max_body_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ));

    let listener = tokio::net::TcpListener::bind(&server.bind_addr).await.unwrap();
    tracing::info!("listening on {}", server.bind_addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .unwrap();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl+c, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
