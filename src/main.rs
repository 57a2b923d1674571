mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::Config;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::features::auth;
use crate::features::completion::{routes as completion_routes, CompletionService};
use crate::features::document_types::{
    routes as document_types_routes, DocumentTypeService, PgDocumentTypeRepository,
};
use crate::features::documents::{routes as documents_routes, DocumentService, PgDocumentRepository};
use crate::features::notifications::{
    routes as notifications_routes, NotificationCenter, PgNotificationRepository,
};
use crate::features::scheduler::{
    routes as scheduler_routes, ComplianceJobs, ComplianceScheduler, ScheduleSettings,
};
use crate::features::tracking::PgAuditSink;
use crate::features::users::PgUserDirectory;
use crate::modules::mail::{DisabledMailTransport, HttpMailRelay, MailTransport};
use crate::modules::storage::MinIOClient;
use axum::{middleware::from_fn_with_state, Router};
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "System info: tokio_worker_threads={}, pid={}",
        worker_threads,
        std::process::id()
    );
    tracing::info!("Configuration loaded successfully");

    // Create database connection pool
    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    tracing::info!("Running database migrations...");
    database::run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    // Initialize auth
    let jwks_client = Arc::new(auth::JwksClient::new(
        &config.auth.issuer,
        config.auth.jwks_cache_ttl,
    ));
    let jwt_validator = Arc::new(auth::JwtValidator::new(
        jwks_client,
        config.auth.issuer.clone(),
        config.auth.audience.clone(),
        config.auth.jwt_leeway,
    ));
    tracing::info!("Auth configuration initialized");

    // Document blob storage
    let minio_client = Arc::new(
        MinIOClient::new(config.minio.clone())
            .map_err(|e| anyhow::anyhow!("Failed to initialize MinIO client: {}", e))?,
    );
    minio_client
        .ensure_bucket_exists()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to ensure MinIO bucket exists: {}", e))?;
    tracing::info!(
        "MinIO client initialized for bucket: {}",
        minio_client.bucket_name()
    );

    // Outbound mail
    let mail: Arc<dyn MailTransport> = match config.mail.api_url.clone() {
        Some(api_url) => {
            tracing::info!("Mail relay configured at {}", api_url);
            Arc::new(
                HttpMailRelay::new(api_url, &config.mail)
                    .map_err(|e| anyhow::anyhow!("Failed to initialize mail relay: {}", e))?,
            )
        }
        None => {
            tracing::warn!("MAIL_API_URL not set; email notifications will be marked failed");
            Arc::new(DisabledMailTransport)
        }
    };

    // Persistence adapters
    let directory = Arc::new(PgUserDirectory::new(pool.clone()));
    let type_repository = Arc::new(PgDocumentTypeRepository::new(pool.clone()));
    let document_repository = Arc::new(PgDocumentRepository::new(pool.clone()));
    let notification_repository = Arc::new(PgNotificationRepository::new(pool.clone()));
    let audit_sink = Arc::new(PgAuditSink::new(pool.clone()));

    // Shared by the scheduler and the upload notices
    let schedule_settings = ScheduleSettings::from_config(&config.scheduler)
        .map_err(|e| anyhow::anyhow!(e))?
        .into_shared();

    // Services
    let notification_center = Arc::new(NotificationCenter::new(
        notification_repository,
        directory.clone(),
        mail,
    ));
    let document_type_service = Arc::new(DocumentTypeService::new(type_repository.clone()));
    let document_service = Arc::new(DocumentService::new(
        document_repository.clone(),
        type_repository.clone(),
        minio_client,
        audit_sink,
        directory.clone(),
        Arc::clone(&notification_center),
        Arc::clone(&schedule_settings),
    ));
    let completion_service = Arc::new(CompletionService::new(
        type_repository,
        document_repository,
    ));
    tracing::info!("Document services initialized");

    // Background jobs
    let compliance_jobs = Arc::new(ComplianceJobs::new(
        Arc::clone(&notification_center),
        Arc::clone(&completion_service),
        directory,
    ));
    let scheduler = Arc::new(ComplianceScheduler::new(
        compliance_jobs,
        &config.scheduler,
        schedule_settings,
    ));
    if config.scheduler.enabled {
        scheduler.start().await;
        tracing::info!("Compliance scheduler started");
    } else {
        tracing::info!("Compliance scheduler disabled (SCHEDULER_ENABLED=false)");
    }

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn_with_state(
                Arc::new(credentials),
                middleware::basic_auth_middleware,
            ))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // Protected routes (require JWT authentication)
    let protected_routes = Router::new()
        .merge(document_types_routes(document_type_service))
        .merge(documents_routes(document_service))
        .merge(completion_routes(completion_service))
        .merge(notifications_routes(notification_center))
        .merge(scheduler_routes(Arc::clone(&scheduler)))
        .route_layer(from_fn_with_state(
            jwt_validator.clone(),
            middleware::auth_middleware,
        ));

    // Simple health check endpoint (no auth required)
    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    let app = Router::new()
        .merge(swagger)
        .merge(protected_routes)
        .merge(health_route)
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    socket.set_recv_buffer_size(256 * 1024)?;
    socket.set_send_buffer_size(256 * 1024)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(60))
            .with_interval(std::time::Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(65535)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on {}", format!("http://{}", addr));
    tracing::info!(
        "Swagger UI available at {}",
        format!("http://{}/swagger-ui/", addr)
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let in-flight job runs finish before exiting
    scheduler.stop().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
