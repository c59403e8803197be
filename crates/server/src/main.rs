//! yatube-rs server entry point.

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yatube_common::{Config, LocalStorage, Paginator, SharedClock, StorageBackend, SystemClock};
use yatube_core::{CommentService, FollowService, GroupService, PostService, UserService};
use yatube_db::repositories::{
    CommentRepository, FollowRepository, GroupRepository, PostRepository, UserRepository,
};
use yatube_web::{AppState, PageCache};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yatube=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting yatube-rs server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = yatube_db::init(&config.database).await?;

    // Run migrations
    info!("Running database migrations...");
    yatube_db::migrate(&db).await?;
    info!("Migrations completed");

    let clock: SharedClock = Arc::new(SystemClock);
    let paginator = Paginator::new(config.pagination.page_size);
    let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::new(
        config.media.path.clone(),
        config.media.url.clone(),
    ));

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let group_repo = GroupRepository::new(Arc::clone(&db));
    let post_repo = PostRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let follow_repo = FollowRepository::new(Arc::clone(&db));

    // Initialize services
    let state = AppState {
        user_service: UserService::new(user_repo.clone(), clock.clone(), paginator),
        group_service: GroupService::new(group_repo.clone(), paginator),
        post_service: PostService::new(
            post_repo.clone(),
            user_repo.clone(),
            group_repo,
            storage,
            clock.clone(),
            paginator,
        ),
        comment_service: CommentService::new(
            comment_repo,
            post_repo,
            user_repo.clone(),
            clock.clone(),
            paginator,
        ),
        follow_service: FollowService::new(follow_repo, user_repo, clock.clone(), paginator),
        page_cache: PageCache::new(Duration::from_secs(config.cache.index_ttl_secs), clock),
    };

    // Expired pages are never read again; drop them periodically
    let page_cache = state.page_cache.clone();
    let purge_every = Duration::from_secs(config.cache.index_ttl_secs.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(purge_every);
        loop {
            interval.tick().await;
            let purged = page_cache.purge_expired().await;
            if purged > 0 {
                tracing::debug!(purged, "Purged expired pages");
            }
        }
    });

    // Build router
    let app = yatube_web::app(state)
        .nest_service(&config.media.url, ServeDir::new(&config.media.path))
        .layer(TraceLayer::new_for_http());

    // Start server with graceful shutdown
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
