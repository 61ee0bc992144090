//! Opencourse server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware};
use opencourse_api::{middleware::AppState, router as api_router};
use opencourse_common::Config;
use opencourse_core::{
    CertificateService, ChapterService, CourseService, EnrollmentService, LessonService,
    ProgressService, PurchaseService, ReviewService, StatsService, UserService,
};
use opencourse_db::repositories::{
    CertificateRepository, ChapterRepository, CourseRepository, EnrollmentRepository,
    LessonProgressRepository, LessonRepository, ReviewRepository, UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
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
                .unwrap_or_else(|_| "opencourse=debug,tower_http=debug,sea_orm=info".into()),
        )
        .init();

    info!("Starting opencourse server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = opencourse_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    opencourse_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let course_repo = CourseRepository::new(Arc::clone(&db));
    let chapter_repo = ChapterRepository::new(Arc::clone(&db));
    let lesson_repo = LessonRepository::new(Arc::clone(&db));
    let enrollment_repo = EnrollmentRepository::new(Arc::clone(&db));
    let progress_repo = LessonProgressRepository::new(Arc::clone(&db));
    let certificate_repo = CertificateRepository::new(Arc::clone(&db));
    let review_repo = ReviewRepository::new(Arc::clone(&db));

    // Initialize services
    let user_service = UserService::new(user_repo.clone());
    let course_service = CourseService::new(
        course_repo.clone(),
        chapter_repo.clone(),
        lesson_repo.clone(),
        enrollment_repo.clone(),
        review_repo.clone(),
        user_repo.clone(),
    );
    let chapter_service = ChapterService::new(chapter_repo.clone(), course_repo.clone());
    let lesson_service = LessonService::new(
        lesson_repo.clone(),
        chapter_repo.clone(),
        course_repo.clone(),
        enrollment_repo.clone(),
    );
    let certificate_service = CertificateService::new(
        certificate_repo.clone(),
        course_repo.clone(),
        lesson_repo.clone(),
        progress_repo.clone(),
    );
    let progress_service = ProgressService::new(
        progress_repo.clone(),
        lesson_repo.clone(),
        chapter_repo.clone(),
        course_repo.clone(),
        enrollment_repo.clone(),
        certificate_service.clone(),
    );
    let enrollment_service = EnrollmentService::new(
        enrollment_repo.clone(),
        course_repo.clone(),
        progress_service.clone(),
    );
    let review_service = ReviewService::new(
        review_repo.clone(),
        course_repo.clone(),
        enrollment_repo.clone(),
        user_repo.clone(),
    );
    let purchase_service =
        PurchaseService::new(course_repo.clone(), enrollment_repo.clone(), &config);
    let stats_service = StatsService::new(
        user_repo,
        course_repo,
        enrollment_repo,
        certificate_repo,
        review_repo,
        lesson_repo,
        progress_repo,
        certificate_service.clone(),
    );

    // Create application state
    let state = AppState {
        user_service,
        course_service,
        chapter_service,
        lesson_service,
        enrollment_service,
        progress_service,
        certificate_service,
        review_service,
        purchase_service,
        stats_service,
    };

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            opencourse_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
