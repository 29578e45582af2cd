//! HTTP interface - axum router, shared state and server lifecycle.
//!
//! Handlers are thin: they extract the [`Principal`](crate::core::access::Principal)
//! and request data, call into [`crate::core`], and wrap the result in the
//! `{success, message, ...}` envelope from [`response`].

/// Admin dashboard, export, verification, menu and expense endpoints
pub mod admin;
/// Login, logout and registration
pub mod auth;
/// Kitchen queue and preparation workflow
pub mod kitchen;
/// Checkout and gateway webhook
pub mod payment;
/// Response envelope and error mapping
pub mod response;
/// Bearer-token session store and extractors
pub mod session;
/// Student dashboard, ordering, tracking and invoices
pub mod student;

use crate::{config::Settings, core::auth::MAX_PHOTO_BYTES, errors::Result};
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
};
use response::{ApiResponse, done};
use sea_orm::DatabaseConnection;
use session::SessionStore;
use std::{sync::Arc, time::Duration};
use tokio::{
    net::TcpListener,
    signal::{
        ctrl_c,
        unix::{SignalKind, signal},
    },
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{error, info};

/// Room for the text fields that travel with an ID photo.
const REGISTER_BODY_LIMIT: usize = MAX_PHOTO_BYTES + 64 * 1024;

/// How often expired sessions are swept.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub sessions: SessionStore,
    pub settings: Arc<Settings>,
}

impl AppState {
    #[must_use]
    pub fn new(db: DatabaseConnection, settings: Settings) -> Self {
        Self {
            db: Arc::new(db),
            sessions: SessionStore::new(chrono::Duration::hours(settings.session_ttl_hours)),
            settings: Arc::new(settings),
        }
    }
}

async fn health() -> Json<ApiResponse<()>> {
    done("ok")
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public = Router::new()
        .route("/health", get(health))
        .route("/login", post(auth::login))
        .route(
            "/register",
            post(auth::register).layer(DefaultBodyLimit::max(REGISTER_BODY_LIMIT)),
        )
        .route("/webhook/gateway", post(payment::gateway_webhook))
        .nest_service("/uploads", ServeDir::new(&state.settings.uploads_root));

    let admin = Router::new()
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/export", get(admin::export))
        .route("/admin/verify-users", get(admin::pending_users))
        .route("/admin/verify-user/:id", post(admin::verify_user))
        .route("/admin/reject-user/:id", post(admin::reject_user))
        .route("/admin/menu", get(admin::list_menu).post(admin::add_menu_item))
        .route(
            "/admin/menu/:id",
            put(admin::edit_menu_item).delete(admin::delete_menu_item),
        )
        .route("/admin/menu/:id/availability", post(admin::set_availability))
        .route(
            "/admin/expenses",
            get(admin::list_expenses).post(admin::add_expense),
        )
        .route(
            "/admin/expenses/:id",
            delete(admin::delete_expense),
        )
        .route(
            "/admin/update-order-status/:id",
            post(admin::update_order_status),
        );

    let student = Router::new()
        .route("/student/dashboard", get(student::dashboard))
        .route("/place-order", post(student::place_order))
        .route("/api/order-status/:id", get(student::order_status))
        .route("/invoice/:id", get(student::download_invoice))
        .route("/payment/verify", post(payment::verify_gateway_payment))
        .route("/payment/:id", get(payment::payment_page))
        .route("/process-payment/:id", post(payment::process_payment))
        .route("/assume-paid/:id", post(payment::assume_paid));

    let kitchen = Router::new()
        .route("/kitchen/dashboard", get(kitchen::dashboard))
        .route("/kitchen/check-new-orders", get(kitchen::check_new_orders))
        .route(
            "/kitchen/start-preparation/:id",
            post(kitchen::start_preparation),
        )
        .route("/kitchen/complete-order/:id", post(kitchen::complete_order))
        .route("/kitchen/set-time/:id", post(kitchen::set_time));

    let logout = Router::new().route("/logout", post(auth::logout));

    public
        .merge(admin)
        .merge(student)
        .merge(kitchen)
        .merge(logout)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Serves the application until Ctrl+C or SIGTERM.
pub async fn serve(state: AppState) -> Result<()> {
    let address = state.settings.bind_addr.clone();

    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            sessions.purge_expired().await;
        }
    });

    let app = router(state);
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        () = interrupt => {},
        () = terminate => {},
    }
}
