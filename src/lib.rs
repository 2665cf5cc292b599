//! The Hook community server library
//!
//! Exposes the router, state and domain modules so the binary and the
//! integration tests share one wiring.

pub mod auth;
pub mod clock;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod models;
pub mod repo;
pub mod routes;
pub mod security;
pub mod storage;
pub mod validation;

pub use config::Config;
pub use db::{open_database, Db};
pub use error::{AppError, Result};
pub use storage::ImageStore;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use constants::MAX_REQUEST_BODY_BYTES;
use models::PostLimits;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: Config,
    pub images: ImageStore,
}

impl AppState {
    /// Create a new AppState; uploads go under `config.storage_dir`
    pub fn new(db: Db, config: Config) -> Self {
        let images = ImageStore::new(&config.storage_dir, &config.public_base_url);
        Self { db, config, images }
    }

    /// Run a datastore operation on the blocking pool
    pub async fn with_db<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&redb::Database) -> Result<T> + Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db)).await?
    }

    pub fn post_limits(&self) -> PostLimits {
        PostLimits {
            per_hour: self.config.posts_per_hour,
            per_day: self.config.posts_per_day,
        }
    }
}

/// Every route the server answers, without CORS or tracing layers
pub fn build_router(state: AppState) -> Router {
    use routes::*;

    let storage = ServeDir::new(state.images.root());

    Router::new()
        .route("/health", get(health::health_check))
        // Auth
        .route("/api/auth/signup", post(account::sign_up))
        .route("/api/auth/signin", post(account::sign_in))
        .route("/api/auth/signout", post(account::sign_out))
        .route("/api/auth/me", get(account::me))
        // Profiles
        .route("/api/profiles/search", get(profiles::search_profiles))
        .route("/api/profiles/:id", get(profiles::get_profile))
        // Badges
        .route("/api/activity", get(activity::fetch_activity))
        .route("/api/activity/:tab/seen", post(activity::mark_seen))
        .route("/api/badges", get(activity::fetch_badges))
        // Forum
        .route(
            "/api/forum/posts",
            get(forum::list_posts).post(forum::create_post),
        )
        .route(
            "/api/forum/posts/:id",
            get(forum::get_post).delete(forum::delete_post),
        )
        .route("/api/forum/posts/:id/useful", post(forum::toggle_useful))
        // Package Watch
        .route(
            "/api/packages",
            get(packages::list_packages).post(packages::create_package_report),
        )
        .route("/api/packages/:id/resolve", post(packages::resolve_package))
        // Events
        .route(
            "/api/events",
            get(events::list_events).post(events::create_event),
        )
        .route("/api/events/:id", axum::routing::delete(events::delete_event))
        // Polls
        .route("/api/polls", get(polls::list_polls).post(polls::create_poll))
        .route(
            "/api/polls/:id",
            get(polls::get_poll).delete(polls::delete_poll),
        )
        .route(
            "/api/polls/:id/vote",
            post(polls::cast_vote).delete(polls::retract_vote),
        )
        // Marketplace
        .route(
            "/api/marketplace",
            get(marketplace::list_items).post(marketplace::create_item),
        )
        .route("/api/marketplace/:id", get(marketplace::get_item))
        .route("/api/marketplace/:id/like", post(marketplace::toggle_like))
        .route("/api/marketplace/:id/view", post(marketplace::record_view))
        .route("/api/marketplace/:id/status", post(marketplace::update_status))
        // Dev support
        .route(
            "/api/dev-support",
            get(dev_support::list_tickets).post(dev_support::create_ticket),
        )
        .route(
            "/api/dev-support/:id",
            axum::routing::delete(dev_support::delete_ticket),
        )
        .route("/api/dev-support/:id/vote", post(dev_support::toggle_vote))
        .route("/api/dev-support/:id/status", post(dev_support::update_status))
        // Comments, shared by every board
        .route(
            "/api/comments/:board/:target",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/api/comments/:board/:target/:comment",
            axum::routing::delete(comments::delete_comment),
        )
        .route(
            "/api/comments/:board/:target/:comment/useful",
            post(comments::toggle_useful),
        )
        // Admin
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/:id/role", post(admin::update_role))
        .route(
            "/api/admin/users/:id/verification",
            post(admin::update_verification),
        )
        .route("/api/admin/stats", get(admin::admin_stats))
        .nest_service("/storage", storage)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .with_state(state)
}
