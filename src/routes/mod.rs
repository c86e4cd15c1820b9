use crate::handlers;
use crate::middleware::auth::auth_middleware;
use axum::{middleware, routing, Router};

pub fn create_routes() -> Router {
    Router::new().nest("/api/v1", api_routes())
}

fn api_routes() -> Router {
    let protected = protected_routes().layer(middleware::from_fn(auth_middleware));
    public_routes().merge(protected)
}

/// Unauthenticated routes: auth + public reads.
fn public_routes() -> Router {
    Router::new()
        .route("/auth/register", routing::post(handlers::register))
        .route("/auth/login", routing::post(handlers::login))
        // Emotions
        .route("/emotions", routing::get(handlers::emotion::list_emotions))
        .route("/emotions/{id}", routing::get(handlers::emotion::get_emotion))
        // Reactions
        .route(
            "/reactions/{kind}/{id}/summary",
            routing::get(handlers::reaction::reaction_summary),
        )
}

/// Authenticated routes; admin checks happen inside the handlers.
fn protected_routes() -> Router {
    Router::new()
        .route("/auth/me", routing::get(handlers::get_current_user))
        // Reactions
        .route(
            "/reactions/{kind}/{id}",
            routing::post(handlers::reaction::toggle_reaction)
                .get(handlers::reaction::my_reaction),
        )
        // Emotions (admin)
        .route(
            "/admin/emotions",
            routing::post(handlers::emotion::create_emotion),
        )
        .route(
            "/admin/emotions/trashed",
            routing::get(handlers::emotion::list_trashed_emotions),
        )
        .route(
            "/admin/emotions/{id}",
            routing::put(handlers::emotion::update_emotion)
                .delete(handlers::emotion::delete_emotion),
        )
        .route(
            "/admin/emotions/{id}/restore",
            routing::put(handlers::emotion::restore_emotion),
        )
        .route(
            "/admin/emotions/{id}/force",
            routing::delete(handlers::emotion::force_delete_emotion),
        )
}
