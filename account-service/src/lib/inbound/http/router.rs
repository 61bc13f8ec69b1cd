use std::sync::Arc;
use std::time::Duration;

use auth::AuthGate;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::admin::change_password;
use super::handlers::admin::delete_account;
use super::handlers::admin::get_account;
use super::handlers::admin::list_admins;
use super::handlers::admin::set_password;
use super::handlers::health::health;
use super::handlers::login::login;
use super::handlers::login_stamps::list_logins;
use super::handlers::profile::get_me;
use super::handlers::profile::update_me;
use super::handlers::register::register;
use super::middleware::authenticate;
use super::middleware::require_admin;
use crate::account::ports::AccountServicePort;

#[derive(Clone)]
pub struct AppState {
    pub account_service: Arc<dyn AccountServicePort>,
    pub gate: Arc<AuthGate>,
}

pub fn create_router(account_service: Arc<dyn AccountServicePort>, gate: Arc<AuthGate>) -> Router {
    let state = AppState {
        account_service,
        gate,
    };

    let public_routes = Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login));

    let authenticated_routes = Router::new()
        .route("/api/auth/me", get(get_me).patch(update_me))
        .route("/api/me", get(get_me).patch(update_me))
        .route("/api/auth/logins", get(list_logins))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    // Layers run bottom-up: authenticate, then require_admin.
    let admin_routes = Router::new()
        .route("/api/admin/users/:id", get(get_account).delete(delete_account))
        .route("/api/admin/admins", get(list_admins))
        .route("/api/admin/users/:id/password", patch(set_password))
        .route("/api/admin/password", patch(change_password))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .merge(admin_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
