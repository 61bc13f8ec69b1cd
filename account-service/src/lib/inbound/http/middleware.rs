use std::net::SocketAddr;

use auth::require_role;
use auth::Identity;
use auth::Role;
use axum::extract::ConnectInfo;
use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use super::handlers::ApiError;
use crate::account::models::AccountId;
use crate::account::models::ClientInfo;
use crate::inbound::http::router::AppState;

/// Extension type holding the verified caller of a protected route.
#[derive(Debug, Clone)]
pub struct CurrentAccount {
    pub id: AccountId,
    pub identity: Identity,
}

/// Middleware that verifies the bearer token and stores the caller in request extensions.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            tracing::debug!("Missing or unreadable Authorization header");
            ApiError::Unauthorized("Unauthorized".to_string())
        })?;

    let identity = state.gate.authenticate(header_value).map_err(|e| {
        tracing::warn!(error = %e, "Token rejected");
        ApiError::from(e)
    })?;

    let id = AccountId::from_subject(&identity.id).map_err(|e| {
        tracing::warn!(error = %e, "Token subject is not an account ID");
        ApiError::Unauthorized("Unauthorized".to_string())
    })?;

    req.extensions_mut().insert(CurrentAccount { id, identity });

    Ok(next.run(req).await)
}

/// Middleware that admits only callers whose token carries the `admin` role.
///
/// Must run after [`authenticate`].
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    let current = req
        .extensions()
        .get::<CurrentAccount>()
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?;

    require_role(&current.identity, Role::Admin).map_err(|e| {
        tracing::warn!(account_id = %current.id, "Admin route refused");
        ApiError::from(e)
    })?;

    Ok(next.run(req).await)
}

/// Collect the client address and user agent recorded with a login stamp.
///
/// The first `X-Forwarded-For` entry wins over the socket address.
pub fn client_info(headers: &HeaderMap, peer: Option<ConnectInfo<SocketAddr>>) -> ClientInfo {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    let ip_addr = forwarded.or_else(|| peer.map(|ConnectInfo(addr)| addr.ip().to_string()));

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    ClientInfo {
        ip_addr,
        user_agent,
    }
}
