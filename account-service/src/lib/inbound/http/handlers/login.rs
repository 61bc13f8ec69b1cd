use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::register::AuthenticatedResponseData;
use super::required;
use super::ApiError;
use super::ApiSuccess;
use crate::account::models::LoginCommand;
use crate::inbound::http::middleware::client_info;
use crate::inbound::http::router::AppState;

pub async fn login(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<ApiSuccess<AuthenticatedResponseData>, ApiError> {
    let (Some(identifier), Some(password)) = (required(body.emailusername), required(body.password))
    else {
        return Err(ApiError::BadRequest(
            "Email/Username and password required".to_string(),
        ));
    };

    let authenticated = state
        .account_service
        .login(
            LoginCommand {
                identifier,
                password,
            },
            client_info(&headers, peer),
        )
        .await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        AuthenticatedResponseData {
            user: (&authenticated.account).into(),
            token: authenticated.token,
        },
    ))
}

/// Login body; `emailusername` holds either the email address or the username.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    emailusername: Option<String>,
    password: Option<String>,
}
