use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use super::required;
use super::AccountData;
use super::ApiError;
use super::ApiSuccess;
use crate::account::errors::EmailError;
use crate::account::errors::UsernameError;
use crate::account::models::EmailAddress;
use crate::account::models::RegisterCommand;
use crate::account::models::Username;
use crate::inbound::http::middleware::client_info;
use crate::inbound::http::router::AppState;

pub async fn register(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(body): Json<RegisterRequest>,
) -> Result<ApiSuccess<AuthenticatedResponseData>, ApiError> {
    let command = body.try_into_command()?;

    state
        .account_service
        .register(command, client_info(&headers, peer))
        .await
        .map_err(ApiError::from)
        .map(|ref authenticated| {
            ApiSuccess::new(
                StatusCode::CREATED,
                AuthenticatedResponseData {
                    token: authenticated.token.clone(),
                    user: (&authenticated.account).into(),
                },
            )
        })
}

/// HTTP request body for registering an account (raw JSON)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterRequest {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Clone, Error)]
enum ParseRegisterRequestError {
    #[error("All fields are required")]
    MissingField,

    #[error("Invalid username: {0}")]
    Username(#[from] UsernameError),

    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),
}

impl RegisterRequest {
    fn try_into_command(self) -> Result<RegisterCommand, ParseRegisterRequestError> {
        let (Some(username), Some(email), Some(password)) = (
            required(self.username),
            required(self.email),
            required(self.password),
        ) else {
            return Err(ParseRegisterRequestError::MissingField);
        };

        let username = Username::new(username)?;
        let email = EmailAddress::new(email)?;
        Ok(RegisterCommand::new(username, email, password))
    }
}

impl From<ParseRegisterRequestError> for ApiError {
    fn from(err: ParseRegisterRequestError) -> Self {
        match err {
            ParseRegisterRequestError::MissingField => ApiError::BadRequest(err.to_string()),
            _ => ApiError::UnprocessableEntity(err.to_string()),
        }
    }
}

/// Response body for register and login: the account plus its new token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedResponseData {
    pub token: String,
    pub user: AccountData,
}
