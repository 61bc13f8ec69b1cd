use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::required;
use super::AccountData;
use super::AccountResponseData;
use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use crate::account::errors::AccountError;
use crate::account::models::AccountId;
use crate::account::models::ChangePasswordCommand;
use crate::account::models::NewPassword;
use crate::inbound::http::middleware::CurrentAccount;
use crate::inbound::http::router::AppState;

pub async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiSuccess<AccountResponseData>, ApiError> {
    let id = AccountId::from_string(&id).map_err(AccountError::from)?;

    state
        .account_service
        .get_account(&id)
        .await
        .map_err(ApiError::from)
        .map(|ref account| ApiSuccess::new(StatusCode::OK, account.into()))
}

pub async fn list_admins(
    State(state): State<AppState>,
) -> Result<ApiSuccess<AdminsResponseData>, ApiError> {
    let admins = state.account_service.list_admins().await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        AdminsResponseData {
            admins: admins.iter().map(AccountData::from).collect(),
        },
    ))
}

pub async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    let id = AccountId::from_string(&id).map_err(AccountError::from)?;

    state.account_service.delete_account(&id).await?;

    Ok(ApiSuccess::new(StatusCode::OK, MessageData::new("User deleted")))
}

pub async fn set_password(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SetPasswordRequest>,
) -> Result<ApiSuccess<AccountResponseData>, ApiError> {
    let id = AccountId::from_string(&id).map_err(AccountError::from)?;
    let password = NewPassword::new(body.password.unwrap_or_default()).map_err(AccountError::from)?;

    state
        .account_service
        .set_password(&id, password)
        .await
        .map_err(ApiError::from)
        .map(|ref account| ApiSuccess::new(StatusCode::OK, account.into()))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    let (Some(current_password), Some(new_password)) =
        (required(body.current_password), required(body.new_password))
    else {
        return Err(ApiError::BadRequest(
            "Current and new passwords are required".to_string(),
        ));
    };
    let new_password = NewPassword::new(new_password).map_err(AccountError::from)?;

    state
        .account_service
        .change_password(
            &current.id,
            ChangePasswordCommand {
                current_password,
                new_password,
            },
        )
        .await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageData::new("Password updated"),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminsResponseData {
    pub admins: Vec<AccountData>,
}

/// Body for an administrator setting another account's password.
#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    pub password: Option<String>,
}

/// Body for changing the caller's own password.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}
