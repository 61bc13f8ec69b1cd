use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::AccountResponseData;
use super::ApiError;
use super::ApiSuccess;
use crate::account::errors::AccountError;
use crate::account::models::EmailAddress;
use crate::account::models::UpdateProfileCommand;
use crate::account::models::Username;
use crate::inbound::http::middleware::CurrentAccount;
use crate::inbound::http::router::AppState;

pub async fn get_me(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
) -> Result<ApiSuccess<AccountResponseData>, ApiError> {
    state
        .account_service
        .get_account(&current.id)
        .await
        .map_err(ApiError::from)
        .map(|ref account| ApiSuccess::new(StatusCode::OK, account.into()))
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<ApiSuccess<AccountResponseData>, ApiError> {
    let command = req.try_into_command()?;

    state
        .account_service
        .update_profile(&current.id, command)
        .await
        .map_err(ApiError::from)
        .map(|ref account| ApiSuccess::new(StatusCode::OK, account.into()))
}

/// HTTP request body for updating the caller's profile (raw JSON)
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

impl UpdateProfileRequest {
    fn try_into_command(self) -> Result<UpdateProfileCommand, AccountError> {
        // Empty strings count as absent.
        let username = super::required(self.username)
            .map(Username::new)
            .transpose()?;
        let email = super::required(self.email)
            .map(EmailAddress::new)
            .transpose()?;

        Ok(UpdateProfileCommand { username, email })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_fields_count_as_absent() {
        let command = UpdateProfileRequest {
            username: Some(String::new()),
            email: None,
        }
        .try_into_command()
        .unwrap();

        assert!(command.username.is_none());
        assert!(command.email.is_none());
    }

    #[test]
    fn test_invalid_username_is_rejected() {
        let result = UpdateProfileRequest {
            username: Some("x".repeat(101)),
            email: None,
        }
        .try_into_command();

        assert!(matches!(result, Err(AccountError::InvalidUsername(_))));
    }
}
