use std::collections::HashMap;

use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::account::models::LoginStamp;
use crate::account::models::StampLimit;
use crate::inbound::http::middleware::CurrentAccount;
use crate::inbound::http::router::AppState;

pub async fn list_logins(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<ApiSuccess<LoginStampsResponseData>, ApiError> {
    let limit = StampLimit::parse(params.get("limit").map(String::as_str));

    let stamps = state
        .account_service
        .list_login_stamps(&current.id, limit)
        .await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        LoginStampsResponseData {
            logins: stamps.iter().map(LoginStampData::from).collect(),
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginStampsResponseData {
    pub logins: Vec<LoginStampData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginStampData {
    pub id: i64,
    pub ip_addr: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&LoginStamp> for LoginStampData {
    fn from(stamp: &LoginStamp) -> Self {
        Self {
            id: stamp.id,
            ip_addr: stamp.ip_addr.clone(),
            user_agent: stamp.user_agent.clone(),
            created_at: stamp.created_at,
        }
    }
}
