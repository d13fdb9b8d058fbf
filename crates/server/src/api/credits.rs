//! Account credit endpoints.

use axum::{
    extract::{Query, State},
    Json,
};
use convertino_core::{credit_alert, AccountInfo, CreditAlert};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CreditsParams {
    /// Query the sandbox account instead of the live one.
    #[serde(default)]
    pub sandbox: bool,
}

/// Current account of the configured API key.
pub async fn get_credits(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CreditsParams>,
) -> Result<Json<AccountInfo>, ApiError> {
    let account = state.client().current_user(params.sandbox).await?;
    Ok(Json(account))
}

#[derive(Debug, Serialize)]
pub struct CreditAlertResponse {
    /// Limit the alert was evaluated against (0 = disabled).
    pub limit: u32,
    pub alert: Option<CreditAlert>,
}

/// Operator alert when credits run low or the account cannot be read.
pub async fn get_credit_alert(State(state): State<Arc<AppState>>) -> Json<CreditAlertResponse> {
    let limit = state.config().backend_alert_credit_limit;
    let alert = credit_alert(state.client(), limit).await;
    Json(CreditAlertResponse { limit, alert })
}
