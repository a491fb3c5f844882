use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    error::Result,
    middleware::auth::AuthUser,
    state::AppState,
};
use super::user_dto::{RegisterTokenCall, RegisterTokenReply, RegisterTokenRequest};

/// Register the caller's device token for push notifications
#[utoipa::path(
    post,
    path = "/api/users/me/fcm-token",
    tag = "users",
    request_body = RegisterTokenCall,
    responses(
        (status = 200, description = "Token recorded", body = RegisterTokenReply),
        (status = 400, description = "Token missing or empty"),
        (status = 401, description = "Caller is not authenticated"),
        (status = 500, description = "Token could not be stored")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_fcm_token(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    payload: std::result::Result<Json<RegisterTokenCall>, JsonRejection>,
) -> Result<impl IntoResponse> {
    // An unreadable body carries no token; the service reports that after
    // checking the caller.
    let request = match payload {
        Ok(Json(call)) => call.data,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable registration payload");
            RegisterTokenRequest::default()
        }
    };

    let result = state
        .registration_service
        .update_fcm_token(caller.map(|AuthUser(user_id)| user_id), request)
        .await?;

    Ok((StatusCode::OK, Json(RegisterTokenReply { result })))
}
