use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct RegisterTokenRequest {
    #[validate(length(max = 4096))]
    #[serde(default)]
    pub token: Option<String>,
}

/// Callable envelope: `{ "data": { "token": "..." } }`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RegisterTokenCall {
    #[serde(default)]
    pub data: RegisterTokenRequest,
}

#[derive(Debug, PartialEq, Serialize, ToSchema)]
pub struct RegisterTokenResponse {
    pub success: bool,
}

/// Callable envelope: `{ "result": { "success": true } }`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterTokenReply {
    pub result: RegisterTokenResponse,
}
