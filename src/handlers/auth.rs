use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use common::ApiResponse;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use super::users::UserResponse;
use super::{respond, GET_SUCCEEDED, POST_SUCCEEDED};
use crate::error::ApiResult;
use crate::extract::ValidJson;
use crate::middleware::AuthUser;
use crate::schemas::{AppState, ErrorResponse};
use crate::services::auth::{self, parse_birth_date, NewAccount};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1))]
    pub nama: String,
    #[validate(length(min = 1))]
    pub kata_sandi: String,
    #[validate(length(min = 1))]
    pub no_telp: String,
    /// `dd/mm/yyyy`
    #[serde(alias = "tanggal_Lahir")]
    pub tanggal_lahir: Option<String>,
    pub jenis_kelamin: Option<String>,
    pub tentang: Option<String>,
    pub pekerjaan: Option<String>,
    #[validate(email)]
    pub email: String,
    pub id_provinsi: Option<String>,
    pub id_kota: Option<String>,
    /// Registration sits behind operator credentials, so the flag is trusted here
    #[serde(alias = "isAdmin")]
    pub is_admin: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub no_telp: String,
    #[validate(length(min = 1))]
    pub kata_sandi: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub expires: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyTokenResponse {
    pub token_verified: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogoutResponse {
    pub logged_out: bool,
}

/// Register an account and its shop
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request data", body = ErrorResponse),
        (status = 401, description = "Bad operator credentials", body = ErrorResponse),
        (status = 409, description = "Phone number already registered", body = ErrorResponse)
    ),
    security(("basic" = [])),
    tag = "auth"
)]
#[instrument(skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<UserResponse>>)> {
    debug!("Registering account for {}", request.no_telp);

    let account = NewAccount {
        tanggal_lahir: parse_birth_date(request.tanggal_lahir.as_deref())?,
        nama: request.nama,
        kata_sandi: request.kata_sandi,
        no_telp: request.no_telp,
        jenis_kelamin: request.jenis_kelamin,
        tentang: request.tentang,
        pekerjaan: request.pekerjaan,
        email: request.email,
        id_provinsi: request.id_provinsi,
        id_kota: request.id_kota,
        is_admin: request.is_admin.unwrap_or(false),
    };

    let created = auth::register(&state.db, account).await?;
    Ok((StatusCode::CREATED, respond(POST_SUCCEEDED, created.into())))
}

/// Exchange phone number and password for a token
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Invalid request data", body = ErrorResponse),
        (status = 401, description = "Invalid phone number or password", body = ErrorResponse)
    ),
    security(("basic" = [])),
    tag = "auth"
)]
#[instrument(skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<LoginRequest>,
) -> ApiResult<Json<ApiResponse<LoginResponse>>> {
    let (token, expires) = auth::login(
        &state.db,
        &state.config.auth.jwt,
        &request.no_telp,
        &request.kata_sandi,
    )
    .await?;

    info!("Issued token for {}", request.no_telp);
    Ok(respond(POST_SUCCEEDED, LoginResponse { token, expires }))
}

/// Check that the presented token is valid
#[utoipa::path(
    get,
    path = "/api/v1/auth/verify-token",
    responses(
        (status = 200, description = "Token is valid", body = ApiResponse<VerifyTokenResponse>),
        (status = 401, description = "Token invalid, expired or revoked", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "auth"
)]
#[instrument]
pub async fn verify_token(_caller: AuthUser) -> Json<ApiResponse<VerifyTokenResponse>> {
    respond(GET_SUCCEEDED, VerifyTokenResponse { token_verified: true })
}

/// Revoke the presented token
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 200, description = "Token revoked", body = ApiResponse<LogoutResponse>),
        (status = 401, description = "Token invalid, expired or revoked", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "auth"
)]
#[instrument(skip(state))]
pub async fn logout(
    State(state): State<AppState>,
    caller: AuthUser,
) -> ApiResult<Json<ApiResponse<LogoutResponse>>> {
    auth::revoke_token(&state.db, &caller.token, caller.expires).await?;
    info!(user_id = caller.id, "token revoked");
    Ok(respond(POST_SUCCEEDED, LogoutResponse { logged_out: true }))
}
