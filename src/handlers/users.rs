use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use common::{ApiResponse, ListQuery, Paginated};
use model::entities::user;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use super::{respond, DELETE_SUCCEEDED, GET_SUCCEEDED, PUT_SUCCEEDED};
use crate::error::ApiResult;
use crate::extract::{AppPath, AppQuery, ValidJson};
use crate::middleware::AuthUser;
use crate::schemas::{AppState, ErrorResponse};
use crate::services::auth::{parse_birth_date, BIRTH_DATE_FORMAT};
use crate::services::users::{self, ProfileUpdate, SORTABLE_COLUMNS};

/// Public view of an account; the password hash never leaves the service.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub nama: String,
    pub no_telp: String,
    /// `dd/mm/yyyy`
    pub tanggal_lahir: Option<String>,
    pub jenis_kelamin: Option<String>,
    pub tentang: Option<String>,
    pub pekerjaan: Option<String>,
    pub email: String,
    pub id_provinsi: Option<String>,
    pub id_kota: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            nama: model.nama,
            no_telp: model.notelp,
            tanggal_lahir: model
                .tanggal_lahir
                .map(|d| d.format(BIRTH_DATE_FORMAT).to_string()),
            jenis_kelamin: model.jenis_kelamin,
            tentang: model.tentang,
            pekerjaan: model.pekerjaan,
            email: model.email,
            id_provinsi: model.id_provinsi,
            id_kota: model.id_kota,
            is_admin: model.is_admin,
            created_at: model.created_at_date,
            updated_at: model.updated_at_date,
        }
    }
}

/// Full profile replacement; the password is re-hashed on every update.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateProfileRequest {
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
    /// Only honored when the caller is an admin
    #[serde(alias = "isAdmin")]
    pub is_admin: Option<bool>,
}

/// Get the caller's profile
#[utoipa::path(
    get,
    path = "/api/v1/user",
    responses(
        (status = 200, description = "Caller profile", body = ApiResponse<UserResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Account no longer exists", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "users"
)]
#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    caller: AuthUser,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let account = users::find(&state.db, caller.id).await?;
    Ok(respond(GET_SUCCEEDED, account.into()))
}

/// Replace the caller's profile
#[utoipa::path(
    put,
    path = "/api/v1/user",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request data", body = ErrorResponse),
        (status = 409, description = "Phone number already registered", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "users"
)]
#[instrument(skip(state, request))]
pub async fn update_profile(
    State(state): State<AppState>,
    caller: AuthUser,
    ValidJson(request): ValidJson<UpdateProfileRequest>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let update = ProfileUpdate {
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
        is_admin: request.is_admin,
    };

    let updated = users::update_profile(&state.db, caller.id, caller.is_admin, update).await?;
    debug!(user_id = updated.id, "profile updated");
    Ok(respond(PUT_SUCCEEDED, updated.into()))
}

/// Delete the caller's account together with its shop, addresses and orders
#[utoipa::path(
    delete,
    path = "/api/v1/user",
    responses(
        (status = 200, description = "Account deleted", body = ApiResponse<String>),
        (status = 404, description = "Account not found", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "users"
)]
#[instrument(skip(state))]
pub async fn delete_profile(
    State(state): State<AppState>,
    caller: AuthUser,
) -> ApiResult<Json<ApiResponse<String>>> {
    users::delete(&state.db, &state.media, caller.id).await?;
    Ok(respond(DELETE_SUCCEEDED, String::new()))
}

/// List accounts (admin)
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(ListQuery),
    responses(
        (status = 200, description = "Page of accounts", body = ApiResponse<Paginated<UserResponse>>),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "users"
)]
#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListQuery>,
) -> ApiResult<Json<ApiResponse<Paginated<UserResponse>>>> {
    let filter = query.resolve(SORTABLE_COLUMNS)?;
    let page = users::list(&state.db, &filter).await?;
    info!("Retrieved {} of {} accounts", page.data.len(), page.total_data);
    Ok(respond(GET_SUCCEEDED, page.map(UserResponse::from)))
}

/// Get one account (admin)
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Account", body = ApiResponse<UserResponse>),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "users"
)]
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let account = users::find(&state.db, id).await?;
    Ok(respond(GET_SUCCEEDED, account.into()))
}

/// Delete one account (admin)
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Account deleted", body = ApiResponse<String>),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "users"
)]
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> ApiResult<Json<ApiResponse<String>>> {
    users::delete(&state.db, &state.media, id).await?;
    Ok(respond(DELETE_SUCCEEDED, String::new()))
}
