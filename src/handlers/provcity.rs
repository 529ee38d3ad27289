use axum::{extract::State, Json};
use common::ApiResponse;
use tracing::{debug, instrument};

use super::{respond, GET_SUCCEEDED};
use crate::error::ApiResult;
use crate::extract::AppPath;
use crate::schemas::{AppState, ErrorResponse};
use crate::services::provcity::{City, Province};

/// List all provinces
#[utoipa::path(
    get,
    path = "/api/v1/provcity/listprovincies",
    responses(
        (status = 200, description = "All provinces", body = ApiResponse<Vec<Province>>),
        (status = 502, description = "Region directory unavailable", body = ErrorResponse)
    ),
    tag = "provcity"
)]
#[instrument(skip(state))]
pub async fn list_provinces(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<Vec<Province>>>> {
    let provinces = state.regions.provinces().await?;
    debug!("Fetched {} provinces", provinces.len());
    Ok(respond(GET_SUCCEEDED, provinces))
}

/// List the cities of a province
#[utoipa::path(
    get,
    path = "/api/v1/provcity/listcities/{prov_id}",
    params(("prov_id" = String, Path, description = "Province ID, digits only")),
    responses(
        (status = 200, description = "Cities of the province", body = ApiResponse<Vec<City>>),
        (status = 400, description = "Malformed province id", body = ErrorResponse),
        (status = 404, description = "Province not found", body = ErrorResponse),
        (status = 502, description = "Region directory unavailable", body = ErrorResponse)
    ),
    tag = "provcity"
)]
#[instrument(skip(state))]
pub async fn list_cities(
    State(state): State<AppState>,
    AppPath(prov_id): AppPath<String>,
) -> ApiResult<Json<ApiResponse<Vec<City>>>> {
    let cities = state.regions.cities(&prov_id).await?;
    Ok(respond(GET_SUCCEEDED, cities))
}

/// Get a province
#[utoipa::path(
    get,
    path = "/api/v1/provcity/detailprovince/{prov_id}",
    params(("prov_id" = String, Path, description = "Province ID, digits only")),
    responses(
        (status = 200, description = "Province", body = ApiResponse<Province>),
        (status = 404, description = "Province not found", body = ErrorResponse),
        (status = 502, description = "Region directory unavailable", body = ErrorResponse)
    ),
    tag = "provcity"
)]
#[instrument(skip(state))]
pub async fn get_province(
    State(state): State<AppState>,
    AppPath(prov_id): AppPath<String>,
) -> ApiResult<Json<ApiResponse<Province>>> {
    let province = state.regions.province(&prov_id).await?;
    Ok(respond(GET_SUCCEEDED, province))
}

/// Get a city
#[utoipa::path(
    get,
    path = "/api/v1/provcity/detailcity/{city_id}",
    params(("city_id" = String, Path, description = "City ID, digits only")),
    responses(
        (status = 200, description = "City", body = ApiResponse<City>),
        (status = 404, description = "City not found", body = ErrorResponse),
        (status = 502, description = "Region directory unavailable", body = ErrorResponse)
    ),
    tag = "provcity"
)]
#[instrument(skip(state))]
pub async fn get_city(
    State(state): State<AppState>,
    AppPath(city_id): AppPath<String>,
) -> ApiResult<Json<ApiResponse<City>>> {
    let city = state.regions.city(&city_id).await?;
    Ok(respond(GET_SUCCEEDED, city))
}
