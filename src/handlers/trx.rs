use axum::{extract::State, http::StatusCode, Json};
use common::{ApiResponse, ListQuery, Paginated};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use super::addresses::AddressResponse;
use super::{respond, GET_SUCCEEDED, POST_SUCCEEDED};
use crate::error::ApiResult;
use crate::extract::{AppPath, AppQuery, ValidJson};
use crate::middleware::AuthUser;
use crate::schemas::{AppState, ErrorResponse};
use crate::services::trx::{self, LineDetails, NewOrder, OrderLine, TrxDetails, SORTABLE_COLUMNS};

#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
pub struct OrderLineRequest {
    pub product_id: i32,
    #[validate(range(min = 1))]
    pub kuantitas: i32,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateTrxRequest {
    #[validate(length(min = 1))]
    pub method_bayar: String,
    /// Id of one of the caller's addresses
    pub alamat_kirim: i32,
    #[validate(length(min = 1), nested)]
    pub detail_trx: Vec<OrderLineRequest>,
}

/// Product as it was when the order was placed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrxProduct {
    pub id: i32,
    pub nama_produk: String,
    pub slug: String,
    pub harga_reseller: String,
    pub harga_konsumen: String,
    pub deskripsi: String,
    pub category_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrxShop {
    pub id: i32,
    pub nama_toko: Option<String>,
    pub url_foto: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrxLineResponse {
    pub product: TrxProduct,
    pub toko: TrxShop,
    pub kuantitas: i32,
    pub harga_total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrxResponse {
    pub id: i32,
    pub harga_total: i64,
    pub kode_invoice: String,
    pub method_bayar: String,
    /// `null` once the shipping address has been deleted
    pub alamat_kirim: Option<AddressResponse>,
    pub detail_trx: Vec<TrxLineResponse>,
}

impl From<LineDetails> for TrxLineResponse {
    fn from(line: LineDetails) -> Self {
        let snapshot = line.snapshot;
        // The shop may be gone; the snapshot still knows which one it was.
        let toko = match line.shop {
            Some(shop) => TrxShop {
                id: shop.id,
                nama_toko: Some(shop.nama_toko),
                url_foto: shop.url_foto,
            },
            None => TrxShop {
                id: snapshot.id_toko,
                nama_toko: None,
                url_foto: None,
            },
        };
        Self {
            product: TrxProduct {
                id: snapshot.id_produk,
                nama_produk: snapshot.nama_produk,
                slug: snapshot.slug,
                harga_reseller: snapshot.harga_reseller,
                harga_konsumen: snapshot.harga_konsumen,
                deskripsi: snapshot.deskripsi,
                category_id: snapshot.id_category,
            },
            toko,
            kuantitas: line.detail.kuantitas,
            harga_total: line.detail.harga_total,
        }
    }
}

impl From<TrxDetails> for TrxResponse {
    fn from(details: TrxDetails) -> Self {
        Self {
            id: details.trx.id,
            harga_total: details.trx.harga_total,
            kode_invoice: details.trx.kode_invoice,
            method_bayar: details.trx.method_bayar,
            alamat_kirim: details.address.map(AddressResponse::from),
            detail_trx: details.lines.into_iter().map(TrxLineResponse::from).collect(),
        }
    }
}

/// Place an order
#[utoipa::path(
    post,
    path = "/api/v1/trx",
    request_body = CreateTrxRequest,
    responses(
        (status = 201, description = "Order placed", body = ApiResponse<TrxResponse>),
        (status = 400, description = "Invalid request data", body = ErrorResponse),
        (status = 404, description = "Invalid address or product not found", body = ErrorResponse),
        (status = 422, description = "A product has an unusable price", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "trx"
)]
#[instrument(skip(state))]
pub async fn create_trx(
    State(state): State<AppState>,
    caller: AuthUser,
    ValidJson(request): ValidJson<CreateTrxRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<TrxResponse>>)> {
    let order = NewOrder {
        method_bayar: request.method_bayar,
        alamat_kirim: request.alamat_kirim,
        lines: request
            .detail_trx
            .into_iter()
            .map(|line| OrderLine {
                product_id: line.product_id,
                kuantitas: line.kuantitas,
            })
            .collect(),
    };

    let id = trx::place_order(&state.db, caller.id, order).await?;
    let placed = trx::find(&state.db, id, caller.id, caller.is_admin).await?;
    Ok((StatusCode::CREATED, respond(POST_SUCCEEDED, placed.into())))
}

/// List the caller's orders (every order for admins)
#[utoipa::path(
    get,
    path = "/api/v1/trx",
    params(ListQuery),
    responses(
        (status = 200, description = "Page of orders", body = ApiResponse<Paginated<TrxResponse>>),
        (status = 400, description = "Invalid filter", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "trx"
)]
#[instrument(skip(state))]
pub async fn list_trx(
    State(state): State<AppState>,
    caller: AuthUser,
    AppQuery(query): AppQuery<ListQuery>,
) -> ApiResult<Json<ApiResponse<Paginated<TrxResponse>>>> {
    let filter = query.resolve(SORTABLE_COLUMNS)?;
    let page = trx::list(&state.db, caller.id, caller.is_admin, &filter).await?;
    info!("Retrieved {} of {} orders", page.data.len(), page.total_data);
    Ok(respond(GET_SUCCEEDED, page.map(TrxResponse::from)))
}

/// Get one of the caller's orders
#[utoipa::path(
    get,
    path = "/api/v1/trx/{id}",
    params(("id" = i32, Path, description = "Trx ID")),
    responses(
        (status = 200, description = "Order", body = ApiResponse<TrxResponse>),
        (status = 404, description = "Trx not found", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "trx"
)]
#[instrument(skip(state))]
pub async fn get_trx(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(id): AppPath<i32>,
) -> ApiResult<Json<ApiResponse<TrxResponse>>> {
    let found = trx::find(&state.db, id, caller.id, caller.is_admin).await?;
    Ok(respond(GET_SUCCEEDED, found.into()))
}
