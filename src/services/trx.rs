//! Order capture and order history.
//!
//! Line items are priced and rendered from `log_produk` snapshots taken inside
//! the same database transaction that writes the order, never from live
//! product rows.

use std::collections::HashMap;

use axum::http::StatusCode;
use chrono::Utc;
use common::{Filter, Paginated, Price};
use model::entities::{address, detail_trx, log_produk, product, shop, trx};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    LoaderTrait, QueryFilter, Set, TransactionTrait,
};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use super::{apply_filter, fetch_page, ListColumns};
use crate::error::{ApiError, ApiResult};
use crate::policy::{ensure_owner, owner_scope};

pub const SORTABLE_COLUMNS: &[&str] = &["created_at_date", "updated_at_date"];
pub const NOT_FOUND: &str = "Failed, trx not found";

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("invalid address")]
    InvalidAddress,
    #[error("product {0} not found")]
    ProductNotFound(i32),
    #[error("invalid price for product {0}")]
    InvalidPrice(i32),
    #[error("order total is too large")]
    TotalOverflow,
    #[error(transparent)]
    Store(#[from] DbErr),
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::InvalidAddress | OrderError::ProductNotFound(_) => {
                ApiError::not_found(err.to_string())
            }
            OrderError::InvalidPrice(_) | OrderError::TotalOverflow => {
                ApiError::warn(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            }
            OrderError::Store(e) => {
                error!("order could not be stored: {}", e);
                ApiError::internal("Internal server error")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: i32,
    pub kuantitas: i32,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub method_bayar: String,
    pub alamat_kirim: i32,
    pub lines: Vec<OrderLine>,
}

#[derive(Debug, Clone)]
pub struct LineDetails {
    pub detail: detail_trx::Model,
    pub snapshot: log_produk::Model,
    pub shop: Option<shop::Model>,
}

#[derive(Debug, Clone)]
pub struct TrxDetails {
    pub trx: trx::Model,
    pub address: Option<address::Model>,
    pub lines: Vec<LineDetails>,
}

fn invoice_code() -> String {
    format!("INV-{}", Utc::now().timestamp())
}

async fn load_product(txn: &DatabaseTransaction, id: i32) -> Result<product::Model, OrderError> {
    product::Entity::find_by_id(id)
        .one(txn)
        .await?
        .ok_or(OrderError::ProductNotFound(id))
}

fn line_total(item: &product::Model, kuantitas: i32) -> Result<i64, OrderError> {
    let price: Price = item.harga_konsumen.parse().map_err(|e| {
        warn!(product_id = item.id, "stored price is unusable: {}", e);
        OrderError::InvalidPrice(item.id)
    })?;
    price
        .line_total(i64::from(kuantitas))
        .ok_or(OrderError::TotalOverflow)
}

/// Places an order for `user_id` and returns the new trx id.
///
/// Everything runs in one transaction; the first failure drops it, which
/// rolls back every row written so far.
#[instrument(skip(db, order), fields(lines = order.lines.len()))]
pub async fn place_order(db: &DatabaseConnection, user_id: i32, order: NewOrder) -> Result<i32, OrderError> {
    let txn = db.begin().await?;

    // An address owned by someone else is reported exactly like a missing one.
    let shipping = address::Entity::find_by_id(order.alamat_kirim)
        .filter(address::Column::IdUser.eq(user_id))
        .one(&txn)
        .await?
        .ok_or(OrderError::InvalidAddress)?;

    let mut harga_total: i64 = 0;
    for line in &order.lines {
        let item = load_product(&txn, line.product_id).await?;
        harga_total = harga_total
            .checked_add(line_total(&item, line.kuantitas)?)
            .ok_or(OrderError::TotalOverflow)?;
    }

    let header = trx::ActiveModel {
        id_user: Set(user_id),
        alamat_pengiriman: Set(shipping.id),
        harga_total: Set(harga_total),
        kode_invoice: Set(invoice_code()),
        method_bayar: Set(order.method_bayar),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for line in &order.lines {
        let item = load_product(&txn, line.product_id).await?;
        let total = line_total(&item, line.kuantitas)?;

        let snapshot = log_produk::ActiveModel {
            id_produk: Set(item.id),
            nama_produk: Set(item.nama_produk.clone()),
            slug: Set(item.slug.clone()),
            harga_reseller: Set(item.harga_reseller.clone()),
            harga_konsumen: Set(item.harga_konsumen.clone()),
            deskripsi: Set(item.deskripsi.clone()),
            id_toko: Set(item.id_toko),
            id_category: Set(item.id_category),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        detail_trx::ActiveModel {
            id_trx: Set(header.id),
            id_log_produk: Set(snapshot.id),
            id_toko: Set(item.id_toko),
            kuantitas: Set(line.kuantitas),
            harga_total: Set(total),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        debug!(trx_id = header.id, product_id = item.id, total, "order line captured");
    }

    txn.commit().await?;
    info!(trx_id = header.id, user_id, harga_total, "order placed");
    Ok(header.id)
}

async fn render(db: &DatabaseConnection, rows: Vec<trx::Model>) -> ApiResult<Vec<TrxDetails>> {
    let details = rows.load_many(detail_trx::Entity, db).await?;

    let log_ids: Vec<i32> = details.iter().flatten().map(|d| d.id_log_produk).collect();
    let shop_ids: Vec<i32> = details.iter().flatten().map(|d| d.id_toko).collect();
    let address_ids: Vec<i32> = rows.iter().map(|t| t.alamat_pengiriman).collect();

    let snapshots: HashMap<i32, log_produk::Model> = log_produk::Entity::find()
        .filter(log_produk::Column::Id.is_in(log_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|l| (l.id, l))
        .collect();
    let shops: HashMap<i32, shop::Model> = shop::Entity::find()
        .filter(shop::Column::Id.is_in(shop_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();
    let addresses: HashMap<i32, address::Model> = address::Entity::find()
        .filter(address::Column::Id.is_in(address_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();

    rows.into_iter()
        .zip(details)
        .map(|(header, details)| {
            let lines = details
                .into_iter()
                .map(|detail| {
                    let snapshot = snapshots.get(&detail.id_log_produk).cloned().ok_or_else(|| {
                        error!(detail_id = detail.id, "order line lost its product snapshot");
                        ApiError::internal("Internal server error")
                    })?;
                    Ok(LineDetails {
                        shop: shops.get(&detail.id_toko).cloned(),
                        snapshot,
                        detail,
                    })
                })
                .collect::<ApiResult<Vec<_>>>()?;
            Ok(TrxDetails {
                address: addresses.get(&header.alamat_pengiriman).cloned(),
                trx: header,
                lines,
            })
        })
        .collect()
}

pub async fn find(db: &DatabaseConnection, id: i32, requester_id: i32, is_admin: bool) -> ApiResult<TrxDetails> {
    let header = trx::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    ensure_owner(header.id_user, Some(requester_id), is_admin, NOT_FOUND)?;

    render(db, vec![header])
        .await?
        .pop()
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

pub async fn list(
    db: &DatabaseConnection,
    requester_id: i32,
    is_admin: bool,
    filter: &Filter,
) -> ApiResult<Paginated<TrxDetails>> {
    let mut select = trx::Entity::find();
    if let Some(owner) = owner_scope(requester_id, is_admin) {
        select = select.filter(trx::Column::IdUser.eq(owner));
    }
    let select = apply_filter(
        select,
        filter,
        ListColumns {
            keyword: trx::Column::KodeInvoice,
            created: trx::Column::CreatedAtDate,
            updated: trx::Column::UpdatedAtDate,
        },
    )?;
    let (total, rows) = fetch_page(db, select, filter).await?;
    let rows = render(db, rows).await?;
    Ok(Paginated::new(filter, total, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        insert_address, insert_category, insert_product, insert_shop, insert_user, setup_test_db,
    };
    use sea_orm::{IntoActiveModel, PaginatorTrait};

    struct Fixture {
        db: DatabaseConnection,
        buyer: i32,
        address: i32,
        product: i32,
    }

    async fn fixture(price: &str) -> Fixture {
        let db = setup_test_db().await;
        let seller = insert_user(&db, "0811", false).await;
        let shop = insert_shop(&db, seller.id, "Toko Batik").await;
        let category = insert_category(&db, "Pakaian").await;
        let product = insert_product(&db, shop.id, category.id, "Kemeja", price).await;
        let buyer = insert_user(&db, "0822", false).await;
        let address = insert_address(&db, buyer.id).await;
        Fixture {
            db,
            buyer: buyer.id,
            address: address.id,
            product: product.id,
        }
    }

    fn order(address: i32, lines: &[(i32, i32)]) -> NewOrder {
        NewOrder {
            method_bayar: "COD".into(),
            alamat_kirim: address,
            lines: lines
                .iter()
                .map(|&(product_id, kuantitas)| OrderLine {
                    product_id,
                    kuantitas,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn total_is_price_times_quantity() {
        let f = fixture("10000").await;
        let id = place_order(&f.db, f.buyer, order(f.address, &[(f.product, 2)]))
            .await
            .unwrap();

        let placed = find(&f.db, id, f.buyer, false).await.unwrap();
        assert_eq!(placed.trx.harga_total, 20000);
        assert!(placed.trx.kode_invoice.starts_with("INV-"));
        assert_eq!(placed.lines.len(), 1);
        assert_eq!(placed.lines[0].detail.harga_total, 20000);
        assert_eq!(placed.lines[0].snapshot.id_produk, f.product);
        assert_eq!(log_produk::Entity::find().count(&f.db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn every_line_is_snapshotted_and_summed() {
        let f = fixture("10000").await;
        let other_seller = insert_user(&f.db, "0855", false).await;
        let other_shop = insert_shop(&f.db, other_seller.id, "Toko Sepatu").await;
        let category = insert_category(&f.db, "Sepatu").await;
        let sepatu = insert_product(&f.db, other_shop.id, category.id, "Sepatu", "25000").await;

        let id = place_order(
            &f.db,
            f.buyer,
            order(f.address, &[(f.product, 2), (sepatu.id, 3)]),
        )
        .await
        .unwrap();

        let placed = find(&f.db, id, f.buyer, false).await.unwrap();
        assert_eq!(placed.trx.harga_total, 2 * 10000 + 3 * 25000);
        assert_eq!(placed.lines.len(), 2);
        let summed: i64 = placed.lines.iter().map(|l| l.detail.harga_total).sum();
        assert_eq!(placed.trx.harga_total, summed);

        let sepatu_line = placed
            .lines
            .iter()
            .find(|l| l.snapshot.id_produk == sepatu.id)
            .expect("line for the second product");
        assert_eq!(sepatu_line.detail.kuantitas, 3);
        assert_eq!(sepatu_line.detail.harga_total, 75000);
        assert_eq!(sepatu_line.detail.id_toko, other_shop.id);
        assert_eq!(sepatu_line.snapshot.nama_produk, "Sepatu");
        assert_eq!(
            sepatu_line.shop.as_ref().map(|s| s.nama_toko.as_str()),
            Some("Toko Sepatu")
        );

        let kemeja_line = placed
            .lines
            .iter()
            .find(|l| l.snapshot.id_produk == f.product)
            .expect("line for the first product");
        assert_eq!(kemeja_line.detail.harga_total, 20000);

        assert_eq!(log_produk::Entity::find().count(&f.db).await.unwrap(), 2);
        assert_eq!(detail_trx::Entity::find().count(&f.db).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn later_product_edits_do_not_touch_the_order() {
        let f = fixture("10000").await;
        let id = place_order(&f.db, f.buyer, order(f.address, &[(f.product, 1)]))
            .await
            .unwrap();

        let mut live = product::Entity::find_by_id(f.product)
            .one(&f.db)
            .await
            .unwrap()
            .unwrap()
            .into_active_model();
        live.harga_konsumen = Set("99999".into());
        live.nama_produk = Set("Renamed".into());
        live.update(&f.db).await.unwrap();

        let placed = find(&f.db, id, f.buyer, false).await.unwrap();
        assert_eq!(placed.trx.harga_total, 10000);
        assert_eq!(placed.lines[0].snapshot.harga_konsumen, "10000");
        assert_eq!(placed.lines[0].snapshot.nama_produk, "Kemeja");

        product::Entity::delete_by_id(f.product).exec(&f.db).await.unwrap();
        let placed = find(&f.db, id, f.buyer, false).await.unwrap();
        assert_eq!(placed.lines[0].snapshot.nama_produk, "Kemeja");
    }

    #[tokio::test]
    async fn someone_elses_address_looks_missing() {
        let f = fixture("10000").await;
        let stranger = insert_user(&f.db, "0833", false).await;

        let foreign = place_order(&f.db, stranger.id, order(f.address, &[(f.product, 1)]))
            .await
            .unwrap_err();
        let missing = place_order(&f.db, f.buyer, order(9999, &[(f.product, 1)]))
            .await
            .unwrap_err();

        assert_eq!(foreign.to_string(), "invalid address");
        assert_eq!(foreign.to_string(), missing.to_string());
        assert_eq!(trx::Entity::find().count(&f.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_product_writes_nothing() {
        let f = fixture("10000").await;
        let err = place_order(&f.db, f.buyer, order(f.address, &[(f.product, 1), (424242, 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::ProductNotFound(424242)));
        assert_eq!(trx::Entity::find().count(&f.db).await.unwrap(), 0);
        assert_eq!(log_produk::Entity::find().count(&f.db).await.unwrap(), 0);
        assert_eq!(detail_trx::Entity::find().count(&f.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unparsable_price_aborts_the_whole_order() {
        let f = fixture("10000").await;
        let seller_shop = product::Entity::find_by_id(f.product)
            .one(&f.db)
            .await
            .unwrap()
            .unwrap()
            .id_toko;
        let category = insert_category(&f.db, "Rusak").await;
        let broken = insert_product(&f.db, seller_shop, category.id, "Broken", "12,5k").await;

        let err = place_order(&f.db, f.buyer, order(f.address, &[(f.product, 1), (broken.id, 1)]))
            .await
            .unwrap_err();

        let api: ApiError = err.into();
        assert_eq!(api.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            api.messages(),
            &[format!("invalid price for product {}", broken.id)]
        );
        assert_eq!(trx::Entity::find().count(&f.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn orders_are_private_to_their_buyer() {
        let f = fixture("5000").await;
        let id = place_order(&f.db, f.buyer, order(f.address, &[(f.product, 3)]))
            .await
            .unwrap();
        let stranger = insert_user(&f.db, "0844", false).await;

        let err = find(&f.db, id, stranger.id, false).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert!(find(&f.db, id, stranger.id, true).await.is_ok());

        let filter = common::ListQuery::default().resolve(SORTABLE_COLUMNS).unwrap();
        assert_eq!(list(&f.db, stranger.id, false, &filter).await.unwrap().total_data, 0);
        assert_eq!(list(&f.db, f.buyer, false, &filter).await.unwrap().total_data, 1);
    }
}
