use chrono::Utc;
use common::{slugify, Filter, Paginated, Price};
use model::entities::{category, product, product_photo, shop};
use sea_orm::{
    sea_query::{Alias, Expr, Func},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, LoaderTrait, ModelTrait, QueryFilter, Select, Set, TransactionTrait,
};
use tracing::{debug, info, warn};

use super::{apply_filter, categories, fetch_page, shops, ListColumns};
use crate::error::{ApiError, ApiResult};
use crate::policy::ensure_owner;
use crate::uploads::{MediaStore, UploadedFile};

pub const SORTABLE_COLUMNS: &[&str] = &["id", "nama_produk", "harga_konsumen", "created_at_date"];
pub const NOT_FOUND: &str = "Failed, product not found";
pub const PHOTO_FOLDER: &str = "products";

/// A product with the rows it is rendered with.
#[derive(Debug, Clone)]
pub struct ProductDetails {
    pub product: product::Model,
    pub shop: Option<shop::Model>,
    pub category: Option<category::Model>,
    pub photos: Vec<product_photo::Model>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub nama_produk: String,
    pub slug: Option<String>,
    pub category_id: i32,
    pub harga_reseller: Price,
    pub harga_konsumen: Price,
    pub stok: i32,
    pub deskripsi: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub nama_produk: Option<String>,
    pub slug: Option<String>,
    pub category_id: Option<i32>,
    pub harga_reseller: Option<Price>,
    pub harga_konsumen: Option<Price>,
    pub stok: Option<i32>,
    pub deskripsi: Option<String>,
}

/// Catalog filters on top of the generic list filter. Price bounds apply to
/// `harga_konsumen` and are inclusive.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<i32>,
    pub toko_id: Option<i32>,
    pub min_harga: Option<i64>,
    pub max_harga: Option<i64>,
}

/// Parses a price field, naming the field in the error.
pub fn parse_price(field: &str, raw: &str) -> ApiResult<Price> {
    raw.parse()
        .map_err(|e| ApiError::bad_request(format!("{field}: {e}")))
}

fn slug_or_default(slug: Option<String>, nama_produk: &str) -> String {
    slug.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| slugify(nama_produk))
}

pub async fn find(db: &DatabaseConnection, id: i32) -> ApiResult<product::Model> {
    product::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

pub async fn details(db: &DatabaseConnection, id: i32) -> ApiResult<ProductDetails> {
    let found = find(db, id).await?;
    let mut loaded = load_details(db, vec![found]).await?;
    loaded
        .pop()
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

async fn load_details(db: &DatabaseConnection, rows: Vec<product::Model>) -> ApiResult<Vec<ProductDetails>> {
    let shops = rows.load_one(shop::Entity, db).await?;
    let categories = rows.load_one(category::Entity, db).await?;
    let photos = rows.load_many(product_photo::Entity, db).await?;

    Ok(rows
        .into_iter()
        .zip(shops)
        .zip(categories)
        .zip(photos)
        .map(|(((product, shop), category), photos)| ProductDetails {
            product,
            shop,
            category,
            photos,
        })
        .collect())
}

fn price_column() -> Expr {
    Expr::expr(Func::cast_as(
        Expr::col((product::Entity, product::Column::HargaKonsumen)),
        Alias::new("INTEGER"),
    ))
}

fn apply_catalog_filter(mut select: Select<product::Entity>, catalog: &ProductFilter) -> Select<product::Entity> {
    if let Some(category_id) = catalog.category_id {
        select = select.filter(product::Column::IdCategory.eq(category_id));
    }
    if let Some(toko_id) = catalog.toko_id {
        select = select.filter(product::Column::IdToko.eq(toko_id));
    }
    if let Some(min) = catalog.min_harga {
        select = select.filter(price_column().gte(min));
    }
    if let Some(max) = catalog.max_harga {
        select = select.filter(price_column().lte(max));
    }
    select
}

pub async fn list(
    db: &DatabaseConnection,
    filter: &Filter,
    catalog: &ProductFilter,
) -> ApiResult<Paginated<ProductDetails>> {
    if let (Some(min), Some(max)) = (catalog.min_harga, catalog.max_harga) {
        if min > max {
            return Err(ApiError::bad_request(
                "min_harga: This field must not exceed max_harga",
            ));
        }
    }

    let select = apply_filter(
        apply_catalog_filter(product::Entity::find(), catalog),
        filter,
        ListColumns {
            keyword: product::Column::NamaProduk,
            created: product::Column::CreatedAtDate,
            updated: product::Column::UpdatedAtDate,
        },
    )?;
    let (total, rows) = fetch_page(db, select, filter).await?;
    let rows = load_details(db, rows).await?;
    Ok(Paginated::new(filter, total, rows))
}

/// Writes each photo to disk and records it. Files written before a failure
/// are removed again.
async fn store_photos<C: ConnectionTrait>(
    conn: &C,
    media: &MediaStore,
    product_id: i32,
    photos: &[UploadedFile],
) -> ApiResult<Vec<String>> {
    let stamp = Utc::now().timestamp_micros();
    let mut saved = Vec::with_capacity(photos.len());

    for (offset, photo) in photos.iter().enumerate() {
        let result = async {
            let name = format!("{}_{}{}", product_id, stamp + offset as i64, photo.image_extension()?);
            let url = media.save(PHOTO_FOLDER, &name, &photo.bytes).await?;
            saved.push(url.clone());
            product_photo::ActiveModel {
                id_produk: Set(product_id),
                url: Set(url),
                ..Default::default()
            }
            .insert(conn)
            .await?;
            Ok::<_, ApiError>(())
        }
        .await;

        if let Err(e) = result {
            for url in &saved {
                media.remove(url).await;
            }
            return Err(e);
        }
    }
    Ok(saved)
}

/// Photo URLs of every product listed by the shop.
pub(crate) async fn shop_photo_urls<C: ConnectionTrait>(conn: &C, shop_id: i32) -> ApiResult<Vec<String>> {
    Ok(product_photo::Entity::find()
        .inner_join(product::Entity)
        .filter(product::Column::IdToko.eq(shop_id))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| p.url)
        .collect())
}

pub(crate) async fn remove_files(media: &MediaStore, urls: &[String]) {
    for url in urls {
        media.remove(url).await;
    }
}

/// Lists a product in the caller's shop.
pub async fn create(
    db: &DatabaseConnection,
    media: &MediaStore,
    owner_id: i32,
    input: NewProduct,
    photos: Vec<UploadedFile>,
) -> ApiResult<ProductDetails> {
    let shop = shops::my_shop(db, owner_id).await?;
    categories::find(db, input.category_id).await?;
    for photo in &photos {
        photo.image_extension()?;
    }

    let slug = slug_or_default(input.slug, &input.nama_produk);
    let txn = db.begin().await?;
    let created = product::ActiveModel {
        nama_produk: Set(input.nama_produk),
        slug: Set(slug),
        harga_reseller: Set(input.harga_reseller.to_string()),
        harga_konsumen: Set(input.harga_konsumen.to_string()),
        stok: Set(input.stok),
        deskripsi: Set(input.deskripsi),
        id_toko: Set(shop.id),
        id_category: Set(input.category_id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let saved = store_photos(&txn, media, created.id, &photos).await?;
    if let Err(e) = txn.commit().await {
        remove_files(media, &saved).await;
        return Err(e.into());
    }

    info!(product_id = created.id, shop_id = shop.id, photos = saved.len(), "product created");
    details(db, created.id).await
}

async fn find_owned(
    db: &DatabaseConnection,
    id: i32,
    requester_id: i32,
    is_admin: bool,
) -> ApiResult<product::Model> {
    let found = find(db, id).await?;
    let requester_shop = shops::find_by_owner(db, requester_id).await?.map(|s| s.id);
    ensure_owner(found.id_toko, requester_shop, is_admin, NOT_FOUND)?;
    Ok(found)
}

/// Partial update. A non-empty `photos` replaces every existing photo.
pub async fn update(
    db: &DatabaseConnection,
    media: &MediaStore,
    id: i32,
    requester_id: i32,
    is_admin: bool,
    changes: ProductChanges,
    photos: Vec<UploadedFile>,
) -> ApiResult<ProductDetails> {
    let current = find_owned(db, id, requester_id, is_admin).await?;
    if let Some(category_id) = changes.category_id {
        categories::find(db, category_id).await?;
    }
    for photo in &photos {
        photo.image_extension()?;
    }

    let txn = db.begin().await?;
    let old_photos = if photos.is_empty() {
        Vec::new()
    } else {
        current.find_related(product_photo::Entity).all(&txn).await?
    };

    let mut active = current.into_active_model();
    if let Some(nama_produk) = changes.nama_produk {
        active.nama_produk = Set(nama_produk);
    }
    if let Some(slug) = changes.slug.filter(|s| !s.trim().is_empty()) {
        active.slug = Set(slug.trim().to_string());
    }
    if let Some(category_id) = changes.category_id {
        active.id_category = Set(category_id);
    }
    if let Some(price) = changes.harga_reseller {
        active.harga_reseller = Set(price.to_string());
    }
    if let Some(price) = changes.harga_konsumen {
        active.harga_konsumen = Set(price.to_string());
    }
    if let Some(stok) = changes.stok {
        active.stok = Set(stok);
    }
    if let Some(deskripsi) = changes.deskripsi {
        active.deskripsi = Set(deskripsi);
    }
    let updated = active.update(&txn).await?;

    let mut saved = Vec::new();
    if !photos.is_empty() {
        product_photo::Entity::delete_many()
            .filter(product_photo::Column::IdProduk.eq(updated.id))
            .exec(&txn)
            .await?;
        saved = store_photos(&txn, media, updated.id, &photos).await?;
    }

    if let Err(e) = txn.commit().await {
        remove_files(media, &saved).await;
        return Err(e.into());
    }

    let replaced: Vec<String> = old_photos.into_iter().map(|p| p.url).collect();
    remove_files(media, &replaced).await;
    debug!(product_id = updated.id, replaced_photos = replaced.len(), "product updated");
    details(db, updated.id).await
}

/// Deletes the product, its photo rows and their files. Order snapshots are
/// left untouched.
pub async fn delete(
    db: &DatabaseConnection,
    media: &MediaStore,
    id: i32,
    requester_id: i32,
    is_admin: bool,
) -> ApiResult<()> {
    let current = find_owned(db, id, requester_id, is_admin).await?;
    let photos: Vec<String> = current
        .find_related(product_photo::Entity)
        .all(db)
        .await?
        .into_iter()
        .map(|p| p.url)
        .collect();

    let result = product::Entity::delete_by_id(current.id).exec(db).await?;
    if result.rows_affected == 0 {
        warn!(product_id = id, "product vanished before delete");
        return Err(ApiError::not_found(NOT_FOUND));
    }
    remove_files(media, &photos).await;
    info!(product_id = id, "product deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_defaults_to_name() {
        assert_eq!(slug_or_default(None, "Kemeja Batik"), "kemeja-batik");
        assert_eq!(slug_or_default(Some("  ".into()), "Kemeja Batik"), "kemeja-batik");
        assert_eq!(slug_or_default(Some("custom".into()), "Kemeja Batik"), "custom");
    }

    #[test]
    fn price_errors_name_the_field() {
        let err = parse_price("harga_konsumen", "abc").unwrap_err();
        assert_eq!(
            err.messages(),
            &["harga_konsumen: 'abc' is not a whole number".to_string()]
        );
        assert_eq!(parse_price("harga_reseller", " 1500 ").unwrap().amount(), 1500);
    }
}
