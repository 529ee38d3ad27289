use chrono::Utc;
use common::{Filter, Paginated};
use model::entities::shop;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};
use tracing::{debug, info};

use super::{apply_filter, fetch_page, products, ListColumns};
use crate::error::{ApiError, ApiResult};
use crate::policy::ensure_owner;
use crate::uploads::{MediaStore, UploadedFile};

pub const SORTABLE_COLUMNS: &[&str] = &["nama_toko", "created_at_date", "updated_at_date"];
pub const NOT_FOUND: &str = "Failed, shop not found";
pub const PHOTO_FOLDER: &str = "shops";

pub async fn find(db: &DatabaseConnection, id: i32) -> ApiResult<shop::Model> {
    shop::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

pub async fn find_by_owner(db: &DatabaseConnection, user_id: i32) -> ApiResult<Option<shop::Model>> {
    Ok(shop::Entity::find()
        .filter(shop::Column::IdUser.eq(user_id))
        .one(db)
        .await?)
}

pub async fn my_shop(db: &DatabaseConnection, user_id: i32) -> ApiResult<shop::Model> {
    find_by_owner(db, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

pub async fn list(db: &DatabaseConnection, filter: &Filter) -> ApiResult<Paginated<shop::Model>> {
    let select = apply_filter(
        shop::Entity::find(),
        filter,
        ListColumns {
            keyword: shop::Column::NamaToko,
            created: shop::Column::CreatedAtDate,
            updated: shop::Column::UpdatedAtDate,
        },
    )?;
    let (total, rows) = fetch_page(db, select, filter).await?;
    Ok(Paginated::new(filter, total, rows))
}

/// Opens a shop for a user that does not have one yet.
pub async fn create(db: &DatabaseConnection, user_id: i32, nama_toko: String) -> ApiResult<shop::Model> {
    if find_by_owner(db, user_id).await?.is_some() {
        return Err(ApiError::conflict("User already has a shop"));
    }
    let created = shop::ActiveModel {
        id_user: Set(user_id),
        nama_toko: Set(nama_toko),
        url_foto: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(shop_id = created.id, user_id, "shop opened");
    Ok(created)
}

/// Renames the shop and, when given, replaces its photo.
pub async fn update(
    db: &DatabaseConnection,
    media: &MediaStore,
    id: i32,
    requester_id: i32,
    is_admin: bool,
    nama_toko: Option<String>,
    photo: Option<UploadedFile>,
) -> ApiResult<shop::Model> {
    let current = find(db, id).await?;
    ensure_owner(current.id_user, Some(requester_id), is_admin, NOT_FOUND)?;

    let stored = match &photo {
        Some(file) => {
            let extension = file.image_extension()?;
            let name = format!(
                "shop_{}_{}_{}{}",
                current.id,
                Utc::now().timestamp(),
                requester_id,
                extension
            );
            Some(media.save(PHOTO_FOLDER, &name, &file.bytes).await?)
        }
        None => None,
    };

    let previous_photo = current.url_foto.clone();
    let mut active = current.into_active_model();
    if let Some(nama_toko) = nama_toko {
        active.nama_toko = Set(nama_toko);
    }
    if let Some(url) = &stored {
        active.url_foto = Set(Some(url.clone()));
    }

    let updated = match active.update(db).await {
        Ok(updated) => updated,
        Err(e) => {
            if let Some(url) = &stored {
                media.remove(url).await;
            }
            return Err(e.into());
        }
    };

    // Two uploads within one second reuse the file name.
    if let (Some(new), Some(old)) = (&stored, previous_photo) {
        if *new != old {
            media.remove(&old).await;
        }
    }
    debug!(shop_id = updated.id, "shop updated");
    Ok(updated)
}

/// Products of the shop go with it.
pub async fn delete(
    db: &DatabaseConnection,
    media: &MediaStore,
    id: i32,
    requester_id: i32,
    is_admin: bool,
) -> ApiResult<()> {
    let current = find(db, id).await?;
    ensure_owner(current.id_user, Some(requester_id), is_admin, NOT_FOUND)?;

    let mut files = products::shop_photo_urls(db, current.id).await?;
    files.extend(current.url_foto.clone());

    shop::Entity::delete_by_id(current.id).exec(db).await?;
    products::remove_files(media, &files).await;
    info!(shop_id = id, files = files.len(), "shop deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{insert_category, insert_product, insert_shop, insert_user, setup_test_db};
    use model::entities::{product, product_photo};
    use std::path::PathBuf;
    use uuid::Uuid;

    fn media_root() -> PathBuf {
        std::env::temp_dir().join(format!("evermos-shops-{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn deleting_a_shop_removes_its_files() {
        let db = setup_test_db().await;
        let root = media_root();
        let media = MediaStore::new(&root);

        let owner = insert_user(&db, "0811", false).await;
        let shop = insert_shop(&db, owner.id, "Toko Batik").await;
        let category = insert_category(&db, "Pakaian").await;
        let kemeja = insert_product(&db, shop.id, category.id, "Kemeja", "10000").await;

        let logo = media.save(PHOTO_FOLDER, "logo.png", b"img").await.unwrap();
        let mut active = shop.clone().into_active_model();
        active.url_foto = Set(Some(logo));
        active.update(&db).await.unwrap();

        let photo = media.save(products::PHOTO_FOLDER, "kemeja.png", b"img").await.unwrap();
        product_photo::ActiveModel {
            id_produk: Set(kemeja.id),
            url: Set(photo),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let logo_path = root.join(PHOTO_FOLDER).join("logo.png");
        let photo_path = root.join(products::PHOTO_FOLDER).join("kemeja.png");
        assert!(logo_path.exists());
        assert!(photo_path.exists());

        delete(&db, &media, shop.id, owner.id, false).await.unwrap();

        assert!(!logo_path.exists());
        assert!(!photo_path.exists());
        assert!(product::Entity::find_by_id(kemeja.id).one(&db).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn other_shops_keep_their_files() {
        let db = setup_test_db().await;
        let root = media_root();
        let media = MediaStore::new(&root);

        let owner = insert_user(&db, "0811", false).await;
        let neighbour = insert_user(&db, "0822", false).await;
        let shop = insert_shop(&db, owner.id, "Toko Batik").await;
        let kept = insert_shop(&db, neighbour.id, "Toko Sepatu").await;
        let category = insert_category(&db, "Pakaian").await;
        let sepatu = insert_product(&db, kept.id, category.id, "Sepatu", "25000").await;

        let photo = media.save(products::PHOTO_FOLDER, "sepatu.png", b"img").await.unwrap();
        product_photo::ActiveModel {
            id_produk: Set(sepatu.id),
            url: Set(photo),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let err = delete(&db, &media, shop.id, neighbour.id, false).await.unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);

        delete(&db, &media, shop.id, owner.id, false).await.unwrap();
        assert!(root.join(products::PHOTO_FOLDER).join("sepatu.png").exists());
        assert!(find(&db, kept.id).await.is_ok());
    }
}
