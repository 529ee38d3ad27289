use chrono::NaiveDate;
use common::{Filter, Paginated};
use model::entities::user;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};
use tracing::info;

use super::{apply_filter, fetch_page, products, shops, ListColumns};
use crate::error::{ApiError, ApiResult};
use crate::services::auth::hash_password;
use crate::uploads::MediaStore;

pub const SORTABLE_COLUMNS: &[&str] = &["nama", "created_at_date", "updated_at_date"];
pub const NOT_FOUND: &str = "Failed, user not found";

/// Replacement profile submitted by the account owner.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub nama: String,
    pub kata_sandi: String,
    pub no_telp: String,
    pub tanggal_lahir: Option<NaiveDate>,
    pub jenis_kelamin: Option<String>,
    pub tentang: Option<String>,
    pub pekerjaan: Option<String>,
    pub email: String,
    pub id_provinsi: Option<String>,
    pub id_kota: Option<String>,
    pub is_admin: Option<bool>,
}

pub async fn find(db: &DatabaseConnection, id: i32) -> ApiResult<user::Model> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

/// `caller_is_admin` decides whether `is_admin` in the update is honored.
pub async fn update_profile(
    db: &DatabaseConnection,
    id: i32,
    caller_is_admin: bool,
    update: ProfileUpdate,
) -> ApiResult<user::Model> {
    let current = find(db, id).await?;

    if current.notelp != update.no_telp {
        let taken = user::Entity::find()
            .filter(user::Column::Notelp.eq(&update.no_telp))
            .one(db)
            .await?;
        if taken.is_some() {
            return Err(ApiError::conflict("Phone number is already registered"));
        }
    }

    let mut active = current.into_active_model();
    active.nama = Set(update.nama);
    active.kata_sandi = Set(hash_password(&update.kata_sandi)?);
    active.notelp = Set(update.no_telp);
    active.email = Set(update.email);
    if update.tanggal_lahir.is_some() {
        active.tanggal_lahir = Set(update.tanggal_lahir);
    }
    if update.jenis_kelamin.is_some() {
        active.jenis_kelamin = Set(update.jenis_kelamin);
    }
    if update.tentang.is_some() {
        active.tentang = Set(update.tentang);
    }
    if update.pekerjaan.is_some() {
        active.pekerjaan = Set(update.pekerjaan);
    }
    if update.id_provinsi.is_some() {
        active.id_provinsi = Set(update.id_provinsi);
    }
    if update.id_kota.is_some() {
        active.id_kota = Set(update.id_kota);
    }
    if let (true, Some(is_admin)) = (caller_is_admin, update.is_admin) {
        active.is_admin = Set(is_admin);
    }

    Ok(active.update(db).await?)
}

/// Removes the account. Its shop, products and their photos go with it.
pub async fn delete(db: &DatabaseConnection, media: &MediaStore, id: i32) -> ApiResult<()> {
    let mut files = Vec::new();
    if let Some(owned) = shops::find_by_owner(db, id).await? {
        files = products::shop_photo_urls(db, owned.id).await?;
        files.extend(owned.url_foto);
    }

    let result = user::Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(ApiError::not_found(NOT_FOUND));
    }
    products::remove_files(media, &files).await;
    info!(user_id = id, files = files.len(), "account deleted");
    Ok(())
}

pub async fn list(db: &DatabaseConnection, filter: &Filter) -> ApiResult<Paginated<user::Model>> {
    let select = apply_filter(
        user::Entity::find(),
        filter,
        ListColumns {
            keyword: user::Column::Nama,
            created: user::Column::CreatedAtDate,
            updated: user::Column::UpdatedAtDate,
        },
    )?;
    let (total, rows) = fetch_page(db, select, filter).await?;
    Ok(Paginated::new(filter, total, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{insert_category, insert_product, insert_shop, insert_user, setup_test_db};
    use model::entities::{product_photo, shop};
    use uuid::Uuid;

    #[tokio::test]
    async fn deleting_an_account_removes_its_shop_files() {
        let db = setup_test_db().await;
        let root = std::env::temp_dir().join(format!("evermos-users-{}", Uuid::new_v4()));
        let media = MediaStore::new(&root);

        let seller = insert_user(&db, "0811", false).await;
        let owned = insert_shop(&db, seller.id, "Toko Batik").await;
        let category = insert_category(&db, "Pakaian").await;
        let kemeja = insert_product(&db, owned.id, category.id, "Kemeja", "10000").await;

        let logo = media.save(shops::PHOTO_FOLDER, "logo.png", b"img").await.unwrap();
        let mut active = owned.clone().into_active_model();
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

        delete(&db, &media, seller.id).await.unwrap();

        assert!(!root.join(shops::PHOTO_FOLDER).join("logo.png").exists());
        assert!(!root.join(products::PHOTO_FOLDER).join("kemeja.png").exists());
        assert!(shop::Entity::find_by_id(owned.id).one(&db).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_a_missing_account_is_not_found() {
        let db = setup_test_db().await;
        let media = MediaStore::new(std::env::temp_dir().join(format!("evermos-users-{}", Uuid::new_v4())));

        let err = delete(&db, &media, 4242).await.unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);
    }
}
