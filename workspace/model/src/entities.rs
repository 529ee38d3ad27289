//! SeaORM entities of the marketplace schema.
//!
//! Table and column names follow the public API vocabulary (`toko`, `produk`,
//! `alamat`, `trx`, ...) so JSON fields and columns line up one to one.

/// Stamps `created_at_date` on insert and `updated_at_date` on every save.
#[macro_export]
macro_rules! timestamped {
    () => {
        #[async_trait::async_trait]
        impl sea_orm::ActiveModelBehavior for ActiveModel {
            async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, sea_orm::DbErr>
            where
                C: sea_orm::ConnectionTrait,
            {
                let now = chrono::Utc::now();
                if insert {
                    self.created_at_date = sea_orm::ActiveValue::Set(now);
                }
                self.updated_at_date = sea_orm::ActiveValue::Set(now);
                Ok(self)
            }
        }
    };
}

pub mod address;
pub mod category;
pub mod detail_trx;
pub mod invalid_token;
pub mod log_produk;
pub mod product;
pub mod product_photo;
pub mod shop;
pub mod trx;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::address::Entity as Address;
    pub use super::category::Entity as Category;
    pub use super::detail_trx::Entity as DetailTrx;
    pub use super::invalid_token::Entity as InvalidToken;
    pub use super::log_produk::Entity as LogProduk;
    pub use super::product::Entity as Product;
    pub use super::product_photo::Entity as ProductPhoto;
    pub use super::shop::Entity as Shop;
    pub use super::trx::Entity as Trx;
    pub use super::user::Entity as User;
}

#[cfg(test)]
mod test {
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait,
        IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter, Set,
    };

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        let db = Database::connect("sqlite::memory:").await?;
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;
        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    async fn seed_user(db: &DatabaseConnection, phone: &str) -> Result<user::Model, DbErr> {
        user::ActiveModel {
            nama: Set("Siti".to_string()),
            kata_sandi: Set("hash".to_string()),
            notelp: Set(phone.to_string()),
            email: Set(format!("{phone}@mail.test")),
            is_admin: Set(false),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    #[tokio::test]
    async fn test_timestamps_are_managed_on_save() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let created = seed_user(&db, "0811").await?;
        assert_eq!(created.created_at_date, created.updated_at_date);

        let mut active = created.clone().into_active_model();
        active.nama = Set("Siti Aminah".to_string());
        let updated = active.update(&db).await?;

        assert_eq!(updated.created_at_date, created.created_at_date);
        assert!(updated.updated_at_date >= created.updated_at_date);
        Ok(())
    }

    #[tokio::test]
    async fn test_phone_number_is_unique() -> Result<(), DbErr> {
        let db = setup_db().await?;
        seed_user(&db, "0812").await?;
        assert!(seed_user(&db, "0812").await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_product_cascade_and_snapshot_survival() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let owner = seed_user(&db, "0813").await?;

        let toko = shop::ActiveModel {
            id_user: Set(owner.id),
            nama_toko: Set("Toko Siti".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let kategori = category::ActiveModel {
            nama_category: Set("Batik".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let produk = product::ActiveModel {
            nama_produk: Set("Kemeja".to_string()),
            slug: Set("kemeja".to_string()),
            harga_reseller: Set("8000".to_string()),
            harga_konsumen: Set("10000".to_string()),
            stok: Set(4),
            deskripsi: Set("Kemeja batik".to_string()),
            id_toko: Set(toko.id),
            id_category: Set(kategori.id),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        product_photo::ActiveModel {
            id_produk: Set(produk.id),
            url: Set("/uploads/products/1.png".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let snapshot = log_produk::ActiveModel {
            id_produk: Set(produk.id),
            nama_produk: Set(produk.nama_produk.clone()),
            slug: Set(produk.slug.clone()),
            harga_reseller: Set(produk.harga_reseller.clone()),
            harga_konsumen: Set(produk.harga_konsumen.clone()),
            deskripsi: Set(produk.deskripsi.clone()),
            id_toko: Set(produk.id_toko),
            id_category: Set(produk.id_category),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Category is still referenced.
        assert!(kategori.clone().delete(&db).await.is_err());

        produk.delete(&db).await?;

        assert_eq!(ProductPhoto::find().count(&db).await?, 0);
        let kept = LogProduk::find_by_id(snapshot.id).one(&db).await?;
        assert_eq!(kept, Some(snapshot));
        Ok(())
    }

    #[tokio::test]
    async fn test_deleting_user_removes_owned_rows() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let owner = seed_user(&db, "0814").await?;

        shop::ActiveModel {
            id_user: Set(owner.id),
            nama_toko: Set("Toko".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        address::ActiveModel {
            id_user: Set(owner.id),
            judul_alamat: Set("Rumah".to_string()),
            nama_penerima: Set("Siti".to_string()),
            no_telp: Set(owner.notelp.clone()),
            detail_alamat: Set("Jl. Melati 1".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        User::delete_by_id(owner.id).exec(&db).await?;

        assert_eq!(Shop::find().count(&db).await?, 0);
        assert_eq!(
            Address::find()
                .filter(address::Column::IdUser.eq(owner.id))
                .count(&db)
                .await?,
            0
        );
        Ok(())
    }
}
