pub use sea_orm_migration::prelude::*;

mod m20240601_000001_create_accounts_and_catalog;
mod m20240601_000002_create_trx;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_accounts_and_catalog::Migration),
            Box::new(m20240601_000002_create_trx::Migration),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Database;

    #[tokio::test]
    async fn migrations_apply_and_roll_back() -> Result<(), DbErr> {
        let db = Database::connect("sqlite::memory:").await?;
        Migrator::up(&db, None).await?;

        let manager = SchemaManager::new(&db);
        for table in [
            "user",
            "invalid_token",
            "toko",
            "category",
            "produk",
            "foto_produk",
            "alamat",
            "trx",
            "log_produk",
            "detail_trx",
        ] {
            assert!(manager.has_table(table).await?, "missing table {table}");
        }

        Migrator::down(&db, None).await?;
        assert!(!manager.has_table("user").await?);
        Ok(())
    }
}
