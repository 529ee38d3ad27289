use sea_orm_migration::{prelude::*, schema::*};

use super::m20240601_000001_create_accounts_and_catalog::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Trx::Table)
                    .if_not_exists()
                    .col(pk_auto(Trx::Id))
                    .col(integer(Trx::IdUser))
                    .col(integer(Trx::AlamatPengiriman))
                    .col(big_integer(Trx::HargaTotal))
                    .col(string(Trx::KodeInvoice))
                    .col(string(Trx::MethodBayar))
                    .col(timestamp_with_time_zone(Trx::CreatedAtDate))
                    .col(timestamp_with_time_zone(Trx::UpdatedAtDate))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trx_user")
                            .from(Trx::Table, Trx::IdUser)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Snapshots intentionally reference nothing.
        manager
            .create_table(
                Table::create()
                    .table(LogProduk::Table)
                    .if_not_exists()
                    .col(pk_auto(LogProduk::Id))
                    .col(integer(LogProduk::IdProduk))
                    .col(string(LogProduk::NamaProduk))
                    .col(string(LogProduk::Slug))
                    .col(string(LogProduk::HargaReseller))
                    .col(string(LogProduk::HargaKonsumen))
                    .col(text(LogProduk::Deskripsi))
                    .col(integer(LogProduk::IdToko))
                    .col(integer(LogProduk::IdCategory))
                    .col(timestamp_with_time_zone(LogProduk::CreatedAtDate))
                    .col(timestamp_with_time_zone(LogProduk::UpdatedAtDate))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DetailTrx::Table)
                    .if_not_exists()
                    .col(pk_auto(DetailTrx::Id))
                    .col(integer(DetailTrx::IdTrx))
                    .col(integer(DetailTrx::IdLogProduk))
                    .col(integer(DetailTrx::IdToko))
                    .col(integer(DetailTrx::Kuantitas))
                    .col(big_integer(DetailTrx::HargaTotal))
                    .col(timestamp_with_time_zone(DetailTrx::CreatedAtDate))
                    .col(timestamp_with_time_zone(DetailTrx::UpdatedAtDate))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_detail_trx_trx")
                            .from(DetailTrx::Table, DetailTrx::IdTrx)
                            .to(Trx::Table, Trx::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_detail_trx_log_produk")
                            .from(DetailTrx::Table, DetailTrx::IdLogProduk)
                            .to(LogProduk::Table, LogProduk::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_trx_id_user")
                    .table(Trx::Table)
                    .col(Trx::IdUser)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DetailTrx::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(LogProduk::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Trx::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Trx {
    Table,
    Id,
    IdUser,
    AlamatPengiriman,
    HargaTotal,
    KodeInvoice,
    MethodBayar,
    CreatedAtDate,
    UpdatedAtDate,
}

#[derive(DeriveIden)]
enum LogProduk {
    Table,
    Id,
    IdProduk,
    NamaProduk,
    Slug,
    HargaReseller,
    HargaKonsumen,
    Deskripsi,
    IdToko,
    IdCategory,
    CreatedAtDate,
    UpdatedAtDate,
}

#[derive(DeriveIden)]
enum DetailTrx {
    Table,
    Id,
    IdTrx,
    IdLogProduk,
    IdToko,
    Kuantitas,
    HargaTotal,
    CreatedAtDate,
    UpdatedAtDate,
}
