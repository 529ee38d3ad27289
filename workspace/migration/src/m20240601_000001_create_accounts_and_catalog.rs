use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(pk_auto(User::Id))
                    .col(string(User::Nama))
                    .col(string(User::KataSandi))
                    .col(string(User::Notelp).unique_key())
                    .col(date_null(User::TanggalLahir))
                    .col(string_null(User::JenisKelamin))
                    .col(text_null(User::Tentang))
                    .col(string_null(User::Pekerjaan))
                    .col(string(User::Email))
                    .col(string_null(User::IdProvinsi))
                    .col(string_null(User::IdKota))
                    .col(boolean(User::IsAdmin).default(false))
                    .col(timestamp_with_time_zone(User::CreatedAtDate))
                    .col(timestamp_with_time_zone(User::UpdatedAtDate))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(InvalidToken::Table)
                    .if_not_exists()
                    .col(pk_auto(InvalidToken::Id))
                    .col(text(InvalidToken::Token).unique_key())
                    .col(timestamp_with_time_zone(InvalidToken::Expires))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Toko::Table)
                    .if_not_exists()
                    .col(pk_auto(Toko::Id))
                    .col(integer(Toko::IdUser).unique_key())
                    .col(string(Toko::NamaToko))
                    .col(string_null(Toko::UrlFoto))
                    .col(timestamp_with_time_zone(Toko::CreatedAtDate))
                    .col(timestamp_with_time_zone(Toko::UpdatedAtDate))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_toko_user")
                            .from(Toko::Table, Toko::IdUser)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Category::Table)
                    .if_not_exists()
                    .col(pk_auto(Category::Id))
                    .col(string(Category::NamaCategory).unique_key())
                    .col(timestamp_with_time_zone(Category::CreatedAtDate))
                    .col(timestamp_with_time_zone(Category::UpdatedAtDate))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Produk::Table)
                    .if_not_exists()
                    .col(pk_auto(Produk::Id))
                    .col(string(Produk::NamaProduk))
                    .col(string(Produk::Slug))
                    .col(string(Produk::HargaReseller))
                    .col(string(Produk::HargaKonsumen))
                    .col(integer(Produk::Stok).default(0))
                    .col(text(Produk::Deskripsi))
                    .col(integer(Produk::IdToko))
                    .col(integer(Produk::IdCategory))
                    .col(timestamp_with_time_zone(Produk::CreatedAtDate))
                    .col(timestamp_with_time_zone(Produk::UpdatedAtDate))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_produk_toko")
                            .from(Produk::Table, Produk::IdToko)
                            .to(Toko::Table, Toko::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_produk_category")
                            .from(Produk::Table, Produk::IdCategory)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_produk_id_toko")
                    .table(Produk::Table)
                    .col(Produk::IdToko)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FotoProduk::Table)
                    .if_not_exists()
                    .col(pk_auto(FotoProduk::Id))
                    .col(integer(FotoProduk::IdProduk))
                    .col(string(FotoProduk::Url))
                    .col(timestamp_with_time_zone(FotoProduk::CreatedAtDate))
                    .col(timestamp_with_time_zone(FotoProduk::UpdatedAtDate))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_foto_produk_produk")
                            .from(FotoProduk::Table, FotoProduk::IdProduk)
                            .to(Produk::Table, Produk::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Alamat::Table)
                    .if_not_exists()
                    .col(pk_auto(Alamat::Id))
                    .col(integer(Alamat::IdUser))
                    .col(string(Alamat::JudulAlamat))
                    .col(string(Alamat::NamaPenerima))
                    .col(string(Alamat::NoTelp))
                    .col(text(Alamat::DetailAlamat))
                    .col(timestamp_with_time_zone(Alamat::CreatedAtDate))
                    .col(timestamp_with_time_zone(Alamat::UpdatedAtDate))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_alamat_user")
                            .from(Alamat::Table, Alamat::IdUser)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Children first so foreign keys never dangle
        manager
            .drop_table(Table::drop().table(Alamat::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(FotoProduk::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Produk::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Category::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Toko::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(InvalidToken::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum User {
    Table,
    Id,
    Nama,
    KataSandi,
    Notelp,
    TanggalLahir,
    JenisKelamin,
    Tentang,
    Pekerjaan,
    Email,
    IdProvinsi,
    IdKota,
    IsAdmin,
    CreatedAtDate,
    UpdatedAtDate,
}

#[derive(DeriveIden)]
enum InvalidToken {
    Table,
    Id,
    Token,
    Expires,
}

#[derive(DeriveIden)]
enum Toko {
    Table,
    Id,
    IdUser,
    NamaToko,
    UrlFoto,
    CreatedAtDate,
    UpdatedAtDate,
}

#[derive(DeriveIden)]
enum Category {
    Table,
    Id,
    NamaCategory,
    CreatedAtDate,
    UpdatedAtDate,
}

#[derive(DeriveIden)]
enum Produk {
    Table,
    Id,
    NamaProduk,
    Slug,
    HargaReseller,
    HargaKonsumen,
    Stok,
    Deskripsi,
    IdToko,
    IdCategory,
    CreatedAtDate,
    UpdatedAtDate,
}

#[derive(DeriveIden)]
enum FotoProduk {
    Table,
    Id,
    IdProduk,
    Url,
    CreatedAtDate,
    UpdatedAtDate,
}

#[derive(DeriveIden)]
enum Alamat {
    Table,
    Id,
    IdUser,
    JudulAlamat,
    NamaPenerima,
    NoTelp,
    DetailAlamat,
    CreatedAtDate,
    UpdatedAtDate,
}
