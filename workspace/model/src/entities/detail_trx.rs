use sea_orm::entity::prelude::*;

/// One order line, priced from its `log_produk` snapshot.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "detail_trx")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub id_trx: i32,
    pub id_log_produk: i32,
    pub id_toko: i32,
    pub kuantitas: i32,
    pub harga_total: i64,
    pub created_at_date: DateTimeUtc,
    pub updated_at_date: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::trx::Entity",
        from = "Column::IdTrx",
        to = "super::trx::Column::Id",
        on_delete = "Cascade"
    )]
    Trx,
    #[sea_orm(
        belongs_to = "super::log_produk::Entity",
        from = "Column::IdLogProduk",
        to = "super::log_produk::Column::Id",
        on_delete = "Restrict"
    )]
    LogProduk,
}

impl Related<super::trx::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Trx.def()
    }
}

impl Related<super::log_produk::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LogProduk.def()
    }
}

crate::timestamped!();
