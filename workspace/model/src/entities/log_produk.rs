use sea_orm::entity::prelude::*;

/// Copy of a product taken when it was ordered.
///
/// Deliberately carries no foreign keys: the source product, shop or
/// category can be edited or deleted and the snapshot stays as it was.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "log_produk")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub id_produk: i32,
    pub nama_produk: String,
    pub slug: String,
    pub harga_reseller: String,
    pub harga_konsumen: String,
    #[sea_orm(column_type = "Text")]
    pub deskripsi: String,
    pub id_toko: i32,
    pub id_category: i32,
    pub created_at_date: DateTimeUtc,
    pub updated_at_date: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::detail_trx::Entity")]
    DetailTrx,
}

impl Related<super::detail_trx::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DetailTrx.def()
    }
}

crate::timestamped!();
