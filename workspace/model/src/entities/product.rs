use sea_orm::entity::prelude::*;

/// A product listed by a shop.
///
/// Prices are kept as the decimal text the client sent; parsing happens in
/// `common::Price`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "produk")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub nama_produk: String,
    pub slug: String,
    pub harga_reseller: String,
    pub harga_konsumen: String,
    pub stok: i32,
    #[sea_orm(column_type = "Text")]
    pub deskripsi: String,
    pub id_toko: i32,
    pub id_category: i32,
    pub created_at_date: DateTimeUtc,
    pub updated_at_date: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::shop::Entity",
        from = "Column::IdToko",
        to = "super::shop::Column::Id",
        on_delete = "Cascade"
    )]
    Shop,
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::IdCategory",
        to = "super::category::Column::Id",
        on_delete = "Restrict"
    )]
    Category,
    #[sea_orm(has_many = "super::product_photo::Entity")]
    Photo,
}

impl Related<super::shop::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shop.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::product_photo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Photo.def()
    }
}

crate::timestamped!();
