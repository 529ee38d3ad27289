use sea_orm::entity::prelude::*;

/// An order header. Line items live in `detail_trx`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "trx")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub id_user: i32,
    /// Address id at order time. Not a foreign key: the address may be
    /// deleted later without touching the order.
    pub alamat_pengiriman: i32,
    pub harga_total: i64,
    pub kode_invoice: String,
    pub method_bayar: String,
    pub created_at_date: DateTimeUtc,
    pub updated_at_date: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::IdUser",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::detail_trx::Entity")]
    DetailTrx,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::detail_trx::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DetailTrx.def()
    }
}

crate::timestamped!();
