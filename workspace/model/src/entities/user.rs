use sea_orm::entity::prelude::*;

/// A marketplace account. `notelp` doubles as the login name.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub nama: String,
    /// Argon2 PHC string, never the plain password.
    pub kata_sandi: String,
    #[sea_orm(unique)]
    pub notelp: String,
    pub tanggal_lahir: Option<Date>,
    pub jenis_kelamin: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub tentang: Option<String>,
    pub pekerjaan: Option<String>,
    pub email: String,
    pub id_provinsi: Option<String>,
    pub id_kota: Option<String>,
    pub is_admin: bool,
    pub created_at_date: DateTimeUtc,
    pub updated_at_date: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::shop::Entity")]
    Shop,
    #[sea_orm(has_many = "super::address::Entity")]
    Address,
    #[sea_orm(has_many = "super::trx::Entity")]
    Trx,
}

impl Related<super::shop::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shop.def()
    }
}

impl Related<super::address::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Address.def()
    }
}

impl Related<super::trx::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Trx.def()
    }
}

crate::timestamped!();
