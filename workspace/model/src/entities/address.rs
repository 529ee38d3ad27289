use sea_orm::entity::prelude::*;

/// A shipping address ("alamat") belonging to a user.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "alamat")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub id_user: i32,
    pub judul_alamat: String,
    pub nama_penerima: String,
    pub no_telp: String,
    #[sea_orm(column_type = "Text")]
    pub detail_alamat: String,
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
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

crate::timestamped!();
