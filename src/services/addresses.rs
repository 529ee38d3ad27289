use common::{Filter, Paginated};
use model::entities::{address, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait,
    QueryFilter, Set,
};
use tracing::debug;

use super::{apply_filter, fetch_page, ListColumns};
use crate::error::{ApiError, ApiResult};
use crate::policy::{ensure_owner, owner_scope};

pub const SORTABLE_COLUMNS: &[&str] = &["judul_alamat", "created_at_date", "updated_at_date"];
pub const NOT_FOUND: &str = "Failed, address not found";

#[derive(Debug, Clone)]
pub struct NewAddress {
    pub no_telp: Option<String>,
    pub judul_alamat: String,
    pub nama_penerima: String,
    pub detail_alamat: String,
}

#[derive(Debug, Clone, Default)]
pub struct AddressChanges {
    pub no_telp: Option<String>,
    pub judul_alamat: Option<String>,
    pub nama_penerima: Option<String>,
    pub detail_alamat: Option<String>,
}

/// The phone number falls back to the owner's own number.
pub async fn create(db: &DatabaseConnection, owner: &user::Model, input: NewAddress) -> ApiResult<address::Model> {
    let no_telp = input
        .no_telp
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| owner.notelp.clone());

    let created = address::ActiveModel {
        id_user: Set(owner.id),
        judul_alamat: Set(input.judul_alamat),
        nama_penerima: Set(input.nama_penerima),
        no_telp: Set(no_telp),
        detail_alamat: Set(input.detail_alamat),
        ..Default::default()
    }
    .insert(db)
    .await?;
    debug!(address_id = created.id, user_id = owner.id, "address created");
    Ok(created)
}

pub async fn find_owned(
    db: &DatabaseConnection,
    id: i32,
    requester_id: i32,
    is_admin: bool,
) -> ApiResult<address::Model> {
    let found = address::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    ensure_owner(found.id_user, Some(requester_id), is_admin, NOT_FOUND)?;
    Ok(found)
}

pub async fn list(
    db: &DatabaseConnection,
    requester_id: i32,
    is_admin: bool,
    filter: &Filter,
) -> ApiResult<Paginated<address::Model>> {
    let mut select = address::Entity::find();
    if let Some(owner) = owner_scope(requester_id, is_admin) {
        select = select.filter(address::Column::IdUser.eq(owner));
    }
    let select = apply_filter(
        select,
        filter,
        ListColumns {
            keyword: address::Column::JudulAlamat,
            created: address::Column::CreatedAtDate,
            updated: address::Column::UpdatedAtDate,
        },
    )?;
    let (total, rows) = fetch_page(db, select, filter).await?;
    Ok(Paginated::new(filter, total, rows))
}

pub async fn update(
    db: &DatabaseConnection,
    id: i32,
    requester_id: i32,
    is_admin: bool,
    changes: AddressChanges,
) -> ApiResult<address::Model> {
    let mut active = find_owned(db, id, requester_id, is_admin)
        .await?
        .into_active_model();

    if let Some(no_telp) = changes.no_telp {
        active.no_telp = Set(no_telp);
    }
    if let Some(judul_alamat) = changes.judul_alamat {
        active.judul_alamat = Set(judul_alamat);
    }
    if let Some(nama_penerima) = changes.nama_penerima {
        active.nama_penerima = Set(nama_penerima);
    }
    if let Some(detail_alamat) = changes.detail_alamat {
        active.detail_alamat = Set(detail_alamat);
    }

    Ok(active.update(db).await?)
}

pub async fn delete(db: &DatabaseConnection, id: i32, requester_id: i32, is_admin: bool) -> ApiResult<()> {
    let found = find_owned(db, id, requester_id, is_admin).await?;
    found.delete(db).await?;
    Ok(())
}
