use common::{Filter, Paginated};
use model::entities::{category, product};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, Set,
};
use tracing::info;

use super::{apply_filter, fetch_page, ListColumns};
use crate::error::{ApiError, ApiResult};

pub const SORTABLE_COLUMNS: &[&str] = &["nama_category", "created_at_date", "updated_at_date"];
pub const NOT_FOUND: &str = "Failed, category not found";

pub async fn create(db: &DatabaseConnection, nama_category: String) -> ApiResult<category::Model> {
    let created = category::ActiveModel {
        nama_category: Set(nama_category),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(category_id = created.id, "category created");
    Ok(created)
}

pub async fn find(db: &DatabaseConnection, id: i32) -> ApiResult<category::Model> {
    category::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

pub async fn list(db: &DatabaseConnection, filter: &Filter) -> ApiResult<Paginated<category::Model>> {
    let select = apply_filter(
        category::Entity::find(),
        filter,
        ListColumns {
            keyword: category::Column::NamaCategory,
            created: category::Column::CreatedAtDate,
            updated: category::Column::UpdatedAtDate,
        },
    )?;
    let (total, rows) = fetch_page(db, select, filter).await?;
    Ok(Paginated::new(filter, total, rows))
}

pub async fn update(db: &DatabaseConnection, id: i32, nama_category: String) -> ApiResult<category::Model> {
    let mut active = find(db, id).await?.into_active_model();
    active.nama_category = Set(nama_category);
    Ok(active.update(db).await?)
}

/// Refuses while products still point at the category.
pub async fn delete(db: &DatabaseConnection, id: i32) -> ApiResult<()> {
    let existing = find(db, id).await?;

    let in_use = product::Entity::find()
        .filter(product::Column::IdCategory.eq(existing.id))
        .count(db)
        .await?;
    if in_use > 0 {
        return Err(ApiError::conflict(format!(
            "Category is still used by {in_use} product(s)"
        )));
    }

    category::Entity::delete_by_id(existing.id).exec(db).await?;
    info!(category_id = id, "category deleted");
    Ok(())
}
