//! Store access for each domain. Handlers stay thin and call into here.

pub mod addresses;
pub mod auth;
pub mod categories;
pub mod products;
pub mod provcity;
pub mod shops;
pub mod trx;
pub mod users;

use std::str::FromStr;

use common::{Filter, SortOrder};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Order, PaginatorTrait, QueryFilter,
    QueryOrder, Select,
};

use crate::error::{ApiError, ApiResult};

/// Columns a list endpoint searches and bounds by date.
pub struct ListColumns<C> {
    pub keyword: C,
    pub created: C,
    pub updated: C,
}

/// Applies keyword, date bounds and ordering of `filter` to `select`.
///
/// `filter.order_by` has already been checked against the endpoint's
/// allow-list, so a column that fails to parse here is a programming error.
pub fn apply_filter<E>(
    mut select: Select<E>,
    filter: &Filter,
    columns: ListColumns<E::Column>,
) -> ApiResult<Select<E>>
where
    E: EntityTrait,
    E::Column: FromStr,
{
    if let Some(keyword) = &filter.keyword {
        select = select.filter(columns.keyword.contains(keyword));
    }
    if let Some(start) = filter.created.start {
        select = select.filter(columns.created.gte(start));
    }
    if let Some(end) = filter.created.end {
        select = select.filter(columns.created.lte(end));
    }
    if let Some(start) = filter.updated.start {
        select = select.filter(columns.updated.gte(start));
    }
    if let Some(end) = filter.updated.end {
        select = select.filter(columns.updated.lte(end));
    }

    let column = E::Column::from_str(&filter.order_by).map_err(|_| {
        ApiError::internal(format!("sortable column '{}' is not mapped", filter.order_by))
    })?;
    let order = match filter.sort_order {
        SortOrder::Asc => Order::Asc,
        SortOrder::Desc => Order::Desc,
    };
    Ok(select.order_by(column, order))
}

/// Runs `select` for the page described by `filter`, returning the total row
/// count alongside the rows.
pub async fn fetch_page<E>(
    db: &DatabaseConnection,
    select: Select<E>,
    filter: &Filter,
) -> Result<(u64, Vec<E::Model>), DbErr>
where
    E: EntityTrait,
    E::Model: Sync,
{
    let paginator = select.paginate(db, filter.limit);
    let total = paginator.num_items().await?;
    let rows = paginator.fetch_page(filter.page_index()).await?;
    Ok((total, rows))
}
