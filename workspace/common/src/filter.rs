use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::{IntoParams, ToSchema};

/// Page size used when the caller does not send `limit`.
pub const DEFAULT_LIMIT: u64 = 20;
/// Largest page size a caller may request.
pub const MAX_LIMIT: u64 = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("Order by column '{0}' is not allowed!")]
    OrderByNotAllowed(String),
    #[error("sort-order: '{0}' must be either asc or desc")]
    InvalidSortOrder(String),
    #[error("limit: This field must be between 1 and 100")]
    InvalidLimit,
    #[error("page: This field must be greater than 0")]
    InvalidPage,
    #[error("{field}: start bound is after end bound")]
    InvertedRange { field: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(FilterError::InvalidSortOrder(s.to_string())),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => f.write_str("asc"),
            SortOrder::Desc => f.write_str("desc"),
        }
    }
}

/// Raw query string of every list endpoint.
///
/// `keyword` may also arrive as `nama`, `search`, `q` or `judul_alamat`;
/// the first non-empty one wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Page size (default 20, max 100)
    pub limit: Option<u64>,
    /// 1-based page number (default 1)
    pub page: Option<u64>,
    /// Column to sort by; must be one of the endpoint's sortable columns
    #[serde(rename = "order-by")]
    pub order_by: Option<String>,
    /// `asc` or `desc`
    #[serde(rename = "sort-order")]
    pub sort_order: Option<String>,
    /// Free text search
    pub keyword: Option<String>,
    pub nama: Option<String>,
    pub search: Option<String>,
    pub q: Option<String>,
    pub judul_alamat: Option<String>,
    /// RFC 3339 lower bound on creation time
    #[serde(rename = "start-created-at")]
    pub start_created_at: Option<DateTime<Utc>>,
    /// RFC 3339 upper bound on creation time
    #[serde(rename = "end-created-at")]
    pub end_created_at: Option<DateTime<Utc>>,
    /// RFC 3339 lower bound on last update time
    #[serde(rename = "start-updated-at")]
    pub start_updated_at: Option<DateTime<Utc>>,
    /// RFC 3339 upper bound on last update time
    #[serde(rename = "end-updated-at")]
    pub end_updated_at: Option<DateTime<Utc>>,
}

/// Inclusive time window; either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateBounds {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateBounds {
    fn new(
        field: &'static str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Self, FilterError> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(FilterError::InvertedRange { field });
            }
        }
        Ok(Self { start, end })
    }

    pub fn is_open(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// A list query checked against an endpoint's sortable columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub limit: u64,
    pub page: u64,
    pub order_by: String,
    pub sort_order: SortOrder,
    pub keyword: Option<String>,
    pub created: DateBounds,
    pub updated: DateBounds,
}

impl Filter {
    /// Zero-based page index, as sea-orm's paginator expects.
    pub fn page_index(&self) -> u64 {
        self.page - 1
    }
}

impl ListQuery {
    /// Validates the query against `allowed` sortable columns.
    ///
    /// An absent `order-by` falls back to the first allowed column.
    pub fn resolve(&self, allowed: &[&str]) -> Result<Filter, FilterError> {
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if limit == 0 || limit > MAX_LIMIT {
            return Err(FilterError::InvalidLimit);
        }

        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(FilterError::InvalidPage);
        }

        let order_by = match self.order_by.as_deref().map(str::trim) {
            Some(column) if !column.is_empty() => {
                if !allowed.contains(&column) {
                    return Err(FilterError::OrderByNotAllowed(column.to_string()));
                }
                column.to_string()
            }
            _ => allowed.first().map(|c| c.to_string()).unwrap_or_default(),
        };

        let sort_order = match self.sort_order.as_deref() {
            Some(raw) if !raw.trim().is_empty() => raw.parse()?,
            _ => SortOrder::Asc,
        };

        let keyword = [
            &self.keyword,
            &self.nama,
            &self.search,
            &self.q,
            &self.judul_alamat,
        ]
        .into_iter()
        .filter_map(|candidate| candidate.as_deref().map(str::trim))
        .find(|candidate| !candidate.is_empty())
        .map(str::to_string);

        Ok(Filter {
            limit,
            page,
            order_by,
            sort_order,
            keyword,
            created: DateBounds::new("created-at", self.start_created_at, self.end_created_at)?,
            updated: DateBounds::new("updated-at", self.start_updated_at, self.end_updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[&str] = &["nama_toko", "created_at_date", "updated_at_date"];

    #[test]
    fn defaults_apply_when_query_is_empty() {
        let filter = ListQuery::default().resolve(COLUMNS).unwrap();
        assert_eq!(filter.limit, DEFAULT_LIMIT);
        assert_eq!(filter.page, 1);
        assert_eq!(filter.page_index(), 0);
        assert_eq!(filter.order_by, "nama_toko");
        assert_eq!(filter.sort_order, SortOrder::Asc);
        assert!(filter.keyword.is_none());
        assert!(filter.created.is_open());
    }

    #[test]
    fn rejects_columns_outside_the_allow_list() {
        let query = ListQuery {
            order_by: Some("kata_sandi".into()),
            ..Default::default()
        };
        let err = query.resolve(COLUMNS).unwrap_err();
        assert_eq!(err.to_string(), "Order by column 'kata_sandi' is not allowed!");
    }

    #[test]
    fn rejects_unknown_sort_order() {
        let query = ListQuery {
            sort_order: Some("sideways".into()),
            ..Default::default()
        };
        assert_eq!(
            query.resolve(COLUMNS).unwrap_err(),
            FilterError::InvalidSortOrder("sideways".into())
        );
    }

    #[test]
    fn keyword_falls_back_through_aliases() {
        let query = ListQuery {
            keyword: Some("  ".into()),
            search: Some("batik".into()),
            q: Some("ignored".into()),
            ..Default::default()
        };
        assert_eq!(query.resolve(COLUMNS).unwrap().keyword.as_deref(), Some("batik"));
    }

    #[test]
    fn limit_and_page_are_bounded() {
        let zero_limit = ListQuery {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(zero_limit.resolve(COLUMNS).unwrap_err(), FilterError::InvalidLimit);

        let huge_limit = ListQuery {
            limit: Some(MAX_LIMIT + 1),
            ..Default::default()
        };
        assert_eq!(huge_limit.resolve(COLUMNS).unwrap_err(), FilterError::InvalidLimit);

        let zero_page = ListQuery {
            page: Some(0),
            ..Default::default()
        };
        assert_eq!(zero_page.resolve(COLUMNS).unwrap_err(), FilterError::InvalidPage);
    }

    #[test]
    fn inverted_date_range_is_rejected() {
        let query = ListQuery {
            start_created_at: Some("2024-05-02T00:00:00Z".parse().unwrap()),
            end_created_at: Some("2024-05-01T00:00:00Z".parse().unwrap()),
            ..Default::default()
        };
        assert!(matches!(
            query.resolve(COLUMNS),
            Err(FilterError::InvertedRange { field: "created-at" })
        ));
    }
}
