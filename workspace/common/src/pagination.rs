use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::Filter;

/// One page of a list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Paginated<T> {
    pub page: u64,
    pub limit: u64,
    pub total_data: u64,
    pub total_page: u64,
    pub data: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn new(filter: &Filter, total_data: u64, data: Vec<T>) -> Self {
        Self {
            page: filter.page,
            limit: filter.limit,
            total_data,
            total_page: total_data.div_ceil(filter.limit),
            data,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            page: self.page,
            limit: self.limit,
            total_data: self.total_data,
            total_page: self.total_page,
            data: self.data.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ListQuery;

    #[test]
    fn total_page_rounds_up() {
        let filter = ListQuery {
            limit: Some(3),
            ..Default::default()
        }
        .resolve(&["id"])
        .unwrap();

        let page = Paginated::new(&filter, 7, vec![1, 2, 3]);
        assert_eq!(page.total_page, 3);

        let empty: Paginated<i32> = Paginated::new(&filter, 0, vec![]);
        assert_eq!(empty.total_page, 0);
    }
}
