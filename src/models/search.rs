use serde::{Deserialize, Serialize};

/// One page of search results as returned by `GET /api/search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse {
    pub results: Vec<serde_json::Value>,
    pub total_count: u64,
    pub current_page: u64,
    pub total_pages: u64,
    pub page_size: u64,
}

impl PaginatedResponse {
    pub fn empty(current_page: u64, page_size: u64) -> Self {
        Self {
            results: Vec::new(),
            total_count: 0,
            current_page,
            total_pages: 0,
            page_size,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_page_wire_shape() {
        let json = serde_json::to_value(PaginatedResponse::empty(1, 10)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "results": [],
                "totalCount": 0,
                "currentPage": 1,
                "totalPages": 0,
                "pageSize": 10,
            })
        );
    }

    #[test]
    fn test_pager_flags() {
        let mut page = PaginatedResponse::empty(1, 10);
        page.total_pages = 3;
        assert!(!page.has_previous());
        assert!(page.has_next());
        page.current_page = 3;
        assert!(page.has_previous());
        assert!(!page.has_next());
    }
}
