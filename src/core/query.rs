//! Query parameters sent to collection endpoints and pagination metadata

use crate::core::filter::FilterCriteria;
use crate::core::sort::{SortDirection, SortSpec};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Query parameters for a collection request
///
/// Serialized as the query string of `GET /api/<resource>`. Empty values are
/// omitted.
///
/// # Example
/// ```text
/// GET /api/invoices?page=2&limit=10
/// GET /api/invoices?search=acme&status=active&sortBy=amount&sortOrder=desc
/// GET /api/materials?category=paint&dateFrom=2024-01-01&dateTo=2024-03-31
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    /// Page number (starts at 1)
    #[serde(default = "default_page")]
    pub page: usize,

    /// Number of items per page
    #[serde(default = "default_limit")]
    pub limit: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortDirection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,

    /// Backend-specific parameters (e.g. `frequency`, `priority`)
    #[serde(default, flatten)]
    pub extra: IndexMap<String, String>,
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    20
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
            search: None,
            status: None,
            category: None,
            sort_by: None,
            sort_order: None,
            date_from: None,
            date_to: None,
            extra: IndexMap::new(),
        }
    }
}

impl QueryParams {
    pub fn new(page: usize, limit: usize) -> Self {
        Self {
            page,
            limit,
            ..Self::default()
        }
    }

    /// Get page number, ensuring minimum of 1
    pub fn page(&self) -> usize {
        self.page.max(1)
    }

    /// Get limit, ensuring minimum of 1
    pub fn limit(&self) -> usize {
        self.limit.max(1)
    }

    pub fn with_sort(mut self, sort: &SortSpec) -> Self {
        self.sort_by = Some(sort.sort_by());
        self.sort_order = Some(sort.direction);
        self
    }

    /// Forward the parts of `criteria` the backend understands natively
    ///
    /// The search term maps to `search`, exact matches on `status` and
    /// `category` map to their own parameters, a range on `date_field` maps
    /// to `dateFrom`/`dateTo`, and any other exact match becomes an extra
    /// parameter. Numeric ranges stay client-side.
    pub fn with_criteria(mut self, criteria: &FilterCriteria, date_field: Option<&str>) -> Self {
        self.search = criteria.search_term().map(String::from);

        for (field, value) in &criteria.exact_match {
            match field.as_str() {
                "status" => self.status = Some(value.clone()),
                "category" => self.category = Some(value.clone()),
                _ => {
                    self.extra.insert(field.clone(), value.clone());
                }
            }
        }

        if let Some(bound) = date_field.and_then(|f| criteria.range.get(f)) {
            self.date_from = bound.min.as_ref().map(|v| v.to_text());
            self.date_to = bound.max.as_ref().map(|v| v.to_text());
        }

        self
    }

    /// Flatten into ordered `(key, value)` pairs for the request URL
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page().to_string()),
            ("limit".to_string(), self.limit().to_string()),
        ];

        let optional = [
            ("search", &self.search),
            ("status", &self.status),
            ("category", &self.category),
            ("sortBy", &self.sort_by),
            ("dateFrom", &self.date_from),
            ("dateTo", &self.date_to),
        ];
        for (key, value) in optional {
            if let Some(v) = value.as_ref().filter(|v| !v.is_empty()) {
                pairs.push((key.to_string(), v.clone()));
            }
        }

        if let Some(order) = self.sort_order {
            pairs.push(("sortOrder".to_string(), order.as_str().to_string()));
        }

        for (key, value) in &self.extra {
            pairs.push((key.clone(), value.clone()));
        }

        pairs
    }
}

/// Pagination metadata as returned by a backend
///
/// Wire shape: `{ "page": 1, "limit": 20, "total": 145, "pages": 8 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    /// Current page number (starts at 1)
    #[serde(default = "default_page")]
    pub page: usize,

    /// Number of items per page
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Total number of items (after filters)
    #[serde(default)]
    pub total: usize,

    /// Total number of pages
    #[serde(default)]
    pub pages: usize,
}

impl PaginationMeta {
    /// Create pagination metadata from calculation
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        let limit = limit.max(1);
        Self {
            page: page.max(1),
            limit,
            total,
            pages: total.div_ceil(limit),
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}
