use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

/// Project/team metadata record tracked by the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    pub id: String,
    /// Source-system identifier
    #[serde(default)]
    pub p_id: Option<String>,
    pub name: String,
    pub project_path: String,
    pub collector_id: String,
    #[serde(default)]
    pub begin_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub change_date: Option<String>,
    #[serde(default)]
    pub asset_state: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
    /// Owning collector, attached on read and never persisted
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub collector: Option<Collector>,
}

/// Collector type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectorType {
    AgileTool,
    Build,
    #[serde(rename = "SCM")]
    Scm,
    Deployment,
    #[serde(other)]
    Other,
}

/// External data-source integration record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collector {
    pub id: String,
    pub name: String,
    pub collector_type: CollectorType,
    /// Epoch millis of the collector's last run
    pub last_executed: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectorItem {
    pub id: String,
    pub collector_id: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Dashboard widget configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub collector_items: HashMap<CollectorType, Vec<CollectorItem>>,
}

impl Component {
    /// First collector item registered under `collector_type`, if any
    pub fn first_collector_item(&self, collector_type: CollectorType) -> Option<&CollectorItem> {
        self.collector_items
            .get(&collector_type)
            .and_then(|items| items.first())
    }
}

/// Result payload paired with the time its source was last refreshed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub result: T,
    pub last_updated: Option<i64>,
}

impl<T> DataResponse<T> {
    pub fn new(result: T, last_updated: Option<i64>) -> Self {
        Self {
            result,
            last_updated,
        }
    }
}

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;
pub const MAX_PAGE: usize = 1_000_000;

/// Zero-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
}

impl PageRequest {
    pub fn new(page: usize, size: usize) -> Self {
        Self {
            page,
            size: size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Index of the first row; saturates so far-off pages are simply empty
    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE)
    }
}

/// One page of results plus the total match count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: usize,
    pub page: usize,
    pub size: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, total_elements: usize, request: PageRequest) -> Self {
        Self {
            content,
            total_elements,
            page: request.page,
            size: request.size,
            total_pages: total_elements.div_ceil(request.size),
        }
    }
}

/// Query parameters for `GET /api/scope/:scope_id`
#[derive(Debug, Deserialize, Validate)]
pub struct ScopeQuery {
    #[validate(length(min = 1))]
    pub component: String,
}

/// Query parameters for the paged collector scope listing
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ScopePageQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    #[validate(range(max = 1_000_000))]
    pub page: Option<usize>,
    #[serde(default)]
    #[validate(range(min = 1, max = 100))]
    pub size: Option<usize>,
}

impl ScopePageQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(0),
            self.size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }
}

/// Principal returned by `/api/auth/me`
#[derive(Debug, Serialize, Deserialize)]
pub struct PrincipalResponse {
    pub username: String,
    pub authorities: Vec<String>,
    pub expires_at: i64,
}
