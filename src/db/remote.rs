use super::{CollectorRepository, ComponentRepository, ScopeRepository};
use crate::{
    models::{Collector, Component, Page, PageRequest, Scope},
    utils::{ApiError, ApiResult},
};
use async_trait::async_trait;
use reqwest::{header::CONTENT_RANGE, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

const SCOPES: &str = "scopes";
const COLLECTORS: &str = "collectors";
const COMPONENTS: &str = "components";

/// PostgREST client for the dashboard document store
#[derive(Clone)]
pub struct Database {
    client: Client,
    base_url: String,
    key: String,
}

impl Database {
    pub fn new(url: &str, key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
        }
    }

    /// `GET` on a table with the service credentials attached
    fn table(&self, table: &str) -> RequestBuilder {
        self.client
            .get(format!("{}/{}", self.base_url, table))
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", self.key))
            .query(&[("select", "*")])
    }

    async fn fetch<T: DeserializeOwned>(&self, query: RequestBuilder) -> ApiResult<Vec<T>> {
        let response = check_status(query.send().await?).await?;
        Ok(response.json().await?)
    }
}

async fn check_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(%status, %body, "Document store rejected query");
    Err(ApiError::store_error("Document store query failed")
        .with_details(serde_json::json!({ "status": status.as_u16() })))
}

/// Total from a `Content-Range` header such as `0-9/42` or `*/42`
fn total_from_content_range(value: &str) -> Option<usize> {
    value.rsplit_once('/')?.1.parse().ok()
}

/// Case-insensitive literal substring match on `needle`
///
/// PostgREST turns `*` into `%` in `ilike` values, so this goes through
/// `imatch` (POSIX regex) with every metacharacter escaped.
fn contains_filter(needle: &str) -> String {
    format!("imatch.{}", regex::escape(needle))
}

/// `in` filter over quoted ids
fn in_filter(ids: &[String]) -> String {
    let quoted: Vec<String> = ids
        .iter()
        .map(|id| format!("\"{}\"", id.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    format!("in.({})", quoted.join(","))
}

#[async_trait]
impl ScopeRepository for Database {
    async fn find_all_ordered_by_project_path_desc(&self) -> ApiResult<Vec<Scope>> {
        self.fetch(self.table(SCOPES).query(&[("order", "project_path.desc")]))
            .await
    }

    async fn find_by_scope_id(&self, scope_id: &str) -> ApiResult<Vec<Scope>> {
        self.fetch(
            self.table(SCOPES)
                .query(&[("p_id", format!("eq.{}", scope_id))]),
        )
        .await
    }

    async fn find_by_collector_id(&self, collector_id: &str) -> ApiResult<Vec<Scope>> {
        self.fetch(
            self.table(SCOPES)
                .query(&[("collector_id", format!("eq.{}", collector_id))]),
        )
        .await
    }

    async fn find_by_collector_id_and_name_containing(
        &self,
        collector_id: &str,
        name: &str,
        page: PageRequest,
    ) -> ApiResult<Page<Scope>> {
        let low = page.offset();
        let high = low.saturating_add(page.size - 1);

        let response = self
            .table(SCOPES)
            .query(&[
                ("collector_id", format!("eq.{}", collector_id)),
                ("name", contains_filter(name)),
                ("order", "id.asc".to_string()),
            ])
            .header("Range-Unit", "items")
            .header("Range", format!("{}-{}", low, high))
            .header("Prefer", "count=exact")
            .send()
            .await?;

        let total = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(total_from_content_range);

        // Asking past the last row is an empty page, not an error
        if response.status() == StatusCode::RANGE_NOT_SATISFIABLE {
            return Ok(Page::new(Vec::new(), total.unwrap_or(0), page));
        }

        let response = check_status(response).await?;
        let content: Vec<Scope> = response.json().await?;
        let total = total.unwrap_or(low.saturating_add(content.len()));

        Ok(Page::new(content, total, page))
    }
}

#[async_trait]
impl CollectorRepository for Database {
    async fn find_collector(&self, id: &str) -> ApiResult<Option<Collector>> {
        let collectors: Vec<Collector> = self
            .fetch(self.table(COLLECTORS).query(&[("id", format!("eq.{}", id))]))
            .await?;
        Ok(collectors.into_iter().next())
    }

    async fn find_collectors(&self, ids: &[String]) -> ApiResult<Vec<Collector>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.fetch(self.table(COLLECTORS).query(&[("id", in_filter(ids))]))
            .await
    }
}

#[async_trait]
impl ComponentRepository for Database {
    async fn find_component(&self, id: &str) -> ApiResult<Option<Component>> {
        let components: Vec<Component> = self
            .fetch(self.table(COMPONENTS).query(&[("id", format!("eq.{}", id))]))
            .await?;
        Ok(components.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_from_content_range() {
        assert_eq!(total_from_content_range("0-9/42"), Some(42));
        assert_eq!(total_from_content_range("*/0"), Some(0));
        assert_eq!(total_from_content_range("0-9/*"), None);
        assert_eq!(total_from_content_range("garbage"), None);
    }

    #[test]
    fn test_contains_filter_escapes_regex_metacharacters() {
        assert_eq!(contains_filter("abc"), "imatch.abc");
        assert_eq!(contains_filter("50%_off"), "imatch.50%_off");
        assert_eq!(contains_filter("a*b"), "imatch.a\\*b");
        assert_eq!(contains_filter("v1.2 (beta)"), "imatch.v1\\.2 \\(beta\\)");
        assert_eq!(contains_filter(""), "imatch.");
    }

    #[test]
    fn test_contains_filter_star_is_literal() {
        let filter = contains_filter("a*b");
        let pattern = regex::RegexBuilder::new(filter.trim_start_matches("imatch."))
            .case_insensitive(true)
            .build()
            .unwrap();
        assert!(pattern.is_match("xA*By"));
        assert!(!pattern.is_match("aXYZb"));
        assert!(!pattern.is_match("ab"));
    }

    #[test]
    fn test_in_filter_quotes_ids() {
        let ids = vec!["c1".to_string(), "c\"2".to_string()];
        assert_eq!(in_filter(&ids), "in.(\"c1\",\"c\\\"2\")");
    }
}
