use super::{CollectorRepository, ComponentRepository, ScopeRepository};
use crate::{
    models::{Collector, Component, Page, PageRequest, Scope},
    utils::{ApiError, ApiResult},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{
    path::Path,
    sync::{RwLock, RwLockReadGuard},
};

/// Store contents as loaded from a JSON fixture file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreFixture {
    #[serde(default)]
    pub scopes: Vec<Scope>,
    #[serde(default)]
    pub collectors: Vec<Collector>,
    #[serde(default)]
    pub components: Vec<Component>,
}

/// In-process document store for development and tests
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<StoreFixture>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fixture(fixture: StoreFixture) -> Self {
        Self {
            data: RwLock::new(fixture),
        }
    }

    /// Load a JSON fixture from disk
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        let fixture: StoreFixture = serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("Invalid store fixture {}: {}", path.display(), e))?;

        tracing::info!(
            scopes = fixture.scopes.len(),
            collectors = fixture.collectors.len(),
            components = fixture.components.len(),
            "Loaded store fixture from {}",
            path.display()
        );
        Ok(Self::with_fixture(fixture))
    }

    pub fn insert_scope(&self, scope: Scope) {
        self.write(|data| data.scopes.push(scope));
    }

    pub fn insert_collector(&self, collector: Collector) {
        self.write(|data| data.collectors.push(collector));
    }

    pub fn insert_component(&self, component: Component) {
        self.write(|data| data.components.push(component));
    }

    fn write(&self, f: impl FnOnce(&mut StoreFixture)) {
        let mut guard = self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard);
    }

    fn read(&self) -> ApiResult<RwLockReadGuard<'_, StoreFixture>> {
        self.data
            .read()
            .map_err(|_| ApiError::internal_error("In-memory store lock poisoned"))
    }

    fn scopes_where(&self, predicate: impl Fn(&Scope) -> bool) -> ApiResult<Vec<Scope>> {
        Ok(self
            .read()?
            .scopes
            .iter()
            .filter(|scope| predicate(scope))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ScopeRepository for MemoryStore {
    async fn find_all_ordered_by_project_path_desc(&self) -> ApiResult<Vec<Scope>> {
        let mut scopes = self.scopes_where(|_| true)?;
        scopes.sort_by(|a, b| b.project_path.cmp(&a.project_path));
        Ok(scopes)
    }

    async fn find_by_scope_id(&self, scope_id: &str) -> ApiResult<Vec<Scope>> {
        self.scopes_where(|scope| scope.p_id.as_deref() == Some(scope_id))
    }

    async fn find_by_collector_id(&self, collector_id: &str) -> ApiResult<Vec<Scope>> {
        self.scopes_where(|scope| scope.collector_id == collector_id)
    }

    async fn find_by_collector_id_and_name_containing(
        &self,
        collector_id: &str,
        name: &str,
        page: PageRequest,
    ) -> ApiResult<Page<Scope>> {
        let needle = name.to_lowercase();
        let mut matches = self.scopes_where(|scope| {
            scope.collector_id == collector_id && scope.name.to_lowercase().contains(&needle)
        })?;
        matches.sort_by(|a, b| a.id.cmp(&b.id));

        let total = matches.len();
        let content = matches
            .into_iter()
            .skip(page.offset())
            .take(page.size)
            .collect();

        Ok(Page::new(content, total, page))
    }
}

#[async_trait]
impl CollectorRepository for MemoryStore {
    async fn find_collector(&self, id: &str) -> ApiResult<Option<Collector>> {
        Ok(self
            .read()?
            .collectors
            .iter()
            .find(|collector| collector.id == id)
            .cloned())
    }

    async fn find_collectors(&self, ids: &[String]) -> ApiResult<Vec<Collector>> {
        Ok(self
            .read()?
            .collectors
            .iter()
            .filter(|collector| ids.contains(&collector.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ComponentRepository for MemoryStore {
    async fn find_component(&self, id: &str) -> ApiResult<Option<Component>> {
        Ok(self
            .read()?
            .components
            .iter()
            .find(|component| component.id == id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CollectorType;
    use std::io::Write;

    fn scope(id: &str, name: &str, collector_id: &str) -> Scope {
        Scope {
            id: id.to_string(),
            p_id: None,
            name: name.to_string(),
            project_path: format!("root/{}", name),
            collector_id: collector_id.to_string(),
            begin_date: None,
            end_date: None,
            change_date: None,
            asset_state: None,
            is_deleted: false,
            collector: None,
        }
    }

    #[tokio::test]
    async fn test_filter_is_case_insensitive_and_scoped_to_collector() {
        let store = MemoryStore::new();
        store.insert_scope(scope("1", "Project ABC", "c1"));
        store.insert_scope(scope("2", "xabcx", "c1"));
        store.insert_scope(scope("3", "abc elsewhere", "c2"));
        store.insert_scope(scope("4", "unrelated", "c1"));

        let page = store
            .find_by_collector_id_and_name_containing("c1", "aBc", PageRequest::new(0, 10))
            .await
            .unwrap();

        let ids: Vec<&str> = page.content.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(page.total_elements, 2);
    }

    #[tokio::test]
    async fn test_filter_pages_past_the_end_are_empty() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store.insert_scope(scope(&format!("{i}"), "team", "c1"));
        }

        let page = store
            .find_by_collector_id_and_name_containing("c1", "", PageRequest::new(1, 3))
            .await
            .unwrap();
        assert_eq!(page.content.len(), 2);
        assert_eq!(page.total_elements, 5);
        assert_eq!(page.total_pages, 2);

        let page = store
            .find_by_collector_id_and_name_containing("c1", "", PageRequest::new(4, 3))
            .await
            .unwrap();
        assert!(page.content.is_empty());
        assert_eq!(page.total_elements, 5);
    }

    #[tokio::test]
    async fn test_from_file_loads_fixture() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "scopes": [{{ "id": "s1", "p_id": "P1", "name": "a", "project_path": "p", "collector_id": "c1" }}],
                "collectors": [{{ "id": "c1", "name": "Jira", "collector_type": "AgileTool", "last_executed": 42 }}]
            }}"#
        )
        .unwrap();

        let store = MemoryStore::from_file(file.path()).unwrap();
        assert_eq!(store.find_by_scope_id("P1").await.unwrap().len(), 1);

        let collector = store.find_collector("c1").await.unwrap().unwrap();
        assert_eq!(collector.collector_type, CollectorType::AgileTool);
        assert!(store.find_component("missing").await.unwrap().is_none());
    }

    #[test]
    fn test_from_file_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(MemoryStore::from_file(file.path()).is_err());
    }
}
