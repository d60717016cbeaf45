//! Document store access.
//!
//! The services only see the repository traits below. Two backends implement
//! them: [`Database`], a PostgREST client for the shared dashboard store, and
//! [`MemoryStore`], an in-process store used in development and tests.

mod memory;
mod remote;

pub use memory::{MemoryStore, StoreFixture};
pub use remote::Database;

use crate::{
    models::{Collector, Component, Page, PageRequest, Scope},
    utils::ApiResult,
};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait ScopeRepository: Send + Sync {
    /// Every scope, ordered by project path descending
    async fn find_all_ordered_by_project_path_desc(&self) -> ApiResult<Vec<Scope>>;

    /// Scopes whose source-system id equals `scope_id`
    async fn find_by_scope_id(&self, scope_id: &str) -> ApiResult<Vec<Scope>>;

    async fn find_by_collector_id(&self, collector_id: &str) -> ApiResult<Vec<Scope>>;

    /// Scopes of `collector_id` whose name contains `name` ignoring case
    async fn find_by_collector_id_and_name_containing(
        &self,
        collector_id: &str,
        name: &str,
        page: PageRequest,
    ) -> ApiResult<Page<Scope>>;
}

#[async_trait]
pub trait CollectorRepository: Send + Sync {
    async fn find_collector(&self, id: &str) -> ApiResult<Option<Collector>>;

    /// Batch lookup; ids with no collector are simply absent from the result
    async fn find_collectors(&self, ids: &[String]) -> ApiResult<Vec<Collector>>;
}

#[async_trait]
pub trait ComponentRepository: Send + Sync {
    async fn find_component(&self, id: &str) -> ApiResult<Option<Component>>;
}

/// Repository handles shared by the services
#[derive(Clone)]
pub struct Repositories {
    pub scopes: Arc<dyn ScopeRepository>,
    pub collectors: Arc<dyn CollectorRepository>,
    pub components: Arc<dyn ComponentRepository>,
}

impl Repositories {
    /// Serve every repository from one backend
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: ScopeRepository + CollectorRepository + ComponentRepository + 'static,
    {
        Self {
            scopes: store.clone(),
            collectors: store.clone(),
            components: store,
        }
    }
}
