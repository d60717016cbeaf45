use crate::{
    db::Repositories,
    models::{Collector, CollectorType, DataResponse, Page, PageRequest, Scope},
    utils::{ApiError, ApiResult},
};
use regex::Regex;
use serde_json::json;
use std::{
    collections::{HashMap, HashSet},
    sync::LazyLock,
};

static MARKUP_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[<>]").expect("static pattern compiles"));

/// Remove every `<` and `>` so the value can be rendered without markup
pub fn strip_markup(value: &str) -> String {
    MARKUP_CHARS.replace_all(value, "").into_owned()
}

/// Scope lookups over the dashboard store
#[derive(Clone)]
pub struct ScopeService {
    repos: Repositories,
}

impl ScopeService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// All scopes ordered by project path descending, each with its collector attached.
    ///
    /// Collectors are fetched in one batch. A scope whose collector no longer
    /// exists is returned with `collector` left empty.
    pub async fn get_all_scopes(&self) -> ApiResult<Vec<Scope>> {
        let mut scopes = self.repos.scopes.find_all_ordered_by_project_path_desc().await?;

        let ids: Vec<String> = scopes
            .iter()
            .map(|scope| scope.collector_id.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let collectors: HashMap<String, Collector> = self
            .repos
            .collectors
            .find_collectors(&ids)
            .await?
            .into_iter()
            .map(|collector| (collector.id.clone(), collector))
            .collect();

        for scope in &mut scopes {
            scope.collector = collectors.get(&scope.collector_id).cloned();
        }

        tracing::debug!(
            scopes = scopes.len(),
            collectors = collectors.len(),
            "Loaded all scopes"
        );
        Ok(scopes)
    }

    /// Scopes with source id `scope_id`, stamped with the last run of the
    /// agile-tool collector feeding `component_id`.
    pub async fn get_scope(
        &self,
        component_id: &str,
        scope_id: &str,
    ) -> ApiResult<DataResponse<Vec<Scope>>> {
        let component = self
            .repos
            .components
            .find_component(component_id)
            .await?
            .ok_or_else(|| {
                ApiError::not_found_error("Component not found")
                    .with_details(json!({ "component_id": component_id }))
            })?;

        let item = component
            .first_collector_item(CollectorType::AgileTool)
            .ok_or_else(|| {
                ApiError::not_found_error("Component has no agile tool collector item")
                    .with_details(json!({ "component_id": component_id }))
            })?;

        // TODO: decide with product whether results should be restricted to
        // scopes owned by this team collector item; the lookup ignores it today.
        tracing::debug!(
            component_id,
            team_collector_item = %item.id,
            "Looking up scope without team restriction"
        );

        let scopes = self.repos.scopes.find_by_scope_id(scope_id).await?;
        let last_updated = self
            .repos
            .collectors
            .find_collector(&item.collector_id)
            .await?
            .map(|collector| collector.last_executed);

        if last_updated.is_none() {
            tracing::warn!(collector_id = %item.collector_id, "Collector for component item not found");
        }

        Ok(DataResponse::new(scopes, last_updated))
    }

    /// Scopes of one collector with `<`/`>` stripped from name and project path
    pub async fn get_scopes_by_collector(&self, collector_id: &str) -> ApiResult<Vec<Scope>> {
        let mut scopes = self.repos.scopes.find_by_collector_id(collector_id).await?;

        for scope in &mut scopes {
            scope.name = strip_markup(&scope.name);
            scope.project_path = strip_markup(&scope.project_path);
        }

        Ok(scopes)
    }

    /// One page of a collector's scopes whose name contains `name` (case-insensitive).
    ///
    /// Values are returned as stored; unlike [`Self::get_scopes_by_collector`]
    /// no markup stripping happens here.
    pub async fn get_scope_by_collector_with_filter(
        &self,
        collector_id: &str,
        name: &str,
        page: PageRequest,
    ) -> ApiResult<Page<Scope>> {
        self.repos
            .scopes
            .find_by_collector_id_and_name_containing(collector_id, name, page)
            .await
    }
}
