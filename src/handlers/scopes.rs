use crate::{
    models::{DataResponse, Page, Scope, ScopePageQuery, ScopeQuery},
    utils::ApiResult,
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use validator::Validate;

/// List every scope with its collector
pub async fn list_scopes(State(state): State<crate::AppState>) -> ApiResult<Json<Vec<Scope>>> {
    let scopes = state.scope_service.get_all_scopes().await?;
    Ok(Json(scopes))
}

/// Scope by source-system id, as seen from a dashboard component
pub async fn get_scope(
    State(state): State<crate::AppState>,
    Path(scope_id): Path<String>,
    Query(query): Query<ScopeQuery>,
) -> ApiResult<Json<DataResponse<Vec<Scope>>>> {
    query.validate()?;

    let response = state
        .scope_service
        .get_scope(&query.component, &scope_id)
        .await?;
    Ok(Json(response))
}

pub async fn scopes_by_collector(
    State(state): State<crate::AppState>,
    Path(collector_id): Path<String>,
) -> ApiResult<Json<Vec<Scope>>> {
    let scopes = state
        .scope_service
        .get_scopes_by_collector(&collector_id)
        .await?;
    Ok(Json(scopes))
}

/// Paged, name-filtered scopes of one collector
pub async fn scopes_by_collector_page(
    State(state): State<crate::AppState>,
    Path(collector_id): Path<String>,
    Query(query): Query<ScopePageQuery>,
) -> ApiResult<Json<Page<Scope>>> {
    query.validate()?;

    let page = state
        .scope_service
        .get_scope_by_collector_with_filter(
            &collector_id,
            query.search.as_deref().unwrap_or_default(),
            query.page_request(),
        )
        .await?;
    Ok(Json(page))
}
