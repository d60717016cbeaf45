use crate::{
    auth::Authentication,
    models::PrincipalResponse,
    utils::ApiResult,
};
use axum::{extract::State, http::HeaderMap, Extension, Json};

/// Current principal, with a renewed token in `X-Authentication-Token`
pub async fn me(
    State(state): State<crate::AppState>,
    Extension(authentication): Extension<Authentication>,
) -> ApiResult<(HeaderMap, Json<PrincipalResponse>)> {
    let mut headers = HeaderMap::new();
    state
        .auth_service
        .add_authentication(&mut headers, &authentication)?;

    Ok((
        headers,
        Json(PrincipalResponse {
            username: authentication.username,
            authorities: authentication.authorities.into_iter().collect(),
            expires_at: authentication
                .details
                .map(|details| details.expires_at)
                .unwrap_or_default(),
        }),
    ))
}
