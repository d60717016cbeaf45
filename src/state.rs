use crate::{auth::TokenAuthenticationService, services::ScopeService, utils::Config};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub scope_service: Arc<ScopeService>,
    pub auth_service: Arc<TokenAuthenticationService>,
    pub config: Arc<Config>,
}
