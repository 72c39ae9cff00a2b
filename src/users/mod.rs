use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
#[cfg(test)]
pub mod memory;
pub mod repo;
pub mod repo_types;
pub mod validation;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(handlers::account_routes())
        .merge(handlers::profile_routes(state))
}
