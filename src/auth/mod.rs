mod dto;
pub mod handlers;
pub mod jwt;

use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
