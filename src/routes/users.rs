//! User routes: `GET /users`, `GET /users/:id`.

use crate::handlers::users;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn user_routes(state: AppState) -> Router {
    Router::new()
        .route("/users", get(users::list))
        .route("/users/:id", get(users::read))
        .with_state(state)
}
