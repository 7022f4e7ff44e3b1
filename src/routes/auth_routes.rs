use axum::{Router, routing::get};
use crate::{AppState, controllers::auth_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/users/login", get(auth_controller::get_login).post(auth_controller::post_login))
        .route("/users/register", get(auth_controller::get_register).post(auth_controller::post_register))
        .route("/users/logout", get(auth_controller::logout))
}
