use axum::{Router, routing::get};
use crate::{AppState, controllers::user_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/users/dashboard", get(user_controller::dashboard))
        .route(
            "/users/change-password",
            get(user_controller::get_change_password).post(user_controller::post_change_password),
        )
        .route("/users/change-password/done", get(user_controller::change_password_done))
}
