use axum::{Router, routing::{get, post}};
use crate::{AppState, controllers::integrations_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/integrations", get(integrations_controller::list))
        .route(
            "/integrations/add",
            get(integrations_controller::get_add).post(integrations_controller::post_add),
        )
        .route(
            "/integrations/edit/:id",
            get(integrations_controller::get_edit).post(integrations_controller::post_edit),
        )
        .route("/integrations/verify/:id", post(integrations_controller::post_verify))
        .route("/integrations/delete/:id", post(integrations_controller::post_delete))
}
