use axum::{
    extract::{Extension, Path, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::{
    auth::login_redirect_target,
    error::Error,
    models::CurrentUser,
    render,
    services::{
        auth_service::FieldErrors,
        integration_service::{self, IntegrationInput},
    },
    AppState,
};

const LIST_PATH: &str = "/integrations";

#[derive(Deserialize)]
pub struct IntegrationForm {
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl From<IntegrationForm> for IntegrationInput {
    fn from(f: IntegrationForm) -> Self {
        Self {
            provider: f.provider,
            username: f.username,
            password: f.password,
        }
    }
}

fn server_error(e: Error) -> Response {
    error!("integrations: {e}");
    (StatusCode::INTERNAL_SERVER_ERROR, Html(format!("db error: {e}"))).into_response()
}

fn form_page(
    state: &AppState,
    headers: &HeaderMap,
    user: &CurrentUser,
    editing: bool,
    action: &str,
    input: &IntegrationInput,
    errors: &FieldErrors,
) -> Response {
    let title = if editing { "Edit integration" } else { "Add integration" };
    render::page(
        state,
        headers,
        StatusCode::OK,
        title,
        "pages/integration_form",
        &json!({
            "editing": editing,
            "action": action,
            "providers": integration_service::provider_options(&input.provider),
            "values": { "username": input.username, "password": input.password },
            "errors": errors,
        }),
        Some(user),
    )
}

// ---------------- LIST ----------------

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: Option<Extension<CurrentUser>>,
) -> Response {
    let Some(Extension(user)) = user else {
        return render::redirect(&headers, &login_redirect_target(LIST_PATH));
    };

    let ctx = match integration_service::list_ctx(&state, user.id).await {
        Ok(ctx) => ctx,
        Err(e) => return server_error(e),
    };

    render::page(&state, &headers, StatusCode::OK, "Integrations", "pages/integrations_list", &ctx, Some(&user))
}

// ---------------- ADD ----------------

pub async fn get_add(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: Option<Extension<CurrentUser>>,
) -> Response {
    let Some(Extension(user)) = user else {
        return render::redirect(&headers, &login_redirect_target("/integrations/add"));
    };

    let empty = IntegrationInput {
        provider: String::new(),
        username: String::new(),
        password: String::new(),
    };
    form_page(&state, &headers, &user, false, "/integrations/add", &empty, &FieldErrors::new())
}

pub async fn post_add(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: Option<Extension<CurrentUser>>,
    Form(form): Form<IntegrationForm>,
) -> Response {
    let Some(Extension(user)) = user else {
        return render::redirect(&headers, &login_redirect_target("/integrations/add"));
    };

    let input = IntegrationInput::from(form);
    match integration_service::save(&state, user.id, None, &input).await {
        Ok(_) => render::redirect(&headers, LIST_PATH),
        Err(errs) => form_page(&state, &headers, &user, false, "/integrations/add", &input, &errs),
    }
}

// ---------------- EDIT ----------------

pub async fn get_edit(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: Option<Extension<CurrentUser>>,
    Path(id): Path<String>,
) -> Response {
    let action = format!("/integrations/edit/{id}");
    let Some(Extension(user)) = user else {
        return render::redirect(&headers, &login_redirect_target(&action));
    };

    let inst = match integration_service::get_owned(&state, user.id, &id).await {
        Ok(i) => i,
        Err(Error::NotFound) => return render::not_found_page(&state, &headers, Some(&user)),
        Err(e) => return server_error(e),
    };

    let input = IntegrationInput {
        provider: inst.provider.as_str().to_string(),
        username: inst.username.clone(),
        password: integration_service::stored_password(&state, &inst),
    };
    form_page(&state, &headers, &user, true, &action, &input, &FieldErrors::new())
}

pub async fn post_edit(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: Option<Extension<CurrentUser>>,
    Path(id): Path<String>,
    Form(form): Form<IntegrationForm>,
) -> Response {
    let action = format!("/integrations/edit/{id}");
    let Some(Extension(user)) = user else {
        return render::redirect(&headers, &login_redirect_target(&action));
    };

    let inst = match integration_service::get_owned(&state, user.id, &id).await {
        Ok(i) => i,
        Err(Error::NotFound) => return render::not_found_page(&state, &headers, Some(&user)),
        Err(e) => return server_error(e),
    };

    let input = IntegrationInput::from(form);
    match integration_service::save(&state, user.id, Some(inst), &input).await {
        Ok(_) => render::redirect(&headers, LIST_PATH),
        Err(errs) => form_page(&state, &headers, &user, true, &action, &input, &errs),
    }
}

// ---------------- VERIFY / DELETE ----------------

pub async fn post_verify(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: Option<Extension<CurrentUser>>,
    Path(id): Path<String>,
) -> Response {
    let Some(Extension(user)) = user else {
        return render::redirect(&headers, &login_redirect_target(LIST_PATH));
    };

    match integration_service::verify(&state, user.id, &id).await {
        Ok(_) => render::redirect(&headers, LIST_PATH),
        Err(Error::NotFound) => render::not_found_page(&state, &headers, Some(&user)),
        Err(e) => server_error(e),
    }
}

pub async fn post_delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: Option<Extension<CurrentUser>>,
    Path(id): Path<String>,
) -> Response {
    let Some(Extension(user)) = user else {
        return render::redirect(&headers, &login_redirect_target(LIST_PATH));
    };

    match integration_service::delete(&state, user.id, &id).await {
        Ok(()) => render::redirect(&headers, LIST_PATH),
        Err(Error::NotFound) => render::not_found_page(&state, &headers, Some(&user)),
        Err(e) => server_error(e),
    }
}
