use axum::{
    extract::{Extension, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::{
    models::{CurrentUser, User},
    render,
    services::auth_service::{self, FieldErrors},
    AppState,
};

const DASHBOARD_PATH: &str = "/users/dashboard";

fn errors_json(errs: FieldErrors) -> serde_json::Map<String, serde_json::Value> {
    errs.into_iter().map(|(k, v)| (k, json!(v))).collect()
}

fn session_cookie_jar(state: &AppState, jar: CookieJar, user: &User) -> Result<CookieJar, String> {
    let token = auth_service::make_jwt_with_days(state, &user.id, auth_service::SESSION_DAYS)?;
    Ok(jar.add(auth_service::auth_cookie(state, token)))
}

// ---------------- LOGIN ----------------

#[derive(Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

pub async fn get_login(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: Option<Extension<CurrentUser>>,
    Query(q): Query<LoginQuery>,
) -> Response {
    let user_ref = user.as_ref().map(|Extension(u)| u);
    let next = auth_service::safe_next(q.next.as_deref());

    render::page(
        &state,
        &headers,
        StatusCode::OK,
        "Log in",
        "pages/login",
        &json!({ "next": next }),
        user_ref,
    )
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

pub async fn post_login(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let username = form.username.trim().to_string();
    let next = auth_service::safe_next(form.next.as_deref());

    let mut errors = serde_json::Map::new();
    if username.is_empty() {
        errors.insert("username".into(), json!("This field is required."));
    }
    if form.password.is_empty() {
        errors.insert("password".into(), json!("This field is required."));
    }

    let render_errors = |errors: serde_json::Map<String, serde_json::Value>| {
        render::page(
            &state,
            &headers,
            StatusCode::OK,
            "Log in",
            "pages/login",
            &json!({
                "values": { "username": username },
                "errors": errors,
                "next": next,
            }),
            None,
        )
    };

    if !errors.is_empty() {
        return render_errors(errors);
    }

    let user = match auth_service::login_user(&state, &username, &form.password).await {
        Ok(u) => u,
        Err(errs) => return render_errors(errors_json(errs)),
    };

    let jar = match session_cookie_jar(&state, jar, &user) {
        Ok(j) => j,
        Err(e) => {
            error!("could not issue session token: {e}");
            let mut errors = serde_json::Map::new();
            errors.insert("_form".into(), json!(format!("Auth error: {e}")));
            return render_errors(errors);
        }
    };

    info!("user {} logged in", user.username);
    let target = next.clone().unwrap_or_else(|| DASHBOARD_PATH.to_string());
    (jar, render::redirect(&headers, &target)).into_response()
}

// ---------------- REGISTER ----------------

pub async fn get_register(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: Option<Extension<CurrentUser>>,
) -> Response {
    let user_ref = user.as_ref().map(|Extension(u)| u);
    render::page(
        &state,
        &headers,
        StatusCode::OK,
        "Register",
        "pages/register",
        &json!({}),
        user_ref,
    )
}

#[derive(Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

pub async fn post_register(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    let username = form.username.trim().to_string();

    let mut errs = auth_service::validate_new_password(&username, &form.password1, &form.password2);
    if let Some(msg) = auth_service::validate_username(&username) {
        errs.insert("username".into(), msg.into());
    }

    let render_errors = |errs: FieldErrors| {
        render::page(
            &state,
            &headers,
            StatusCode::OK,
            "Register",
            "pages/register",
            &json!({
                "values": { "username": username },
                "errors": errors_json(errs),
            }),
            None,
        )
    };

    if !errs.is_empty() {
        return render_errors(errs);
    }

    let user = match auth_service::register_user(&state, &username, &form.password1).await {
        Ok(u) => u,
        Err(errs) => return render_errors(errs),
    };

    let jar = match session_cookie_jar(&state, jar, &user) {
        Ok(j) => j,
        Err(e) => {
            error!("could not issue session token: {e}");
            let mut errs = FieldErrors::new();
            errs.insert("_form".into(), "There is a problem registering this user!".into());
            return render_errors(errs);
        }
    };

    info!("registered user {}", user.username);
    let jar = jar.add(render::flash_cookie("registered"));
    (jar, render::redirect(&headers, DASHBOARD_PATH)).into_response()
}

// ---------------- LOGOUT ----------------

pub async fn logout(State(state): State<AppState>, headers: HeaderMap, jar: CookieJar) -> Response {
    let jar = jar.add(auth_service::clear_auth_cookie(&state));
    (jar, render::redirect(&headers, "/")).into_response()
}
