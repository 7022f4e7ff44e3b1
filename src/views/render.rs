use axum::{
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::json;

use crate::{models::CurrentUser, AppState};

pub const FLASH_COOKIE: &str = "flash";

pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("HX-Request")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn user_json(user: Option<&CurrentUser>) -> (bool, serde_json::Value) {
    match user {
        Some(u) => (
            true,
            json!({
                "id": u.id.to_hex(),
                "username": u.username,
                "is_premium": u.is_premium,
            }),
        ),
        None => (false, serde_json::Value::Null),
    }
}

pub fn render_full(
    state: &AppState,
    title: &str,
    body_html: String,
    user: Option<&CurrentUser>,
    flash: Option<&str>,
) -> Result<String, String> {
    let (is_logged_in, user_json) = user_json(user);

    let ctx = json!({
        "title": title,
        "body": body_html,
        "is_logged_in": is_logged_in,
        "user": user_json,
        "flash": flash,
    });

    state
        .hbs
        .render("layouts/base", &ctx)
        .map_err(|e| e.to_string())
}

/// Renders `tpl` as the page body: bare for HTMX requests, inside the
/// layout otherwise.
pub fn page(
    state: &AppState,
    headers: &HeaderMap,
    status: StatusCode,
    title: &str,
    tpl: &str,
    ctx: &serde_json::Value,
    user: Option<&CurrentUser>,
) -> Response {
    page_with_flash(state, headers, status, title, tpl, ctx, user, None)
}

#[allow(clippy::too_many_arguments)]
pub fn page_with_flash(
    state: &AppState,
    headers: &HeaderMap,
    status: StatusCode,
    title: &str,
    tpl: &str,
    ctx: &serde_json::Value,
    user: Option<&CurrentUser>,
    flash: Option<&str>,
) -> Response {
    let body = match state.hbs.render(tpl, ctx) {
        Ok(s) => s,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!("template error: {e}")),
            )
                .into_response()
        }
    };

    if is_htmx(headers) {
        return (status, Html(body)).into_response();
    }

    match render_full(state, title, body, user, flash) {
        Ok(page) => (status, Html(page)).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, Html(e)).into_response(),
    }
}

pub fn not_found_page(state: &AppState, headers: &HeaderMap, user: Option<&CurrentUser>) -> Response {
    page(state, headers, StatusCode::NOT_FOUND, "404", "pages/not_found", &json!({}), user)
}

/// HTMX requests get an `HX-Redirect`, everything else a 303.
pub fn redirect(headers: &HeaderMap, path: &str) -> Response {
    if is_htmx(headers) {
        let mut out = HeaderMap::new();
        if let Ok(v) = HeaderValue::from_str(path) {
            out.insert("HX-Redirect", v);
        }
        return (StatusCode::OK, out, Html(String::new())).into_response();
    }
    Redirect::to(path).into_response()
}

// ---------------- Flash ----------------

pub fn flash_cookie(code: &str) -> Cookie<'static> {
    let mut cookie = Cookie::new(FLASH_COOKIE, code.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

/// Reads and clears the one-shot message left by the previous redirect.
pub fn take_flash(jar: CookieJar, user: Option<&CurrentUser>) -> (CookieJar, Option<String>) {
    let Some(code) = jar.get(FLASH_COOKIE).map(|c| c.value().to_string()) else {
        return (jar, None);
    };

    let msg = match code.as_str() {
        "registered" => Some(format!(
            "Registration successful. Welcome, {}!",
            user.map(|u| u.username.as_str()).unwrap_or("")
        )),
        "password_changed" => Some("Your password was changed successfully.".to_string()),
        _ => None,
    };

    let mut removal = Cookie::from(FLASH_COOKIE);
    removal.set_path("/");
    (jar.remove(removal), msg)
}
