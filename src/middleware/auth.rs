use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::{models::CurrentUser, render::is_htmx, AppState};

pub const LOGIN_PATH: &str = "/users/login";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    // user id as hex string
    pub sub: String,
    // expiry (unix timestamp seconds)
    pub exp: usize,
}

fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;

    for part in raw.split(';') {
        let part = part.trim();
        let mut it = part.splitn(2, '=');
        let k = it.next()?.trim();
        let v = it.next()?.trim();
        if k == name {
            return Some(v.to_string());
        }
    }
    None
}

pub async fn inject_current_user(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let cookie_name = state.settings.jwt_cookie_name.as_str();

    if let Some(token) = get_cookie(req.headers(), cookie_name) {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(state.settings.jwt_secret.as_bytes()),
            &validation,
        );

        if let Ok(data) = decoded {
            if let Ok(user_id) = ObjectId::parse_str(&data.claims.sub) {
                if let Ok(Some(user)) = state.store.users.find_by_id(user_id).await {
                    if user.is_active {
                        // Store user in request extensions so handlers can access it
                        req.extensions_mut().insert(CurrentUser::from(user));
                    }
                }
            }
        }
    }

    next.run(req).await
}

fn is_login_required(path: &str) -> bool {
    path == "/integrations"
        || path.starts_with("/integrations/")
        || path == "/users/dashboard"
        || path.starts_with("/users/change-password")
}

/// Where anonymous users are sent, remembering the page they asked for.
pub fn login_redirect_target(path: &str) -> String {
    let next: String = url::form_urlencoded::byte_serialize(path.as_bytes()).collect();
    format!("{LOGIN_PATH}?next={next}")
}

pub async fn require_auth(
    State(_state): State<AppState>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();

    if !is_login_required(&path) {
        return next.run(req).await;
    }

    // If inject_current_user already put CurrentUser in extensions => authenticated
    if req.extensions().get::<CurrentUser>().is_some() {
        return next.run(req).await;
    }

    let target = login_redirect_target(&path);

    // HTMX: force full redirect, normal: 303 to the login page
    if is_htmx(req.headers()) {
        let mut headers = HeaderMap::new();
        if let Ok(v) = HeaderValue::from_str(&target) {
            headers.insert("HX-Redirect", v);
        }
        return (StatusCode::OK, headers, Html("".to_string())).into_response();
    }

    Redirect::to(&target).into_response()
}
