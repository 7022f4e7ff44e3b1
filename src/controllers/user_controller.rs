use axum::{
    extract::{Extension, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::{
    auth::login_redirect_target,
    models::CurrentUser,
    render,
    services::{auth_service, user_service},
    AppState,
};

pub async fn dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    user: Option<Extension<CurrentUser>>,
) -> Response {
    let Some(Extension(user)) = user else {
        return render::redirect(&headers, &login_redirect_target("/users/dashboard"));
    };

    let (jar, flash) = render::take_flash(jar, Some(&user));
    let page = render::page_with_flash(
        &state,
        &headers,
        StatusCode::OK,
        "Dashboard",
        "pages/dashboard",
        &json!({ "username": user.username, "is_premium": user.is_premium }),
        Some(&user),
        flash.as_deref(),
    );
    (jar, page).into_response()
}

// ---------------- CHANGE PASSWORD ----------------

pub async fn get_change_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: Option<Extension<CurrentUser>>,
) -> Response {
    let Some(Extension(user)) = user else {
        return render::redirect(&headers, &login_redirect_target("/users/change-password"));
    };

    render::page(
        &state,
        &headers,
        StatusCode::OK,
        "Change password",
        "pages/change_password",
        &json!({}),
        Some(&user),
    )
}

#[derive(Deserialize)]
pub struct ChangePasswordForm {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password1: String,
    #[serde(default)]
    pub new_password2: String,
}

pub async fn post_change_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    user: Option<Extension<CurrentUser>>,
    Form(form): Form<ChangePasswordForm>,
) -> Response {
    let Some(Extension(user)) = user else {
        return render::redirect(&headers, &login_redirect_target("/users/change-password"));
    };

    let mut errs = auth_service::validate_new_password(&user.username, &form.new_password1, &form.new_password2);
    if form.old_password.is_empty() {
        errs.insert("old_password".into(), "This field is required.".into());
    }

    if errs.is_empty() {
        if let Err(e) =
            user_service::change_password(&state, user.id, &form.old_password, &form.new_password1).await
        {
            errs = e;
        }
    }

    if !errs.is_empty() {
        return render::page(
            &state,
            &headers,
            StatusCode::OK,
            "Change password",
            "pages/change_password",
            &json!({ "errors": errs }),
            Some(&user),
        );
    }

    info!("user {} changed their password", user.username);

    // Fresh token so the current session survives the change.
    let jar = match auth_service::make_jwt_with_days(&state, &user.id, auth_service::SESSION_DAYS) {
        Ok(token) => jar.add(auth_service::auth_cookie(&state, token)),
        Err(e) => {
            error!("could not reissue session token: {e}");
            jar
        }
    };
    let jar = jar.add(render::flash_cookie("password_changed"));

    (jar, render::redirect(&headers, "/users/change-password/done")).into_response()
}

pub async fn change_password_done(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    user: Option<Extension<CurrentUser>>,
) -> Response {
    let Some(Extension(user)) = user else {
        return render::redirect(&headers, &login_redirect_target("/users/change-password/done"));
    };

    let (jar, flash) = render::take_flash(jar, Some(&user));
    let page = render::page_with_flash(
        &state,
        &headers,
        StatusCode::OK,
        "Password changed",
        "pages/change_password_done",
        &json!({}),
        Some(&user),
        flash.as_deref(),
    );
    (jar, page).into_response()
}
