use std::{collections::HashMap, sync::OnceLock};

use axum_extra::extract::cookie::{Cookie, SameSite};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use mongodb::bson::oid::ObjectId;
use regex::Regex;
use tracing::{error, warn};

use crate::{
    auth::Claims,
    error::Error,
    models::{NewUser, User},
    AppState,
};

pub type FieldErrors = HashMap<String, String>;

pub const SESSION_DAYS: i64 = 7;
pub const USERNAME_MAX: usize = 150;
pub const PASSWORD_MIN: usize = 8;

pub const LOGIN_FAILED: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

fn username_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\w.@+-]+$").expect("static regex"))
}

pub fn make_jwt_with_days(state: &AppState, user_id: &ObjectId, days: i64) -> Result<String, String> {
    let exp = (Utc::now() + Duration::days(days)).timestamp() as usize;

    let claims = Claims {
        sub: user_id.to_hex(),
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.settings.jwt_secret.as_bytes()),
    )
    .map_err(|e| e.to_string())
}

pub fn auth_cookie(state: &AppState, token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(state.settings.jwt_cookie_name.clone(), token);
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    if state.settings.cookie_secure {
        cookie.set_secure(true);
    }
    cookie
}

pub fn clear_auth_cookie(state: &AppState) -> Cookie<'static> {
    let mut cookie = Cookie::new(state.settings.jwt_cookie_name.clone(), "");
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.make_removal();
    cookie
}

pub fn validate_username(username: &str) -> Option<&'static str> {
    if username.is_empty() {
        Some("This field is required.")
    } else if username.chars().count() > USERNAME_MAX {
        Some("Ensure this value has at most 150 characters.")
    } else if !username_re().is_match(username) {
        Some("Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.")
    } else {
        None
    }
}

/// Checks a new password pair. Errors are keyed `password1` / `password2`.
pub fn validate_new_password(username: &str, password1: &str, password2: &str) -> FieldErrors {
    let mut errs = FieldErrors::new();

    if password1.is_empty() {
        errs.insert("password1".into(), "This field is required.".into());
    }
    if password2.is_empty() {
        errs.insert("password2".into(), "This field is required.".into());
    }
    if !errs.is_empty() {
        return errs;
    }

    if password1 != password2 {
        errs.insert("password2".into(), "The two password fields didn’t match.".into());
        return errs;
    }

    if password1.chars().count() < PASSWORD_MIN {
        errs.insert(
            "password2".into(),
            "This password is too short. It must contain at least 8 characters.".into(),
        );
    } else if password1.chars().all(|c| c.is_ascii_digit()) {
        errs.insert("password2".into(), "This password is entirely numeric.".into());
    } else if !username.is_empty() && password1.eq_ignore_ascii_case(username) {
        errs.insert("password2".into(), "The password is too similar to the username.".into());
    }

    errs
}

pub fn hash_password(password: &str) -> Result<String, String> {
    hash(password, DEFAULT_COST).map_err(|e| e.to_string())
}

pub fn check_password(password: &str, password_hash: &str) -> bool {
    verify(password, password_hash).unwrap_or(false)
}

pub async fn login_user(state: &AppState, username: &str, password: &str) -> Result<User, FieldErrors> {
    let mut errs: FieldErrors = HashMap::new();

    let user = match state.store.users.find_by_username(username).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            errs.insert("_form".into(), LOGIN_FAILED.into());
            return Err(errs);
        }
        Err(e) => {
            error!("login lookup failed: {e}");
            errs.insert("_form".into(), "Server error. Please try again.".into());
            return Err(errs);
        }
    };

    if !check_password(password, &user.password_hash) {
        errs.insert("_form".into(), LOGIN_FAILED.into());
        return Err(errs);
    }

    if !user.is_active {
        errs.insert("_form".into(), "This account is inactive.".into());
        return Err(errs);
    }

    if let Err(e) = state
        .store
        .users
        .touch_last_login(user.id, Utc::now().timestamp())
        .await
    {
        warn!("could not record last_login for {}: {e}", user.username);
    }

    Ok(user)
}

pub async fn register_user(state: &AppState, username: &str, password: &str) -> Result<User, FieldErrors> {
    let mut errs: FieldErrors = HashMap::new();

    match state.store.users.find_by_username(username).await {
        Ok(Some(_)) => {
            errs.insert("username".into(), "A user with that username already exists.".into());
            return Err(errs);
        }
        Ok(None) => {}
        Err(e) => {
            error!("register lookup failed: {e}");
            errs.insert("_form".into(), "There is a problem registering this user!".into());
            return Err(errs);
        }
    }

    let password_hash = match hash_password(password) {
        Ok(h) => h,
        Err(e) => {
            error!("password hashing failed: {e}");
            errs.insert("_form".into(), "There is a problem registering this user!".into());
            return Err(errs);
        }
    };

    let new_user = NewUser {
        username: username.to_string(),
        email: String::new(),
        password_hash,
    };

    match state.store.users.insert(new_user).await {
        Ok(u) => Ok(u),
        Err(Error::Duplicate(_)) => {
            errs.insert("username".into(), "A user with that username already exists.".into());
            Err(errs)
        }
        Err(e) => {
            error!("register insert failed: {e}");
            errs.insert("_form".into(), "There is a problem registering this user!".into());
            Err(errs)
        }
    }
}

/// Only local absolute paths are honoured as post-login targets.
pub fn safe_next(next: Option<&str>) -> Option<String> {
    let next = next?.trim();
    if next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') {
        Some(next.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert_eq!(validate_username("alice.b+1@x-y_z"), None);
        assert!(validate_username("").is_some());
        assert!(validate_username("has space").is_some());
        assert!(validate_username(&"a".repeat(151)).is_some());
    }

    #[test]
    fn password_pair_rules() {
        assert!(validate_new_password("alice", "correct-horse", "correct-horse").is_empty());

        let errs = validate_new_password("alice", "abcdefgh1", "abcdefgh2");
        assert_eq!(errs["password2"], "The two password fields didn’t match.");

        let errs = validate_new_password("alice", "short", "short");
        assert!(errs["password2"].contains("at least 8 characters"));

        let errs = validate_new_password("alice", "12345678", "12345678");
        assert!(errs["password2"].contains("entirely numeric"));

        let errs = validate_new_password("alicealice", "AliceAlice", "AliceAlice");
        assert!(errs["password2"].contains("too similar"));

        let errs = validate_new_password("alice", "", "");
        assert!(errs.contains_key("password1"));
        assert!(errs.contains_key("password2"));
    }

    #[test]
    fn next_must_be_a_local_path() {
        assert_eq!(safe_next(Some("/integrations")), Some("/integrations".to_string()));
        assert_eq!(safe_next(Some("//evil.example")), None);
        assert_eq!(safe_next(Some("https://evil.example")), None);
        assert_eq!(safe_next(None), None);
    }
}
