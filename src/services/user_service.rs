use mongodb::bson::oid::ObjectId;
use tracing::error;

use crate::AppState;

use super::auth_service::{self, FieldErrors};

/// Verifies `old_password`, then stores the hash of `new_password`.
/// The new password pair must already be validated.
pub async fn change_password(
    state: &AppState,
    user_id: ObjectId,
    old_password: &str,
    new_password: &str,
) -> Result<(), FieldErrors> {
    let mut errs = FieldErrors::new();

    let db_user = match state.store.users.find_by_id(user_id).await {
        Ok(Some(u)) => u,
        _ => {
            errs.insert("_form".into(), "User not found.".into());
            return Err(errs);
        }
    };

    if !auth_service::check_password(old_password, &db_user.password_hash) {
        errs.insert(
            "old_password".into(),
            "Your old password was entered incorrectly. Please enter it again.".into(),
        );
        return Err(errs);
    }

    let pw_hash = match auth_service::hash_password(new_password) {
        Ok(h) => h,
        Err(_) => {
            errs.insert("_form".into(), "Failed to hash password.".into());
            return Err(errs);
        }
    };

    if let Err(e) = state.store.users.set_password_hash(user_id, &pw_hash).await {
        error!("password update failed: {e}");
        errs.insert("_form".into(), format!("db error: {e}"));
        return Err(errs);
    }

    Ok(())
}
