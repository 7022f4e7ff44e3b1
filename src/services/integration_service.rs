//! Brokerage integrations: the record lives in the store, the password in
//! the credential store under the same (provider, username) pair.
//!
//! Saving writes the secret first and the record second. If the record
//! write fails, the secret that was there before is put back, so the two
//! never drift apart.

use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use serde_json::json;
use tracing::{info, warn};

use crate::{
    error::{Error, Result},
    models::{key_name, Integration, Provider},
    AppState,
};

use super::auth_service::FieldErrors;

/// Symbol quoted to check that the market-data connection works.
pub const VERIFY_SYMBOL: &str = "AAPL";
pub const USERNAME_MAX: usize = 255;

pub const DUPLICATE_PROVIDER: &str = "Integration with this User and Provider already exists.";

#[derive(Debug, Clone)]
pub struct IntegrationInput {
    pub provider: String,
    pub username: String,
    pub password: String,
}

pub struct ValidInput {
    pub provider: Provider,
    pub username: String,
    pub password: String,
}

pub fn validate(input: &IntegrationInput) -> Result<ValidInput, FieldErrors> {
    let mut errs = FieldErrors::new();

    let provider = if input.provider.trim().is_empty() {
        errs.insert("provider".into(), "This field is required.".into());
        None
    } else {
        match input.provider.parse::<Provider>() {
            Ok(p) => Some(p),
            Err(msg) => {
                errs.insert("provider".into(), msg);
                None
            }
        }
    };

    let username = input.username.trim().to_string();
    if username.is_empty() {
        errs.insert("username".into(), "This field is required.".into());
    } else if username.chars().count() > USERNAME_MAX {
        errs.insert("username".into(), "Ensure this value has at most 255 characters.".into());
    }

    if input.password.is_empty() {
        errs.insert("password".into(), "This field is required.".into());
    }

    match provider {
        Some(provider) if errs.is_empty() => Ok(ValidInput {
            provider,
            username,
            password: input.password.clone(),
        }),
        _ => Err(errs),
    }
}

fn form_error(key: &str, msg: &str) -> FieldErrors {
    let mut errs = FieldErrors::new();
    errs.insert(key.into(), msg.into());
    errs
}

fn restore_secret(state: &AppState, provider: Provider, username: &str, previous: Option<&str>) {
    let res = match previous {
        Some(secret) => state.credentials.set(provider.as_str(), username, secret),
        None => state.credentials.delete(provider.as_str(), username),
    };
    if let Err(e) = res {
        warn!("could not roll back credential {}: {e}", key_name(provider, username));
    }
}

/// Drops the secret of a record that is going away, unless another record
/// (possibly another user's) still files its secret under the same key.
async fn release_secret(state: &AppState, provider: Provider, username: &str, leaving: ObjectId) {
    let key = key_name(provider, username);
    match state.store.integrations.key_in_use(&key, leaving).await {
        Ok(false) => {
            if let Err(e) = state.credentials.delete(provider.as_str(), username) {
                warn!("stale credential {key} left behind: {e}");
            }
        }
        Ok(true) => info!("credential {key} still in use, keeping it"),
        Err(e) => warn!("could not check users of credential {key}, keeping it: {e}"),
    }
}

/// Creates (`existing == None`) or updates an integration owned by `user_id`.
pub async fn save(
    state: &AppState,
    user_id: ObjectId,
    existing: Option<Integration>,
    input: &IntegrationInput,
) -> Result<Integration, FieldErrors> {
    let valid = validate(input)?;

    match state.store.integrations.find_by_provider(user_id, valid.provider).await {
        Ok(Some(other)) if existing.as_ref().map(|e| e.id) != Some(other.id) => {
            return Err(form_error("provider", DUPLICATE_PROVIDER));
        }
        Ok(_) => {}
        Err(e) => {
            warn!("integration lookup failed: {e}");
            return Err(form_error("_form", "Could not save the integration. Please try again."));
        }
    }

    let provider = valid.provider;
    let username = valid.username.as_str();

    let previous = match state.credentials.get(provider.as_str(), username) {
        Ok(p) => p,
        Err(e) => {
            warn!("credential store unavailable: {e}");
            return Err(form_error("_form", "The credential store is unavailable."));
        }
    };

    if let Err(e) = state.credentials.set(provider.as_str(), username, &valid.password) {
        warn!("could not store credential {}: {e}", key_name(provider, username));
        return Err(form_error("_form", "The credential store is unavailable."));
    }

    let now = Utc::now().timestamp();
    let (record, old_key) = match existing {
        Some(mut inst) => {
            let old_key = (inst.provider, inst.username.clone());
            inst.provider = provider;
            inst.username = username.to_string();
            inst.key_name = key_name(provider, username);
            inst.updated_at = now;
            (inst, Some(old_key))
        }
        None => (Integration::new(user_id, provider, username, now), None),
    };

    let written = if old_key.is_some() {
        state.store.integrations.update(&record).await
    } else {
        state.store.integrations.insert(&record).await
    };

    if let Err(e) = written {
        restore_secret(state, provider, username, previous.as_deref());
        return Err(match e {
            Error::Duplicate(_) => form_error("provider", DUPLICATE_PROVIDER),
            e => {
                warn!("integration write failed: {e}");
                form_error("_form", "Could not save the integration. Please try again.")
            }
        });
    }

    if let Some((old_provider, old_username)) = old_key {
        if (old_provider, old_username.as_str()) != (provider, username) {
            release_secret(state, old_provider, &old_username, record.id).await;
        }
    }

    info!("saved integration {}", record.key_name);
    Ok(record)
}

/// Looks up an integration the user owns. Malformed ids are "not found".
pub async fn get_owned(state: &AppState, user_id: ObjectId, id: &str) -> Result<Integration> {
    let oid = ObjectId::parse_str(id).map_err(|_| Error::NotFound)?;
    state
        .store
        .integrations
        .get_for_user(oid, user_id)
        .await?
        .ok_or(Error::NotFound)
}

/// Secret shown in the edit form; empty when missing or unreadable.
pub fn stored_password(state: &AppState, inst: &Integration) -> String {
    match state.credentials.get(inst.provider.as_str(), &inst.username) {
        Ok(p) => p.unwrap_or_default(),
        Err(e) => {
            warn!("could not load credential {}: {e}", inst.key_name);
            String::new()
        }
    }
}

/// One quote request decides the flag; every kind of failure counts as `false`.
pub async fn verify(state: &AppState, user_id: ObjectId, id: &str) -> Result<bool> {
    let inst = get_owned(state, user_id, id).await?;

    let verified = match state.market_data.quote(VERIFY_SYMBOL).await {
        Ok(Some(_)) => true,
        Ok(None) => false,
        Err(e) => {
            info!("verification of {} failed: {e}", inst.key_name);
            false
        }
    };

    state
        .store
        .integrations
        .set_verified(inst.id, user_id, verified, Utc::now().timestamp())
        .await?;

    Ok(verified)
}

pub async fn delete(state: &AppState, user_id: ObjectId, id: &str) -> Result<()> {
    let inst = get_owned(state, user_id, id).await?;

    if !state.store.integrations.delete_for_user(inst.id, user_id).await? {
        return Err(Error::NotFound);
    }

    release_secret(state, inst.provider, &inst.username, inst.id).await;
    Ok(())
}

pub async fn list_ctx(state: &AppState, user_id: ObjectId) -> Result<serde_json::Value> {
    let items = state.store.integrations.list_for_user(user_id).await?;

    let rows: Vec<_> = items
        .iter()
        .map(|i| {
            json!({
                "id": i.id.to_hex(),
                "provider": i.provider.as_str(),
                "provider_label": i.provider.label(),
                "username": i.username,
                "key_name": i.key_name,
                "verified": i.verified,
                "updated_at": super::news_service::fmt_timestamp(i.updated_at),
            })
        })
        .collect();

    Ok(json!({ "items": rows, "has_items": !rows.is_empty() }))
}

pub fn provider_options(selected: &str) -> Vec<serde_json::Value> {
    Provider::ALL
        .iter()
        .map(|p| {
            json!({
                "value": p.as_str(),
                "label": p.label(),
                "selected": p.as_str() == selected,
            })
        })
        .collect()
}
