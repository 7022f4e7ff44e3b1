use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub username: String,

    #[serde(default)]
    pub email: String,

    pub password_hash: String,

    #[serde(default)]
    pub is_premium: bool,

    #[serde(default = "default_active")]
    pub is_active: bool,

    pub date_joined: i64,

    #[serde(default)]
    pub last_login: Option<i64>,
}

fn default_active() -> bool {
    true
}

/// Fields supplied at registration; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// The logged-in user as seen by handlers (never carries the password hash).
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    #[serde(serialize_with = "mongodb::bson::serde_helpers::serialize_object_id_as_hex_string")]
    pub id: ObjectId,
    pub username: String,
    pub is_premium: bool,
}

impl From<User> for CurrentUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            is_premium: u.is_premium,
        }
    }
}
