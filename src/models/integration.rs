use std::{fmt, str::FromStr};

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Webull,
    Robinhood,
    Fidelity,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Webull, Provider::Robinhood, Provider::Fidelity];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Webull => "webull",
            Provider::Robinhood => "robinhood",
            Provider::Fidelity => "fidelity",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Provider::Webull => "Webull",
            Provider::Robinhood => "Robinhood",
            Provider::Fidelity => "Fidelity",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| format!("Select a valid choice. {} is not one of the available choices.", s.trim()))
    }
}

/// Name under which the secret is filed in the credential store.
pub fn key_name(provider: Provider, username: &str) -> String {
    format!("{provider}:{username}")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Integration {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub user_id: ObjectId,
    pub provider: Provider,
    pub username: String,

    // always provider:username, the password itself lives in the credential store
    pub key_name: String,

    #[serde(default)]
    pub verified: bool,

    pub updated_at: i64,
}

impl Integration {
    pub fn new(user_id: ObjectId, provider: Provider, username: &str, now: i64) -> Self {
        Self {
            id: ObjectId::new(),
            user_id,
            provider,
            username: username.to_string(),
            key_name: key_name(provider, username),
            verified: false,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parses_known_values_only() {
        assert_eq!("robinhood".parse::<Provider>(), Ok(Provider::Robinhood));
        assert_eq!(" fidelity ".parse::<Provider>(), Ok(Provider::Fidelity));
        assert!("etrade".parse::<Provider>().is_err());
        assert!("Webull".parse::<Provider>().is_err());
    }

    #[test]
    fn key_name_joins_provider_and_username() {
        assert_eq!(key_name(Provider::Webull, "alice"), "webull:alice");

        let inst = Integration::new(ObjectId::new(), Provider::Fidelity, "bob@example.com", 0);
        assert_eq!(inst.key_name, "fidelity:bob@example.com");
        assert!(!inst.verified);
    }
}
