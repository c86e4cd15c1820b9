use crate::error::{AppError, AppResult};
use crate::utils::hashid::{HashidError, Hashids, DEFAULT_ALPHABET};
use std::collections::HashMap;
use std::env;
use std::sync::Arc;

/// Connection for every model ID that is not a user ID.
pub const MAIN_CONNECTION: &str = "main";
/// Connection for user IDs.
pub const USERS_CONNECTION: &str = "users";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub salt: String,
    pub length: usize,
    pub alphabet: String,
}

impl ConnectionConfig {
    /// Reads `HASHIDS_<NAME>_SALT`, `HASHIDS_<NAME>_LENGTH` and
    /// `HASHIDS_<NAME>_ALPHABET` through `lookup`.
    fn from_lookup<F>(name: &str, default_length: usize, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = format!("HASHIDS_{}", name.to_ascii_uppercase());

        let salt = lookup(&format!("{prefix}_SALT")).unwrap_or_else(|| name.to_string());
        let length = lookup(&format!("{prefix}_LENGTH"))
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(default_length);
        let alphabet = lookup(&format!("{prefix}_ALPHABET"))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_ALPHABET.to_string());

        Self {
            salt,
            length,
            alphabet,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HashidsConfig {
    pub connections: Vec<(String, ConnectionConfig)>,
}

impl HashidsConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let connections = [(MAIN_CONNECTION, 8), (USERS_CONNECTION, 12)]
            .into_iter()
            .map(|(name, default_length)| {
                (
                    name.to_string(),
                    ConnectionConfig::from_lookup(name, default_length, &lookup),
                )
            })
            .collect();

        Self { connections }
    }

    /// Build one immutable codec per connection.
    pub fn build(&self) -> Result<HashidsManager, HashidError> {
        let mut connections = HashMap::with_capacity(self.connections.len());
        for (name, cfg) in &self.connections {
            let codec = Hashids::new(&cfg.salt, cfg.length, &cfg.alphabet)?;
            connections.insert(name.clone(), codec);
        }
        Ok(HashidsManager {
            connections: Arc::new(connections),
        })
    }
}

/// Registry of named codecs. Switching connection is a lookup, never a
/// mutation, so one manager is shared by every request.
#[derive(Debug, Clone)]
pub struct HashidsManager {
    connections: Arc<HashMap<String, Hashids>>,
}

impl HashidsManager {
    pub fn connection(&self, name: &str) -> AppResult<&Hashids> {
        self.connections
            .get(name)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Unknown hashids connection '{}'", name)))
    }

    pub fn main(&self) -> AppResult<&Hashids> {
        self.connection(MAIN_CONNECTION)
    }

    pub fn users(&self) -> AppResult<&Hashids> {
        self.connection(USERS_CONNECTION)
    }

    pub fn encode_id(&self, connection: &str, id: i32) -> AppResult<String> {
        Ok(self.connection(connection)?.encode_id(id))
    }

    /// Decode an inbound opaque ID; anything undecodable is a client error.
    pub fn decode_id(&self, connection: &str, raw: &str) -> AppResult<i32> {
        self.connection(connection)?
            .decode_id(raw.trim())
            .ok_or(AppError::InvalidIdentifier)
    }
}
