#![cfg(feature = "std")]
//! Contract for the account system the match engine relies on, plus an
//! in-process implementation.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Persistent player identifier issued by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        PlayerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("player not found")]
    NotFound,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("nickname {0:?} is already taken")]
    NickTaken(String),
    #[error("nickname must not be empty")]
    InvalidNick,
    #[error("identity service unavailable: {0}")]
    Unavailable(String),
}

#[async_trait::async_trait]
pub trait IdentityService: Send + Sync {
    /// Nickname of a registered player.
    async fn resolve_name(&self, id: &PlayerId) -> Result<String, IdentityError>;

    /// Nicknames of every player except `excluding`.
    async fn list_other_players(&self, excluding: &PlayerId) -> Result<Vec<String>, IdentityError>;

    async fn authenticate(&self, nick: &str, secret: &str) -> Result<PlayerId, IdentityError>;

    async fn register(&self, nick: &str, secret: &str) -> Result<PlayerId, IdentityError>;
}

struct Account {
    nick: String,
    secret: String,
}

#[derive(Default)]
struct Accounts {
    next_id: u64,
    by_id: HashMap<PlayerId, Account>,
}

/// Identity service kept in process memory. Nicknames are unique and
/// compared after trimming.
#[derive(Clone, Default)]
pub struct InMemoryIdentity {
    accounts: Arc<Mutex<Accounts>>,
}

impl InMemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl IdentityService for InMemoryIdentity {
    async fn resolve_name(&self, id: &PlayerId) -> Result<String, IdentityError> {
        let accounts = self.accounts.lock().await;
        accounts
            .by_id
            .get(id)
            .map(|a| a.nick.clone())
            .ok_or(IdentityError::NotFound)
    }

    async fn list_other_players(&self, excluding: &PlayerId) -> Result<Vec<String>, IdentityError> {
        let accounts = self.accounts.lock().await;
        let mut nicks: Vec<String> = accounts
            .by_id
            .iter()
            .filter(|(id, _)| *id != excluding)
            .map(|(_, a)| a.nick.clone())
            .collect();
        nicks.sort();
        Ok(nicks)
    }

    async fn authenticate(&self, nick: &str, secret: &str) -> Result<PlayerId, IdentityError> {
        let nick = nick.trim();
        let accounts = self.accounts.lock().await;
        accounts
            .by_id
            .iter()
            .find(|(_, a)| a.nick == nick && a.secret == secret)
            .map(|(id, _)| id.clone())
            .ok_or_else(|| {
                debug!("[InMemoryIdentity] failed login for {:?}", nick);
                IdentityError::InvalidCredentials
            })
    }

    async fn register(&self, nick: &str, secret: &str) -> Result<PlayerId, IdentityError> {
        let nick = nick.trim();
        if nick.is_empty() {
            return Err(IdentityError::InvalidNick);
        }
        let mut accounts = self.accounts.lock().await;
        if accounts.by_id.values().any(|a| a.nick == nick) {
            return Err(IdentityError::NickTaken(nick.to_owned()));
        }
        accounts.next_id += 1;
        let id = PlayerId::new(format!("player-{}", accounts.next_id));
        accounts.by_id.insert(
            id.clone(),
            Account {
                nick: nick.to_owned(),
                secret: secret.to_owned(),
            },
        );
        info!("[InMemoryIdentity] registered {:?} as {}", nick, id);
        Ok(id)
    }
}
