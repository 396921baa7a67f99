//! Conversation context storage keyed by scope.

mod memory;
mod sqlite;

use std::fmt;

use log::{debug, info};
use strum::EnumString;

use crate::config::Config;
use crate::error::Result;
use crate::gateway::Inbound;
use crate::types::Turn;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Key of one independent conversation context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Channel(u64),
    Member { channel: u64, user: u64 },
    Thread(u64),
}

impl Scope {
    /// Stable string form, stored in the `thread_id` column.
    #[must_use]
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Channel that replies for this scope are delivered to.
    #[must_use]
    pub fn delivery_channel(&self) -> u64 {
        match *self {
            Scope::Channel(channel) | Scope::Member { channel, .. } | Scope::Thread(channel) => {
                channel
            }
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Channel(channel) => write!(f, "channel:{channel}"),
            Scope::Member { channel, user } => write!(f, "member:{channel}:{user}"),
            Scope::Thread(thread) => write!(f, "thread:{thread}"),
        }
    }
}

/// How inbound messages map onto scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum ScopePolicy {
    /// One context per channel
    Channel,
    /// One context per user within a channel
    Member,
    /// One context per discussion thread
    Thread,
}

impl ScopePolicy {
    /// Whether scoping depends on the message being inside a thread.
    #[must_use]
    pub fn needs_thread_lookup(&self) -> bool {
        *self == ScopePolicy::Thread
    }

    /// Scope the message already belongs to.
    ///
    /// Returns `None` under the thread policy when the message was posted
    /// outside a thread, since that scope only exists once a thread is created.
    #[must_use]
    pub fn existing_scope(&self, message: &Inbound) -> Option<Scope> {
        self.scope_for(message.channel_id, message.author_id, message.in_thread)
    }

    #[must_use]
    pub fn scope_for(&self, channel_id: u64, author_id: u64, in_thread: bool) -> Option<Scope> {
        match self {
            ScopePolicy::Channel => Some(Scope::Channel(channel_id)),
            ScopePolicy::Member => Some(Scope::Member {
                channel: channel_id,
                user: author_id,
            }),
            ScopePolicy::Thread => in_thread.then_some(Scope::Thread(channel_id)),
        }
    }
}

/// Which backing holds the contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum ContextBackend {
    Memory,
    Sqlite,
}

/// Store of contexts, injected into the handler.
pub enum ContextStore {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

impl ContextStore {
    /// Build the store selected by configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the `SQLite` database cannot be opened.
    pub async fn from_config(config: &Config) -> Result<Self> {
        match config.context_backend {
            ContextBackend::Memory => {
                info!("Keeping conversation context in memory");
                Ok(ContextStore::Memory(MemoryStore::new()))
            }
            ContextBackend::Sqlite => {
                info!("Persisting conversation context to {}", config.database_url);
                Ok(ContextStore::Sqlite(
                    SqliteStore::connect(&config.database_url).await?,
                ))
            }
        }
    }

    /// Append one turn to the end of the scope's context.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted backing fails to write.
    pub async fn append(&self, scope: &Scope, turn: Turn) -> Result<()> {
        debug!("Appending {} turn to {scope}", turn.role.as_ref());
        match self {
            ContextStore::Memory(store) => {
                store.append(scope, turn).await;
                Ok(())
            }
            ContextStore::Sqlite(store) => store.save_turn(&scope.key(), &turn).await,
        }
    }

    /// Full ordered history for the scope, empty if it was never used.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted backing fails to read.
    pub async fn read_all(&self, scope: &Scope) -> Result<Vec<Turn>> {
        match self {
            ContextStore::Memory(store) => Ok(store.read_all(scope).await),
            ContextStore::Sqlite(store) => store.load_history(&scope.key()).await,
        }
    }

    /// Empty the scope's context; later appends start a fresh history.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted backing fails to delete.
    pub async fn reset(&self, scope: &Scope) -> Result<()> {
        info!("Resetting conversation context for {scope}");
        match self {
            ContextStore::Memory(store) => {
                store.reset(scope).await;
                Ok(())
            }
            ContextStore::Sqlite(store) => store.clear_history(&scope.key()).await,
        }
    }
}
