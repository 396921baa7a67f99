//! Process-lifetime context storage.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::types::Turn;

use super::Scope;

#[derive(Debug, Default)]
pub struct MemoryStore {
    contexts: RwLock<HashMap<Scope, Vec<Turn>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(&self, scope: &Scope, turn: Turn) {
        self.contexts
            .write()
            .await
            .entry(*scope)
            .or_default()
            .push(turn);
    }

    pub async fn read_all(&self, scope: &Scope) -> Vec<Turn> {
        self.contexts
            .read()
            .await
            .get(scope)
            .cloned()
            .unwrap_or_default()
    }

    /// Clears the existing history in place instead of dropping the entry.
    pub async fn reset(&self, scope: &Scope) {
        if let Some(turns) = self.contexts.write().await.get_mut(scope) {
            turns.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_scope_reads_empty() {
        let store = MemoryStore::new();
        assert!(store.read_all(&Scope::Thread(3)).await.is_empty());
    }

    #[tokio::test]
    async fn reset_empties_and_scope_stays_usable() {
        let store = MemoryStore::new();
        let scope = Scope::Channel(1);
        store.append(&scope, Turn::user("hello")).await;
        store.append(&scope, Turn::assistant("hi")).await;

        store.reset(&scope).await;
        assert!(store.read_all(&scope).await.is_empty());

        store.append(&scope, Turn::user("again")).await;
        assert_eq!(store.read_all(&scope).await, vec![Turn::user("again")]);
    }

    #[tokio::test]
    async fn scopes_do_not_share_history() {
        let store = MemoryStore::new();
        store.append(&Scope::Channel(1), Turn::user("a")).await;
        store.append(&Scope::Channel(2), Turn::user("b")).await;

        assert_eq!(
            store.read_all(&Scope::Channel(1)).await,
            vec![Turn::user("a")]
        );
    }

    #[tokio::test]
    async fn turns_keep_append_order() {
        let store = MemoryStore::new();
        let scope = Scope::Member {
            channel: 1,
            user: 2,
        };
        for text in ["one", "two", "two", "three"] {
            store.append(&scope, Turn::user(text)).await;
        }

        let texts: Vec<String> = store
            .read_all(&scope)
            .await
            .into_iter()
            .map(|turn| turn.text)
            .collect();
        assert_eq!(texts, ["one", "two", "two", "three"]);
    }
}
