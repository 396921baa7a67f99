//! Messaging platform boundary.
//!
//! The chatbot only talks to Discord through [`Gateway`], which keeps the
//! interaction logic independent of serenity types.

mod discord;

use crate::error::Result;

pub use discord::DiscordGateway;

/// Auto-archive duration for threads the bot opens.
pub const THREAD_AUTO_ARCHIVE_MINUTES: u16 = 60;

/// Inbound message as seen by the chatbot.
#[derive(Debug, Clone)]
pub struct Inbound {
    pub id: u64,
    pub author_id: u64,
    pub author_name: String,
    pub author_is_bot: bool,
    pub content: String,
    pub channel_id: u64,
    pub guild_id: Option<u64>,
    pub in_thread: bool,
    pub reference: Option<u64>,
}

/// A message looked up by id, used to resolve replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMessage {
    pub author_id: u64,
    pub content: String,
}

/// Who the bot is on the platform.
#[derive(Debug, Clone, Default)]
pub struct BotIdentity {
    pub user_id: u64,
    pub role_ids: Vec<u64>,
}

impl BotIdentity {
    /// Mention tokens that address the bot directly or through one of its roles.
    #[must_use]
    pub fn mention_tokens(&self) -> Vec<String> {
        let mut tokens = vec![
            format!("<@{}>", self.user_id),
            format!("<@!{}>", self.user_id),
        ];
        tokens.extend(self.role_ids.iter().map(|role| format!("<@&{role}>")));
        tokens
    }

    #[must_use]
    pub fn is_mentioned_in(&self, text: &str) -> bool {
        self.mention_tokens()
            .iter()
            .any(|token| text.contains(token.as_str()))
    }

    /// Remove every mention of the bot and trim what is left.
    #[must_use]
    pub fn strip_mentions(&self, text: &str) -> String {
        self.mention_tokens()
            .iter()
            .fold(text.to_string(), |acc, token| acc.replace(token.as_str(), ""))
            .trim()
            .to_string()
    }
}

/// Outbound operations the chatbot needs from the platform.
///
/// Uses native async fn in traits; implementors may write `async fn`.
pub trait Gateway: Send + Sync {
    /// Best-effort typing indicator.
    fn broadcast_typing(&self, channel_id: u64) -> impl Future<Output = Result<()>> + Send;

    /// Send `text` to the channel, optionally as a reply to `reply_to`.
    fn send_message(
        &self,
        channel_id: u64,
        reply_to: Option<u64>,
        text: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    fn fetch_message(
        &self,
        channel_id: u64,
        message_id: u64,
    ) -> impl Future<Output = Result<FetchedMessage>> + Send;

    /// Open a private thread in the channel and return its id.
    fn create_private_thread(
        &self,
        channel_id: u64,
        name: &str,
        auto_archive_minutes: u16,
    ) -> impl Future<Output = Result<u64>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> BotIdentity {
        BotIdentity {
            user_id: 42,
            role_ids: vec![7],
        }
    }

    #[test]
    fn detects_user_nickname_and_role_mentions() {
        let bot = identity();
        assert!(bot.is_mentioned_in("<@42> hello"));
        assert!(bot.is_mentioned_in("hey <@!42>"));
        assert!(bot.is_mentioned_in("<@&7> anyone?"));
        assert!(!bot.is_mentioned_in("<@43> hello"));
        assert!(!bot.is_mentioned_in("<@&8> anyone?"));
    }

    #[test]
    fn strips_mentions_and_whitespace() {
        let bot = identity();
        assert_eq!(bot.strip_mentions("<@42> hello"), "hello");
        assert_eq!(bot.strip_mentions(" <@&7>  what is rust? <@!42>"), "what is rust?");
        assert_eq!(bot.strip_mentions("<@1> hi"), "<@1> hi");
    }
}
