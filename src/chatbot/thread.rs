//! Private thread provisioning for thread-scoped conversations.

use log::{info, warn};
use strum::EnumString;

use crate::error::Result;
use crate::gateway::{Gateway, THREAD_AUTO_ARCHIVE_MINUTES};
use crate::ollama::ChatModel;
use crate::types::Turn;

/// Used when no better label can be derived.
pub const DEFAULT_THREAD_LABEL: &str = "discussion";

/// Discord's thread name limit in characters.
const MAX_THREAD_NAME_LENGTH: usize = 100;

const MAX_KEYWORDS: usize = 3;

const STOP_WORDS: &[&str] = &[
    "about", "after", "all", "also", "and", "any", "are", "because", "been", "but", "can",
    "could", "did", "does", "for", "from", "had", "has", "have", "her", "his", "how", "into",
    "its", "just", "like", "more", "not", "now", "off", "one", "our", "out", "please", "she",
    "should", "some", "tell", "than", "that", "the", "their", "them", "then", "there", "these",
    "they", "this", "those", "was", "way", "were", "what", "when", "where", "which", "who",
    "why", "will", "with", "would", "you", "your",
];

const SUMMARIZE_PROMPT: &str = "Summarize the following message as a short topic label of \
    at most five words. Reply with the label only.";

/// How a new thread gets its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum ThreadLabelStrategy {
    /// First few non-trivial words of the message
    Keywords,
    /// Ask the model for a short label
    Summarize,
}

/// Up to three non-trivial words from `text`, lowercased.
#[must_use]
pub fn keyword_label(text: &str) -> Option<String> {
    let words: Vec<String> = text
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|word| word.chars().count() >= 3 && !STOP_WORDS.contains(&word.as_str()))
        .take(MAX_KEYWORDS)
        .collect();

    (!words.is_empty()).then(|| words.join(" "))
}

/// Ask the model to label `text`; `None` on failure or an empty answer.
pub async fn summarize_label<M: ChatModel>(model: &M, text: &str) -> Option<String> {
    let prompt = Turn::user(format!("{SUMMARIZE_PROMPT}\n\n{text}"));
    match model.chat(&[prompt]).await {
        Ok(Some(turn)) => {
            let label = turn
                .text
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())?
                .trim_matches(|c: char| matches!(c, '"' | '\'' | '*' | '.' | '`'))
                .trim()
                .to_string();
            (!label.is_empty()).then_some(label)
        }
        Ok(None) => None,
        Err(e) => {
            warn!("Failed to summarize thread label: {e}");
            None
        }
    }
}

/// Thread name for `text` under the strategy, clipped to Discord's limit.
pub async fn derive_label<M: ChatModel>(
    strategy: ThreadLabelStrategy,
    model: &M,
    text: &str,
) -> String {
    let label = match strategy {
        ThreadLabelStrategy::Keywords => keyword_label(text),
        ThreadLabelStrategy::Summarize => summarize_label(model, text).await,
    };

    label
        .unwrap_or_else(|| DEFAULT_THREAD_LABEL.to_string())
        .chars()
        .take(MAX_THREAD_NAME_LENGTH)
        .collect()
}

/// Open a private thread for a new conversation and return its id.
///
/// # Errors
///
/// Returns an error if the platform refuses to create the thread.
pub async fn provision_thread<G: Gateway, M: ChatModel>(
    gateway: &G,
    model: &M,
    strategy: ThreadLabelStrategy,
    channel_id: u64,
    text: &str,
) -> Result<u64> {
    let name = derive_label(strategy, model, text).await;
    let thread_id = gateway
        .create_private_thread(channel_id, &name, THREAD_AUTO_ARCHIVE_MINUTES)
        .await?;
    info!("Opened thread '{name}' ({thread_id}) in channel {channel_id}");
    Ok(thread_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BotError;
    use crate::testing::{FakeGateway, FakeModel};

    #[test]
    fn keywords_skip_stop_words_and_short_words() {
        assert_eq!(
            keyword_label("How do I configure the Rust borrow checker?"),
            Some("configure rust borrow".to_string())
        );
        assert_eq!(keyword_label("is it ok?"), None);
        assert_eq!(keyword_label(""), None);
    }

    #[tokio::test]
    async fn summarize_uses_first_line_without_quotes() {
        let model = FakeModel::replying([Ok(Some(Turn::assistant("\"Async Rust\"\nmore text")))]);
        assert_eq!(
            summarize_label(&model, "tell me about tokio").await,
            Some("Async Rust".to_string())
        );
        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0][0].text.ends_with("tell me about tokio"));
    }

    #[tokio::test]
    async fn summarize_falls_back_to_default() {
        let failing = FakeModel::replying([Err(BotError::OllamaResponse("down".to_string()))]);
        assert_eq!(
            derive_label(ThreadLabelStrategy::Summarize, &failing, "hi").await,
            DEFAULT_THREAD_LABEL
        );

        let empty = FakeModel::replying([Ok(Some(Turn::assistant("  \"\"  ")))]);
        assert_eq!(
            derive_label(ThreadLabelStrategy::Summarize, &empty, "hi").await,
            DEFAULT_THREAD_LABEL
        );
    }

    #[tokio::test]
    async fn labels_are_clipped() {
        let model = FakeModel::replying([Ok(Some(Turn::assistant("x".repeat(300))))]);
        let label = derive_label(ThreadLabelStrategy::Summarize, &model, "hi").await;
        assert_eq!(label.chars().count(), MAX_THREAD_NAME_LENGTH);
    }

    #[tokio::test]
    async fn provision_creates_private_thread() -> Result<()> {
        let gateway = FakeGateway::default();
        let model = FakeModel::default();

        let thread_id = provision_thread(
            &gateway,
            &model,
            ThreadLabelStrategy::Keywords,
            10,
            "deploying kubernetes clusters today",
        )
        .await?;

        let threads = gateway.threads();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].id, thread_id);
        assert_eq!(threads[0].parent, 10);
        assert_eq!(threads[0].name, "deploying kubernetes clusters");
        assert_eq!(threads[0].auto_archive_minutes, THREAD_AUTO_ARCHIVE_MINUTES);
        assert!(model.calls().is_empty());
        Ok(())
    }
}
