//! Decides whether an inbound message is meant for the bot.

use log::{debug, warn};
use strum::EnumString;

use crate::error::Result;
use crate::gateway::{BotIdentity, Gateway, Inbound};
use crate::types::Turn;

/// Which messages count as addressing the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum AddressingPolicy {
    /// Only direct or role mentions
    Mention,
    /// Mentions and replies to the bot's own messages
    MentionOrReply,
    /// Mentions, replies to the bot, and replies to messages already in context
    Contextual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Mention,
    ReplyToBot,
    ContextualReply,
}

/// Positive addressing decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addressed {
    pub trigger: Trigger,
    /// Text of the replied-to message, to be added to context as a user turn
    /// ahead of the new message.
    pub referenced_text: Option<String>,
}

impl AddressingPolicy {
    /// Whether evaluating this message needs the current context.
    #[must_use]
    pub fn needs_context(&self, message: &Inbound) -> bool {
        *self == AddressingPolicy::Contextual && message.reference.is_some()
    }

    /// Evaluate the policy against one message.
    ///
    /// # Errors
    ///
    /// Returns an error when the replied-to message cannot be fetched while
    /// deciding on a reply; the caller drops the event.
    pub async fn evaluate<G: Gateway>(
        &self,
        gateway: &G,
        identity: &BotIdentity,
        message: &Inbound,
        context: &[Turn],
    ) -> Result<Option<Addressed>> {
        if message.author_is_bot {
            return Ok(None);
        }

        if identity.is_mentioned_in(&message.content) {
            let referenced_text = if *self == AddressingPolicy::Contextual
                && let Some(reference) = message.reference
            {
                match gateway.fetch_message(message.channel_id, reference).await {
                    Ok(referenced) if referenced.author_id != identity.user_id => {
                        Some(identity.strip_mentions(&referenced.content))
                            .filter(|text| !text.is_empty())
                    }
                    Ok(_) => None,
                    Err(e) => {
                        warn!("Failed to fetch the referenced message {reference}: {e}");
                        None
                    }
                }
            } else {
                None
            };

            return Ok(Some(Addressed {
                trigger: Trigger::Mention,
                referenced_text,
            }));
        }

        if *self == AddressingPolicy::Mention {
            return Ok(None);
        }

        let Some(reference) = message.reference else {
            return Ok(None);
        };

        let referenced = gateway
            .fetch_message(message.channel_id, reference)
            .await?;

        if referenced.author_id == identity.user_id {
            return Ok(Some(Addressed {
                trigger: Trigger::ReplyToBot,
                referenced_text: None,
            }));
        }

        if *self == AddressingPolicy::Contextual {
            let referenced_text = identity.strip_mentions(&referenced.content);
            if context.iter().any(|turn| turn.text == referenced_text) {
                debug!("Message {} replies to a message already in context", message.id);
                return Ok(Some(Addressed {
                    trigger: Trigger::ContextualReply,
                    referenced_text: Some(referenced_text),
                }));
            }
        }

        Ok(None)
    }
}
