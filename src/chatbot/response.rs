//! Response delivery to Discord, split to fit the message size limit.

use log::{debug, info};
use strum::EnumString;

use crate::error::Result;
use crate::gateway::Gateway;

/// Discord's message limit in characters.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Sent instead of a reply that exceeds the limit under [`OversizePolicy::Refuse`].
pub const TOO_LONG_NOTICE: &str = "The response is too long to send.";

/// What to do with replies longer than [`MAX_MESSAGE_LENGTH`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum OversizePolicy {
    /// Send consecutive fixed-size slices
    Split,
    /// Send a short notice instead
    Refuse,
}

/// Split `text` into consecutive slices of at most `chunk_size` characters.
#[must_use]
pub fn split_message(text: &str, chunk_size: usize) -> Vec<&str> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == chunk_size {
            chunks.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() || chunks.is_empty() {
        chunks.push(&text[start..]);
    }
    chunks
}

/// Messages to send for `text` under the given policy, in order.
#[must_use]
pub fn plan_delivery(text: &str, policy: OversizePolicy) -> Vec<&str> {
    if text.chars().count() <= MAX_MESSAGE_LENGTH {
        return vec![text];
    }

    match policy {
        OversizePolicy::Split => split_message(text, MAX_MESSAGE_LENGTH),
        OversizePolicy::Refuse => vec![TOO_LONG_NOTICE],
    }
}

/// Deliver the reply, awaiting each message before sending the next.
///
/// # Errors
///
/// Returns the first send failure; remaining slices are not sent.
pub async fn send_response<G: Gateway>(
    gateway: &G,
    channel_id: u64,
    reply_to: Option<u64>,
    text: &str,
    policy: OversizePolicy,
) -> Result<()> {
    let messages = plan_delivery(text, policy);
    debug!(
        "Delivering {} characters as {} message(s)",
        text.chars().count(),
        messages.len()
    );

    for message in &messages {
        gateway.send_message(channel_id, reply_to, message).await?;
    }

    info!(
        "Replied in channel {channel_id} with {} message(s)",
        messages.len()
    );
    Ok(())
}
