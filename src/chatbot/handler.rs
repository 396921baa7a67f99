//! Main handler for inbound messages.

use log::{debug, error, info, warn};

use crate::config::Config;
use crate::context::{ContextStore, Scope, ScopePolicy};
use crate::error::{BotError, Result};
use crate::gateway::{BotIdentity, Gateway, Inbound};
use crate::ollama::ChatModel;
use crate::types::Turn;

use super::addressing::{Addressed, AddressingPolicy};
use super::response::{OversizePolicy, send_response};
use super::thread::{ThreadLabelStrategy, provision_thread};

pub const RESET_DONE_NOTICE: &str = "Conversation history has been reset.";
pub const RESET_DENIED_NOTICE: &str = "You are not authorized to use this command.";
pub const NOTHING_TO_RESET_NOTICE: &str = "There is no conversation to reset here.";

/// Behavior switches for the chatbot, taken from [`Config`].
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub scope_policy: ScopePolicy,
    pub addressing_policy: AddressingPolicy,
    pub reset_command: String,
    pub reset_allowed_user: Option<String>,
    pub thread_label: ThreadLabelStrategy,
    pub oversize_policy: OversizePolicy,
}

impl From<&Config> for ChatSettings {
    fn from(config: &Config) -> Self {
        Self {
            scope_policy: config.scope_policy,
            addressing_policy: config.addressing_policy,
            reset_command: config.reset_command.clone(),
            reset_allowed_user: config.reset_allowed_user.clone(),
            thread_label: config.thread_label,
            oversize_policy: config.oversize_policy,
        }
    }
}

/// Conversation driver: owns the context store and the model.
pub struct Chatbot<M> {
    store: ContextStore,
    model: M,
    settings: ChatSettings,
}

impl<M: ChatModel> Chatbot<M> {
    pub fn new(store: ContextStore, model: M, settings: ChatSettings) -> Self {
        Self {
            store,
            model,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    /// Handle one inbound message end to end.
    ///
    /// Failures tied to the single event are logged here; only delivery
    /// failures of the final reply or notice are returned.
    ///
    /// # Errors
    ///
    /// Returns an error if sending the reply or failure notice fails.
    pub async fn handle_message<G: Gateway>(
        &self,
        gateway: &G,
        identity: &BotIdentity,
        message: &Inbound,
    ) -> Result<()> {
        if message.author_is_bot {
            return Ok(());
        }

        if message.content.trim() == self.settings.reset_command {
            return self.handle_reset_command(gateway, message).await;
        }

        let existing_scope = self.settings.scope_policy.existing_scope(message);

        let Some(addressed) = self.addressing(gateway, identity, message, existing_scope).await
        else {
            return Ok(());
        };

        info!(
            "Received message from {} in channel {}: {} ({:?})",
            message.author_name, message.channel_id, message.content, addressed.trigger
        );

        let user_text = identity.strip_mentions(&message.content);
        if user_text.is_empty() && addressed.referenced_text.is_none() {
            debug!("Ignoring message {} with no text besides mentions", message.id);
            return Ok(());
        }

        // Replies go to the triggering message unless a new thread is opened for them.
        let (scope, reply_to) = match existing_scope {
            Some(scope) => (scope, Some(message.id)),
            None => match provision_thread(
                gateway,
                &self.model,
                self.settings.thread_label,
                message.channel_id,
                &user_text,
            )
            .await
            {
                Ok(thread_id) => (Scope::Thread(thread_id), None),
                Err(e) => {
                    error!(
                        "Failed to create a thread for message {} in channel {}: {e}",
                        message.id, message.channel_id
                    );
                    return Ok(());
                }
            },
        };
        let channel_id = scope.delivery_channel();

        if let Err(e) = gateway.broadcast_typing(channel_id).await {
            warn!("Failed to broadcast typing indicator in channel {channel_id}: {e}");
        }

        match self.converse(&scope, addressed, user_text).await {
            Ok(reply) => {
                send_response(
                    gateway,
                    channel_id,
                    reply_to,
                    &reply.text,
                    self.settings.oversize_policy,
                )
                .await
            }
            Err(e) => {
                error!(
                    "Error processing message from {}: {e}",
                    message.author_name
                );
                notify_failure(gateway, channel_id, reply_to, &e).await
            }
        }
    }

    /// Run the addressing policy, swallowing lookup failures.
    async fn addressing<G: Gateway>(
        &self,
        gateway: &G,
        identity: &BotIdentity,
        message: &Inbound,
        scope: Option<Scope>,
    ) -> Option<Addressed> {
        let policy = self.settings.addressing_policy;

        let context = match scope {
            Some(scope) if policy.needs_context(message) => {
                match self.store.read_all(&scope).await {
                    Ok(turns) => turns,
                    Err(e) => {
                        error!("Failed to read context for {scope}: {e}");
                        return None;
                    }
                }
            }
            _ => Vec::new(),
        };

        match policy.evaluate(gateway, identity, message, &context).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(
                    "Dropping message {} after failed reference lookup: {e}",
                    message.id
                );
                None
            }
        }
    }

    /// Record the user's turn(s), ask the model, and record its answer.
    async fn converse(
        &self,
        scope: &Scope,
        addressed: Addressed,
        user_text: String,
    ) -> Result<Turn> {
        if let Some(referenced) = addressed.referenced_text {
            self.store.append(scope, Turn::user(referenced)).await?;
        }
        if !user_text.is_empty() {
            self.store.append(scope, Turn::user(user_text)).await?;
        }

        let history = self.store.read_all(scope).await?;
        debug!("Conversation history for {scope} has {} turns", history.len());

        let reply = self
            .model
            .chat(&history)
            .await?
            .ok_or(BotError::EmptyResponse)?;

        self.store.append(scope, reply.clone()).await?;
        Ok(reply)
    }

    async fn handle_reset_command<G: Gateway>(
        &self,
        gateway: &G,
        message: &Inbound,
    ) -> Result<()> {
        let scope = self.settings.scope_policy.existing_scope(message);
        let notice = self.reset(&message.author_name, scope).await;
        gateway
            .send_message(message.channel_id, Some(message.id), notice)
            .await
    }

    /// Reset `scope` on behalf of `author_name` and return the notice to show.
    pub async fn reset(&self, author_name: &str, scope: Option<Scope>) -> &'static str {
        if let Some(allowed) = &self.settings.reset_allowed_user
            && author_name != allowed
        {
            info!("Refused reset from {author_name}");
            return RESET_DENIED_NOTICE;
        }

        let Some(scope) = scope else {
            return NOTHING_TO_RESET_NOTICE;
        };

        match self.store.reset(&scope).await {
            Ok(()) => RESET_DONE_NOTICE,
            Err(e) => {
                error!("Failed to reset context for {scope}: {e}");
                e.user_message()
            }
        }
    }
}

/// Tell the user their message could not be answered.
async fn notify_failure<G: Gateway>(
    gateway: &G,
    channel_id: u64,
    reply_to: Option<u64>,
    error: &BotError,
) -> Result<()> {
    gateway
        .send_message(channel_id, reply_to, error.user_message())
        .await
}
