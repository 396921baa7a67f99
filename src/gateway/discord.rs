//! Discord implementation of the gateway using serenity.

use log::{debug, warn};
use poise::serenity_prelude::{
    AutoArchiveDuration, Channel, ChannelId, ChannelType, Context, CreateMessage, CreateThread,
    Error as SerenityError, GuildId, Message as SerenityMessage, MessageId,
};

use crate::error::{BotError, Result};

use super::{BotIdentity, FetchedMessage, Gateway, Inbound};

pub struct DiscordGateway<'a> {
    ctx: &'a Context,
}

impl<'a> DiscordGateway<'a> {
    #[must_use]
    pub fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    /// Resolve the bot's user id and the roles it holds in the guild.
    pub async fn identity(&self, guild_id: Option<u64>) -> BotIdentity {
        let user_id = self.ctx.cache.current_user().id;

        let role_ids = match guild_id {
            Some(guild_id) => match GuildId::new(guild_id).member(self.ctx, user_id).await {
                Ok(member) => member.roles.iter().map(|role| role.get()).collect(),
                Err(e) => {
                    warn!("Failed to look up bot roles in guild {guild_id}: {e}");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        BotIdentity {
            user_id: user_id.get(),
            role_ids,
        }
    }

    /// Whether the channel is a thread.
    pub async fn is_thread(&self, channel_id: ChannelId) -> bool {
        match channel_id.to_channel(self.ctx).await {
            Ok(Channel::Guild(channel)) => matches!(
                channel.kind,
                ChannelType::PublicThread | ChannelType::PrivateThread | ChannelType::NewsThread
            ),
            Ok(_) => false,
            Err(e) => {
                warn!("Failed to resolve channel {channel_id}: {e}");
                false
            }
        }
    }

    /// Convert a serenity message into the chatbot's inbound form.
    ///
    /// Threads are not kept in the cache, so `in_thread` is only looked up
    /// when `resolve_thread` is set and is `false` otherwise.
    pub async fn inbound(&self, message: &SerenityMessage, resolve_thread: bool) -> Inbound {
        let in_thread = resolve_thread && self.is_thread(message.channel_id).await;

        Inbound {
            id: message.id.get(),
            author_id: message.author.id.get(),
            author_name: message.author.name.clone(),
            author_is_bot: message.author.bot,
            content: message.content.clone(),
            channel_id: message.channel_id.get(),
            guild_id: message.guild_id.map(GuildId::get),
            in_thread,
            reference: message
                .message_reference
                .as_ref()
                .and_then(|reference| reference.message_id)
                .map(MessageId::get),
        }
    }
}

fn archive_duration(minutes: u16) -> AutoArchiveDuration {
    match minutes {
        0..=60 => AutoArchiveDuration::OneHour,
        61..=1440 => AutoArchiveDuration::OneDay,
        1441..=4320 => AutoArchiveDuration::ThreeDays,
        _ => AutoArchiveDuration::OneWeek,
    }
}

impl Gateway for DiscordGateway<'_> {
    async fn broadcast_typing(&self, channel_id: u64) -> Result<()> {
        ChannelId::new(channel_id)
            .broadcast_typing(&self.ctx.http)
            .await?;
        Ok(())
    }

    async fn send_message(&self, channel_id: u64, reply_to: Option<u64>, text: &str) -> Result<()> {
        let channel_id = ChannelId::new(channel_id);
        let mut message = CreateMessage::new().content(text);
        if let Some(reply_to) = reply_to {
            message = message.reference_message((channel_id, MessageId::new(reply_to)));
        }
        channel_id.send_message(&self.ctx.http, message).await?;
        Ok(())
    }

    async fn fetch_message(&self, channel_id: u64, message_id: u64) -> Result<FetchedMessage> {
        match self
            .ctx
            .http
            .get_message(ChannelId::new(channel_id), MessageId::new(message_id))
            .await
        {
            Ok(message) => Ok(FetchedMessage {
                author_id: message.author.id.get(),
                content: message.content,
            }),
            Err(SerenityError::Http(e)) if e.status_code().is_some_and(|s| s.as_u16() == 404) => {
                Err(BotError::MessageNotFound(message_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn create_private_thread(
        &self,
        channel_id: u64,
        name: &str,
        auto_archive_minutes: u16,
    ) -> Result<u64> {
        let thread = ChannelId::new(channel_id)
            .create_thread(
                &self.ctx.http,
                CreateThread::new(name)
                    .kind(ChannelType::PrivateThread)
                    .auto_archive_duration(archive_duration(auto_archive_minutes)),
            )
            .await?;
        debug!("Created private thread {} in channel {channel_id}", thread.id);
        Ok(thread.id.get())
    }
}
