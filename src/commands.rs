//! Slash commands.

use crate::{
    bot::Data,
    error::{BotError, Result},
    gateway::DiscordGateway,
};

/// Context type for chatbot commands.
type Context<'a> = poise::Context<'a, Data, BotError>;

/// Forget the conversation in this channel or thread.
#[poise::command(slash_command)]
pub async fn reset(ctx: Context<'_>) -> Result<()> {
    let chatbot = &ctx.data().chatbot;
    let channel_id = ctx.channel_id();
    let policy = chatbot.settings().scope_policy;
    let in_thread = policy.needs_thread_lookup()
        && DiscordGateway::new(ctx.serenity_context())
            .is_thread(channel_id)
            .await;

    let scope = policy.scope_for(
        channel_id.get(),
        ctx.author().id.get(),
        in_thread,
    );
    let notice = chatbot.reset(&ctx.author().name, scope).await;

    ctx.say(notice).await?;
    Ok(())
}

/// Get available chatbot commands.
#[must_use]
pub fn chat_commands() -> Vec<poise::Command<Data, BotError>> {
    vec![reset()]
}
