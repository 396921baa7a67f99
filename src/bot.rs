//! Discord bot setup and event handling.

use log::{debug, error, info};
use poise::{
    Framework, FrameworkOptions, builtins,
    serenity_prelude::{ClientBuilder, Context, FullEvent, GatewayIntents},
};

use crate::chatbot::{ChatSettings, Chatbot};
use crate::commands::chat_commands;
use crate::config::Config;
use crate::context::ContextStore;
use crate::error::Result;
use crate::gateway::DiscordGateway;
use crate::ollama::OllamaClient;

pub struct Data {
    pub chatbot: Chatbot<OllamaClient>,
}

/// Run the Discord bot.
///
/// # Errors
///
/// Returns an error if configuration, the context store, or the Discord
/// client fail to start.
pub async fn run() -> Result<()> {
    info!("Initializing bot");
    let config = Config::from_env()?;

    debug!("Initializing Ollama client");
    let ollama_client = OllamaClient::new(
        &config.ollama_api_url,
        config.ollama_model.clone(),
        config.system_prompt.clone(),
    )?;
    info!(
        "Using model {} at {}",
        config.ollama_model, config.ollama_api_url
    );

    let store = ContextStore::from_config(&config).await?;
    let chatbot = Chatbot::new(store, ollama_client, ChatSettings::from(&config));

    debug!("Setting up gateway intents");
    let intents = GatewayIntents::non_privileged() | GatewayIntents::MESSAGE_CONTENT;

    debug!("Building framework");
    let framework = Framework::builder()
        .options(FrameworkOptions {
            commands: chat_commands(),
            event_handler: |ctx, event, _framework, data| Box::pin(event_handler(ctx, event, data)),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.tag());
                debug!("Registering commands globally");
                builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Commands registered successfully");
                Ok(Data { chatbot })
            })
        })
        .build();

    debug!("Creating Discord client");
    let mut client = ClientBuilder::new(config.discord_token, intents)
        .framework(framework)
        .await?;

    info!("Starting Discord client");

    tokio::select! {
        result = client.start() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, shutting down...");
        }
    }

    Ok(())
}

async fn event_handler(
    ctx: &Context,
    event: &FullEvent,
    data: &Data,
) -> Result<()> {
    if let FullEvent::Message { new_message } = event
        && !new_message.author.bot
    {
        let gateway = DiscordGateway::new(ctx);
        let resolve_thread = data.chatbot.settings().scope_policy.needs_thread_lookup();
        let inbound = gateway.inbound(new_message, resolve_thread).await;
        let identity = gateway.identity(inbound.guild_id).await;

        if let Err(e) = data
            .chatbot
            .handle_message(&gateway, &identity, &inbound)
            .await
        {
            error!(
                "Error replying to {} in channel {}: {e}",
                new_message.author.tag(),
                new_message.channel_id
            );
        }
    }
    Ok(())
}
