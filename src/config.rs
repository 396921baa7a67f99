use std::{env, fmt::Display, str::FromStr};

use log::{debug, error, info};

use crate::chatbot::{AddressingPolicy, OversizePolicy, ThreadLabelStrategy};
use crate::context::{ContextBackend, ScopePolicy};
use crate::error::{BotError, Result};

const DEFAULT_OLLAMA_API_URL: &str = "http://localhost:11434";
const DEFAULT_OLLAMA_MODEL: &str = "phi3";
const DEFAULT_DATABASE_URL: &str = "sqlite://ollabot.db";
const DEFAULT_RESET_COMMAND: &str = "!reset";

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub ollama_api_url: String,
    pub ollama_model: String,
    pub system_prompt: Option<String>,
    pub scope_policy: ScopePolicy,
    pub addressing_policy: AddressingPolicy,
    pub context_backend: ContextBackend,
    pub database_url: String,
    pub reset_command: String,
    pub reset_allowed_user: Option<String>,
    pub thread_label: ThreadLabelStrategy,
    pub oversize_policy: OversizePolicy,
}

impl Config {
    /// Load configuration from the process environment, after applying `.env`.
    ///
    /// # Errors
    ///
    /// Returns an error if `DISCORD_TOKEN` is missing or a policy variable
    /// holds an unknown value.
    pub fn from_env() -> Result<Self> {
        debug!("Loading configuration from environment");
        dotenvy::dotenv().ok();

        let discord_token = env::var("DISCORD_TOKEN").map_err(|e| {
            error!("Failed to load DISCORD_TOKEN from environment: {e}");
            e
        })?;

        let config = Self::from_lookup(discord_token, |name| env::var(name).ok())?;

        info!("Configuration loaded successfully");
        debug!(
            "Discord token length: {} characters",
            config.discord_token.len()
        );
        debug!("Ollama endpoint: {}", config.ollama_api_url);
        debug!("Ollama model: {}", config.ollama_model);
        debug!(
            "Scope policy: {:?}, addressing policy: {:?}, backend: {:?}",
            config.scope_policy, config.addressing_policy, config.context_backend
        );

        Ok(config)
    }

    fn from_lookup(
        discord_token: String,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        Ok(Self {
            discord_token,
            ollama_api_url: var("OLLAMA_API_URL")
                .unwrap_or_else(|| DEFAULT_OLLAMA_API_URL.to_string()),
            ollama_model: var("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
            system_prompt: var("SYSTEM_PROMPT"),
            scope_policy: parse_or(var("SCOPE_POLICY"), "SCOPE_POLICY", ScopePolicy::Channel)?,
            addressing_policy: parse_or(
                var("ADDRESSING_POLICY"),
                "ADDRESSING_POLICY",
                AddressingPolicy::Contextual,
            )?,
            context_backend: parse_or(
                var("CONTEXT_BACKEND"),
                "CONTEXT_BACKEND",
                ContextBackend::Memory,
            )?,
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            reset_command: var("RESET_COMMAND")
                .map_or_else(|| DEFAULT_RESET_COMMAND.to_string(), |c| c.trim().to_string()),
            reset_allowed_user: var("RESET_ALLOWED_USER"),
            thread_label: parse_or(
                var("THREAD_LABEL"),
                "THREAD_LABEL",
                ThreadLabelStrategy::Keywords,
            )?,
            oversize_policy: parse_or(
                var("OVERSIZE_POLICY"),
                "OVERSIZE_POLICY",
                OversizePolicy::Split,
            )?,
        })
    }
}

fn parse_or<T>(value: Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match value {
        Some(raw) => raw.trim().parse().map_err(|e| {
            error!("Invalid value '{raw}' for {name}: {e}");
            BotError::Config(format!("invalid value '{raw}' for {name}: {e}"))
        }),
        None => Ok(default),
    }
}
