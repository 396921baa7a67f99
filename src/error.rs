use thiserror::Error;

/// Notice sent when the inference endpoint cannot produce a reply.
pub const GENERIC_FAILURE_NOTICE: &str = "An error occurred while processing your request.";

/// Notice sent when the inference endpoint answers without any content.
pub const EMPTY_RESPONSE_NOTICE: &str = "No suitable message was returned from the model.";

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Serenity error: {0}")]
    Serenity(Box<poise::serenity_prelude::Error>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Ollama API error ({status}): {message}")]
    OllamaApi {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("Ollama response error: {0}")]
    OllamaResponse(String),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Message {0} could not be found")]
    MessageNotFound(u64),

    #[error("Unknown message role: {0}")]
    UnknownRole(String),
}

impl From<poise::serenity_prelude::Error> for BotError {
    fn from(err: poise::serenity_prelude::Error) -> Self {
        BotError::Serenity(Box::new(err))
    }
}

impl BotError {
    /// Returns the notice shown to the user when handling their message failed.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            BotError::EmptyResponse => EMPTY_RESPONSE_NOTICE,
            _ => GENERIC_FAILURE_NOTICE,
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
