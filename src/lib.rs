pub mod bot;
pub mod chatbot;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod gateway;
pub mod ollama;
pub mod types;

#[cfg(test)]
mod testing;

pub use bot::run;
