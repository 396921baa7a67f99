//! Recording fakes for the gateway and the model.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::error::{BotError, Result};
use crate::gateway::{BotIdentity, FetchedMessage, Gateway, Inbound};
use crate::ollama::ChatModel;
use crate::types::Turn;

pub const BOT_ID: u64 = 42;
pub const BOT_ROLE_ID: u64 = 7;

pub fn identity() -> BotIdentity {
    BotIdentity {
        user_id: BOT_ID,
        role_ids: vec![BOT_ROLE_ID],
    }
}

/// A human message in channel 10 of guild 5.
pub fn inbound(content: &str) -> Inbound {
    Inbound {
        id: 100,
        author_id: 1,
        author_name: "alice".to_string(),
        author_is_bot: false,
        content: content.to_string(),
        channel_id: 10,
        guild_id: Some(5),
        in_thread: false,
        reference: None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub channel_id: u64,
    pub reply_to: Option<u64>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedThread {
    pub id: u64,
    pub parent: u64,
    pub name: String,
    pub auto_archive_minutes: u16,
}

#[derive(Debug, Default)]
pub struct FakeGateway {
    messages: HashMap<u64, FetchedMessage>,
    fail_threads: bool,
    fail_typing: bool,
    sent: Mutex<Vec<SentMessage>>,
    typing: Mutex<Vec<u64>>,
    threads: Mutex<Vec<CreatedThread>>,
}

impl FakeGateway {
    pub fn failing_threads() -> Self {
        Self {
            fail_threads: true,
            ..Self::default()
        }
    }

    pub fn failing_typing() -> Self {
        Self {
            fail_typing: true,
            ..Self::default()
        }
    }

    pub fn with_message(mut self, id: u64, message: FetchedMessage) -> Self {
        self.messages.insert(id, message);
        self
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn typing(&self) -> Vec<u64> {
        self.typing.lock().unwrap().clone()
    }

    pub fn threads(&self) -> Vec<CreatedThread> {
        self.threads.lock().unwrap().clone()
    }
}

impl Gateway for FakeGateway {
    async fn broadcast_typing(&self, channel_id: u64) -> Result<()> {
        if self.fail_typing {
            return Err(BotError::Config("typing unavailable".to_string()));
        }
        self.typing.lock().unwrap().push(channel_id);
        Ok(())
    }

    async fn send_message(&self, channel_id: u64, reply_to: Option<u64>, text: &str) -> Result<()> {
        self.sent.lock().unwrap().push(SentMessage {
            channel_id,
            reply_to,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn fetch_message(&self, _channel_id: u64, message_id: u64) -> Result<FetchedMessage> {
        self.messages
            .get(&message_id)
            .cloned()
            .ok_or(BotError::MessageNotFound(message_id))
    }

    async fn create_private_thread(
        &self,
        channel_id: u64,
        name: &str,
        auto_archive_minutes: u16,
    ) -> Result<u64> {
        if self.fail_threads {
            return Err(BotError::Config("threads disabled".to_string()));
        }
        let mut threads = self.threads.lock().unwrap();
        let id = 1000 + threads.len() as u64;
        threads.push(CreatedThread {
            id,
            parent: channel_id,
            name: name.to_string(),
            auto_archive_minutes,
        });
        Ok(id)
    }
}

/// Model that answers from a script and records every history it was given.
#[derive(Debug, Default)]
pub struct FakeModel {
    replies: Mutex<VecDeque<Result<Option<Turn>>>>,
    calls: Mutex<Vec<Vec<Turn>>>,
}

impl FakeModel {
    pub fn replying(replies: impl IntoIterator<Item = Result<Option<Turn>>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::default(),
        }
    }

    pub fn calls(&self) -> Vec<Vec<Turn>> {
        self.calls.lock().unwrap().clone()
    }
}

impl ChatModel for FakeModel {
    async fn chat(&self, turns: &[Turn]) -> Result<Option<Turn>> {
        self.calls.lock().unwrap().push(turns.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BotError::OllamaResponse("no scripted reply".to_string())))
    }
}
