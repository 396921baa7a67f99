//! AI chatbot module - handles addressed messages and conversations.

mod addressing;
mod handler;
mod response;
mod thread;

pub use addressing::{Addressed, AddressingPolicy, Trigger};
pub use handler::{
    ChatSettings, Chatbot, NOTHING_TO_RESET_NOTICE, RESET_DENIED_NOTICE, RESET_DONE_NOTICE,
};
pub use response::{
    MAX_MESSAGE_LENGTH, OversizePolicy, TOO_LONG_NOTICE, plan_delivery, send_response,
    split_message,
};
pub use thread::{DEFAULT_THREAD_LABEL, ThreadLabelStrategy, derive_label, keyword_label};
