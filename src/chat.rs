//! Chat
//!
//! Conversation state for the farming assistant chatbot.

use serde::{Deserialize, Serialize};

/// Title of a conversation before its first message.
pub const NEW_CHAT_TITLE: &str = "New chat";

/// Title shown for a stored session that never got one.
pub const UNTITLED_CHAT_TITLE: &str = "Untitled Chat";

/// Longest auto-generated title, in characters, before the ellipsis.
pub const TITLE_MAX_CHARS: usize = 30;

/// Bot message recorded when the user stops a pending reply.
pub const STOPPED_MESSAGE: &str = "Generation stopped by user.";

/// Bot message recorded when the backend replies with nothing.
pub const EMPTY_REPLY_MESSAGE: &str = "Sorry, I received an empty response.";

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The signed-in or guest user
    User,

    /// The assistant
    Bot,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message body
    pub text: String,

    /// Author
    pub sender: Sender,
}

impl ChatMessage {
    /// A message written by the user.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
        }
    }

    /// A message written by the assistant.
    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Bot,
        }
    }
}

/// A past conversation kept by the backend for a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSessionSummary {
    /// Backend session id
    pub session_id: String,

    #[serde(default)]
    title: Option<String>,

    /// Time of the last message, as reported by the backend
    #[serde(default)]
    pub last_activity: Option<String>,

    /// Messages exchanged so far
    #[serde(default)]
    pub total_messages: u32,
}

impl ChatSessionSummary {
    /// A summary with the given id and title.
    pub fn new(session_id: impl Into<String>, title: Option<String>) -> Self {
        Self {
            session_id: session_id.into(),
            title,
            last_activity: None,
            total_messages: 0,
        }
    }

    /// Display title, falling back to [`UNTITLED_CHAT_TITLE`].
    pub fn title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|title| !title.is_empty())
            .unwrap_or(UNTITLED_CHAT_TITLE)
    }
}

/// One conversation with the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    id: String,
    title: String,
    session_id: Option<String>,
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Start an empty conversation.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: NEW_CHAT_TITLE.to_string(),
            session_id: None,
            messages: Vec::new(),
        }
    }

    /// Continue a stored session with its message history.
    ///
    /// The backend session id doubles as the local id.
    pub fn resume(summary: &ChatSessionSummary, messages: Vec<ChatMessage>) -> Self {
        Self {
            id: summary.session_id.clone(),
            title: summary.title().to_string(),
            session_id: Some(summary.session_id.clone()),
            messages,
        }
    }

    /// Local conversation id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Backend session the conversation is attached to, once the first reply arrived.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Messages in order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Whether any message was exchanged.
    pub fn has_messages(&self) -> bool {
        !self.messages.is_empty()
    }

    /// Record a user message.
    ///
    /// The first message of an untitled conversation also becomes its title.
    pub fn push_user(&mut self, text: &str) {
        if self.messages.is_empty() && self.title == NEW_CHAT_TITLE {
            self.title = title_from(text);
        }

        self.messages.push(ChatMessage::user(text));
    }

    /// Record an assistant message.
    pub fn push_bot(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage::bot(text));
    }

    /// Attach the conversation to a backend session.
    pub fn adopt_session(&mut self, session_id: Option<String>) {
        if session_id.is_some() {
            self.session_id = session_id;
        }
    }

    /// Rename the conversation.
    pub fn rename(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }
}

/// Derive a conversation title from its first message.
pub fn title_from(message: &str) -> String {
    if message.chars().count() > TITLE_MAX_CHARS {
        let truncated: String = message.chars().take(TITLE_MAX_CHARS).collect();

        format!("{truncated}...")
    } else {
        message.to_string()
    }
}
