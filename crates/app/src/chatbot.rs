//! Farming assistant chatbot.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use investomart::{
    chat::{
        ChatMessage, ChatSessionSummary, Conversation, EMPTY_REPLY_MESSAGE, STOPPED_MESSAGE,
        Sender,
    },
    session::AuthToken,
};
use mockall::automock;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, ApiError};

/// Body of a chatbot request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub message: String,

    /// Backend session to continue, absent for the first message.
    pub session_id: Option<String>,
}

/// Body of a chatbot reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub response: Option<String>,

    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum ChatServiceError {
    /// The chatbot answered with an error status and its own explanation.
    #[error("{message} (status {status})")]
    Reply { status: StatusCode, message: String },

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Deserialize)]
struct SessionList {
    #[serde(default)]
    sessions: Vec<ChatSessionSummary>,
}

#[derive(Debug, Deserialize)]
struct StoredMessage {
    #[serde(default)]
    text: Option<String>,
    sender: Sender,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<StoredMessage>,
}

#[derive(Debug, Deserialize)]
struct TitleUpdate {
    #[serde(default)]
    success: bool,
}

#[derive(Debug, Clone)]
pub struct HttpChatService {
    api: ApiClient,
}

impl HttpChatService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ChatService for HttpChatService {
    async fn send(
        &self,
        request: ChatRequest,
        token: Option<AuthToken>,
    ) -> Result<ChatReply, ChatServiceError> {
        let context = "chatbot message";
        let mut builder = self.api.post("chatbot/api/").json(&request);

        if let Some(token) = token {
            builder = builder.bearer_auth(token.expose());
        }

        let response = self.api.execute(builder, context).await?;
        let status = response.status();

        if status.is_success() {
            return response.json().await.map_err(|source| {
                error!(context, error = %source, "failed to decode response body");

                ChatServiceError::from(ApiError::Decode(source))
            });
        }

        let body = response.text().await.unwrap_or_default();

        error!(context, %status, body = %body, "backend returned an error");

        let explanation = serde_json::from_str::<ChatReply>(&body)
            .ok()
            .and_then(|reply| reply.response)
            .filter(|message| !message.is_empty());

        match explanation {
            Some(message) => Err(ChatServiceError::Reply { status, message }),
            None => Err(ChatServiceError::from(ApiError::from_response(status, &body))),
        }
    }

    async fn health(&self) -> Result<(), ApiError> {
        let request = self.api.get("chatbot/health/");

        self.api.send_empty(request, "chatbot health").await
    }

    async fn sessions(&self, token: &AuthToken) -> Result<Vec<ChatSessionSummary>, ApiError> {
        let request = self
            .api
            .get("chatbot/sessions/")
            .bearer_auth(token.expose());

        let list: SessionList = self.api.send_json(request, "list chat sessions").await?;

        Ok(list.sessions)
    }

    async fn messages(
        &self,
        session_id: &str,
        token: &AuthToken,
    ) -> Result<Vec<ChatMessage>, ApiError> {
        let request = self
            .api
            .get(&format!("chatbot/sessions/{session_id}/messages/"))
            .bearer_auth(token.expose());

        let list: MessageList = self.api.send_json(request, "chat session messages").await?;

        Ok(list
            .messages
            .into_iter()
            .map(|message| ChatMessage {
                text: message.text.unwrap_or_default(),
                sender: message.sender,
            })
            .collect())
    }

    async fn rename(
        &self,
        session_id: &str,
        title: &str,
        token: &AuthToken,
    ) -> Result<bool, ApiError> {
        let request = self
            .api
            .post(&format!("chatbot/sessions/{session_id}/title/"))
            .bearer_auth(token.expose())
            .json(&json!({ "title": title }));

        let update: TitleUpdate = self.api.send_json(request, "rename chat session").await?;

        Ok(update.success)
    }
}

#[automock]
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Send one user message, with the bearer token when signed in.
    async fn send(
        &self,
        request: ChatRequest,
        token: Option<AuthToken>,
    ) -> Result<ChatReply, ChatServiceError>;

    /// Probe the chatbot backend.
    async fn health(&self) -> Result<(), ApiError>;

    /// Past sessions of the signed-in user, most recent first.
    async fn sessions(&self, token: &AuthToken) -> Result<Vec<ChatSessionSummary>, ApiError>;

    /// Full message history of a stored session.
    async fn messages(
        &self,
        session_id: &str,
        token: &AuthToken,
    ) -> Result<Vec<ChatMessage>, ApiError>;

    /// Store a new title for a session. `false` when the backend did not find it.
    async fn rename(
        &self,
        session_id: &str,
        title: &str,
        token: &AuthToken,
    ) -> Result<bool, ApiError>;
}

/// What happened to a message handed to [`ChatController::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The message was blank and nothing was sent.
    Ignored,

    /// The assistant replied (possibly with nothing, see [`EMPTY_REPLY_MESSAGE`]).
    Replied { elapsed: Duration },

    /// The request failed; the error text was added as a bot message.
    Failed,

    /// The user stopped the request before a reply arrived.
    Stopped,
}

/// Drives one exchange at a time with the assistant.
#[derive(Clone)]
pub struct ChatController {
    service: Arc<dyn ChatService>,
}

impl std::fmt::Debug for ChatController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatController").finish_non_exhaustive()
    }
}

impl ChatController {
    #[must_use]
    pub fn new(service: Arc<dyn ChatService>) -> Self {
        Self { service }
    }

    /// Send `text` in `conversation` and record the outcome in it.
    ///
    /// Blank text is ignored; anything else is sent as typed. Cancelling
    /// `stop` drops the in-flight request and whatever the backend does
    /// afterwards is ignored.
    pub async fn send(
        &self,
        conversation: &mut Conversation,
        text: &str,
        token: Option<AuthToken>,
        stop: &CancellationToken,
    ) -> SendOutcome {
        if text.trim().is_empty() {
            return SendOutcome::Ignored;
        }

        conversation.push_user(text);

        let request = ChatRequest {
            message: text.to_string(),
            session_id: conversation.session_id().map(ToString::to_string),
        };

        let started = Instant::now();

        let result = tokio::select! {
            biased;

            () = stop.cancelled() => None,
            result = self.service.send(request, token) => Some(result),
        };

        let Some(result) = result else {
            info!(conversation = conversation.id(), "generation stopped by user");

            conversation.push_bot(STOPPED_MESSAGE);

            return SendOutcome::Stopped;
        };

        match result {
            Ok(reply) => {
                let elapsed = started.elapsed();

                match reply.response.filter(|response| !response.is_empty()) {
                    Some(response) => {
                        conversation.push_bot(response);
                        conversation.adopt_session(reply.session_id);
                    }
                    None => conversation.push_bot(EMPTY_REPLY_MESSAGE),
                }

                debug!(
                    conversation = conversation.id(),
                    elapsed_ms = elapsed.as_millis(),
                    "assistant replied"
                );

                SendOutcome::Replied { elapsed }
            }
            Err(error) => {
                warn!(conversation = conversation.id(), %error, "chat request failed");

                conversation.push_bot(failure_text(&error));

                SendOutcome::Failed
            }
        }
    }

    /// Probe the chatbot backend, logging the result.
    pub async fn check_health(&self) -> bool {
        match self.service.health().await {
            Ok(()) => {
                debug!("chatbot backend is healthy");

                true
            }
            Err(error) => {
                warn!(%error, "chatbot health check failed");

                false
            }
        }
    }

    /// Past conversations of the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot list them.
    pub async fn history(&self, token: &AuthToken) -> Result<Vec<ChatSessionSummary>, ApiError> {
        self.service.sessions(token).await
    }

    /// Load a stored conversation so it can be continued.
    ///
    /// # Errors
    ///
    /// Returns an error when the message history cannot be loaded.
    pub async fn resume(
        &self,
        summary: &ChatSessionSummary,
        token: &AuthToken,
    ) -> Result<Conversation, ApiError> {
        let messages = self.service.messages(&summary.session_id, token).await?;

        info!(
            session_id = summary.session_id,
            messages = messages.len(),
            "resumed chat session"
        );

        Ok(Conversation::resume(summary, messages))
    }

    /// Rename `conversation`, storing the title on the backend when the
    /// conversation is attached to a session and a token is available.
    ///
    /// Blank titles are ignored. The local title changes even when the backend
    /// update fails.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend update fails.
    pub async fn rename(
        &self,
        conversation: &mut Conversation,
        title: &str,
        token: Option<&AuthToken>,
    ) -> Result<(), ApiError> {
        let title = title.trim();

        if title.is_empty() {
            return Ok(());
        }

        conversation.rename(title);

        let (Some(session_id), Some(token)) = (conversation.session_id(), token) else {
            return Ok(());
        };

        if !self.service.rename(session_id, title, token).await? {
            warn!(session_id, "backend did not find chat session to rename");
        }

        Ok(())
    }
}

fn failure_text(error: &ChatServiceError) -> String {
    match error {
        ChatServiceError::Reply { message, .. } => message.clone(),
        ChatServiceError::Api(error) => {
            format!("Connection Error: Failed to reach the assistant. {error}")
        }
    }
}
