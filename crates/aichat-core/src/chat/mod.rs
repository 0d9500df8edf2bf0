//! Conversational chat, streamed or in one response.

mod controller;

pub use controller::{StreamController, StreamSession};

use url::Url;

use crate::client::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::providers::Provider;
use crate::stream::{self, StreamOptions, StreamOutcome, StreamReport};

const STREAMING_CHAT_PATH: &str = "chatmodel/streaming/chat";
const CHAT_PATH: &str = "chatmodel/chat";

/// Response header carrying the backend's conversation id.
pub const CONVERSATION_ID_HEADER: &str = "conversation-id";

const EMPTY_MESSAGE_WARNING: &str = "Please enter a message!";

/// User input for one chat turn.
#[derive(Debug, Clone, Default)]
pub struct ChatForm {
    pub message: String,
    pub provider: Provider,
    /// Conversation to continue; blank starts a new one
    pub conversation_id: String,
}

/// A validated chat turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    /// Sent as-is; only emptiness is checked on the trimmed form
    pub message: String,
    pub provider: Provider,
    pub conversation_id: Option<String>,
}

impl ChatForm {
    /// # Errors
    /// Returns a validation error when the trimmed message is empty.
    pub fn validate(&self) -> ClientResult<ChatRequest> {
        if self.message.trim().is_empty() {
            return Err(ClientError::validation(EMPTY_MESSAGE_WARNING));
        }

        let conversation_id = Some(self.conversation_id.trim())
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        Ok(ChatRequest {
            message: self.message.clone(),
            provider: self.provider,
            conversation_id,
        })
    }
}

/// Progress reported while a chat stream runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatUpdate<'a> {
    /// The backend assigned or confirmed a conversation id
    ConversationId(&'a str),
    /// Full accumulated response text so far
    Text(&'a str),
}

/// Result of one streamed chat turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatStreamReport {
    pub report: StreamReport,
    pub conversation_id: Option<String>,
}

impl ChatStreamReport {
    fn failed(error: ClientError) -> Self {
        Self {
            report: StreamReport::failed(error),
            conversation_id: None,
        }
    }

    pub fn display_text(&self) -> &str {
        self.report.display_text()
    }
}

/// Builds `<base>/<path>` or `<base>/<path>/conversation?conversationId=<id>`.
fn chat_url(client: &ApiClient, path: &str, conversation_id: Option<&str>) -> ClientResult<Url> {
    match conversation_id {
        None => client.endpoint(path),
        Some(id) => {
            let mut url = client.endpoint(&format!("{path}/conversation"))?;
            url.query_pairs_mut().append_pair("conversationId", id);
            Ok(url)
        }
    }
}

/// Streams one chat turn, reporting progress through `on_update`.
///
/// Connection failures, non-2xx status, and body read errors all end in a
/// `Failed` outcome; they never surface as `Err`. Cancelling the session's
/// token stops the stream at the next read, after which nothing further is
/// reported.
pub async fn stream_chat(
    client: &ApiClient,
    request: &ChatRequest,
    session: &StreamSession,
    options: StreamOptions,
    mut on_update: impl FnMut(ChatUpdate<'_>),
) -> ChatStreamReport {
    let url = match chat_url(
        client,
        STREAMING_CHAT_PATH,
        request.conversation_id.as_deref(),
    ) {
        Ok(url) => url,
        Err(err) => return ChatStreamReport::failed(err),
    };

    let send = client.post_text(url, request.provider, request.message.clone());
    let response = tokio::select! {
        biased;
        () = session.token().cancelled() => {
            tracing::debug!(generation = session.generation(), "stream cancelled before response");
            return ChatStreamReport {
                report: StreamReport {
                    text: String::new(),
                    outcome: StreamOutcome::Cancelled,
                },
                conversation_id: None,
            };
        }
        response = send => response,
    };

    let response = match response {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(
                details = err.details.as_deref().unwrap_or_default(),
                "stream request failed"
            );
            return ChatStreamReport::failed(err);
        }
    };

    let conversation_id = response
        .headers()
        .get(CONVERSATION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string);

    if let Some(id) = &conversation_id {
        tracing::debug!(conversation_id = %id, "conversation id received");
        on_update(ChatUpdate::ConversationId(id));
    }

    let report = stream::consume(response.bytes_stream(), session.token(), options, |text| {
        on_update(ChatUpdate::Text(text));
    })
    .await;

    ChatStreamReport {
        report,
        conversation_id,
    }
}

/// Sends one chat turn and waits for the whole response text.
///
/// # Errors
/// Returns the generic connectivity error for transport failures and
/// non-2xx status.
pub async fn send_message(client: &ApiClient, request: &ChatRequest) -> ClientResult<String> {
    let url = chat_url(client, CHAT_PATH, request.conversation_id.as_deref())?;
    let response = client
        .post_text(url, request.provider, request.message.clone())
        .await?;
    Ok(response.text().await?)
}
