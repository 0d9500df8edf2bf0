//! Consumption of the backend's `data:`-line text stream.
//!
//! Chunks are decoded, framed into lines, and every `data:` payload is
//! appended to one accumulated buffer. Chunks are processed strictly in
//! arrival order. Cancellation is observed at the next chunk read.

mod decoder;
mod line_buffer;

use std::pin::pin;

use futures_util::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

pub use decoder::Utf8StreamDecoder;
pub use line_buffer::{DATA_PREFIX, LineBuffer, data_payload};

use crate::error::{ClientError, STREAM_CONNECT_ERROR};

/// Stream consumption options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamOptions {
    /// Process an unterminated final line at end of stream instead of
    /// dropping it.
    pub flush_trailing_fragment: bool,
}

impl From<&crate::config::StreamConfig> for StreamOptions {
    fn from(config: &crate::config::StreamConfig) -> Self {
        Self {
            flush_trailing_fragment: config.flush_trailing_fragment,
        }
    }
}

/// How a consumed stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The body ended normally
    Completed,
    /// The session's token was cancelled
    Cancelled,
    /// Connecting or reading failed
    Failed(ClientError),
}

/// Result of one stream consumption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamReport {
    /// Accumulated `data:` payloads
    pub text: String,
    pub outcome: StreamOutcome,
}

impl StreamReport {
    pub fn failed(error: ClientError) -> Self {
        Self {
            text: String::new(),
            outcome: StreamOutcome::Failed(error),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.outcome == StreamOutcome::Completed
    }

    /// Text a front end should leave on screen once the stream is over.
    ///
    /// Partial content is a valid outcome: an interrupted stream that
    /// produced anything shows what it produced. Only a stream that ended
    /// early with nothing accumulated shows the fixed error message.
    pub fn display_text(&self) -> &str {
        if !self.is_completed() && self.text.is_empty() {
            STREAM_CONNECT_ERROR
        } else {
            &self.text
        }
    }
}

/// Reads `body` to the end (or until `cancel` fires), calling `on_text`
/// with the full accumulated text after every accepted payload.
///
/// Once cancellation is observed nothing further is emitted.
pub async fn consume<S, B, E>(
    body: S,
    cancel: &CancellationToken,
    options: StreamOptions,
    mut on_text: impl FnMut(&str),
) -> StreamReport
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<ClientError>,
{
    let mut body = pin!(body);
    let mut decoder = Utf8StreamDecoder::new();
    let mut lines = LineBuffer::new();
    let mut text = String::new();

    let outcome = loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            next = body.next() => Some(next),
        };
        let Some(next) = next else {
            tracing::debug!(accumulated = text.len(), "stream cancelled");
            break StreamOutcome::Cancelled;
        };

        match next {
            Some(Ok(chunk)) => {
                let decoded = decoder.decode(chunk.as_ref());
                for line in lines.push(&decoded) {
                    accept_line(&line, &mut text, &mut on_text);
                }
            }
            Some(Err(err)) => {
                let err: ClientError = err.into();
                tracing::warn!(
                    details = err.details.as_deref().unwrap_or_default(),
                    accumulated = text.len(),
                    "stream read failed"
                );
                break StreamOutcome::Failed(err);
            }
            None => {
                let tail = decoder.finish();
                if options.flush_trailing_fragment {
                    lines.push(&tail);
                    if let Some(line) = lines.take_remainder() {
                        accept_line(&line, &mut text, &mut on_text);
                    }
                } else if let Some(dropped) = lines.take_remainder() {
                    tracing::debug!(fragment = %dropped, "dropping unterminated final line");
                }
                break StreamOutcome::Completed;
            }
        }
    };

    StreamReport { text, outcome }
}

fn accept_line(line: &str, text: &mut String, on_text: &mut impl FnMut(&str)) {
    tracing::trace!(line, "stream line");
    if let Some(payload) = data_payload(line) {
        text.push_str(payload);
        on_text(text);
    }
}
