//! Single-flight ownership of the active stream.
//!
//! A controller tracks at most one active session. Beginning a new session
//! cancels the previous one; there is no queueing and no merging.

use tokio_util::sync::CancellationToken;

use crate::chat::{ChatForm, ChatRequest};
use crate::error::ClientResult;

/// Handle for one stream run.
#[derive(Debug, Clone)]
pub struct StreamSession {
    token: CancellationToken,
    generation: u64,
}

impl StreamSession {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Owns the single active-stream handle.
#[derive(Debug, Default)]
pub struct StreamController {
    active: Option<StreamSession>,
    generation: u64,
}

impl StreamController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the active session (if any) and installs a fresh one.
    pub fn begin(&mut self) -> StreamSession {
        if let Some(previous) = self.active.take() {
            previous.token.cancel();
            tracing::debug!(generation = previous.generation, "cancelled superseded stream");
        }

        self.generation += 1;
        let session = StreamSession {
            token: CancellationToken::new(),
            generation: self.generation,
        };
        self.active = Some(session.clone());
        session
    }

    /// Validates `form` and, only if it is valid, begins a new session.
    ///
    /// An invalid form leaves the active session running.
    ///
    /// # Errors
    /// Returns a validation error when the message is empty.
    pub fn start(&mut self, form: &ChatForm) -> ClientResult<(ChatRequest, StreamSession)> {
        let request = form.validate()?;
        Ok((request, self.begin()))
    }

    /// Returns true while `session` is the active one.
    ///
    /// Front ends render updates only for the current session.
    pub fn is_current(&self, session: &StreamSession) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.generation == session.generation)
    }

    /// Cancels the active session. Returns false when nothing was active.
    pub fn cancel_active(&mut self) -> bool {
        match self.active.take() {
            Some(session) => {
                session.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Releases `session` after its stream ended, if it is still current.
    pub fn finish(&mut self, session: &StreamSession) {
        if self.is_current(session) {
            self.active = None;
        }
    }

    pub fn has_active(&self) -> bool {
        self.active.is_some()
    }
}
