//! Newline framing for decoded stream text.

/// Prefix marking a payload line in the streamed body.
pub const DATA_PREFIX: &str = "data:";

/// Splits decoded text into newline-terminated lines.
///
/// A line is only yielded once its `\n` has arrived; the unterminated tail
/// stays buffered and is prefixed to the next push.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: String,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `text` and returns every line completed by it, in order,
    /// without their terminating `\n`.
    pub fn push(&mut self, text: &str) -> Vec<String> {
        self.buf.push_str(text);

        let Some(last_newline) = self.buf.rfind('\n') else {
            return Vec::new();
        };

        let tail = self.buf.split_off(last_newline + 1);
        let mut complete = std::mem::replace(&mut self.buf, tail);
        complete.pop();

        complete.split('\n').map(str::to_string).collect()
    }

    /// Returns the buffered partial line.
    pub fn pending(&self) -> &str {
        &self.buf
    }

    /// Takes the buffered partial line, if any.
    pub fn take_remainder(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buf))
        }
    }
}

/// Returns the payload of a `data:` line, verbatim.
///
/// Nothing after the prefix is trimmed: a leading space is content.
pub fn data_payload(line: &str) -> Option<&str> {
    line.strip_prefix(DATA_PREFIX)
}
