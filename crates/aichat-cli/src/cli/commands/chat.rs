//! Chat command handler.
//!
//! One-shot mode sends `--message` and exits. Without it, lines read from
//! stdin are sent one turn at a time and the conversation id returned by
//! the backend carries over to the next turn.

use std::io::{self, Write};

use aichat_core::chat::{self, ChatForm, ChatUpdate, StreamController};
use aichat_core::client::ApiClient;
use aichat_core::interrupt::{self, InterruptedError};
use aichat_core::providers::Provider;
use aichat_core::stream::{StreamOptions, StreamOutcome};
use anyhow::{Context, Result};

const QUIT_COMMAND: &str = ":q";

pub struct ChatRunOptions {
    pub message: Option<String>,
    pub provider: Provider,
    pub conversation_id: String,
    pub no_stream: bool,
    pub stream: StreamOptions,
}

/// How a single turn ended.
#[derive(Debug)]
enum TurnOutcome {
    Completed,
    Interrupted,
    /// Nothing arrived; carries the message to show instead
    Failed(String),
}

struct ChatSession<'a, W> {
    client: &'a ApiClient,
    controller: StreamController,
    form: ChatForm,
    no_stream: bool,
    stream: StreamOptions,
    out: W,
}

impl<W: Write> ChatSession<'_, W> {
    async fn turn(&mut self, message: &str) -> Result<TurnOutcome> {
        self.form.message = message.to_string();

        let outcome = if self.no_stream {
            self.send_turn().await
        } else {
            self.stream_turn().await
        };

        // A press that landed after the response settled must not arm the
        // force-exit on the next one.
        if interrupt::is_interrupted() {
            interrupt::reset();
        }
        outcome
    }

    async fn send_turn(&mut self) -> Result<TurnOutcome> {
        let request = self.form.validate()?;

        let sent = tokio::select! {
            () = interrupt::wait_for_interrupt() => None,
            sent = chat::send_message(self.client, &request) => Some(sent),
        };
        let Some(sent) = sent else {
            tracing::debug!("non-streamed turn interrupted");
            return Ok(TurnOutcome::Interrupted);
        };

        let text = sent?;
        writeln!(self.out, "{text}").context("write response to stdout")?;
        self.out.flush().context("write response to stdout")?;
        Ok(TurnOutcome::Completed)
    }

    async fn stream_turn(&mut self) -> Result<TurnOutcome> {
        let (request, session) = self.controller.start(&self.form)?;

        let token = session.token().clone();
        let watcher = tokio::spawn(async move {
            interrupt::wait_for_interrupt().await;
            token.cancel();
        });

        let mut printed = 0;
        let mut write_error = None;
        let out = &mut self.out;
        let conversation_id = &mut self.form.conversation_id;
        let result = chat::stream_chat(self.client, &request, &session, self.stream, |update| {
            match update {
                ChatUpdate::ConversationId(id) => {
                    eprintln!("conversation-id: {id}");
                    *conversation_id = id.to_string();
                }
                ChatUpdate::Text(_) if write_error.is_some() => {}
                ChatUpdate::Text(text) => {
                    let written = out
                        .write_all(&text.as_bytes()[printed..])
                        .and_then(|()| out.flush());
                    match written {
                        Ok(()) => printed = text.len(),
                        Err(err) => {
                            tracing::debug!(error = %err, "stdout closed, cancelling stream");
                            session.token().cancel();
                            write_error = Some(err);
                        }
                    }
                }
            }
        })
        .await;

        watcher.abort();
        self.controller.finish(&session);
        if let Some(err) = write_error {
            return Err(anyhow::Error::new(err).context("write response to stdout"));
        }
        if printed > 0 {
            writeln!(self.out).context("write response to stdout")?;
        }

        Ok(match result.report.outcome {
            StreamOutcome::Completed => TurnOutcome::Completed,
            StreamOutcome::Cancelled => TurnOutcome::Interrupted,
            StreamOutcome::Failed(_) if printed > 0 => TurnOutcome::Completed,
            StreamOutcome::Failed(_) => TurnOutcome::Failed(result.display_text().to_string()),
        })
    }
}

pub async fn run(client: &ApiClient, options: ChatRunOptions) -> Result<()> {
    let mut session = ChatSession {
        client,
        controller: StreamController::new(),
        form: ChatForm {
            message: String::new(),
            provider: options.provider,
            conversation_id: options.conversation_id,
        },
        no_stream: options.no_stream,
        stream: options.stream,
        out: io::stdout(),
    };

    match options.message {
        Some(message) => match session.turn(&message).await? {
            TurnOutcome::Completed => Ok(()),
            TurnOutcome::Interrupted => Err(InterruptedError.into()),
            TurnOutcome::Failed(message) => Err(anyhow::anyhow!(message)),
        },
        None => repl(&mut session).await,
    }
}

async fn repl<W: Write>(session: &mut ChatSession<'_, W>) -> Result<()> {
    eprintln!(
        "Chatting with {} ({QUIT_COMMAND} to quit)",
        session.form.provider.label()
    );

    loop {
        write!(session.out, "> ").context("write prompt")?;
        session.out.flush().context("flush stdout")?;

        let Some(line) = read_line().await? else {
            return Ok(());
        };
        let message = line.trim_end_matches(['\r', '\n']);
        if message.trim() == QUIT_COMMAND {
            return Ok(());
        }

        match session.turn(message).await {
            Ok(TurnOutcome::Completed) => {}
            Ok(TurnOutcome::Interrupted) => eprintln!("[interrupted]"),
            Ok(TurnOutcome::Failed(text)) => eprintln!("{text}"),
            Err(err) => match crate::cli::validation_error(&err) {
                Some(warning) => eprintln!("Warning: {warning}"),
                None => eprintln!("{err:#}"),
            },
        }
    }
}

/// Reads one line from stdin; `None` at end of input.
async fn read_line() -> Result<Option<String>> {
    let read = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        let n = io::stdin().read_line(&mut line)?;
        Ok::<_, io::Error>((n > 0).then_some(line))
    });

    tokio::select! {
        () = interrupt::wait_for_interrupt() => Err(InterruptedError.into()),
        line = read => Ok(line.context("join stdin reader")?.context("read stdin")?),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;
    use std::time::Duration;

    use aichat_core::config::Config;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    // Ctrl+C state is process-wide, so tests that press it take turns.
    static CTRL_C: LazyLock<tokio::sync::Mutex<()>> = LazyLock::new(Default::default);

    fn session<W: Write>(client: &ApiClient, no_stream: bool, out: W) -> ChatSession<'_, W> {
        ChatSession {
            client,
            controller: StreamController::new(),
            form: ChatForm {
                message: String::new(),
                provider: Provider::OpenAI,
                conversation_id: String::new(),
            },
            no_stream,
            stream: StreamOptions::default(),
            out,
        }
    }

    fn client(server: &MockServer) -> ApiClient {
        ApiClient::from_config(&Config::default(), Some(&server.uri())).unwrap()
    }

    async fn mount_slow(server: &MockServer, route: &str) {
        Mock::given(method("POST"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("data:late\n\n")
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(server)
            .await;
    }

    fn press_ctrl_c_soon() -> tokio::task::JoinHandle<()> {
        tokio::spawn(async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            interrupt::trigger_ctrl_c();
        })
    }

    /// Accepts nothing, like stdout piped into a closed reader.
    #[derive(Default)]
    struct ClosedPipe {
        attempts: usize,
    }

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            self.attempts += 1;
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::ErrorKind::BrokenPipe.into())
        }
    }

    #[tokio::test]
    async fn test_ctrl_c_stops_non_streamed_turn_and_clears_flag() {
        let _guard = CTRL_C.lock().await;
        interrupt::reset();

        let server = MockServer::start().await;
        mount_slow(&server, "/chatmodel/chat").await;
        let client = client(&server);
        let mut chat = session(&client, true, Vec::new());

        let press = press_ctrl_c_soon();
        let outcome = tokio::time::timeout(Duration::from_secs(5), chat.turn("hi"))
            .await
            .expect("turn should stop on Ctrl+C")
            .unwrap();
        press.await.unwrap();

        assert!(matches!(outcome, TurnOutcome::Interrupted));
        assert!(!interrupt::is_interrupted());
        assert!(chat.out.is_empty());
    }

    #[tokio::test]
    async fn test_ctrl_c_stops_streamed_turn_and_clears_flag() {
        let _guard = CTRL_C.lock().await;
        interrupt::reset();

        let server = MockServer::start().await;
        mount_slow(&server, "/chatmodel/streaming/chat").await;
        let client = client(&server);
        let mut chat = session(&client, false, Vec::new());

        let press = press_ctrl_c_soon();
        let outcome = tokio::time::timeout(Duration::from_secs(5), chat.turn("hi"))
            .await
            .expect("turn should stop on Ctrl+C")
            .unwrap();
        press.await.unwrap();

        assert!(matches!(outcome, TurnOutcome::Interrupted));
        assert!(!interrupt::is_interrupted());
        assert!(!chat.controller.has_active());
    }

    #[tokio::test]
    async fn test_non_streamed_turn_prints_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chatmodel/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Hello!"))
            .expect(1)
            .mount(&server)
            .await;
        let client = client(&server);
        let mut chat = session(&client, true, Vec::new());

        let outcome = chat.turn("hi").await.unwrap();

        assert!(matches!(outcome, TurnOutcome::Completed));
        assert_eq!(String::from_utf8(chat.out).unwrap(), "Hello!\n");
    }

    #[tokio::test]
    async fn test_streamed_turn_prints_deltas_and_keeps_conversation_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chatmodel/streaming/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("conversation-id", "c42")
                    .set_body_string("data:Hel\n\ndata:lo\n\n"),
            )
            .expect(1)
            .mount(&server)
            .await;
        let client = client(&server);
        let mut chat = session(&client, false, Vec::new());

        let outcome = chat.turn("hi").await.unwrap();

        assert!(matches!(outcome, TurnOutcome::Completed));
        assert_eq!(chat.form.conversation_id, "c42");
        assert_eq!(String::from_utf8(chat.out).unwrap(), "Hello\n");
    }

    #[tokio::test]
    async fn test_closed_stdout_cancels_stream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chatmodel/streaming/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("data:a\n\ndata:b\n\n"))
            .expect(1)
            .mount(&server)
            .await;
        let client = client(&server);
        let mut chat = session(&client, false, ClosedPipe::default());

        let err = chat.turn("hi").await.unwrap_err();

        assert!(err.to_string().contains("write response to stdout"));
        assert_eq!(chat.out.attempts, 1);
        assert!(!chat.controller.has_active());
    }
}
