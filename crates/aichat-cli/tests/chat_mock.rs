//! Integration tests for `aichat chat` against a mocked backend.

mod fixtures;

use fixtures::{aichat, can_bind_localhost, data_lines, temp_home};
use predicates::prelude::*;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_one_shot_stream_prints_text_and_conversation_id() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chatmodel/streaming/chat"))
        .and(header("ai-provider", "openai"))
        .and(body_string("hello"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("conversation-id", "abc123")
                .set_body_string(data_lines(&["Hi", " there", "!"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    aichat(&home, &server.uri())
        .args(["chat", "-m", "hello", "--provider", "openai"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hi there!"))
        .stderr(predicate::str::contains("conversation-id: abc123"));
}

#[tokio::test]
async fn test_repl_carries_conversation_id() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chatmodel/streaming/chat"))
        .and(body_string("first"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("conversation-id", "conv-7")
                .set_body_string(data_lines(&["one"])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chatmodel/streaming/chat/conversation"))
        .and(query_param("conversationId", "conv-7"))
        .and(body_string("second"))
        .respond_with(ResponseTemplate::new(200).set_body_string(data_lines(&["two"])))
        .expect(1)
        .mount(&server)
        .await;

    aichat(&home, &server.uri())
        .arg("chat")
        .write_stdin("first\n\nsecond\n:q\nnever sent\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("one"))
        .stdout(predicate::str::contains("two"))
        .stderr(predicate::str::contains("Warning: Please enter a message!"));
}

#[tokio::test]
async fn test_existing_conversation_flag() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chatmodel/streaming/chat/conversation"))
        .and(query_param("conversationId", "abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_string(data_lines(&["again"])))
        .expect(1)
        .mount(&server)
        .await;

    aichat(&home, &server.uri())
        .args(["chat", "-m", "more", "--conversation-id", " abc123 "])
        .assert()
        .success()
        .stdout(predicate::str::contains("again"));
}

#[tokio::test]
async fn test_stream_error_shows_stream_message() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    aichat(&home, &server.uri())
        .args(["chat", "-m", "hello"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Error: Failed to connect to streaming endpoint.",
        ));
}

#[tokio::test]
async fn test_blank_message_warns_without_request() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    aichat(&home, &server.uri())
        .args(["chat", "-m", "  "])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Warning: Please enter a message!"));
}

#[tokio::test]
async fn test_no_stream_prints_full_response() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chatmodel/chat"))
        .and(header("ai-provider", "cohere"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Complete answer"))
        .expect(1)
        .mount(&server)
        .await;

    aichat(&home, &server.uri())
        .args(["chat", "-m", "hi", "--provider", "cohere", "--no-stream"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Complete answer"));
}

#[tokio::test]
async fn test_configured_flush_keeps_unterminated_tail() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    std::fs::write(
        home.path().join("config.toml"),
        "[stream]\nflush_trailing_fragment = true\n",
    )
    .unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("data:head\ndata:-tail"))
        .mount(&server)
        .await;

    aichat(&home, &server.uri())
        .args(["chat", "-m", "hi"])
        .assert()
        .success()
        .stdout(predicate::str::contains("head-tail"));
}
