//! Tests for [`rmp_server::RagPipeline`] with recording service doubles. No network.

mod common;

use bytes::Bytes;
use common::*;
use futures::StreamExt;
use rmp_core::{ChatMessage, MessageRole, RagError, RequestError};
use rmp_server::{ReplyState, ReplyStream, ServerConfig};
use serial_test::serial;

async fn collect_text(reply: ReplyStream) -> String {
    let parts: Vec<Bytes> = reply.map(|b| b.expect("chunk ok")).collect().await;
    parts
        .iter()
        .map(|b| std::str::from_utf8(b).unwrap())
        .collect()
}

/// **Test: Exactly one embedding call, with the content of the last message.**
#[tokio::test]
async fn embeds_last_message_once() {
    let h = Harness::new(
        RecordingEmbedder::new(vec![0.1, 0.2]),
        RecordingIndex::new(vec![]),
        ScriptedLlm::chunks(&["ok"]),
    );
    let transcript = vec![
        ChatMessage::assistant("Hi! How can I help?"),
        ChatMessage::user("first question"),
        ChatMessage::assistant("first answer"),
        ChatMessage::user("who teaches calculus well?"),
    ];

    let reply = h.pipeline().answer(&transcript).await.unwrap();
    collect_text(reply).await;

    assert_eq!(h.embedder.calls(), vec!["who teaches calculus well?".to_string()]);
}

/// **Test: The index is queried once with topK=5, metadata on, and the embedding as vector.**
#[tokio::test]
async fn queries_top_five_with_metadata() {
    let h = Harness::new(
        RecordingEmbedder::new(vec![0.5, -0.25, 1.0]),
        RecordingIndex::new(vec![]),
        ScriptedLlm::chunks(&["ok"]),
    );

    let reply = h.pipeline().answer(&[ChatMessage::user("q")]).await.unwrap();
    collect_text(reply).await;

    let calls = h.index.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].top_k, 5);
    assert!(calls[0].include_metadata);
    assert_eq!(calls[0].vector, vec![0.5, -0.25, 1.0]);
}

/// **Test: The match count is fixed at five; a RETRIEVAL_TOP_K variable changes nothing.**
#[tokio::test]
#[serial]
async fn top_k_is_not_configurable() {
    std::env::set_var("RETRIEVAL_TOP_K", "2");
    let config = ServerConfig::from_env();
    let h = Harness::new(
        RecordingEmbedder::new(vec![0.1]),
        RecordingIndex::new(professors_abc()),
        ScriptedLlm::chunks(&["ok"]),
    );

    let reply = h.pipeline().answer(&[ChatMessage::user("q")]).await.unwrap();
    collect_text(reply).await;
    std::env::remove_var("RETRIEVAL_TOP_K");

    assert!(config.validate().is_ok());
    assert_eq!(h.index.calls()[0].top_k, 5);
}

/// **Test: Completion input = system + history unchanged + augmented question (input length + 1).**
#[tokio::test]
async fn completion_messages_preserve_history_and_prefix() {
    let h = Harness::new(
        RecordingEmbedder::new(vec![0.1]),
        RecordingIndex::new(professors_abc()),
        ScriptedLlm::chunks(&["ok"]),
    );
    let transcript = vec![
        ChatMessage::assistant("greeting"),
        ChatMessage::user("earlier"),
        ChatMessage::assistant("earlier reply"),
        ChatMessage::user("best chemistry professor?"),
    ];

    let reply = h.pipeline().answer(&transcript).await.unwrap();
    collect_text(reply).await;

    let calls = h.llm.calls();
    assert_eq!(calls.len(), 1);
    let sent = &calls[0];
    assert_eq!(sent.len(), transcript.len() + 1);
    assert_eq!(sent[0], ChatMessage::system(TEST_SYSTEM_PROMPT));
    assert_eq!(&sent[1..4], &transcript[..3]);
    let last = sent.last().unwrap();
    assert_eq!(last.role, MessageRole::User);
    assert!(last.content.starts_with("best chemistry professor?"));
    assert!(last.content.contains("Returned results from vector db (done automatically):"));
}

/// **Test: Reply bytes keep chunk order; empty deltas produce nothing.**
#[tokio::test]
async fn streams_chunks_in_order_skipping_empty() {
    let h = Harness::new(
        RecordingEmbedder::new(vec![0.1]),
        RecordingIndex::new(vec![]),
        ScriptedLlm::chunks(&["", "Dr. ", "", "Carter", " teaches CS.", ""]),
    );

    let reply = h.pipeline().answer(&[ChatMessage::user("q")]).await.unwrap();
    let parts: Vec<Bytes> = reply.map(|b| b.unwrap()).collect().await;

    assert_eq!(
        parts,
        vec![Bytes::from("Dr. "), Bytes::from("Carter"), Bytes::from(" teaches CS.")]
    );
}

/// **Test: Three matches A/B/C render three records in order; reply is the concatenated chunks.**
#[tokio::test]
async fn professors_abc_scenario() {
    let h = Harness::new(
        RecordingEmbedder::new(vec![0.3]),
        RecordingIndex::new(professors_abc()),
        ScriptedLlm::chunks(&["Prof ", "A."]),
    );

    let reply = h
        .pipeline()
        .answer(&[ChatMessage::user("Who is good at math?")])
        .await
        .unwrap();
    assert_eq!(collect_text(reply).await, "Prof A.");

    let question = h.llm.calls()[0].last().unwrap().content.clone();
    assert_eq!(question.matches("Returned Results:").count(), 3);
    let a = question.find("Professor: Prof A").unwrap();
    let b = question.find("Professor: Prof B").unwrap();
    let c = question.find("Professor: Prof C").unwrap();
    assert!(a < b && b < c);
    assert!(question.contains("Review: 4.5\nSubject: Math\nStars: 4.5"));
}

/// **Test: Empty transcript is rejected and no service is called.**
#[tokio::test]
async fn empty_transcript_makes_no_calls() {
    let h = Harness::new(
        RecordingEmbedder::new(vec![0.1]),
        RecordingIndex::new(vec![]),
        ScriptedLlm::chunks(&["never"]),
    );

    let err = h.pipeline().answer(&[]).await.err().unwrap();
    assert!(matches!(
        err,
        RagError::InvalidRequest(RequestError::EmptyConversation)
    ));
    assert!(h.no_service_called());
}

/// **Test: A transcript ending with an assistant message is rejected before any call.**
#[tokio::test]
async fn trailing_assistant_message_makes_no_calls() {
    let h = Harness::new(
        RecordingEmbedder::new(vec![0.1]),
        RecordingIndex::new(vec![]),
        ScriptedLlm::chunks(&["never"]),
    );

    let err = h
        .pipeline()
        .answer(&[ChatMessage::user("q"), ChatMessage::assistant("")])
        .await
        .err()
        .unwrap();
    assert!(matches!(err, RagError::InvalidRequest(_)));
    assert!(h.no_service_called());
}

/// **Test: Embedding failure fails the request; index and model are not called.**
#[tokio::test]
async fn embedding_failure_stops_pipeline() {
    let h = Harness::new(
        RecordingEmbedder::failing(),
        RecordingIndex::new(vec![]),
        ScriptedLlm::chunks(&["never"]),
    );

    let err = h.pipeline().answer(&[ChatMessage::user("q")]).await.err().unwrap();
    assert!(matches!(err, RagError::Embedding(_)));
    assert!(h.index.calls().is_empty());
    assert!(h.llm.calls().is_empty());
}

/// **Test: Vector index failure fails the request; the model is not called.**
#[tokio::test]
async fn index_failure_stops_pipeline() {
    let h = Harness::new(
        RecordingEmbedder::new(vec![0.1]),
        RecordingIndex::failing(),
        ScriptedLlm::chunks(&["never"]),
    );

    let err = h.pipeline().answer(&[ChatMessage::user("q")]).await.err().unwrap();
    assert!(matches!(err, RagError::Retrieval(_)));
    assert!(h.llm.calls().is_empty());
}

/// **Test: A completion error before any chunk fails the request instead of opening a stream.**
#[tokio::test]
async fn completion_error_before_first_chunk_fails_request() {
    let h = Harness::new(
        RecordingEmbedder::new(vec![0.1]),
        RecordingIndex::new(vec![]),
        ScriptedLlm::new(vec![Err("invalid_api_key")]),
    );

    let err = h.pipeline().answer(&[ChatMessage::user("q")]).await.err().unwrap();
    assert!(matches!(err, RagError::Completion(_)));
}

/// **Test: A mid-stream error is delivered after the partial text, then the stream closes.**
#[tokio::test]
async fn mid_stream_error_ends_stream() {
    let h = Harness::new(
        RecordingEmbedder::new(vec![0.1]),
        RecordingIndex::new(vec![]),
        ScriptedLlm::new(vec![Ok("Prof "), Err("connection reset"), Ok("never")]),
    );

    let mut reply = h.pipeline().answer(&[ChatMessage::user("q")]).await.unwrap();
    assert_eq!(reply.next().await.unwrap().unwrap(), Bytes::from("Prof "));
    assert!(matches!(
        reply.next().await.unwrap(),
        Err(RagError::Completion(_))
    ));
    assert!(h.llm.released());
    assert!(reply.next().await.is_none());
    assert_eq!(reply.state(), ReplyState::Closed);
}

/// **Test: Dropping the reply mid-stream (client abort) releases the upstream stream.**
#[tokio::test]
async fn dropped_reply_releases_upstream() {
    let h = Harness::new(
        RecordingEmbedder::new(vec![0.1]),
        RecordingIndex::new(vec![]),
        ScriptedLlm::chunks(&["one", "two", "three"]),
    );

    let mut reply = h.pipeline().answer(&[ChatMessage::user("q")]).await.unwrap();
    assert_eq!(reply.next().await.unwrap().unwrap(), Bytes::from("one"));
    assert!(!h.llm.released());

    drop(reply);
    assert!(h.llm.released());
}
