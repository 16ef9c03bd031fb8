//! Tests for [`vector_index::PineconeIndex`] against a mock Pinecone server (mockito).

use mockito::Matcher;
use vector_index::{PineconeConfig, PineconeIndex, QueryRequest, VectorIndex, DEFAULT_TOP_K};

const QUERY_RESPONSE: &str = r#"{
  "results": [],
  "matches": [
    { "id": "Dr. Emily Carter", "score": 0.91, "values": [], "metadata": { "subject": "Computer Science", "stars": 5, "review": "Great" } },
    { "id": "Dr. Alan Kim", "score": 0.87, "values": [], "metadata": { "subject": "Algorithms", "stars": 4.5 } },
    { "id": "Prof. No Meta", "score": 0.5, "values": [] }
  ],
  "namespace": "ns1",
  "usage": { "readUnits": 6 }
}"#;

fn config_for(server: &mockito::ServerGuard, host: Option<String>) -> PineconeConfig {
    PineconeConfig {
        api_key: "pcsk_test_key".to_string(),
        index_name: "rag".to_string(),
        namespace: "ns1".to_string(),
        index_host: host,
        controller_url: server.url(),
    }
}

/// **Test: Query body carries topK=5, includeMetadata=true, the vector, and the namespace; matches keep order.**
#[tokio::test]
async fn query_requests_top_five_with_metadata() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/query")
        .match_header("api-key", "pcsk_test_key")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "namespace": "ns1",
            "vector": [0.5, 0.25],
            "topK": 5,
            "includeMetadata": true
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(QUERY_RESPONSE)
        .expect(1)
        .create_async()
        .await;

    let index = PineconeIndex::connect(&config_for(&server, Some(server.url())))
        .await
        .unwrap();
    let matches = index
        .query(QueryRequest::with_metadata(vec![0.5, 0.25], DEFAULT_TOP_K))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(matches.len(), 3);
    assert_eq!(matches[0].id, "Dr. Emily Carter");
    assert_eq!(matches[0].metadata.subject, "Computer Science");
    assert_eq!(matches[0].metadata.stars, 5.0);
    assert_eq!(matches[1].metadata.stars, 4.5);
    assert_eq!(matches[2].metadata.subject, "");
}

/// **Test: Without a configured host, connect looks it up through the controller.**
#[tokio::test]
async fn connect_discovers_host() {
    let mut server = mockito::Server::new_async().await;
    let data_plane = server.url();
    let describe = server
        .mock("GET", "/indexes/rag")
        .match_header("api-key", "pcsk_test_key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            serde_json::json!({ "name": "rag", "dimension": 1536, "metric": "cosine", "host": data_plane })
                .to_string(),
        )
        .create_async()
        .await;

    let index = PineconeIndex::connect(&config_for(&server, None)).await.unwrap();

    describe.assert_async().await;
    assert_eq!(index.host(), data_plane);
    assert_eq!(index.namespace(), "ns1");
}

/// **Test: A non-2xx query response is an error carrying the status.**
#[tokio::test]
async fn query_error_status_is_propagated() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/query")
        .with_status(401)
        .with_body(r#"{"code":16,"message":"Invalid API Key"}"#)
        .create_async()
        .await;

    let index = PineconeIndex::new("bad".to_string(), &server.url(), "ns1".to_string()).unwrap();
    let err = index
        .query(QueryRequest::with_metadata(vec![0.1], DEFAULT_TOP_K))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("401"));
}

/// **Test: An unknown index fails connect.**
#[tokio::test]
async fn connect_unknown_index_fails() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/indexes/rag")
        .with_status(404)
        .with_body(r#"{"error":{"code":"NOT_FOUND","message":"Resource rag not found"}}"#)
        .create_async()
        .await;

    assert!(PineconeIndex::connect(&config_for(&server, None)).await.is_err());
}
