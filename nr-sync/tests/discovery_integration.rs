use nr_sync::error::SyncError;
use nr_sync::newrelic::NerdGraphClient;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn search_body(entities: serde_json::Value, count: i64) -> serde_json::Value {
    json!({
        "data": {
            "actor": {
                "entitySearch": {
                    "count": count,
                    "results": { "entities": entities }
                }
            }
        }
    })
}

#[tokio::test]
async fn test_search_sends_api_key_and_parses_entities() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("API-Key", "NRAK-TEST"))
        .and(body_string_contains("entitySearch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(
            json!([
                {
                    "entityType": "APM_APPLICATION_ENTITY",
                    "name": "Order Service",
                    "applicationId": 1,
                    "guid": "guid-1",
                    "permalink": "https://one.newrelic.com/redirect/entity/1",
                    "language": "java",
                    "reporting": true,
                    "tags": [{"key": "env", "values": ["prod"]}]
                },
                {
                    "entityType": "BROWSER_APPLICATION_ENTITY",
                    "name": "Web   App",
                    "applicationId": 2,
                    "guid": "guid-2",
                    "permalink": "https://one.newrelic.com/redirect/entity/2",
                    "reporting": false,
                    "tags": []
                }
            ]),
            2
        )))
        .mount(&mock_server)
        .await;

    let client = NerdGraphClient::new(mock_server.uri(), "NRAK-TEST".to_string()).unwrap();
    let result = client.search_applications().await.unwrap();

    assert_eq!(result.count, 2);
    assert_eq!(result.entities.len(), 2);
    assert_eq!(result.entities[0].name, "Order Service");
    assert_eq!(result.entities[0].language.as_deref(), Some("java"));
    assert_eq!(result.entities[1].application_id, 2);
    assert!(result.entities[1].language.is_none());
}

#[tokio::test]
async fn test_search_empty_result_is_valid() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(json!([]), 0)))
        .mount(&mock_server)
        .await;

    let client = NerdGraphClient::new(mock_server.uri(), "NRAK-TEST".to_string()).unwrap();
    let result = client.search_applications().await.unwrap();

    assert_eq!(result.count, 0);
    assert!(result.entities.is_empty());
}

#[tokio::test]
async fn test_search_server_error_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = NerdGraphClient::new(mock_server.uri(), "NRAK-TEST".to_string()).unwrap();
    let result = client.search_applications().await;

    match result {
        Err(error @ SyncError::DiscoveryQueryFailed(_)) => assert!(error.is_fatal()),
        other => panic!("expected DiscoveryQueryFailed, got {:?}", other)
    }
}

#[tokio::test]
async fn test_search_unexpected_shape_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .mount(&mock_server)
        .await;

    let client = NerdGraphClient::new(mock_server.uri(), "NRAK-TEST".to_string()).unwrap();
    let result = client.search_applications().await;

    assert!(matches!(result, Err(SyncError::DiscoveryQueryFailed(_))));
}
