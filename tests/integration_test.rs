use mockito::{Matcher, Server};
use postbox::{ApiClient, Config, MessagePayload, NonRetryableError, TransportConfig};
use serde_json::{json, Map, Value};

fn client_for(server: &Server) -> ApiClient {
    client_with_retries(server, 3)
}

fn client_with_retries(server: &Server, max_retries: usize) -> ApiClient {
    let config = Config {
        max_retries,
        transport: TransportConfig {
            base_url: server.url(),
            ..Default::default()
        },
    };
    ApiClient::new("integration-token", &config).unwrap()
}

fn message() -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("From".to_string(), json!("admin@example.com"));
    map.insert("To".to_string(), json!("user@example.com"));
    map.insert("Subject".to_string(), json!("Hello"));
    map
}

#[tokio::test]
async fn test_deliver_message_end_to_end() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/email")
        .match_header("x-postbox-server-token", "integration-token")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "From": "admin@example.com",
            "To": "user@example.com",
            "Subject": "Hello"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "To": "user@example.com",
                "SubmittedAt": "2026-08-06T09:00:00.000Z",
                "MessageID": "b7bc2f4a-e38e-4336-af7d-e6c392c2f817",
                "ErrorCode": 0,
                "Message": "OK"
            }"#,
        )
        .create_async()
        .await;

    let response = client_for(&server)
        .deliver_message(&message())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(
        response["MessageID"],
        json!("b7bc2f4a-e38e-4336-af7d-e6c392c2f817")
    );
    assert_eq!(response["ErrorCode"], json!(0));
}

#[tokio::test]
async fn test_deliver_messages_posts_batch() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/email/batch")
        .match_body(Matcher::Json(json!([
            {"From": "admin@example.com", "To": "user@example.com", "Subject": "Hello"},
            {"From": "admin@example.com", "To": "user@example.com", "Subject": "Hello"}
        ])))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"ErrorCode": 0}, {"ErrorCode": 0}]"#)
        .create_async()
        .await;

    let messages = vec![message(), message()];
    let response = client_for(&server)
        .deliver_messages(&messages)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_deliver_message_custom_payload_type() {
    struct PasswordReset {
        to: String,
    }

    impl MessagePayload for PasswordReset {
        fn to_message_map(&self) -> Map<String, Value> {
            let mut map = Map::new();
            map.insert("From".to_string(), json!("security@example.com"));
            map.insert("To".to_string(), self.to.clone().into());
            map
        }
    }

    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/email")
        .match_body(Matcher::Json(json!({
            "From": "security@example.com",
            "To": "user@example.com"
        })))
        .with_status(200)
        .with_body(r#"{"ErrorCode": 0}"#)
        .create_async()
        .await;

    let payload = PasswordReset {
        to: "user@example.com".to_string(),
    };
    client_for(&server).deliver_message(&payload).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_deliver_message_retries_until_exhaustion_on_server_error() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/email")
        .with_status(500)
        .with_body(r#"{"Message": "Internal Server Error"}"#)
        .expect(3)
        .create_async()
        .await;

    let err = client_for(&server)
        .deliver_message(&message())
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(err.to_string().contains("HTTP 500"));
}

#[tokio::test]
async fn test_deliver_message_custom_retry_bound() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/email")
        .with_status(503)
        .expect(2)
        .create_async()
        .await;

    let err = client_with_retries(&server, 2)
        .deliver_message(&message())
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(err.to_string().contains("HTTP 503"));
}

#[tokio::test]
async fn test_deliver_message_unprocessable_is_attempted_once() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/email")
        .with_status(422)
        .with_body(r#"{"ErrorCode": 300, "Message": "Invalid 'To' address"}"#)
        .expect(1)
        .create_async()
        .await;

    let err = client_for(&server)
        .deliver_message(&message())
        .await
        .unwrap_err();

    mock.assert_async().await;
    match err.downcast_ref::<NonRetryableError>() {
        Some(NonRetryableError::UnprocessableEntity(msg)) => {
            assert_eq!(msg, "Invalid 'To' address");
        }
        other => panic!("unexpected classification: {:?}", other),
    }
}

#[tokio::test]
async fn test_delivery_stats() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/deliverystats")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "InactiveMails": 26,
                "Bounces": [{"Name": "All", "Count": 30}]
            }"#,
        )
        .create_async()
        .await;

    let stats = client_for(&server).delivery_stats().await.unwrap();

    mock.assert_async().await;
    assert_eq!(stats["InactiveMails"], json!(26));
    assert_eq!(stats["Bounces"][0]["Count"], json!(30));
}

#[tokio::test]
async fn test_get_bounces_with_options() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/bounces?type=HardBounce&count=25&offset=0")
        .with_status(200)
        .with_body(r#"{"TotalCount": 1, "Bounces": [{"ID": 42}]}"#)
        .create_async()
        .await;

    let bounces = client_for(&server)
        .get_bounces(&[("type", "HardBounce"), ("count", "25"), ("offset", "0")])
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(bounces["TotalCount"], json!(1));
}

#[tokio::test]
async fn test_get_bounced_tags() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/bounces/tags")
        .with_status(200)
        .with_body(r#"["newsletter", "invoice"]"#)
        .create_async()
        .await;

    let tags = client_for(&server).get_bounced_tags().await.unwrap();

    mock.assert_async().await;
    assert_eq!(tags, json!(["newsletter", "invoice"]));
}

#[tokio::test]
async fn test_bounce_lookup_paths() {
    let mut server = Server::new_async().await;

    let bounce_mock = server
        .mock("GET", "/bounces/42")
        .with_status(200)
        .with_body(r#"{"ID": 42, "Type": "HardBounce"}"#)
        .create_async()
        .await;

    let dump_mock = server
        .mock("GET", "/bounces/42/dump")
        .with_status(200)
        .with_body(r#"{"Body": "raw message content"}"#)
        .create_async()
        .await;

    let client = client_for(&server);

    let bounce = client.get_bounce(42).await.unwrap();
    let dump = client.dump_bounce(42).await.unwrap();

    bounce_mock.assert_async().await;
    dump_mock.assert_async().await;
    assert_eq!(bounce["Type"], json!("HardBounce"));
    assert_eq!(dump["Body"], json!("raw message content"));
}

#[tokio::test]
async fn test_activate_bounce_issues_put() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("PUT", "/bounces/42/activate")
        .with_status(200)
        .with_body(r#"{"Message": "OK", "Bounce": {"ID": 42, "Inactive": false}}"#)
        .create_async()
        .await;

    let response = client_for(&server).activate_bounce(42).await.unwrap();

    mock.assert_async().await;
    assert_eq!(response["Bounce"]["Inactive"], json!(false));
}

#[tokio::test]
async fn test_unauthorized_surfaces_immediately() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/deliverystats")
        .with_status(401)
        .with_body(r#"{"Message": "Unauthorized"}"#)
        .expect(1)
        .create_async()
        .await;

    let err = client_for(&server).delivery_stats().await.unwrap_err();

    mock.assert_async().await;
    assert!(matches!(
        err.downcast_ref::<NonRetryableError>(),
        Some(NonRetryableError::AuthenticationFailed(_))
    ));
}
