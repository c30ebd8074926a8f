use std::sync::Mutex;

use serde_json::json;
use teamsattend::auth::{AuthError, Authenticator, StaticToken, TokenSource};
use teamsattend::config::AppConfig;
use teamsattend::graph::{GraphClient, GraphError};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};


const MEETING: &str = "19:meeting_ABC123";


fn config_for(server: &MockServer) -> AppConfig {
    let graph = format!("{}/v1.0", server.uri());
    AppConfig::from_lookup(move |key| match key {
        "GRAPH_API_ENDPOINT" => Some(graph.clone()),
        "TENANT_ID" => Some("tenant-1".to_owned()),
        _ => None,
    })
}

fn token() -> StaticToken {
    StaticToken("test-token".to_owned())
}


#[tokio::test]
async fn report_uses_plain_id_when_meeting_exists() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1.0/me/onlineMeetings/{}", MEETING)))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": MEETING})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v1.0/me/onlineMeetings/{}/attendanceReports", MEETING)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": [{"id": "r1"}]})))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let tokens = token();
    let client = GraphClient::new(&config, &tokens).unwrap();
    let reports = client.get_attendance_report(MEETING).await.unwrap();
    assert_eq!(reports, Some(json!({"value": [{"id": "r1"}]})));
}

#[tokio::test]
async fn report_falls_back_to_quoted_id_exactly_once_then_lists_by_plain_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1.0/me/onlineMeetings/{}", MEETING)))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v1.0/me/onlineMeetings('{}')", MEETING)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": MEETING})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v1.0/me/onlineMeetings/{}/attendanceReports", MEETING)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": [{"id": "r9"}]})))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let tokens = token();
    let client = GraphClient::new(&config, &tokens).unwrap();
    let reports = client.get_attendance_report(MEETING).await.unwrap();
    assert_eq!(reports, Some(json!({"value": [{"id": "r9"}]})));
}

#[tokio::test]
async fn report_not_found_under_either_form() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let tokens = token();
    let client = GraphClient::new(&config, &tokens).unwrap();
    assert_eq!(client.get_attendance_report(MEETING).await.unwrap(), None);
}

#[tokio::test]
async fn report_server_error_is_distinguishable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1.0/me/onlineMeetings/{}", MEETING)))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let tokens = token();
    let client = GraphClient::new(&config, &tokens).unwrap();
    let err = client.get_attendance_report(MEETING).await.unwrap_err();
    match err {
        GraphError::Status { status, body } => {
            assert_eq!(status.as_u16(), 403);
            assert_eq!(body, "Forbidden");
        },
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn reports_missing_after_meeting_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1.0/me/onlineMeetings/{}", MEETING)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": MEETING})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v1.0/me/onlineMeetings/{}/attendanceReports", MEETING)))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let tokens = token();
    let client = GraphClient::new(&config, &tokens).unwrap();
    assert_eq!(client.get_attendance_report(MEETING).await.unwrap(), None);
}

#[tokio::test]
async fn records_return_the_value_array() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1.0/me/onlineMeetings/{}/attendanceReports/r1/attendanceRecords", MEETING)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@odata.context": "ignored",
            "value": [{"id": "a"}, {"id": "b"}],
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v1.0/me/onlineMeetings/{}/attendanceReports/r2/attendanceRecords", MEETING)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v1.0/me/onlineMeetings/{}/attendanceReports/r3/attendanceRecords", MEETING)))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let tokens = token();
    let client = GraphClient::new(&config, &tokens).unwrap();
    assert_eq!(
        client.get_attendance_records(MEETING, "r1").await.unwrap(),
        Some(vec![json!({"id": "a"}), json!({"id": "b"})]),
    );
    assert_eq!(client.get_attendance_records(MEETING, "r2").await.unwrap(), Some(vec![]));
    assert!(matches!(
        client.get_attendance_records(MEETING, "r3").await,
        Err(GraphError::Status { .. }),
    ));
}

#[tokio::test]
async fn list_meetings_passes_filter_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1.0/me/onlineMeetings"))
        .and(query_param("$filter", "JoinWebUrl eq 'https://teams.microsoft.com/l/meetup-join/x'"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": [{"id": "m1"}]})))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let tokens = token();
    let client = GraphClient::new(&config, &tokens).unwrap();
    let meetings = client
        .list_online_meetings(Some("JoinWebUrl eq 'https://teams.microsoft.com/l/meetup-join/x'"))
        .await
        .unwrap();
    assert_eq!(meetings, Some(vec![json!({"id": "m1"})]));
}

#[tokio::test]
async fn list_meetings_without_filter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1.0/me/onlineMeetings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let tokens = token();
    let client = GraphClient::new(&config, &tokens).unwrap();
    assert_eq!(client.list_online_meetings(None).await.unwrap(), Some(vec![]));
}


struct RotatingToken(Mutex<String>);
impl TokenSource for RotatingToken {
    fn bearer_token(&self) -> Result<String, AuthError> {
        Ok(self.0.lock().unwrap().clone())
    }
}

#[tokio::test]
async fn token_is_read_on_every_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1.0/me/onlineMeetings"))
        .and(header("authorization", "Bearer first"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": [{"id": "one"}]})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1.0/me/onlineMeetings"))
        .and(header("authorization", "Bearer second"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": [{"id": "two"}]})))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let tokens = RotatingToken(Mutex::new("first".to_owned()));
    let client = GraphClient::new(&config, &tokens).unwrap();
    assert_eq!(client.list_online_meetings(None).await.unwrap(), Some(vec![json!({"id": "one"})]));

    *tokens.0.lock().unwrap() = "second".to_owned();
    assert_eq!(client.list_online_meetings(None).await.unwrap(), Some(vec![json!({"id": "two"})]));
}

#[tokio::test]
async fn unauthenticated_client_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let auth = Authenticator::new(&config).unwrap();
    let client = GraphClient::new(&config, &auth).unwrap();
    assert!(matches!(
        client.list_online_meetings(None).await,
        Err(GraphError::Token(AuthError::NotAuthenticated)),
    ));
}
