//! Request shapes and error mapping for ContentClient, against a local mock server

use lectern_client::{ClientConfig, ClientError, ContentClient, OrderEntry, QuizAnswer};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ContentClient {
    ContentClient::new(ClientConfig {
        base_url: server.uri(),
        api_key: Some("token-123".to_string()),
        timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn test_lists_modules_with_bearer_auth() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/courses/c1/modules"))
        .and(header("authorization", "Bearer token-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"_id": "m1", "courseId": "c1", "title": "Foundations", "order": 0, "quizId": "q1"},
            {"_id": "m2", "courseId": "c1", "title": "Discipleship", "order": 1}
        ])))
        .mount(&server)
        .await;

    let modules = client_for(&server).list_modules("c1").await.unwrap();
    assert_eq!(modules.len(), 2);
    assert_eq!(modules[0].quiz_id.as_deref(), Some("q1"));
    assert_eq!(modules[1].quiz_id, None);
}

#[tokio::test]
async fn test_missing_quiz_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/quizzes/module/m1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let quiz = client_for(&server).get_quiz("m1").await.unwrap();
    assert!(quiz.is_none());
}

#[tokio::test]
async fn test_reorder_lessons_sends_full_ordering() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/lessons/reorder"))
        .and(body_json(json!({
            "moduleId": "m1",
            "lessons": [{"id": "l2", "order": 0}, {"id": "l1", "order": 1}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Lessons reordered"})))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server)
        .reorder_lessons("m1", &[OrderEntry::new("l2", 0), OrderEntry::new("l1", 1)])
        .await
        .unwrap();
    assert_eq!(response.message, "Lessons reordered");
}

#[tokio::test]
async fn test_reorder_failure_maps_to_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/modules/c1/reorder"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .reorder_modules("c1", &[OrderEntry::new("m1", 0)])
        .await
        .unwrap_err();

    match err {
        ClientError::Server { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "database unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_locked_lesson_completion_maps_to_locked() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/lessons/l2/complete"))
        .and(body_json(json!({"userId": "u1"})))
        .respond_with(ResponseTemplate::new(423).set_body_string("complete the previous lesson first"))
        .mount(&server)
        .await;

    let err = client_for(&server).complete_lesson("u1", "l2").await.unwrap_err();
    match err {
        ClientError::Locked { resource, message } => {
            assert_eq!(resource, "l2");
            assert!(message.contains("previous lesson"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_submit_quiz_returns_verdict() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/quizzes/q1/submit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"passed": false, "score": 65.0})))
        .mount(&server)
        .await;

    let answers = vec![QuizAnswer {
        question_id: "question-1".to_string(),
        answer: json!("b"),
    }];
    let result = client_for(&server).submit_quiz("u1", "q1", &answers).await.unwrap();
    assert!(!result.passed);
    assert_eq!(result.score, 65.0);
}

#[tokio::test]
async fn test_garbage_body_is_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lessons/module/m1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).list_lessons("m1").await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_wrong_shape_is_json_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/courses/c1/modules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"modules": []})))
        .mount(&server)
        .await;

    let err = client_for(&server).list_modules("c1").await.unwrap_err();
    assert!(matches!(err, ClientError::Json(ref e) if e.is_data()));
}
