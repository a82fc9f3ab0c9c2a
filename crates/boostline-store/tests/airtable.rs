//! Integration tests for `AirtableStore` using wiremock HTTP mocks.

use boostline_store::{AirtableStore, Fields, Query, RecordStore, StoreError};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_store(server: &MockServer) -> AirtableStore {
    AirtableStore::with_base_url("pat-test", "appBASE", 5, &server.uri())
        .expect("store construction should not fail")
}

#[tokio::test]
async fn select_sends_formula_and_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v0/appBASE/Campaigns"))
        .and(header("authorization", "Bearer pat-test"))
        .and(query_param("filterByFormula", "{Short C Formular} = 'SPRING'"))
        .and(query_param("maxRecords", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{ "id": "recA", "fields": { "Name": "Spring" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let rows = test_store(&server)
        .select("Campaigns", &Query::field_equals("Short C Formular", "SPRING").limit(1))
        .await
        .expect("select should succeed");

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "recA");
    assert_eq!(rows[0].text("Name"), Some("Spring"));
}

#[tokio::test]
async fn select_follows_offset_cursor() {
    let server = MockServer::start().await;

    // Registered first so the cursor request does not fall through to page one.
    Mock::given(method("GET"))
        .and(path("/v0/appBASE/Parasition%20Group%20Discord"))
        .and(query_param("offset", "itr2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{ "id": "rec2", "fields": {} }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v0/appBASE/Parasition%20Group%20Discord"))
        .and(query_param("view", "Current Month"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{ "id": "rec1", "fields": {} }],
            "offset": "itr2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let rows = test_store(&server)
        .select("Parasition Group Discord", &Query::all().in_view("Current Month"))
        .await
        .expect("select should succeed");

    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["rec1", "rec2"]);
}

#[tokio::test]
async fn forbidden_is_reported_as_status_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("INVALID_PERMISSIONS"))
        .mount(&server)
        .await;

    let err = test_store(&server)
        .select("KPIs Weekly", &Query::all())
        .await
        .unwrap_err();

    assert!(err.is_forbidden(), "got: {err:?}");
}

#[tokio::test]
async fn create_posts_records_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v0/appBASE/Misc1"))
        .and(body_json(json!({
            "records": [{ "fields": { "Name": "hello", "Message ID": "m1" } }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{ "id": "recNew", "fields": { "Name": "hello", "Campaign": ["SPRING"] } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut fields = Fields::new();
    fields.insert("Name".to_owned(), json!("hello"));
    fields.insert("Message ID".to_owned(), json!("m1"));

    let created = test_store(&server)
        .create("Misc1", vec![fields])
        .await
        .expect("create should succeed");

    assert_eq!(created.len(), 1);
    assert_eq!(created[0].text("Campaign"), Some("SPRING"));
}

#[tokio::test]
async fn update_patches_single_record() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/v0/appBASE/Parasition%20Group%20Discord"))
        .and(body_json(json!({
            "records": [{ "id": "rec1", "fields": { "Views Count": 10 } }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{ "id": "rec1", "fields": { "Views Count": 10 } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut fields = Fields::new();
    fields.insert("Views Count".to_owned(), json!(10));

    test_store(&server)
        .update("Parasition Group Discord", "rec1", fields)
        .await
        .expect("update should succeed");
}

#[tokio::test]
async fn update_without_echoed_record_is_write_failure() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "records": [] })))
        .mount(&server)
        .await;

    let err = test_store(&server)
        .update("Parasition Group Discord", "rec1", Fields::new())
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::WriteFailed { .. }), "got: {err:?}");
}

#[tokio::test]
async fn malformed_body_is_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = test_store(&server)
        .select("Campaigns", &Query::all())
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Deserialize { .. }), "got: {err:?}");
}
