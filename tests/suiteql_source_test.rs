use ar_intel::config::toml_config::SuiteQlConfig;
use ar_intel::domain::ports::InvoiceSource;
use ar_intel::{ArEngine, ArError, EngineConfig, SuiteQlSource, ToolCall, ToolName};
use chrono::NaiveDate;
use httpmock::prelude::*;
use serde_json::json;

const SUITEQL_PATH: &str = "/services/rest/query/v1/suiteql";

fn config(server: &MockServer, page_size: usize, max_rows: usize) -> SuiteQlConfig {
    SuiteQlConfig {
        endpoint: server.url(SUITEQL_PATH),
        access_token: "test-token".to_string(),
        timeout_seconds: 5,
        page_size,
        lookback_days: 365,
        max_rows,
    }
}

fn row(id: u32, customer: &str, unpaid: &str, due: &str) -> serde_json::Value {
    json!({
        "transaction_id": id.to_string(),
        "invoice_number": format!("INV-{}", id),
        "invoice_date": "03/01/2024",
        "due_date": due,
        "customer_id": customer,
        "customer_name": format!("Customer {}", customer),
        "amount_total": unpaid,
        "unpaid_amount": unpaid
    })
}

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

#[tokio::test]
async fn test_follows_has_more_across_pages() {
    let server = MockServer::start();

    let first_page = server.mock(|when, then| {
        when.method(POST)
            .path(SUITEQL_PATH)
            .query_param("limit", "2")
            .query_param("offset", "0")
            .header("Authorization", "Bearer test-token")
            .header("Prefer", "transient")
            .body_contains("SELECT");
        then.status(200).json_body(json!({
            "items": [row(1, "7", "100.00", "05/01/2024"), row(2, "7", "50.00", "05/25/2024")],
            "hasMore": true,
            "count": 2,
            "offset": 0,
            "totalResults": 3
        }));
    });

    let second_page = server.mock(|when, then| {
        when.method(POST)
            .path(SUITEQL_PATH)
            .query_param("limit", "2")
            .query_param("offset", "2");
        then.status(200).json_body(json!({
            "items": [row(3, "8", "75.00", "06/20/2024")],
            "hasMore": false
        }));
    });

    let source = SuiteQlSource::new(config(&server, 2, 5000)).unwrap();
    let rows = source.fetch_open_invoices(as_of()).await.unwrap();

    first_page.assert();
    second_page.assert();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2].data["transaction_id"], json!("3"));
}

#[tokio::test]
async fn test_stops_at_max_rows() {
    let server = MockServer::start();

    let first_page = server.mock(|when, then| {
        when.method(POST).path(SUITEQL_PATH).query_param("offset", "0");
        then.status(200).json_body(json!({
            "items": [row(1, "7", "10", "05/01/2024"), row(2, "7", "10", "05/01/2024")],
            "hasMore": true
        }));
    });
    let second_page = server.mock(|when, then| {
        when.method(POST).path(SUITEQL_PATH).query_param("offset", "2");
        then.status(200).json_body(json!({
            "items": [row(3, "7", "10", "05/01/2024"), row(4, "7", "10", "05/01/2024")],
            "hasMore": true
        }));
    });

    let source = SuiteQlSource::new(config(&server, 2, 3)).unwrap();
    let rows = source.fetch_open_invoices(as_of()).await.unwrap();

    first_page.assert_hits(1);
    second_page.assert_hits(1);
    assert_eq!(rows.len(), 3);
}

#[tokio::test]
async fn test_error_status_becomes_source_error() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path(SUITEQL_PATH);
        then.status(401).body("INVALID_LOGIN");
    });

    let source = SuiteQlSource::new(config(&server, 1000, 5000)).unwrap();
    let err = source.fetch_open_invoices(as_of()).await.unwrap_err();

    mock.assert();
    match err {
        ArError::SourceError { message } => assert!(message.contains("INVALID_LOGIN")),
        other => panic!("expected a source error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_write_statements_never_leave_the_process() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path(SUITEQL_PATH);
        then.status(200).json_body(json!({"items": [], "hasMore": false}));
    });

    let source = SuiteQlSource::new(config(&server, 1000, 5000)).unwrap();
    let err = source
        .query_rows("UPDATE transaction SET memo = 'x'")
        .await
        .unwrap_err();

    assert!(matches!(err, ArError::ValidationError { .. }));
    mock.assert_hits(0);
}

#[tokio::test]
async fn test_priority_queue_over_suiteql_rows() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path(SUITEQL_PATH);
        then.status(200).json_body(json!({
            "items": [
                row(1, "7", "9000.00", "04/01/2024"),
                row(2, "8", "400.00", "05/25/2024"),
                row(3, "9", "250.00", "06/20/2024")
            ],
            "hasMore": false
        }));
    });

    let source = SuiteQlSource::new(config(&server, 1000, 5000)).unwrap();
    let engine = ArEngine::new(source, EngineConfig::default()).unwrap();

    let mut call = ToolCall::new(ToolName::CollectionsPriorityQueue);
    call.as_of = Some(as_of());
    call.top_n = Some(2);
    let output = engine.dispatch(&call, as_of()).await.unwrap();

    mock.assert();
    let queue = output.result["queue"].as_array().unwrap();
    assert_eq!(queue.len(), 2);
    assert_eq!(queue[0]["customer_id"], json!("7"));
    assert_eq!(queue[0]["rank"], json!(1));
    assert_eq!(queue[0]["recommended_action"], json!("escalate"));
    assert_eq!(queue[1]["rank"], json!(2));
}
