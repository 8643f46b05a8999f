#[path = "../src/api_client.rs"]
mod api_client;

use api_client::{ApiClient, Solution};
use httpmock::Method::{GET, POST};
use httpmock::MockServer;
use serde_json::json;
use std::net::TcpListener;

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

#[tokio::test]
async fn fetch_problem_returns_dump_unchanged() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    let token = "abc123";
    let encoded = "H4sIAAAAAAAA/w==";

    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/challenges/backup_restore/problem")
            .query_param("access_token", token);
        then.status(200).json_body(json!({ "dump": encoded }));
    });

    let client = ApiClient::new(&server.base_url(), token).unwrap();
    let problem = client.fetch_problem().await.unwrap();
    assert_eq!(problem.dump, encoded);
    mock.assert();
}

#[tokio::test]
async fn fetch_problem_surfaces_error_body() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/challenges/backup_restore/problem");
        then.status(500).body("internal meltdown");
    });

    let client = ApiClient::new(&server.base_url(), "abc123").unwrap();
    let err = client.fetch_problem().await.unwrap_err();
    assert!(err.to_string().contains("500"));
    assert!(err.to_string().contains("internal meltdown"));
}

#[tokio::test]
async fn fetch_problem_rejects_malformed_json() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/challenges/backup_restore/problem");
        then.status(200).body("not json at all");
    });

    let client = ApiClient::new(&server.base_url(), "abc123").unwrap();
    let err = client.fetch_problem().await.unwrap_err();
    assert!(err.to_string().contains("expected JSON shape"));
}

#[tokio::test]
async fn submit_solution_posts_payload_and_returns_body() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    let token = "abc123";

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/challenges/backup_restore/solve")
            .query_param("access_token", token)
            .query_param("playground", "1")
            .json_body(json!({ "alive_ssns": ["123-45-6789"] }));
        then.status(200).body("{\"result\":\"correct\"}");
    });

    let client = ApiClient::new(&server.base_url(), token).unwrap();
    let response = client
        .submit_solution(&Solution {
            alive_ssns: vec!["123-45-6789".to_string()],
        })
        .await
        .unwrap();
    assert_eq!(response, "{\"result\":\"correct\"}");
    mock.assert();
}

#[tokio::test]
async fn submit_solution_fails_on_forbidden() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/challenges/backup_restore/solve");
        then.status(403).body("bad token");
    });

    let client = ApiClient::new(&server.base_url(), "wrong").unwrap();
    let err = client
        .submit_solution(&Solution { alive_ssns: vec![] })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("403"));
    assert!(err.to_string().contains("bad token"));
}
