//! Batch client against a mock OData service.

use mockito::{Matcher, Server};
use odata_batch_http::client::{BatchClient, BearerToken, ClientConfig, EntityTracker, Outcome};
use odata_batch_http::{ApiVersion, BatchError, Operation};
use serde_json::json;
use std::sync::Arc;

fn client_for(server: &Server) -> BatchClient {
    let config = ClientConfig::new(format!("{}/api/data/", server.url()));
    BatchClient::new(config, Arc::new(BearerToken::new("super-secret-token"))).expect("create client")
}

fn nested_response(base: &str) -> String {
    format!(
        "--batchresponse_7c4f\r\n\
Content-Type: multipart/mixed; boundary=changesetresponse_91aa\r\n\
\r\n\
--changesetresponse_91aa\r\n\
Content-Type: application/http\r\n\
Content-Transfer-Encoding: binary\r\n\
Content-ID: 1\r\n\
\r\n\
HTTP/1.1 204 No Content\r\n\
OData-Version: 4.0\r\n\
Location: {base}contacts(1)\r\n\
OData-EntityId: {base}contacts(1)\r\n\
\r\n\
\r\n\
--changesetresponse_91aa\r\n\
Content-Type: application/http\r\n\
Content-Transfer-Encoding: binary\r\n\
Content-ID: 2\r\n\
\r\n\
HTTP/1.1 204 No Content\r\n\
OData-Version: 4.0\r\n\
OData-EntityId: {base}contacts(2)\r\n\
\r\n\
\r\n\
--changesetresponse_91aa--\r\n\
--batchresponse_7c4f\r\n\
Content-Type: application/http\r\n\
Content-Transfer-Encoding: binary\r\n\
\r\n\
HTTP/1.1 200 OK\r\n\
Content-Type: application/json; odata.metadata=minimal\r\n\
OData-Version: 4.0\r\n\
\r\n\
{{\"value\":[{{\"subject\":\"Task 1\"}}]}}\r\n\
--batchresponse_7c4f--\r\n"
    )
}

#[tokio::test]
async fn test_version_discovery() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/data/v8.2/RetrieveVersion")
        .match_header("Authorization", "Bearer super-secret-token")
        .match_header("OData-MaxVersion", "4.0")
        .match_header("OData-Version", "4.0")
        .match_header("Accept", "application/json")
        .with_status(200)
        .with_header("Content-Type", "application/json")
        .with_body(r#"{"@odata.context":"$metadata#Microsoft.Dynamics.CRM.RetrieveVersionResponse","Version":"9.1.0.643"}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let root = client.discover_version().await.expect("discover version");

    assert_eq!(root.version(), ApiVersion::new(9, 1));
    assert_eq!(
        root.batch_url(),
        format!("{}/api/data/v9.1/$batch", server.url())
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_version_discovery_failure() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/data/v8.2/RetrieveVersion")
        .with_status(401)
        .with_body("token expired")
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client.discover_version().await.unwrap_err();

    match err {
        BatchError::VersionDiscovery { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "token expired");
        }
        other => panic!("unexpected error: {other}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_batch_round_trip_and_cleanup() {
    let mut server = Server::new_async().await;
    let base = format!("{}/api/data/v8.2/", server.url());

    let batch = server
        .mock("POST", "/api/data/v8.2/$batch")
        .match_header("OData-MaxVersion", "4.0")
        .match_header("OData-Version", "4.0")
        .match_header("Accept", "application/json")
        .match_header(
            "Prefer",
            Matcher::Regex("OData.Community.Display.V1.FormattedValue".into()),
        )
        .match_header(
            "Content-Type",
            Matcher::Regex(r"^multipart/mixed; ?boundary=batch_[0-9a-f-]{36}$".into()),
        )
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("Content-Type: multipart/mixed; ?boundary=changeset_".into()),
            Matcher::Regex("Content-ID: 1\r\n".into()),
            Matcher::Regex("Content-ID: 2\r\n".into()),
            Matcher::Regex(r"GET \S+/api/data/v8.2/Account_Tasks\?\$select=subject HTTP/1.1".into()),
            Matcher::Regex("\"firstname\":\"Peter\"".into()),
        ]))
        .with_status(200)
        .with_header("Content-Type", "multipart/mixed; boundary=batchresponse_7c4f")
        .with_body(nested_response(&base))
        .create_async()
        .await;

    let first = server
        .mock("DELETE", "/api/data/v8.2/contacts(1)")
        .with_status(204)
        .create_async()
        .await;
    let second = server
        .mock("DELETE", "/api/data/v8.2/contacts(2)")
        .with_status(404)
        .with_body("not found")
        .create_async()
        .await;

    let client = client_for(&server);
    let root = client.config().api_root().expect("api root");
    let envelope = client
        .builder(&root)
        .push(Operation::post("contacts", json!({"firstname": "Peter", "lastname": "Cambel"})))
        .push(Operation::post("contacts", json!({"firstname": "Susie", "lastname": "Curtis"})))
        .push(Operation::get("Account_Tasks?$select=subject"))
        .build()
        .expect("build batch");

    let mut tracker = EntityTracker::new();
    let outcomes = client
        .execute(&root, &envelope, &mut tracker)
        .await
        .expect("execute batch");

    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].entity_uri(), Some(format!("{base}contacts(1)").as_str()));
    assert_eq!(outcomes[1].entity_uri(), Some(format!("{base}contacts(2)").as_str()));
    assert!(matches!(&outcomes[2], Outcome::Success { body } if body.contains("Task 1")));
    assert_eq!(tracker.len(), 2);
    batch.assert_async().await;

    let report = client.cleanup(&mut tracker, true).await.expect("cleanup");
    assert_eq!(report.deleted, 1);
    assert_eq!(report.not_found, 1);
    assert_eq!(report.failed, 0);
    assert!(tracker.is_empty());
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_rejected_batch() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/data/v8.2/$batch")
        .with_status(400)
        .with_body(r#"{"error":{"code":"0x0","message":"The batch request must have a Content-Type"}}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let root = client.config().api_root().expect("api root");
    let envelope = client
        .builder(&root)
        .push(Operation::get("accounts"))
        .build()
        .expect("build batch");

    let mut tracker = EntityTracker::new();
    let err = client.execute(&root, &envelope, &mut tracker).await.unwrap_err();
    match err {
        BatchError::BatchRejected { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("Content-Type"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(tracker.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_cleanup_reports_every_delete() {
    let mut server = Server::new_async().await;
    let base = format!("{}/api/data/v8.2/", server.url());

    let deleted = server
        .mock("DELETE", "/api/data/v8.2/tasks(1)")
        .with_status(204)
        .create_async()
        .await;
    let missing = server
        .mock("DELETE", "/api/data/v8.2/tasks(2)")
        .with_status(404)
        .create_async()
        .await;
    let broken = server
        .mock("DELETE", "/api/data/v8.2/tasks(3)")
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;

    let client = client_for(&server);
    let mut tracker = EntityTracker::new();
    for i in 1..=3 {
        tracker.record(format!("{base}tasks({i})"));
    }

    let err = client.cleanup(&mut tracker, true).await.unwrap_err();
    match err {
        BatchError::Cleanup { report, body } => {
            assert_eq!((report.deleted, report.not_found, report.failed), (1, 1, 1));
            assert_eq!(body, "internal error");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(tracker.is_empty());
    deleted.assert_async().await;
    missing.assert_async().await;
    broken.assert_async().await;
}

#[tokio::test]
async fn test_declined_cleanup_sends_no_deletes() {
    let mut server = Server::new_async().await;
    let base = format!("{}/api/data/v8.2/", server.url());
    let mock = server
        .mock("DELETE", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = client_for(&server);
    let mut tracker = EntityTracker::new();
    tracker.record(format!("{base}tasks(1)"));

    let report = client.cleanup(&mut tracker, false).await.expect("cleanup");
    assert_eq!(report.attempted(), 0);
    assert!(tracker.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_entities_from_earlier_batch_cleaned_after_later_failure() {
    let mut server = Server::new_async().await;
    let base = format!("{}/api/data/v8.2/", server.url());

    let accepted = server
        .mock("POST", "/api/data/v8.2/$batch")
        .match_body(Matcher::Regex("\"firstname\"".into()))
        .with_status(200)
        .with_header("Content-Type", "multipart/mixed; boundary=batchresponse_7c4f")
        .with_body(nested_response(&base))
        .create_async()
        .await;
    let rejected = server
        .mock("POST", "/api/data/v8.2/$batch")
        .match_body(Matcher::Regex("\"subject\"".into()))
        .with_status(500)
        .with_body("service unavailable")
        .create_async()
        .await;
    let deletes = server
        .mock("DELETE", Matcher::Regex(r"^/api/data/v8.2/contacts\([12]\)$".into()))
        .with_status(204)
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server);
    let root = client.config().api_root().expect("api root");
    let mut tracker = EntityTracker::new();

    let contacts = client
        .builder(&root)
        .push(Operation::post("contacts", json!({"firstname": "Peter"})))
        .push(Operation::post("contacts", json!({"firstname": "Susie"})))
        .build()
        .expect("build batch");
    let tasks = client
        .builder(&root)
        .push(Operation::post("tasks", json!({"subject": "Task 1 in batch"})))
        .build()
        .expect("build batch");

    let run = async {
        client.execute(&root, &contacts, &mut tracker).await?;
        client.execute(&root, &tasks, &mut tracker).await
    }
    .await;
    assert!(run.is_err());
    assert_eq!(tracker.len(), 2);

    let err = client.finish_run(&mut tracker, true, run).await.unwrap_err();
    assert!(matches!(err, BatchError::BatchRejected { status: 500, .. }));
    assert!(tracker.is_empty());

    accepted.assert_async().await;
    rejected.assert_async().await;
    deletes.assert_async().await;
}
