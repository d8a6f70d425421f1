//! Batch operations sample
//!
//! Creates two contacts and reads tasks in one `$batch` call, then creates five
//! tasks in a second call, and finally offers to delete everything it created.
//!
//! Configure with environment variables:
//!
//! - `ODATA_SERVICE_URL`: service root, e.g. `https://org.crm.dynamics.com/api/data/`
//! - `ODATA_ACCESS_TOKEN`: OAuth bearer token (optional)
//! - `ODATA_PROXY_URL`: outbound proxy (optional)
//!
//! Run with: cargo run --example batch_operations

use anyhow::Context;
use odata_batch_http::client::{
    Anonymous, BatchClient, BearerToken, ClientConfig, CredentialProvider, EntityTracker, Outcome,
};
use odata_batch_http::{ApiRoot, BatchEnvelope, BatchError, Operation};
use serde_json::json;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,odata_batch_http=debug")),
        )
        .init();

    println!("OData Batch Operations Sample");
    println!("=============================\n");

    let service_url = std::env::var("ODATA_SERVICE_URL")
        .context("ODATA_SERVICE_URL must name the service root")?;
    let mut config = ClientConfig::new(service_url);
    if let Ok(proxy) = std::env::var("ODATA_PROXY_URL") {
        config.proxy_url = proxy;
    }

    let credentials: Arc<dyn CredentialProvider> = match std::env::var("ODATA_ACCESS_TOKEN") {
        Ok(token) => Arc::new(BearerToken::new(token)),
        Err(_) => Arc::new(Anonymous),
    };

    let client = BatchClient::new(config, credentials)?;
    let root = client.discover_version().await?;
    println!("Using {}\n", root.versioned_base());

    let mut tracker = EntityTracker::new();
    let run = run_samples(&client, &root, &mut tracker).await;
    if let Err(e) = &run {
        println!("Run failed: {:#}", e);
    }

    // Created entities are offered for deletion even when a sample failed.
    let confirm = !tracker.is_empty()
        && prompt_yes_no("\nDo you want to delete the records created by this sample?")?;
    let created = tracker.len();
    let result = client
        .finish_run(&mut tracker, confirm, run.map_err(BatchError::from))
        .await;

    match &result {
        Err(BatchError::Cleanup { report, body }) => {
            println!(
                "Deleted: {}, not found: {}, failed: {}",
                report.deleted, report.not_found, report.failed
            );
            println!("Last failure: {}", body);
        }
        _ if confirm => println!("Deleted {} created records", created),
        _ => {}
    }

    result.map_err(Into::into)
}

async fn run_samples(
    client: &BatchClient,
    root: &ApiRoot,
    tracker: &mut EntityTracker,
) -> anyhow::Result<()> {
    // Two creates in one changeset, plus a read outside it.
    let first = client
        .builder(root)
        .push(Operation::post(
            "contacts",
            json!({"firstname": "Peter", "lastname": "Cambel"}),
        ))
        .push(Operation::post(
            "contacts",
            json!({"firstname": "Susie", "lastname": "Curtis"}),
        ))
        .push(Operation::get("Account_Tasks?$select=subject"))
        .build()?;
    run_sample(client, root, &first, tracker, "Sample 1").await?;

    let second = client
        .builder(root)
        .extend((1..=5).map(|i| {
            Operation::post(
                "tasks",
                json!({
                    "subject": format!("Task {} in batch", i),
                    "description": "Tackle Business Complexity",
                }),
            )
        }))
        .build()?;
    run_sample(client, root, &second, tracker, "Sample 2").await
}

async fn run_sample(
    client: &BatchClient,
    root: &ApiRoot,
    envelope: &BatchEnvelope,
    tracker: &mut EntityTracker,
    name: &str,
) -> anyhow::Result<()> {
    println!("{}: {} operations in one batch", name, envelope.request_count());
    let outcomes = client
        .execute(root, envelope, tracker)
        .await
        .with_context(|| format!("{} batch failed", name))?;

    for (i, outcome) in outcomes.iter().enumerate() {
        match outcome {
            Outcome::Created { entity_uri } => println!("  [{}] created {}", i, entity_uri),
            Outcome::Success { body } => println!("  [{}] ok {}", i, body),
            Outcome::Failed { status, reason } => println!("  [{}] failed {} {}", i, status, reason),
        }
    }
    Ok(())
}

/// Ask a yes/no question on the console. An empty answer or one starting
/// with `y` means yes.
fn prompt_yes_no(question: &str) -> io::Result<bool> {
    print!("{} (y/n) [y]: ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    let answer = answer.trim();
    Ok(answer.is_empty() || answer.starts_with(['y', 'Y']))
}
