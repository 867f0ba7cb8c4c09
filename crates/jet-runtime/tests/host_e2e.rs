//! End-to-end tests for the host: configuration in, outcome out.

use std::time::Duration;

use jet_config::{ConfigLoader, JetConfig};
use jet_core::fixtures::{self, GreetingHandler, LoggingGreetingHandler};
use jet_core::{
    handler_fn, value_handler_fn, Capabilities, Context, ErrorCategory, Request, Response,
};
use jet_runtime::{Host, ResponseEnvelope};

fn config_with_files(root: &std::path::Path, allow_write: bool) -> JetConfig {
    let toml = format!(
        r#"
        [capabilities.fetch]
        enabled = false

        [capabilities.files]
        enabled = true
        root = '{}'
        allow_write = {allow_write}
        "#,
        root.display()
    );

    ConfigLoader::new()
        .with_string(&toml, "toml")
        .unwrap()
        .load()
        .unwrap()
}

#[tokio::test]
async fn test_alice_to_bob() {
    let host = Host::builder().handler(GreetingHandler).build().unwrap();
    let (request, context) = fixtures::alice_to_bob();

    let response = host.invoke(request, context).await.into_result().unwrap();

    assert_eq!(
        ResponseEnvelope::new(&response).to_json().unwrap(),
        r#"{"status":200,"data":"Hello Alice, this is Bob."}"#
    );
}

#[tokio::test]
async fn test_empty_inputs() {
    let host = Host::builder().handler(GreetingHandler).build().unwrap();
    let (request, context) = fixtures::empty_inputs();

    let response = host.invoke(request, context).await.into_result().unwrap();
    assert_eq!(response, Response::new(200, "Hello , this is ."));
}

#[tokio::test]
async fn test_logging_greeting_with_tracing_logger() {
    let host = Host::builder()
        .handler(LoggingGreetingHandler)
        .build()
        .unwrap();

    let outcome = host
        .invoke_json(r#"{"to": "Alice"}"#, r#"{"current_user": {"name": "Alice"}}"#)
        .await;

    assert_eq!(
        outcome.response().unwrap().data(),
        "Hello Alice, this is Alice."
    );
}

#[tokio::test]
async fn test_file_capability_from_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("name.txt"), "Carol").unwrap();

    let host = Host::builder()
        .config(config_with_files(dir.path(), true))
        .handler(handler_fn(|request, _context| async move {
            let files = Capabilities::current()?.files()?.clone();
            let name = files.read_to_string("name.txt").await?;
            files
                .write("out/greeting.txt", &format!("{} greets {name}", request.to()))
                .await?;
            Ok(Response::ok(name))
        }))
        .build()
        .unwrap();

    let outcome = host
        .invoke(Request::new("Dave"), Context::for_user("Erin"))
        .await;

    assert_eq!(outcome.response().unwrap().data(), "Carol");
    assert_eq!(
        std::fs::read_to_string(dir.path().join("out/greeting.txt")).unwrap(),
        "Dave greets Carol"
    );
}

#[tokio::test]
async fn test_file_capability_sandbox_escape_fails_invocation() {
    let dir = tempfile::tempdir().unwrap();

    let host = Host::builder()
        .config(config_with_files(dir.path(), false))
        .handler(handler_fn(|_request, _context| async {
            let caps = Capabilities::current()?;
            let secret = caps.files()?.read_to_string("../../etc/hostname").await?;
            Ok(Response::ok(secret))
        }))
        .build()
        .unwrap();

    let outcome = host
        .invoke(Request::new("a"), Context::for_user("b"))
        .await;

    let err = outcome.error().unwrap();
    assert_eq!(err.category(), ErrorCategory::Capability);
    assert!(err.to_string().contains("escapes the sandbox"));
}

#[tokio::test]
async fn test_fetch_disabled_by_config() {
    let mut config = JetConfig::default();
    config.capabilities.fetch.enabled = false;

    let host = Host::builder()
        .config(config)
        .handler(handler_fn(|_request, _context| async {
            let body = Capabilities::current()?.fetch("https://example.com").await?;
            Ok(Response::ok(body))
        }))
        .build()
        .unwrap();

    let outcome = host
        .invoke(Request::new("a"), Context::for_user("b"))
        .await;
    assert_eq!(outcome.error().unwrap().category(), ErrorCategory::Capability);
}

#[tokio::test]
async fn test_non_conforming_value_is_failure() {
    let host = Host::builder()
        .handler(value_handler_fn(|request, _context| async move {
            Ok(serde_json::json!({ "status": "ok", "data": request.to() }))
        }))
        .build()
        .unwrap();

    let outcome = host
        .invoke(Request::new("Alice"), Context::for_user("Bob"))
        .await;

    assert_eq!(
        outcome.error().unwrap().category(),
        ErrorCategory::NonConforming
    );
    assert_eq!(outcome.into_response().status(), 500);
}

#[tokio::test]
async fn test_concurrent_invocations_are_independent() {
    let host = Host::builder()
        .handler(handler_fn(|request, context| async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok(Response::new(
                200,
                format!("{}->{}", context.current_user().name(), request.to()),
            ))
        }))
        .build()
        .unwrap();

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let host = host.clone();
            tokio::spawn(async move {
                host.invoke(Request::new(format!("to{i}")), Context::for_user(format!("from{i}")))
                    .await
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let outcome = handle.await.unwrap();
        assert_eq!(outcome.response().unwrap().data(), format!("from{i}->to{i}"));
    }
}

#[tokio::test]
async fn test_outcomes_carry_distinct_ids() {
    let host = Host::builder().handler(GreetingHandler).build().unwrap();
    let (request, context) = fixtures::alice_to_bob();

    let first = host.invoke(request.clone(), context.clone()).await;
    let second = host.invoke(request, context).await;

    assert_ne!(first.invocation_id, second.invocation_id);
    assert_eq!(first.response(), second.response());
}
