// HTTP dialogue client against an in-process stub of the dialogue service

use anyhow::Result;
use axum::{http::StatusCode, routing::post, Json, Router};
use loqa_caller::config::DialogueConfig;
use loqa_caller::dialogue::TurnRequest;
use loqa_caller::{CallError, DialogueClient, HttpDialogueClient};
use serde_json::{json, Value};
use std::time::Duration;

/// Serve `router` on an ephemeral local port and return its base URL
async fn serve(router: Router) -> Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    Ok(format!("http://{}", addr))
}

fn client(base_url: String, timeout_ms: Option<u64>) -> Result<HttpDialogueClient> {
    Ok(HttpDialogueClient::new(&DialogueConfig {
        base_url,
        timeout_ms,
    })?)
}

fn stub_service() -> Router {
    Router::new()
        .route(
            "/start",
            post(|| async { Json(json!({ "reply": "Am I speaking with the business owner?", "end": false })) }),
        )
        .route(
            "/next",
            post(|Json(req): Json<TurnRequest>| async move {
                if req.text.contains("not interested") {
                    Json(json!({ "end": true, "final": "Not interested" }))
                } else {
                    Json(json!({ "end": false, "reply": format!("You said: {}", req.text) }))
                }
            }),
        )
}

#[tokio::test]
async fn test_call_start_returns_opening_line() -> Result<()> {
    let base = serve(stub_service()).await?;
    let client = client(base, None)?;

    let reply = client.call_start().await?;
    assert_eq!(reply.reply, "Am I speaking with the business owner?");

    Ok(())
}

#[tokio::test]
async fn test_send_turn_posts_text() -> Result<()> {
    let base = serve(stub_service()).await?;
    let client = client(format!("{}/", base), None)?;

    let reply = client.send_turn("Hello").await?;
    assert!(!reply.end);
    assert_eq!(reply.reply, "You said: Hello");
    assert_eq!(reply.final_outcome, None);

    Ok(())
}

#[tokio::test]
async fn test_send_turn_end_of_call() -> Result<()> {
    let base = serve(stub_service()).await?;
    let client = client(base, None)?;

    let reply = client.send_turn("sorry, not interested").await?;
    assert!(reply.end);
    assert_eq!(reply.reply, "");
    assert_eq!(reply.final_outcome.as_deref(), Some("Not interested"));

    Ok(())
}

#[tokio::test]
async fn test_server_error_is_transport_failure() -> Result<()> {
    let router = Router::new().route(
        "/next",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "agent crashed") }),
    );
    let base = serve(router).await?;
    let client = client(base, None)?;

    match client.send_turn("Hello").await {
        Err(CallError::Transport(msg)) => assert!(msg.contains("agent crashed")),
        other => panic!("expected transport error, got {:?}", other),
    }

    Ok(())
}

#[tokio::test]
async fn test_malformed_reply_is_invalid_response() -> Result<()> {
    let router = Router::new().route("/start", post(|| async { Json(json!({ "greeting": 1 })) }));
    let base = serve(router).await?;
    let client = client(base, None)?;

    assert!(matches!(
        client.call_start().await,
        Err(CallError::InvalidResponse(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_unreachable_service_fails_without_retry() -> Result<()> {
    // Bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let client = client(format!("http://{}", addr), None)?;

    assert!(matches!(
        client.call_start().await,
        Err(CallError::Transport(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_configured_timeout() -> Result<()> {
    let router = Router::new().route(
        "/next",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(Value::Null)
        }),
    );
    let base = serve(router).await?;
    let client = client(base, Some(100))?;

    assert!(matches!(
        client.send_turn("Hello").await,
        Err(CallError::Timeout)
    ));

    Ok(())
}
