use payloads::{APIClient, ClientError, ListQuery, MemoryStorage, RecordId};
use reqwest::StatusCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use test_helpers::{assert_status_code, spawn_app, test_retry_policy};

#[tokio::test]
async fn server_errors_are_retried_with_growing_delays() -> anyhow::Result<()>
{
    let app = spawn_app().await;
    app.login_admin().await?;
    app.seed_records(3);
    app.fail_next("/records", 500, 3);

    let started = Instant::now();
    let result = app.client.list_records(&ListQuery::default()).await;

    assert_status_code(result, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.requests_to("/records").len(), 3);
    // 20ms then 40ms between the three attempts
    assert!(started.elapsed() >= Duration::from_millis(60));
    Ok(())
}

#[tokio::test]
async fn transient_failure_recovers_on_retry() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_admin().await?;
    app.seed_records(3);
    app.fail_next("/records", 503, 2);

    let page = app.client.list_records(&ListQuery::default()).await?;

    assert_eq!(page.data.len(), 3);
    assert_eq!(app.requests_to("/records").len(), 3);
    Ok(())
}

#[tokio::test]
async fn client_errors_are_not_retried() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_admin().await?;

    let result = app.client.get_record(RecordId(9999)).await;

    assert_status_code(result, StatusCode::NOT_FOUND);
    assert_eq!(app.requests_to("/records/9999").len(), 1);
    Ok(())
}

#[tokio::test]
async fn backend_message_is_kept() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_admin().await?;
    let details = test_helpers::record_details("LV-100");
    app.client.create_record(&details).await?;

    let result = app.client.create_record(&details).await;

    match result {
        Err(ClientError::APIError(details)) => {
            assert_eq!(details.status, StatusCode::CONFLICT);
            assert_eq!(
                details.message,
                "Ya existe un registro con el código LV-100"
            );
        }
        other => panic!("Expected a conflict, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() -> anyhow::Result<()> {
    let client =
        APIClient::new("http://127.0.0.1:9", Arc::new(MemoryStorage::new()))
            .with_retry_policy(test_retry_policy())
            .with_timeout(Duration::from_secs(2));

    let result = client.list_records(&ListQuery::default()).await;

    let Err(error) = result else {
        panic!("Expected a transport error");
    };
    assert!(matches!(
        error,
        ClientError::Network(_) | ClientError::Timeout
    ));
    assert_eq!(error.status(), None);
    Ok(())
}

#[tokio::test]
async fn rejected_token_expires_the_session_once() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_admin().await?;
    let expirations = Arc::new(AtomicU32::new(0));
    let counter = expirations.clone();
    app.client.on_token_expired(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    app.store.expire_tokens();

    let result = app.client.list_records(&ListQuery::default()).await;

    assert!(matches!(result, Err(ClientError::SessionExpired)));
    assert_eq!(expirations.load(Ordering::SeqCst), 1);
    assert_eq!(app.client.token(), None);
    // a 401 is never retried
    assert_eq!(app.requests_to("/records").len(), 1);
    Ok(())
}

#[tokio::test]
async fn unauthorized_without_token_is_an_ordinary_error() -> anyhow::Result<()>
{
    let app = spawn_app().await;
    let expirations = Arc::new(AtomicU32::new(0));
    let counter = expirations.clone();
    app.client.on_token_expired(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let result = app.client.list_records(&ListQuery::default()).await;

    assert_status_code(result, StatusCode::UNAUTHORIZED);
    assert_eq!(expirations.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn bearer_token_is_attached_after_login() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let login = app.login_admin().await?;

    app.client.list_records(&ListQuery::default()).await?;

    let requests = app.requests_to("/records");
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some(format!("Bearer {}", login.access_token).as_str())
    );
    assert!(app.requests_to("/auth/login")[0].authorization.is_none());
    Ok(())
}

#[tokio::test]
async fn logout_clears_token_even_when_server_fails() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_admin().await?;
    app.fail_next("/auth/logout", 500, 3);

    let result = app.client.logout().await;

    assert!(result.is_err());
    assert_eq!(app.client.token(), None);
    Ok(())
}
