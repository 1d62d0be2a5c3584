mod async_call;
mod client;
mod pages;
mod paginated;
mod routes;
mod services;
mod session;

use payloads::ListQuery;
use test_helpers::spawn_app;

#[tokio::test]
async fn health_check() -> anyhow::Result<()> {
    let app = spawn_app().await;

    let body = app
        .client
        .get_bytes("health_check", &ListQuery::default())
        .await?;

    assert_eq!(body, b"healthy");
    Ok(())
}
