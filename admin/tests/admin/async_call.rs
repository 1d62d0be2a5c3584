use admin::AdminError;
use admin::hooks::{AsyncCall, AsyncOptions, CallState};
use admin::models::Record;
use admin::services::RecordsService;
use payloads::{APIClient, RetryPolicy};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use test_helpers::{TestApp, admin_credentials, spawn_app};

type RecordCall = AsyncCall<String, Record, AdminError>;

fn get_record(client: APIClient, options: AsyncOptions<Record>) -> RecordCall {
    let service = RecordsService::new(client);
    AsyncCall::new(
        move |id: String| {
            let service = service.clone();
            async move { service.get(&id).await }
        },
        options,
    )
}

async fn logged_in_app() -> anyhow::Result<TestApp> {
    let app = spawn_app().await;
    app.login_admin().await?;
    Ok(app)
}

#[tokio::test]
async fn successful_call_fills_state_and_runs_callback() -> anyhow::Result<()>
{
    let app = logged_in_app().await?;
    let ids = app.seed_records(1);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let call = get_record(
        app.client.clone(),
        AsyncOptions::default().on_success(move |record: &Record| {
            sink.lock().unwrap().push(record.codigo.clone());
        }),
    );

    let result = call.execute(ids[0].to_string()).await;

    let record = result.expect("not discarded").expect("fetched");
    assert_eq!(record.codigo, "LV-001");
    let state = call.state();
    assert!(state.success);
    assert!(!state.loading);
    assert_eq!(state.data.map(|r| r.codigo).as_deref(), Some("LV-001"));
    assert_eq!(*seen.lock().unwrap(), vec!["LV-001".to_string()]);
    Ok(())
}

#[tokio::test]
async fn failed_call_reports_module_message() -> anyhow::Result<()> {
    let app = logged_in_app().await?;
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = errors.clone();
    let call = get_record(
        app.client.clone(),
        AsyncOptions::default().on_error(move |message: &str| {
            sink.lock().unwrap().push(message.to_string());
        }),
    );

    let result = call.execute("9999".to_string()).await;

    assert_eq!(
        result,
        Some(Err("Línea de vida no encontrada".to_string()))
    );
    let state = call.state();
    assert_eq!(state.error.as_deref(), Some("Línea de vida no encontrada"));
    assert_eq!(state.data, None);
    assert!(!state.success);
    assert_eq!(errors.lock().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn slower_older_call_does_not_overwrite_newer() -> anyhow::Result<()> {
    let app = logged_in_app().await?;
    let ids = app.seed_records(2);
    let call = get_record(app.client.clone(), AsyncOptions::default());
    app.delay_next(&format!("/records/{}", ids[0]), Duration::from_millis(300));

    let slow = call.clone();
    let first_id = ids[0].to_string();
    let first = tokio::spawn(async move { slow.execute(first_id).await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    let second = call.execute(ids[1].to_string()).await;
    let first = first.await?;

    assert!(matches!(second, Some(Ok(ref r)) if r.codigo == "LV-002"));
    assert_eq!(first, None);
    let data = call.state().data.map(|r| r.codigo);
    assert_eq!(data.as_deref(), Some("LV-002"));
    Ok(())
}

#[tokio::test]
async fn unmounted_call_changes_nothing() -> anyhow::Result<()> {
    let app = logged_in_app().await?;
    let ids = app.seed_records(1);
    let successes = Arc::new(AtomicU32::new(0));
    let counter = successes.clone();
    let call = get_record(
        app.client.clone(),
        AsyncOptions::default().on_success(move |_: &Record| {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );
    let path = format!("/records/{}", ids[0]);
    app.delay_next(&path, Duration::from_millis(200));

    let pending = call.clone();
    let id = ids[0].to_string();
    let in_flight = tokio::spawn(async move { pending.execute(id).await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    call.unmount();

    assert_eq!(in_flight.await?, None);
    assert_eq!(successes.load(Ordering::SeqCst), 0);
    assert_eq!(call.state().data, None);

    // nothing is sent once unmounted
    assert_eq!(call.execute(ids[0].to_string()).await, None);
    assert_eq!(app.requests_to(&path).len(), 1);
    Ok(())
}

#[tokio::test]
async fn reset_discards_in_flight_result() -> anyhow::Result<()> {
    let app = logged_in_app().await?;
    let ids = app.seed_records(1);
    let call = get_record(app.client.clone(), AsyncOptions::default());
    app.delay_next(&format!("/records/{}", ids[0]), Duration::from_millis(200));

    let pending = call.clone();
    let id = ids[0].to_string();
    let in_flight = tokio::spawn(async move { pending.execute(id).await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    call.reset();

    assert_eq!(in_flight.await?, None);
    assert_eq!(call.state(), CallState::default());
    Ok(())
}

#[tokio::test]
async fn operation_retry_is_opt_in() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let ids = app.seed_records(1);
    let client = app.new_client().with_retry_policy(RetryPolicy::none());
    client.login(&admin_credentials()).await?;
    let path = format!("/records/{}", ids[0]);

    let plain = get_record(client.clone(), AsyncOptions::default());
    app.fail_next(&path, 500, 1);
    assert!(matches!(plain.execute(ids[0].to_string()).await, Some(Err(_))));
    assert_eq!(app.requests_to(&path).len(), 1);

    let retrying = get_record(
        client,
        AsyncOptions::default().retry(2, Duration::from_millis(10)),
    );
    app.fail_next(&path, 500, 2);
    let result = retrying.execute(ids[0].to_string()).await;

    assert!(matches!(result, Some(Ok(_))));
    assert_eq!(app.requests_to(&path).len(), 4);
    Ok(())
}

#[tokio::test]
async fn retry_repeats_last_arguments() -> anyhow::Result<()> {
    let app = logged_in_app().await?;
    let ids = app.seed_records(1);
    let call = get_record(app.client.clone(), AsyncOptions::default());

    assert_eq!(call.retry().await, None);
    call.execute(ids[0].to_string()).await;
    let again = call.retry().await;

    assert!(matches!(again, Some(Ok(ref r)) if r.codigo == "LV-001"));
    assert_eq!(app.requests_to(&format!("/records/{}", ids[0])).len(), 2);
    Ok(())
}
