use admin::hooks::{AsyncOptions, FilterPatch, PaginatedFetch};
use admin::models::Record;
use admin::services::RecordsService;
use payloads::{ListQuery, PageMeta, SortOrder};
use std::time::Duration;

use test_helpers::spawn_app;

fn records(
    service: RecordsService,
    initial: ListQuery,
) -> PaginatedFetch<Record> {
    PaginatedFetch::new(
        move |query| {
            let service = service.clone();
            async move { service.list(&query).await }
        },
        initial,
        AsyncOptions::default(),
    )
}

/// The outcome of a fetch that is expected to have been applied.
fn settled(
    outcome: Option<Result<PageMeta, String>>,
) -> anyhow::Result<PageMeta> {
    let outcome = outcome.ok_or_else(|| anyhow::anyhow!("discarded"))?;
    outcome.map_err(anyhow::Error::msg)
}

fn codes(items: &[Record]) -> Vec<&str> {
    items.iter().map(|r| r.codigo.as_str()).collect()
}

#[tokio::test]
async fn load_more_appends_pages() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_admin().await?;
    app.seed_records(25);
    let fetch = records(
        RecordsService::new(app.client.clone()),
        ListQuery::default(),
    );

    fetch.execute(FilterPatch::default()).await;
    let meta = settled(fetch.load_more().await)?;

    assert_eq!(meta.page, 2);
    let state = fetch.state();
    assert_eq!(state.all_data.len(), 20);
    assert_eq!(state.page_items.len(), 10);
    assert_eq!(state.page_items[0].codigo, "LV-011");
    assert!(state.has_more());
    Ok(())
}

#[tokio::test]
async fn load_more_stops_on_last_page() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_admin().await?;
    app.seed_records(15);
    let fetch = records(
        RecordsService::new(app.client.clone()),
        ListQuery::default(),
    );

    fetch.execute(FilterPatch::default()).await;
    fetch.load_more().await;
    let extra = fetch.load_more().await;

    assert_eq!(extra, None);
    assert_eq!(fetch.state().all_data.len(), 15);
    assert_eq!(app.requests_to("/records").len(), 2);
    Ok(())
}

#[tokio::test]
async fn changing_filters_starts_over_from_page_one() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_admin().await?;
    app.seed_records(47);
    let fetch = records(
        RecordsService::new(app.client.clone()),
        ListQuery::default(),
    );
    fetch.execute(FilterPatch::default()).await;
    fetch.load_more().await;

    let meta =
        settled(fetch.update_filters(FilterPatch::search("LV-04")).await)?;

    assert_eq!(meta.page, 1);
    assert_eq!(meta.total, 8);
    let state = fetch.state();
    assert_eq!(state.filters.page, 1);
    assert_eq!(state.filters.search.as_deref(), Some("LV-04"));
    assert_eq!(state.all_data.len(), 8);
    let last = app.requests_to("/records").pop().expect("a request");
    assert!(last.query.contains("page=1"));
    assert!(last.query.contains("search=LV-04"));
    Ok(())
}

#[tokio::test]
async fn new_search_drops_pages_of_the_old_listing() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_admin().await?;
    app.seed_records(47);
    let fetch = records(
        RecordsService::new(app.client.clone()),
        ListQuery::default(),
    );
    fetch.execute(FilterPatch::default()).await;
    fetch.load_more().await;
    fetch.load_more().await;
    assert_eq!(fetch.state().all_data.len(), 30);

    let meta = settled(fetch.execute(FilterPatch::search("LV-04")).await)?;

    assert_eq!(meta.page, 1);
    let state = fetch.state();
    assert_eq!(state.filters.page, 1);
    assert_eq!(state.all_data.len(), 8);
    assert!(state.all_data.iter().all(|r| r.codigo.starts_with("LV-04")));
    let last = app.requests_to("/records").pop().expect("a request");
    assert!(last.query.contains("page=1"));
    Ok(())
}

#[tokio::test]
async fn update_filters_clears_items_before_the_fetch_lands()
-> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_admin().await?;
    app.seed_records(25);
    let fetch = records(
        RecordsService::new(app.client.clone()),
        ListQuery::default(),
    );
    fetch.execute(FilterPatch::default()).await;
    fetch.load_more().await;
    app.delay_next("/records", Duration::from_millis(300));

    let pending = fetch.clone();
    let in_flight = tokio::spawn(async move {
        pending.update_filters(FilterPatch::search("LV-01")).await
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let state = fetch.state();
    assert!(state.loading);
    assert!(state.all_data.is_empty());
    assert!(state.page_items.is_empty());
    assert_eq!(state.filters.page, 1);

    let meta = settled(in_flight.await?)?;
    assert_eq!(meta.total, 10);
    assert_eq!(fetch.state().all_data.len(), 10);
    Ok(())
}

#[tokio::test]
async fn sort_and_params_reach_the_backend() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_admin().await?;
    app.seed_records(12);
    let fetch = records(
        RecordsService::new(app.client.clone()),
        ListQuery::default(),
    );

    let patch = FilterPatch::sort("codigo", SortOrder::Desc)
        .with_param("estado_actual", "vencido");
    settled(fetch.update_filters(patch).await)?;

    let state = fetch.state();
    // every fourth seeded record is expired: LV-004, LV-008, LV-012
    assert_eq!(codes(&state.all_data), vec!["LV-012", "LV-008", "LV-004"]);
    let query = &app.requests_to("/records")[0].query;
    assert!(query.contains("sortBy=codigo"));
    assert!(query.contains("sortOrder=DESC"));
    assert!(query.contains("estado_actual=vencido"));

    let patch = FilterPatch::default().without_param("estado_actual");
    settled(fetch.update_filters(patch).await)?;
    assert_eq!(fetch.state().pagination.total, 12);
    Ok(())
}

#[tokio::test]
async fn failed_page_keeps_loaded_items() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_admin().await?;
    app.seed_records(25);
    let fetch = records(
        RecordsService::new(app.client.clone()),
        ListQuery::default(),
    );
    fetch.execute(FilterPatch::default()).await;
    app.fail_next("/records", 400, 1);

    let result = fetch.load_more().await;

    assert!(matches!(result, Some(Err(_))));
    let state = fetch.state();
    assert!(state.error.is_some());
    assert!(!state.loading);
    assert_eq!(state.all_data.len(), 10);
    Ok(())
}

#[tokio::test]
async fn immediate_listing_fetches_once_on_mount() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_admin().await?;
    app.seed_records(3);
    let service = RecordsService::new(app.client.clone());
    let fetch = PaginatedFetch::new(
        move |query| {
            let service = service.clone();
            async move { service.list(&query).await }
        },
        ListQuery::default(),
        AsyncOptions::default().immediate(),
    );

    assert!(fetch.mount().await.is_some());
    assert!(fetch.mount().await.is_none());
    assert_eq!(codes(&fetch.state().all_data).len(), 3);
    assert_eq!(app.requests_to("/records").len(), 1);
    Ok(())
}

#[tokio::test]
async fn unmount_drops_pending_page() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_admin().await?;
    app.seed_records(3);
    let fetch = records(
        RecordsService::new(app.client.clone()),
        ListQuery::default(),
    );
    app.delay_next("/records", Duration::from_millis(200));

    let pending = fetch.clone();
    let in_flight = tokio::spawn(async move {
        pending.execute(FilterPatch::default()).await
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    fetch.unmount();

    assert_eq!(in_flight.await?, None);
    assert!(fetch.state().all_data.is_empty());
    Ok(())
}
