use admin::pages;
use admin::services::{AlertsService, RecordsService, UsersService};
use payloads::ListQuery;

use test_helpers::spawn_app;

#[tokio::test]
async fn records_page_navigates_by_number() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_admin().await?;
    app.seed_records(47);
    let mut page = pages::records(
        RecordsService::new(app.client.clone()),
        ListQuery::default(),
    );

    page.load().await.map_err(anyhow::Error::msg)?;

    assert_eq!(*page.table().page_buttons(), vec![1, 2, 3, 4, 5]);
    let text = page.render();
    let footer = text.lines().last().unwrap_or_default();
    assert!(footer.starts_with("  [1] 2 3 4 5 ›"), "{footer}");
    assert!(footer.ends_with("Página 1 de 5 (47 registros)"), "{footer}");

    page.go_to_page(3).await.map_err(anyhow::Error::msg)?;

    let last = app.requests_to("/records").pop().expect("a request");
    assert!(last.query.contains("page=3"));
    assert!(last.query.contains("limit=10"));
    let rows = page.table().rows();
    assert_eq!(rows.len(), 10);
    assert_eq!(rows[0][1], "LV-021");
    assert_eq!(rows[9][1], "LV-030");
    assert_eq!(page.table().pagination().page, 3);
    Ok(())
}

#[tokio::test]
async fn next_and_previous_stay_in_range() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_admin().await?;
    app.seed_records(15);
    let mut page = pages::records(
        RecordsService::new(app.client.clone()),
        ListQuery::default(),
    );
    page.load().await.map_err(anyhow::Error::msg)?;

    page.previous_page().await.map_err(anyhow::Error::msg)?;
    page.next_page().await.map_err(anyhow::Error::msg)?;
    page.next_page().await.map_err(anyhow::Error::msg)?;

    assert_eq!(page.table().pagination().page, 2);
    assert_eq!(page.table().data().len(), 5);
    assert_eq!(app.requests_to("/records").len(), 2);
    Ok(())
}

#[tokio::test]
async fn sorting_a_column_refetches_from_page_one() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_admin().await?;
    app.seed_records(47);
    let mut page = pages::records(
        RecordsService::new(app.client.clone()),
        ListQuery::default(),
    );
    page.load().await.map_err(anyhow::Error::msg)?;
    page.go_to_page(2).await.map_err(anyhow::Error::msg)?;

    page.sort_by("codigo").await.map_err(anyhow::Error::msg)?;
    page.sort_by("codigo").await.map_err(anyhow::Error::msg)?;

    let last = app.requests_to("/records").pop().expect("a request");
    assert!(last.query.contains("page=1"));
    assert!(last.query.contains("sortOrder=DESC"));
    assert_eq!(page.table().rows()[0][1], "LV-047");
    assert!(page.render().lines().next().unwrap_or_default().contains('▼'));

    // not sortable: no request
    let before = app.requests_to("/records").len();
    page.sort_by("ubicacion").await.map_err(anyhow::Error::msg)?;
    assert_eq!(app.requests_to("/records").len(), before);
    Ok(())
}

#[tokio::test]
async fn search_without_matches_shows_empty_message() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_admin().await?;
    app.seed_records(5);
    let mut page = pages::records(
        RecordsService::new(app.client.clone()),
        ListQuery::default(),
    );

    page.search("no existe").await.map_err(anyhow::Error::msg)?;

    assert!(page.render().contains("No hay líneas de vida registradas"));
    assert_eq!(page.filters().search.as_deref(), Some("no existe"));
    Ok(())
}

#[tokio::test]
async fn forbidden_listing_reports_module_message() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_supervisor().await?;
    let mut page = pages::users(
        UsersService::new(app.client.clone()),
        ListQuery::default(),
    );

    let result = page.load().await;

    assert_eq!(
        result,
        Err("No tiene permisos para realizar esta acción".to_string())
    );
    assert!(page.table().data().is_empty());
    Ok(())
}

#[tokio::test]
async fn alert_filter_narrows_the_listing() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_admin().await?;
    app.store.seed_alert(None, "critica", false);
    app.store.seed_alert(None, "baja", true);
    app.store.seed_alert(None, "baja", false);
    let mut page = pages::alerts(
        AlertsService::new(app.client.clone()),
        ListQuery::default(),
    );

    page.filter("leida", Some("false"))
        .await
        .map_err(anyhow::Error::msg)?;
    assert_eq!(page.table().data().len(), 2);

    page.filter("leida", None).await.map_err(anyhow::Error::msg)?;
    assert_eq!(page.table().data().len(), 3);
    Ok(())
}
