use admin::AdminError;
use admin::models::{
    AuthorizationForm, MaintenanceForm, MovementAction, RecordForm,
    RecordStatus, RequestStatus, RequestedOperation, Role, Severity, UserForm,
};
use admin::services::{
    AccidentsService, AlertsService, AuthorizationService, MaintenanceService,
    MovementHistoryService, PurchaseOrdersService, RecordsService,
    UsersService,
};
use jiff::civil::Date;
use payloads::{ListQuery, RecordId};
use reqwest::StatusCode;

use test_helpers::spawn_app;

fn record_form(codigo: &str) -> RecordForm {
    RecordForm {
        codigo: codigo.to_string(),
        cliente: "Minera Andina".into(),
        equipo: "Línea vertical".into(),
        fv_anios: 2,
        fv_meses: 6,
        fecha_instalacion: Some(Date::constant(2024, 1, 15)),
        ubicacion: "Planta Arequipa".into(),
        ..RecordForm::default()
    }
}

fn message(result: Result<impl std::fmt::Debug, AdminError>) -> String {
    match result {
        Err(error) => error.to_string(),
        Ok(value) => panic!("Expected an error, got {value:?}"),
    }
}

#[tokio::test]
async fn record_lifecycle() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_admin().await?;
    let records = RecordsService::new(app.client.clone());

    let created = records.create(&record_form("LV-500")).await?;
    assert_eq!(created.fecha_caducidad, Some(Date::constant(2026, 7, 15)));
    assert_eq!(created.estado, RecordStatus::Activo);

    let mut form = RecordForm::from_record(&created);
    form.cliente = "Cementos Sur".into();
    let updated = records.update(&created, &form).await?;
    assert_eq!(updated.cliente, "Cementos Sur");

    records.delete(&created.id).await?;
    let result = records.get(&created.id).await;
    assert_eq!(message(result), "Línea de vida no encontrada");
    Ok(())
}

#[tokio::test]
async fn update_sends_only_changed_fields() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_admin().await?;
    let records = RecordsService::new(app.client.clone());
    let created = records.create(&record_form("LV-501")).await?;
    let mut form = RecordForm::from_record(&created);
    form.ubicacion = "Nave 9".into();

    records.update(&created, &form).await?;

    let history = MovementHistoryService::new(app.client.clone());
    let page = history.list(&ListQuery::default()).await?;
    let latest = &page.data[0];
    assert_eq!(latest.action, MovementAction::Update);
    assert_eq!(latest.record_code.as_deref(), Some("LV-501"));
    let fields: Vec<&str> =
        latest.changes.iter().map(|c| c.field.as_str()).collect();
    assert!(fields.contains(&"ubicacion"));
    assert!(!fields.contains(&"cliente"));
    Ok(())
}

#[tokio::test]
async fn duplicate_code_uses_module_wording() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_admin().await?;
    let records = RecordsService::new(app.client.clone());
    records.create(&record_form("LV-600")).await?;

    let result = records.create(&record_form("LV-600")).await;

    let Err(error) = result else {
        panic!("duplicate accepted");
    };
    assert_eq!(
        error.to_string(),
        "Ya existe una línea de vida con ese código"
    );
    assert_eq!(error.status(), Some(StatusCode::CONFLICT));
    Ok(())
}

#[tokio::test]
async fn invalid_input_is_rejected_locally() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_admin().await?;
    app.store.clear_requests();
    let records = RecordsService::new(app.client.clone());

    let bad_id = records.get("abc").await;
    let bad_form = records.create(&RecordForm::default()).await;

    assert!(matches!(bad_id, Err(AdminError::Validation(_))));
    let Err(AdminError::Validation(problems)) = bad_form else {
        panic!("empty form accepted");
    };
    assert!(problems.iter().any(|p| p.contains("código")));
    assert!(app.store.requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn users_are_admin_only() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_admin().await?;
    let users = UsersService::new(app.client.clone());

    let created = users
        .create(&UserForm {
            username: "inspector".into(),
            email: "inspector@ayniline.pe".into(),
            password: "inspector1".into(),
            nombre: "Inspector de campo".into(),
            role: Role::Supervisor,
            ..UserForm::default()
        })
        .await?;
    assert_eq!(created.role, Role::Supervisor);
    let page = users.list(&ListQuery::default()).await?;
    assert_eq!(page.meta.total, 4);

    let tecnico = app.new_client();
    tecnico.login(&test_helpers::tecnico_credentials()).await?;
    let result = UsersService::new(tecnico)
        .list(&ListQuery::default())
        .await;
    assert_eq!(message(result), "No tiene permisos para realizar esta acción");
    Ok(())
}

#[tokio::test]
async fn authorization_request_flow() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let ids = app.seed_records(1);
    let requester = app.new_client();
    requester.login(&test_helpers::tecnico_credentials()).await?;
    let form = AuthorizationForm {
        operation: RequestedOperation::Delete,
        entity_type: "record".into(),
        entity_id: ids[0].to_string(),
        justificacion: "Equipo dado de baja por corrosión".into(),
    };

    let request = AuthorizationService::new(requester).generate(&form).await?;
    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.requester(), "tecnico");

    app.login_admin().await?;
    let approvals = AuthorizationService::new(app.client.clone());
    let pending = approvals.pending().await?;
    assert!(pending.iter().any(|r| r.id == request.id));

    let approved = approvals.approve(&request.id).await?;
    assert_eq!(approved.status, RequestStatus::Approved);
    assert!(approved.approved_at.is_some());

    let again = approvals.approve(&request.id).await;
    assert_eq!(message(again), "La solicitud ya fue procesada (approved)");
    Ok(())
}

#[tokio::test]
async fn rejection_needs_a_reason() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_supervisor().await?;
    let service = AuthorizationService::new(app.client.clone());
    let request = service
        .generate(&AuthorizationForm {
            operation: RequestedOperation::Update,
            entity_type: "record".into(),
            entity_id: "1".into(),
            justificacion: "Corregir fecha de instalación".into(),
        })
        .await?;

    let blank = service.reject(&request.id, "  ").await;
    assert!(matches!(blank, Err(AdminError::Validation(_))));

    let rejected = service.reject(&request.id, "Sin sustento").await?;
    assert_eq!(rejected.status, RequestStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("Sin sustento"));
    Ok(())
}

#[tokio::test]
async fn short_justification_is_rejected_locally() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_admin().await?;
    let service = AuthorizationService::new(app.client.clone());

    let result = service
        .generate(&AuthorizationForm {
            operation: RequestedOperation::Delete,
            entity_type: "record".into(),
            entity_id: "x".into(),
            justificacion: "corto".into(),
        })
        .await;

    let Err(AdminError::Validation(problems)) = result else {
        panic!("invalid request accepted");
    };
    assert_eq!(problems.len(), 2);
    assert!(app.requests_to("/authorization-codes/generate").is_empty());
    Ok(())
}

#[tokio::test]
async fn alerts_can_be_marked_read() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_admin().await?;
    let first = app.store.seed_alert(None, "critica", false);
    app.store.seed_alert(None, "media", false);
    app.store.seed_alert(None, "baja", true);
    let alerts = AlertsService::new(app.client.clone());

    assert_eq!(alerts.unread_count().await?, 2);
    let dashboard = alerts.dashboard().await?;
    assert_eq!(dashboard.total, 3);
    assert_eq!(dashboard.critical, 1);

    let alert = alerts.mark_read(&first.to_string()).await?;
    assert!(alert.leida);
    assert_eq!(alerts.unread_count().await?, 1);

    let confirmation = alerts.mark_all_read().await?;
    assert_eq!(confirmation, "1 alertas marcadas como leídas");
    assert_eq!(alerts.unread_count().await?, 0);
    Ok(())
}

#[tokio::test]
async fn accident_reports() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_admin().await?;
    let ids = app.seed_records(2);
    app.store.seed_accident(ids[0], "GRAVE", "REPORTADO");
    app.store.seed_accident(ids[0], "LEVE", "CERRADO");
    app.store.seed_accident(ids[1], "GRAVE", "EN_INVESTIGACION");
    let accidents = AccidentsService::new(app.client.clone());

    let statistics = accidents.statistics().await?;
    assert_eq!(statistics.total, 3);
    assert!(statistics.por_severidad.contains(&(Severity::Grave, 2)));

    let grave = accidents.by_severity(&Severity::Grave).await?;
    assert_eq!(grave.len(), 2);

    let on_first = accidents.by_record(&ids[0].to_string()).await?;
    assert_eq!(on_first.len(), 2);
    assert!(
        on_first
            .iter()
            .all(|a| a.record_codigo.as_deref() == Some("LV-001"))
    );
    Ok(())
}

#[tokio::test]
async fn movement_history_needs_a_supervisor() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let tecnico = app.new_client();
    tecnico.login(&test_helpers::tecnico_credentials()).await?;

    let result = MovementHistoryService::new(tecnico)
        .list(&ListQuery::default())
        .await;

    let Err(error) = result else {
        panic!("history listed for a técnico");
    };
    assert_eq!(error.status(), Some(StatusCode::FORBIDDEN));
    Ok(())
}

#[tokio::test]
async fn maintenance_can_change_record_status() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_admin().await?;
    let ids: Vec<RecordId> = app.seed_records(1);
    let record_id = ids[0].to_string();
    let maintenance = MaintenanceService::new(app.client.clone());

    let entry = maintenance
        .create(&MaintenanceForm {
            record_id: record_id.clone(),
            fecha: Some(Date::constant(2025, 2, 10)),
            descripcion: "Cambio de absorbedor".into(),
            estado_nuevo: Some(RecordStatus::Mantenimiento),
        })
        .await?;

    assert_eq!(entry.estado_anterior, Some(RecordStatus::Activo));
    assert_eq!(app.store.maintenance_for(ids[0]).len(), 1);
    let record = RecordsService::new(app.client.clone())
        .get(&record_id)
        .await?;
    assert_eq!(record.estado, RecordStatus::Mantenimiento);

    maintenance.delete(&entry.id).await?;
    assert!(app.store.maintenance_for(ids[0]).is_empty());
    Ok(())
}

#[tokio::test]
async fn purchase_orders_show_amounts() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.login_admin().await?;
    let id = app.store.seed_purchase_order("OC-2024-001");
    let orders = PurchaseOrdersService::new(app.client.clone());

    let order = orders.get(&id.to_string()).await?;

    assert_eq!(order.numero, "OC-2024-001");
    assert_eq!(order.monto_display(), "S/ 1250.50");
    Ok(())
}
