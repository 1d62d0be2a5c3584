use actix_web::{HttpRequest, HttpResponse, delete, get, post, web};
use jiff::Timestamp;
use payloads::{MaintenanceId, requests, responses};
use serde_json::json;
use std::collections::HashMap;

use super::{
    APIError, current_user, list_params, require_non_empty, require_role,
    validated,
};
use crate::store::{Store, list};

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[get("/maintenance")]
pub async fn list_maintenance(
    request: HttpRequest,
    query: web::Query<HashMap<String, String>>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    current_user(&request, &store)?;
    let params = list_params(query);
    let page = store.with(|t| list(&t.maintenance, &params, &["descripcion"]));
    Ok(HttpResponse::Ok().json(page))
}

/// Register a maintenance. When `estado_nuevo` is given the record's state
/// changes too, and the change lands in the movement history.
#[tracing::instrument(skip(request, details, store), fields(user_id = tracing::field::Empty))]
#[post("/maintenance")]
pub async fn create_maintenance(
    request: HttpRequest,
    details: web::Json<requests::CreateMaintenance>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    let user = current_user(&request, &store)?;
    let details = details.into_inner();
    let mut problems = Vec::new();
    require_non_empty(&mut problems, "descripcion", &details.descripcion);
    validated(problems)?;

    let maintenance = store.with(|t| {
        let record = t
            .records
            .iter_mut()
            .find(|r| r.id == details.record_id)
            .ok_or_else(|| {
                APIError::NotFound("Registro no encontrado".to_string())
            })?;
        let estado_anterior = Some(record.estado_actual.clone());
        if let Some(estado) = &details.estado_nuevo {
            record.estado_actual = estado.clone();
            record.updated_at = Timestamp::now();
        }
        let record = record.clone();
        let maintenance = responses::Maintenance {
            id: MaintenanceId(t.next_id()),
            record_id: details.record_id,
            fecha_mantenimiento: details.fecha_mantenimiento,
            descripcion: details.descripcion,
            estado_anterior: estado_anterior.clone(),
            estado_nuevo: details.estado_nuevo.clone(),
            usuario_id: Some(user.id),
            created_at: Timestamp::now(),
        };
        t.maintenance.push(maintenance.clone());
        if let Some(estado) = details.estado_nuevo {
            t.log_movement(
                &record,
                "MAINTENANCE",
                Some(&user),
                Some(json!({ "estado_actual": estado_anterior })),
                Some(json!({ "estado_actual": estado })),
            );
        }
        Ok::<_, APIError>(maintenance)
    })?;
    Ok(HttpResponse::Created().json(maintenance))
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[delete("/maintenance/{id}")]
pub async fn delete_maintenance(
    request: HttpRequest,
    path: web::Path<MaintenanceId>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    require_role(&request, &store, &["ADMIN", "SUPERVISOR"])?;
    let id = path.into_inner();
    store.with(|t| {
        let before = t.maintenance.len();
        t.maintenance.retain(|m| m.id != id);
        if t.maintenance.len() == before {
            Err(APIError::NotFound("Mantenimiento no encontrado".to_string()))
        } else {
            Ok(())
        }
    })?;
    Ok(HttpResponse::Ok().json(responses::SuccessMessage {
        message: "Mantenimiento eliminado".to_string(),
    }))
}
