use actix_web::{HttpRequest, HttpResponse, delete, get, patch, post, web};
use jiff::Timestamp;
use payloads::{RecordId, requests, responses};
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::{
    APIError, current_user, list_params, require_non_empty, require_role,
    validated,
};
use crate::store::{Store, list};

const SEARCH_FIELDS: &[&str] = &["codigo", "cliente", "equipo", "ubicacion"];

fn not_found() -> APIError {
    APIError::NotFound("Registro no encontrado".to_string())
}

fn duplicate(codigo: &str) -> APIError {
    APIError::Conflict(format!("Ya existe un registro con el código {codigo}"))
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[get("/records")]
pub async fn list_records(
    request: HttpRequest,
    query: web::Query<HashMap<String, String>>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    current_user(&request, &store)?;
    let params = list_params(query);
    let page = store.with(|t| list(&t.records, &params, SEARCH_FIELDS));
    Ok(HttpResponse::Ok().json(page))
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[get("/records/{id}")]
pub async fn get_record(
    request: HttpRequest,
    path: web::Path<RecordId>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    current_user(&request, &store)?;
    let record = store
        .with(|t| t.record(*path).cloned())
        .ok_or_else(not_found)?;
    Ok(HttpResponse::Ok().json(record))
}

#[tracing::instrument(skip(request, details, store), fields(user_id = tracing::field::Empty))]
#[post("/records")]
pub async fn create_record(
    request: HttpRequest,
    details: web::Json<requests::CreateRecord>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    let user = current_user(&request, &store)?;
    let details = details.into_inner();
    let mut problems = Vec::new();
    require_non_empty(&mut problems, "codigo", &details.codigo);
    require_non_empty(&mut problems, "cliente", &details.cliente);
    require_non_empty(&mut problems, "ubicacion", &details.ubicacion);
    validated(problems)?;

    let record = store.with(|t| {
        if t.records.iter().any(|r| r.codigo == details.codigo) {
            return Err(duplicate(&details.codigo));
        }
        let now = Timestamp::now();
        let record = responses::Record {
            id: RecordId(t.next_id()),
            codigo: details.codigo,
            cliente: details.cliente,
            equipo: details.equipo,
            fv_anios: details.fv_anios,
            fv_meses: details.fv_meses,
            fecha_instalacion: details.fecha_instalacion,
            fecha_caducidad: Some(details.fecha_caducidad),
            estado_actual: details.estado_actual,
            tipo_linea: details.tipo_linea,
            ubicacion: details.ubicacion,
            seec: details.seec,
            anclaje_equipos: details.anclaje_equipos,
            created_at: now,
            updated_at: now,
        };
        t.records.push(record.clone());
        let snapshot = serde_json::to_value(&record).ok();
        t.log_movement(&record, "CREATE", Some(&user), None, snapshot);
        Ok(record)
    })?;
    tracing::info!(id = %record.id, codigo = %record.codigo, "Record created");
    Ok(HttpResponse::Created().json(record))
}

#[tracing::instrument(skip(request, details, store), fields(user_id = tracing::field::Empty))]
#[patch("/records/{id}")]
pub async fn update_record(
    request: HttpRequest,
    path: web::Path<RecordId>,
    details: web::Json<requests::UpdateRecord>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    let user = current_user(&request, &store)?;
    let id = path.into_inner();
    let details = details.into_inner();
    if let Some(codigo) = &details.codigo {
        let mut problems = Vec::new();
        require_non_empty(&mut problems, "codigo", codigo);
        validated(problems)?;
    }

    let record = store.with(|t| {
        let taken = details.codigo.as_ref().filter(|codigo| {
            t.records.iter().any(|r| &r.codigo == *codigo && r.id != id)
        });
        if let Some(codigo) = taken {
            return Err(duplicate(codigo));
        }
        let record =
            t.records.iter_mut().find(|r| r.id == id).ok_or_else(not_found)?;
        let before = serde_json::to_value(&*record).unwrap_or_default();
        apply_update(record, details);
        record.updated_at = Timestamp::now();
        let record = record.clone();
        let after = serde_json::to_value(&record).unwrap_or_default();
        let (previous, new) = changed_fields(&before, &after);
        if !new.is_empty() {
            t.log_movement(
                &record,
                "UPDATE",
                Some(&user),
                Some(Value::Object(previous)),
                Some(Value::Object(new)),
            );
        }
        Ok(record)
    })?;
    Ok(HttpResponse::Ok().json(record))
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[delete("/records/{id}")]
pub async fn delete_record(
    request: HttpRequest,
    path: web::Path<RecordId>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    let user = require_role(&request, &store, &["ADMIN", "SUPERVISOR"])?;
    let id = path.into_inner();
    store.with(|t| {
        let index = t
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(not_found)?;
        let record = t.records.remove(index);
        let snapshot = serde_json::to_value(&record).ok();
        t.log_movement(&record, "DELETE", Some(&user), snapshot, None);
        Ok::<_, APIError>(())
    })?;
    tracing::info!(%id, "Record deleted");
    Ok(HttpResponse::Ok().json(responses::SuccessMessage {
        message: "Registro eliminado".to_string(),
    }))
}

fn apply_update(record: &mut responses::Record, details: requests::UpdateRecord) {
    let requests::UpdateRecord {
        codigo,
        cliente,
        equipo,
        fv_anios,
        fv_meses,
        fecha_instalacion,
        fecha_caducidad,
        estado_actual,
        tipo_linea,
        ubicacion,
        seec,
        anclaje_equipos,
    } = details;
    if let Some(v) = codigo {
        record.codigo = v;
    }
    if let Some(v) = cliente {
        record.cliente = v;
    }
    if let Some(v) = equipo {
        record.equipo = v;
    }
    if let Some(v) = fv_anios {
        record.fv_anios = v;
    }
    if let Some(v) = fv_meses {
        record.fv_meses = v;
    }
    if let Some(v) = fecha_instalacion {
        record.fecha_instalacion = v;
    }
    if let Some(v) = fecha_caducidad {
        record.fecha_caducidad = Some(v);
    }
    if let Some(v) = estado_actual {
        record.estado_actual = v;
    }
    if let Some(v) = tipo_linea {
        record.tipo_linea = v;
    }
    if let Some(v) = ubicacion {
        record.ubicacion = v;
    }
    if seec.is_some() {
        record.seec = seec;
    }
    if anclaje_equipos.is_some() {
        record.anclaje_equipos = anclaje_equipos;
    }
}

/// The fields that differ between two snapshots, as (before, after) maps.
/// Timestamps are ignored.
fn changed_fields(
    before: &Value,
    after: &Value,
) -> (Map<String, Value>, Map<String, Value>) {
    let mut previous = Map::new();
    let mut new = Map::new();
    if let (Value::Object(before), Value::Object(after)) = (before, after) {
        for (key, value) in after {
            if key == "updated_at" || key == "created_at" {
                continue;
            }
            let old = before.get(key).cloned().unwrap_or(Value::Null);
            if &old != value {
                previous.insert(key.clone(), old);
                new.insert(key.clone(), value.clone());
            }
        }
    }
    (previous, new)
}
