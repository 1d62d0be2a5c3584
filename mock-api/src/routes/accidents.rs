use actix_web::{HttpRequest, HttpResponse, delete, get, patch, post, web};
use jiff::{Span, Timestamp};
use payloads::{AccidentId, RecordId, requests, responses};
use std::collections::{BTreeMap, HashMap};

use super::{
    APIError, csv, csv_response, current_user, list_params, require_non_empty,
    require_role, validated,
};
use crate::store::{Store, list};

const SEARCH_FIELDS: &[&str] =
    &["descripcion_incidente", "persona_involucrada", "severidad"];
pub const SEVERITIES: &[&str] = &["LEVE", "MODERADO", "GRAVE", "FATAL"];

fn not_found() -> APIError {
    APIError::NotFound("Accidente no encontrado".to_string())
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[get("/accidents")]
pub async fn list_accidents(
    request: HttpRequest,
    query: web::Query<HashMap<String, String>>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    current_user(&request, &store)?;
    let params = list_params(query);
    let page = store.with(|t| list(&t.accidents, &params, SEARCH_FIELDS));
    Ok(HttpResponse::Ok().json(page))
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[get("/accidents/statistics")]
pub async fn statistics(
    request: HttpRequest,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    current_user(&request, &store)?;
    let month_ago = Timestamp::now()
        .checked_sub(Span::new().hours(24 * 30))
        .map_err(anyhow::Error::from)?;
    let statistics = store.with(|t| {
        let mut por_estado = BTreeMap::new();
        let mut por_severidad = BTreeMap::new();
        for accident in &t.accidents {
            *por_estado.entry(accident.estado.clone()).or_insert(0) += 1;
            *por_severidad.entry(accident.severidad.clone()).or_insert(0) += 1;
        }
        responses::AccidentStatistics {
            total: t.accidents.len() as u64,
            por_estado,
            por_severidad,
            ultimo_mes: t
                .accidents
                .iter()
                .filter(|a| a.fecha_creacion >= month_ago)
                .count() as u64,
        }
    });
    Ok(HttpResponse::Ok().json(statistics))
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[get("/accidents/export")]
pub async fn export(
    request: HttpRequest,
    query: web::Query<HashMap<String, String>>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    current_user(&request, &store)?;
    let mut params = list_params(query);
    params.page = 1;
    params.limit = u32::MAX;
    let rows = store.with(|t| list(&t.accidents, &params, SEARCH_FIELDS).data);
    let body = csv(
        &["id", "linea_vida", "fecha", "severidad", "estado", "descripcion"],
        rows.into_iter().map(|a| {
            vec![
                a.id.to_string(),
                a.linea_vida.map(|l| l.codigo).unwrap_or_default(),
                a.fecha_accidente.to_string(),
                a.severidad,
                a.estado,
                a.descripcion_incidente,
            ]
        }),
    );
    Ok(csv_response("accidentes.csv", body))
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[get("/accidents/by-linea-vida/{record_id}")]
pub async fn by_record(
    request: HttpRequest,
    path: web::Path<RecordId>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    current_user(&request, &store)?;
    let record_id = path.into_inner();
    let accidents: Vec<_> = store.with(|t| {
        t.accidents
            .iter()
            .filter(|a| a.linea_vida_id == record_id)
            .cloned()
            .collect()
    });
    Ok(HttpResponse::Ok().json(accidents))
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[get("/accidents/by-severity/{severity}")]
pub async fn by_severity(
    request: HttpRequest,
    path: web::Path<String>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    current_user(&request, &store)?;
    let severity = path.into_inner();
    let accidents: Vec<_> = store.with(|t| {
        t.accidents
            .iter()
            .filter(|a| a.severidad.eq_ignore_ascii_case(&severity))
            .cloned()
            .collect()
    });
    Ok(HttpResponse::Ok().json(accidents))
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[get("/accidents/{id}")]
pub async fn get_accident(
    request: HttpRequest,
    path: web::Path<AccidentId>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    current_user(&request, &store)?;
    let id = path.into_inner();
    let accident = store
        .with(|t| t.accidents.iter().find(|a| a.id == id).cloned())
        .ok_or_else(not_found)?;
    Ok(HttpResponse::Ok().json(accident))
}

fn check_severity(problems: &mut Vec<String>, severidad: &str) {
    if !SEVERITIES.iter().any(|s| s.eq_ignore_ascii_case(severidad)) {
        problems.push(format!(
            "severidad must be one of the following values: {}",
            SEVERITIES.join(", ")
        ));
    }
}

#[tracing::instrument(skip(request, details, store), fields(user_id = tracing::field::Empty))]
#[post("/accidents")]
pub async fn create_accident(
    request: HttpRequest,
    details: web::Json<requests::CreateAccident>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    let user = current_user(&request, &store)?;
    let details = details.into_inner();
    let mut problems = Vec::new();
    require_non_empty(
        &mut problems,
        "descripcion_incidente",
        &details.descripcion_incidente,
    );
    check_severity(&mut problems, &details.severidad);
    validated(problems)?;

    let accident = store.with(|t| {
        let linea_vida = t.record_summary(details.linea_vida_id).ok_or_else(
            || APIError::NotFound("Línea de vida no encontrada".to_string()),
        )?;
        let accident = responses::Accident {
            id: AccidentId(t.next_id()),
            linea_vida_id: details.linea_vida_id,
            fecha_accidente: details.fecha_accidente,
            descripcion_incidente: details.descripcion_incidente,
            persona_involucrada: details.persona_involucrada,
            acciones_correctivas: details.acciones_correctivas,
            evidencias_urls: details.evidencias_urls,
            estado: "REPORTADO".to_string(),
            severidad: details.severidad.to_ascii_uppercase(),
            reportado_por: Some(user.id),
            fecha_creacion: Timestamp::now(),
            linea_vida: Some(linea_vida),
        };
        t.accidents.push(accident.clone());
        Ok::<_, APIError>(accident)
    })?;
    Ok(HttpResponse::Created().json(accident))
}

#[tracing::instrument(skip(request, details, store), fields(user_id = tracing::field::Empty))]
#[patch("/accidents/{id}")]
pub async fn update_accident(
    request: HttpRequest,
    path: web::Path<AccidentId>,
    details: web::Json<requests::UpdateAccident>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    current_user(&request, &store)?;
    let id = path.into_inner();
    let details = details.into_inner();
    if let Some(severidad) = &details.severidad {
        let mut problems = Vec::new();
        check_severity(&mut problems, severidad);
        validated(problems)?;
    }
    let accident = store.with(|t| {
        let accident = t
            .accidents
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(not_found)?;
        if let Some(v) = details.fecha_accidente {
            accident.fecha_accidente = v;
        }
        if let Some(v) = details.descripcion_incidente {
            accident.descripcion_incidente = v;
        }
        if let Some(v) = details.severidad {
            accident.severidad = v.to_ascii_uppercase();
        }
        if let Some(v) = details.estado {
            accident.estado = v;
        }
        if details.persona_involucrada.is_some() {
            accident.persona_involucrada = details.persona_involucrada;
        }
        if details.acciones_correctivas.is_some() {
            accident.acciones_correctivas = details.acciones_correctivas;
        }
        Ok::<_, APIError>(accident.clone())
    })?;
    Ok(HttpResponse::Ok().json(accident))
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[delete("/accidents/{id}")]
pub async fn delete_accident(
    request: HttpRequest,
    path: web::Path<AccidentId>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    require_role(&request, &store, &["ADMIN", "SUPERVISOR"])?;
    let id = path.into_inner();
    store.with(|t| {
        let before = t.accidents.len();
        t.accidents.retain(|a| a.id != id);
        if t.accidents.len() == before {
            Err(not_found())
        } else {
            Ok(())
        }
    })?;
    Ok(HttpResponse::Ok().json(responses::SuccessMessage {
        message: "Accidente eliminado".to_string(),
    }))
}
