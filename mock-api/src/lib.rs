pub mod routes;
pub mod store;
pub mod telemetry;

use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{Server, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::middleware::{Next, from_fn};
use actix_web::{App, HttpServer, web};
use std::net::TcpListener;
use std::sync::Arc;

use crate::store::{LoggedRequest, Store};

/// Build the server, but not await it.
///
/// Returns the port that the server has bound to by modifying the config.
pub fn build(
    config: &mut Config,
    store: Arc<Store>,
) -> std::io::Result<Server> {
    let store = web::Data::from(store);
    // OS assigns the port if binding to 0
    let listener = TcpListener::bind(format!("{}:{}", config.ip, config.port))?;
    config.port = listener.local_addr()?.port();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(from_fn(faults_and_request_log))
            .app_data(web::JsonConfig::default().error_handler(
                |e, _request| routes::APIError::BadRequest(vec![e.to_string()])
                    .into(),
            ))
            .app_data(store.clone())
            .service(routes::api_services())
    })
    .workers(2)
    .listen(listener)?
    .run();
    Ok(server)
}

/// Record every request, then apply the first matching injected fault.
async fn faults_and_request_log(
    request: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<BoxBody>, actix_web::Error> {
    let Some(store) = request.app_data::<web::Data<Store>>().cloned() else {
        return next.call(request).await.map(|r| r.map_into_boxed_body());
    };
    let method = request.method().as_str().to_string();
    let path = request.path().to_string();
    store.log_request(LoggedRequest {
        method: method.clone(),
        path: path.clone(),
        query: request.query_string().to_string(),
        authorization: request
            .headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
    });

    if let Some(fault) = store.take_fault(&method, &path) {
        tracing::debug!(%method, %path, ?fault, "Injecting fault");
        if let Some(delay) = fault.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(status) = fault.status {
            let status = StatusCode::from_u16(status)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let response = routes::error_response(status, &fault.message);
            return Ok(request.into_response(response));
        }
    }
    next.call(request).await.map(|r| r.map_into_boxed_body())
}

pub struct Config {
    /// set to "0.0.0.0" for public access, "127.0.0.1" for local dev
    pub ip: String,
    /// set to 0 to get an os-assigned port
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ip: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Config {
    /// Read `IP_ADDRESS` and `PORT`, falling back to `127.0.0.1:3000`.
    pub fn from_env() -> anyhow::Result<Self> {
        use std::env::var;

        let defaults = Self::default();
        let port = match var("PORT") {
            Ok(port) => port.parse().map_err(|e| {
                anyhow::anyhow!("PORT must be a port number, got {port:?}: {e}")
            })?,
            Err(_) => defaults.port,
        };
        Ok(Config {
            ip: var("IP_ADDRESS").unwrap_or(defaults.ip),
            port,
        })
    }

    /// Loopback on an OS-assigned port, for tests.
    pub fn ephemeral() -> Self {
        Self {
            ip: "127.0.0.1".to_string(),
            port: 0,
        }
    }
}
