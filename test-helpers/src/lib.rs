pub mod mock;

use jiff::civil::Date;
use mock_api::store::{Fault, LoggedRequest, Store};
use mock_api::{Config, telemetry};
use payloads::{
    APIClient, MemoryStorage, RecordId, RetryPolicy, Storage, requests,
    responses,
};
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;

pub struct TestApp {
    #[allow(unused)]
    pub port: u16,
    pub address: String,
    /// Client with its own in-memory storage and a fast retry policy.
    pub client: APIClient,
    /// The backend's state, for seeding data and injecting faults.
    pub store: Arc<Store>,
}

/// Retry schedule for tests: same shape as the default, milliseconds
/// instead of seconds.
pub fn test_retry_policy() -> RetryPolicy {
    RetryPolicy::exponential(3, Duration::from_millis(10))
}

pub fn admin_credentials() -> requests::LoginCredentials {
    requests::LoginCredentials {
        username: "admin".into(),
        password: "admin123".into(),
    }
}

pub fn supervisor_credentials() -> requests::LoginCredentials {
    requests::LoginCredentials {
        username: "supervisor".into(),
        password: "super123".into(),
    }
}

/// An account whose backend role is not one the admin knows about.
pub fn tecnico_credentials() -> requests::LoginCredentials {
    requests::LoginCredentials {
        username: "tecnico".into(),
        password: "tecnico123".into(),
    }
}

pub fn record_details(codigo: &str) -> requests::CreateRecord {
    requests::CreateRecord {
        codigo: codigo.to_string(),
        cliente: "Minera Andina".into(),
        equipo: "Línea vertical".into(),
        fv_anios: 2,
        fv_meses: 6,
        fecha_instalacion: Date::constant(2024, 1, 15),
        fecha_caducidad: Date::constant(2026, 7, 15),
        estado_actual: "activo".into(),
        tipo_linea: "vertical".into(),
        ubicacion: "Planta Arequipa".into(),
        seec: None,
        anclaje_equipos: None,
    }
}

impl TestApp {
    /// Another client for the same backend, with separate storage.
    pub fn new_client(&self) -> APIClient {
        self.client_with_storage(Arc::new(MemoryStorage::new()))
    }

    pub fn client_with_storage(&self, storage: Arc<dyn Storage>) -> APIClient {
        APIClient::new(self.address.clone(), storage)
            .with_retry_policy(test_retry_policy())
            .with_timeout(Duration::from_secs(2))
    }

    pub async fn login_admin(&self) -> anyhow::Result<responses::LoginResponse> {
        Ok(self.client.login(&admin_credentials()).await?)
    }

    pub async fn login_supervisor(
        &self,
    ) -> anyhow::Result<responses::LoginResponse> {
        Ok(self.client.login(&supervisor_credentials()).await?)
    }

    pub async fn login_tecnico(
        &self,
    ) -> anyhow::Result<responses::LoginResponse> {
        Ok(self.client.login(&tecnico_credentials()).await?)
    }

    /// Answer the next `times` requests under `path` with `status`.
    pub fn fail_next(&self, path: &str, status: u16, times: u32) {
        self.store.inject(Fault::status(path, status, times));
    }

    /// Hold the next request under `path` for `delay` before handling it.
    pub fn delay_next(&self, path: &str, delay: Duration) {
        self.store.inject(Fault::delay(path, delay, 1));
    }

    pub fn requests_to(&self, path: &str) -> Vec<LoggedRequest> {
        self.store.requests_to(path)
    }

    pub fn seed_records(&self, count: usize) -> Vec<RecordId> {
        self.store.seed_records(count)
    }
}

pub async fn spawn_app_on_port(port: u16) -> anyhow::Result<TestApp> {
    let subscriber = telemetry::get_subscriber("error");
    telemetry::init_subscriber(subscriber);

    let store = Arc::new(Store::new());
    let mut config = Config {
        ip: "127.0.0.1".into(),
        port,
    };
    let server = mock_api::build(&mut config, store.clone())?;
    tokio::spawn(server);

    let address = format!("http://127.0.0.1:{}", config.port);
    let client = APIClient::new(address.clone(), Arc::new(MemoryStorage::new()))
        .with_retry_policy(test_retry_policy())
        .with_timeout(Duration::from_secs(2));
    Ok(TestApp {
        port: config.port,
        address,
        client,
        store,
    })
}

/// Use OS-assigned port for parallel testing.
pub async fn spawn_app() -> TestApp {
    match spawn_app_on_port(0).await {
        Ok(app) => app,
        Err(e) => panic!("Failed to start mock backend: {e:#}"),
    }
}

/// Assert that the result of an API action results in a specific status code.
pub fn assert_status_code<T: std::fmt::Debug>(
    result: Result<T, payloads::ClientError>,
    expected: StatusCode,
) {
    match result {
        Err(payloads::ClientError::APIError(details)) => {
            assert_eq!(details.status, expected, "{}", details.message)
        }
        other => panic!("Expected APIError with {expected}, got {other:?}"),
    };
}
