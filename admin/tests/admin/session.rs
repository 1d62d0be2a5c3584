use admin::AdminError;
use admin::models::Role;
use admin::state::{SessionConfig, SessionStore};
use jiff::{SignedDuration, Timestamp};
use payloads::api_client::SESSION_EXPIRED_MESSAGE;
use payloads::requests::{
    LoginCredentials, PASSWORD_TOO_SHORT, USERNAME_TOO_SHORT,
};
use payloads::storage::TOKEN_KEY;
use payloads::{MemoryStorage, Storage};
use std::sync::Arc;
use std::time::Duration;

use test_helpers::{
    TestApp, admin_credentials, spawn_app, supervisor_credentials,
    tecnico_credentials,
};

fn session(app: &TestApp) -> SessionStore {
    SessionStore::init(app.new_client(), SessionConfig::default())
}

#[tokio::test]
async fn invalid_credentials_never_reach_the_backend() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let store = session(&app);
    let credentials = LoginCredentials {
        username: "ab".into(),
        password: "123".into(),
    };

    let result = store.login(&credentials).await;

    assert!(matches!(result, Err(AdminError::Validation(_))));
    assert!(app.requests_to("/auth/login").is_empty());
    let snapshot = store.snapshot();
    assert!(!snapshot.is_authenticated);
    assert_eq!(
        snapshot.error,
        Some(format!("{USERNAME_TOO_SHORT}, {PASSWORD_TOO_SHORT}"))
    );
    Ok(())
}

#[tokio::test]
async fn login_loads_user_and_role() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let store = session(&app);

    let user = store.login(&admin_credentials()).await?;

    assert_eq!(user.username, "admin");
    assert_eq!(user.role, Role::Admin);
    let snapshot = store.snapshot();
    assert!(snapshot.is_authenticated);
    assert!(snapshot.is_initialized);
    assert!(snapshot.has_token);
    assert!(!snapshot.loading);
    assert!(store.client().token().is_some());
    assert_eq!(app.requests_to("/auth/profile").len(), 1);
    store.dispose();
    Ok(())
}

#[tokio::test]
async fn padded_username_is_trimmed_before_sending() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let store = session(&app);
    let credentials = LoginCredentials {
        username: "  admin ".into(),
        ..admin_credentials()
    };

    let user = store.login(&credentials).await?;

    assert_eq!(user.username, "admin");
    assert_eq!(app.requests_to("/auth/login").len(), 1);
    store.dispose();
    Ok(())
}

#[tokio::test]
async fn wrong_password_keeps_backend_message() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let store = session(&app);
    let credentials = LoginCredentials {
        username: "admin".into(),
        password: "incorrecta".into(),
    };

    let result = store.login(&credentials).await;

    let error = result.expect_err("rejected");
    assert_eq!(error.to_string(), "Credenciales inválidas");
    let snapshot = store.snapshot();
    assert!(!snapshot.is_authenticated);
    assert_eq!(snapshot.error.as_deref(), Some("Credenciales inválidas"));
    assert_eq!(store.client().token(), None);
    Ok(())
}

#[tokio::test]
async fn unknown_backend_role_is_an_ordinary_user() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let store = session(&app);

    let user = store.login(&tecnico_credentials()).await?;

    assert_eq!(user.role, Role::Usuario);
    store.dispose();
    Ok(())
}

#[tokio::test]
async fn stored_token_restores_the_session() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let first = SessionStore::init(
        app.client_with_storage(storage.clone()),
        SessionConfig::default(),
    );
    first.login(&supervisor_credentials()).await?;
    first.dispose();

    let second = SessionStore::init(
        app.client_with_storage(storage),
        SessionConfig::default(),
    );
    second.initialize_auth().await;

    let snapshot = second.snapshot();
    assert!(snapshot.is_authenticated);
    assert_eq!(snapshot.role(), Some(Role::Supervisor));
    assert_eq!(snapshot.error, None);

    // initialization runs once
    second.initialize_auth().await;
    assert_eq!(app.requests_to("/auth/profile").len(), 2);
    second.dispose();
    Ok(())
}

#[tokio::test]
async fn rejected_stored_token_is_dropped_silently() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    storage.set(TOKEN_KEY, "caducado");
    let store = SessionStore::init(
        app.client_with_storage(storage.clone()),
        SessionConfig::default(),
    );

    store.initialize_auth().await;

    let snapshot = store.snapshot();
    assert!(snapshot.is_initialized);
    assert!(!snapshot.is_authenticated);
    assert_eq!(snapshot.error, None);
    assert_eq!(storage.get(TOKEN_KEY), None);
    Ok(())
}

#[tokio::test]
async fn no_stored_token_skips_the_network() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let store = session(&app);

    store.initialize_auth().await;

    assert!(store.snapshot().is_initialized);
    assert!(!store.is_authenticated());
    assert!(app.store.requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn logout_clears_the_session() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let store = session(&app);
    store.login(&admin_credentials()).await?;

    store.logout().await;

    let snapshot = store.snapshot();
    assert!(!snapshot.is_authenticated);
    assert!(!snapshot.has_token);
    assert_eq!(snapshot.user, None);
    assert_eq!(snapshot.error, None);
    assert_eq!(store.client().token(), None);
    assert_eq!(app.requests_to("/auth/logout").len(), 1);
    Ok(())
}

#[tokio::test]
async fn expired_token_on_a_request_signs_out() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let store = session(&app);
    store.login(&admin_credentials()).await?;
    app.store.expire_tokens();

    let result = store.client().user_profile().await;

    assert!(result.is_err());
    let snapshot = store.snapshot();
    assert!(!snapshot.is_authenticated);
    assert_eq!(snapshot.error.as_deref(), Some(SESSION_EXPIRED_MESSAGE));
    Ok(())
}

#[tokio::test]
async fn periodic_verification_ends_an_expired_session() -> anyhow::Result<()>
{
    let app = spawn_app().await;
    let store = SessionStore::init(
        app.new_client(),
        SessionConfig {
            verify_interval: Duration::from_millis(100),
            ..SessionConfig::default()
        },
    );
    store.login(&admin_credentials()).await?;
    app.store.expire_tokens();

    let mut session = store.subscribe();
    tokio::time::timeout(
        Duration::from_secs(2),
        session.wait_for(|session| !session.is_authenticated),
    )
    .await??;

    let snapshot = store.snapshot();
    assert_eq!(snapshot.error.as_deref(), Some(SESSION_EXPIRED_MESSAGE));
    assert!(!app.requests_to("/auth/verify-session").is_empty());
    Ok(())
}

#[tokio::test]
async fn verification_keeps_a_live_session() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let store = session(&app);
    store.login(&admin_credentials()).await?;

    assert!(store.check_auth_status().await);
    assert!(store.is_authenticated());

    app.store.expire_tokens();
    assert!(!store.check_auth_status().await);
    assert!(!store.is_authenticated());
    Ok(())
}

#[tokio::test]
async fn password_change_reminder_is_rate_limited() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.store.require_password_change("supervisor");
    let store = session(&app);
    store.login(&supervisor_credentials()).await?;
    let now = Timestamp::now();

    assert!(store.snapshot().needs_password_change);
    assert!(store.should_prompt_password_change_at(now));

    store.mark_password_prompt_shown_at(now);
    let later = now + SignedDuration::from_hours(1);
    assert!(!store.should_prompt_password_change_at(later));
    let next_day = now + SignedDuration::from_hours(25);
    assert!(store.should_prompt_password_change_at(next_day));
    store.dispose();
    Ok(())
}

#[tokio::test]
async fn no_reminder_without_backend_request() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let store = session(&app);
    store.login(&admin_credentials()).await?;

    assert!(!store.should_prompt_password_change_at(Timestamp::now()));
    store.dispose();
    Ok(())
}
