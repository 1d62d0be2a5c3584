use admin::state::{SessionConfig, SessionStore};
use admin::{AdminError, Route};
use payloads::requests::LoginCredentials;

use test_helpers::{
    TestApp, admin_credentials, spawn_app, supervisor_credentials,
    tecnico_credentials,
};

async fn signed_in(
    app: &TestApp,
    credentials: &LoginCredentials,
) -> anyhow::Result<SessionStore> {
    let store = SessionStore::init(app.new_client(), SessionConfig::default());
    store.login(credentials).await?;
    Ok(store)
}

#[tokio::test]
async fn admin_opens_every_section() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let store = signed_in(&app, &admin_credentials()).await?;
    let session = store.snapshot();

    for route in [
        Route::Dashboard,
        Route::Users,
        Route::Records,
        Route::History,
        Route::Accidents,
        Route::Requests,
    ] {
        assert!(route.guard(&session).is_ok(), "{route:?}");
    }
    store.dispose();
    Ok(())
}

#[tokio::test]
async fn supervisor_sees_history_but_not_users() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let store = signed_in(&app, &supervisor_credentials()).await?;
    let session = store.snapshot();

    assert!(Route::History.guard(&session).is_ok());
    assert!(matches!(
        Route::Users.guard(&session),
        Err(AdminError::Forbidden)
    ));
    store.dispose();
    Ok(())
}

#[tokio::test]
async fn regular_user_is_kept_to_shared_sections() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let store = signed_in(&app, &tecnico_credentials()).await?;
    let session = store.snapshot();

    assert!(Route::recognize("/registro/3").guard(&session).is_ok());
    assert!(Route::recognize("/solicitudes").guard(&session).is_ok());
    assert!(matches!(
        Route::recognize("/historial").guard(&session),
        Err(AdminError::Forbidden)
    ));
    store.dispose();
    Ok(())
}

#[tokio::test]
async fn expired_session_loses_access() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let store = signed_in(&app, &admin_credentials()).await?;
    app.store.expire_tokens();

    assert!(!store.check_auth_status().await);

    assert!(matches!(
        Route::Records.guard(&store.snapshot()),
        Err(AdminError::Unauthenticated)
    ));
    assert!(Route::Login.guard(&store.snapshot()).is_ok());
    Ok(())
}
