//! Session state: who is logged in, and the lifecycle around the bearer
//! token.
//!
//! There is one [`SessionStore`] per process, created with
//! [`SessionStore::init`] and handed to whatever needs it. Only the token
//! is persisted (by the client's storage). The user and role are always
//! re-derived from the backend.

use jiff::Timestamp;
use payloads::api_client::SESSION_EXPIRED_MESSAGE;
use payloads::storage::password_prompt_key;
use payloads::{APIClient, requests};
use secrecy::SecretBox;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::AdminError;
use crate::models::{Role, User};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// How often a live session is re-verified with the backend.
    pub verify_interval: Duration,
    /// Minimum time between two password-change prompts for one user.
    pub password_prompt_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            verify_interval: Duration::from_secs(5 * 60),
            password_prompt_interval: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// `is_authenticated` implies `token.is_some()`.
#[derive(Debug, Default)]
pub struct Session {
    pub user: Option<User>,
    pub token: Option<SecretBox<String>>,
    pub is_authenticated: bool,
    pub is_initialized: bool,
    pub loading: bool,
    pub error: Option<String>,
    pub needs_password_change: bool,
}

/// A copy of [`Session`] without the token.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub user: Option<User>,
    pub has_token: bool,
    pub is_authenticated: bool,
    pub is_initialized: bool,
    pub loading: bool,
    pub error: Option<String>,
    pub needs_password_change: bool,
}

impl Session {
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            user: self.user.clone(),
            has_token: self.token.is_some(),
            is_authenticated: self.is_authenticated,
            is_initialized: self.is_initialized,
            loading: self.loading,
            error: self.error.clone(),
            needs_password_change: self.needs_password_change,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|user| user.role)
    }

    fn signed_in(
        user: User,
        token: String,
        needs_password_change: bool,
    ) -> Self {
        Self {
            user: Some(user),
            token: Some(SecretBox::new(Box::new(token))),
            is_authenticated: true,
            is_initialized: true,
            loading: false,
            error: None,
            needs_password_change,
        }
    }

    fn signed_out(error: Option<String>) -> Self {
        Self {
            is_initialized: true,
            error,
            ..Default::default()
        }
    }
}

impl SessionSnapshot {
    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|user| user.role)
    }
}

struct Inner {
    client: APIClient,
    config: SessionConfig,
    session: watch::Sender<Session>,
    verifier: Mutex<Option<JoinHandle<()>>>,
    init_started: AtomicBool,
}

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Construction and teardown
impl SessionStore {
    /// Create the store and register it as the client's token-expired
    /// handler.
    pub fn init(client: APIClient, config: SessionConfig) -> Self {
        let store = Self {
            inner: Arc::new(Inner {
                client,
                config,
                session: watch::Sender::new(Session::default()),
                verifier: Mutex::new(None),
                init_started: AtomicBool::new(false),
            }),
        };
        let weak = Arc::downgrade(&store.inner);
        store.inner.client.on_token_expired(move || {
            if let Some(inner) = weak.upgrade() {
                SessionStore { inner }.handle_token_expired();
            }
        });
        store
    }

    /// Stop background verification and detach from the client.
    pub fn dispose(&self) {
        self.stop_verifier();
        self.inner.client.clear_token_expired_handler();
    }

    pub fn client(&self) -> &APIClient {
        &self.inner.client
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.session.borrow().snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.session.subscribe()
    }

    pub fn current_user(&self) -> Option<User> {
        self.inner.session.borrow().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.session.borrow().is_authenticated
    }
}

/// Authentication flow
impl SessionStore {
    /// Resolve the stored token into a session. Runs once per store; later
    /// calls return immediately. A missing or rejected token leaves the
    /// session unauthenticated without reporting an error.
    pub async fn initialize_auth(&self) {
        if self.inner.init_started.swap(true, Ordering::SeqCst) {
            return;
        }
        let Some(token) = self.inner.client.token() else {
            tracing::debug!("No stored token");
            self.inner.session.send_replace(Session::signed_out(None));
            return;
        };

        self.inner.session.send_modify(|session| session.loading = true);
        match self.inner.client.user_profile().await {
            Ok(profile) => {
                let user = User::from(profile);
                tracing::info!(
                    username = %user.username,
                    role = %user.role,
                    "Restored session"
                );
                let needs_change = user.must_change_password;
                self.inner.session.send_replace(Session::signed_in(
                    user,
                    token,
                    needs_change,
                ));
                self.start_verifier();
            }
            Err(e) => {
                tracing::debug!("Stored token not accepted: {e}");
                self.inner.client.clear_token();
                self.inner.session.send_replace(Session::signed_out(None));
            }
        }
    }

    /// Validate `credentials` locally, then log in. Validation failures
    /// never reach the network.
    pub async fn login(
        &self,
        credentials: &requests::LoginCredentials,
    ) -> Result<User, AdminError> {
        let credentials = &credentials.normalized();
        let problems = credentials.validate();
        if !problems.is_empty() {
            let error = AdminError::Validation(
                problems.into_iter().map(str::to_string).collect(),
            );
            let message = error.to_string();
            self.inner
                .session
                .send_modify(|session| session.error = Some(message));
            return Err(error);
        }

        // a login settles initialization on its own
        self.inner.init_started.store(true, Ordering::SeqCst);
        self.inner.session.send_modify(|session| {
            session.loading = true;
            session.error = None;
        });

        let response = match self.inner.client.login(credentials).await {
            Ok(response) => response,
            Err(e) => {
                let message = e.to_string();
                tracing::info!(
                    username = %credentials.username,
                    "Login failed: {message}"
                );
                self.inner
                    .session
                    .send_replace(Session::signed_out(Some(message.clone())));
                return Err(AdminError::Request { message, source: e });
            }
        };

        let mut user = User::from(response.user);
        match self.inner.client.user_profile().await {
            Ok(profile) => user = User::from(profile),
            Err(e) => tracing::warn!("Could not load full profile: {e}"),
        }
        tracing::info!(
            username = %user.username,
            role = %user.role,
            "Logged in"
        );
        self.inner.session.send_replace(Session::signed_in(
            user.clone(),
            response.access_token,
            response.needs_password_change,
        ));
        self.start_verifier();
        Ok(user)
    }

    /// End the session. The server call is best-effort; local state is
    /// always cleared.
    pub async fn logout(&self) {
        self.stop_verifier();
        self.end_session().await;
        tracing::info!("Logged out");
    }

    async fn end_session(&self) {
        if let Err(e) = self.inner.client.logout().await {
            tracing::debug!("Server logout failed: {e}");
        }
        self.inner.session.send_replace(Session::signed_out(None));
    }

    /// Called by the client when the backend rejects the token.
    ///
    /// Before initialization completes this is silent: an expired stored
    /// token is expected at startup.
    pub fn handle_token_expired(&self) {
        if !self.inner.session.borrow().is_initialized {
            return;
        }
        self.stop_verifier();
        self.inner
            .session
            .send_replace(Session::signed_out(Some(
                SESSION_EXPIRED_MESSAGE.to_string(),
            )));
        tracing::info!("Session expired");
    }

    /// Re-verify the session with the backend. Any failure ends the
    /// session.
    pub async fn check_auth_status(&self) -> bool {
        if self.verify().await {
            return true;
        }
        if self.is_authenticated() {
            self.logout().await;
        }
        false
    }

    async fn verify(&self) -> bool {
        if self.inner.client.token().is_none() {
            return false;
        }
        match self.inner.client.verify_session().await {
            Ok(verdict) if verdict.valid => {
                if let Some(user) = verdict.user {
                    let user = User::from(user);
                    self.inner
                        .session
                        .send_modify(|session| session.user = Some(user));
                }
                true
            }
            Ok(_) => {
                tracing::info!("Backend reports the session as invalid");
                false
            }
            Err(e) => {
                tracing::warn!("Session verification failed: {e}");
                false
            }
        }
    }
}

/// Background verification
impl SessionStore {
    fn start_verifier(&self) {
        self.stop_verifier();
        let period = self.inner.config.verify_interval;
        let weak = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(verify_periodically(weak, period));
        *lock(&self.inner.verifier) = Some(handle);
    }

    fn stop_verifier(&self) {
        if let Some(handle) = lock(&self.inner.verifier).take() {
            handle.abort();
        }
    }
}

async fn verify_periodically(store: Weak<Inner>, period: Duration) {
    let mut interval =
        tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        let Some(inner) = store.upgrade() else {
            break;
        };
        let store = SessionStore { inner };
        if store.verify().await {
            continue;
        }
        // detach rather than abort: this task is the one running
        lock(&store.inner.verifier).take();
        if store.is_authenticated() {
            tracing::info!("Forcing logout after failed verification");
            store.end_session().await;
        }
        break;
    }
}

/// Password-change prompt
impl SessionStore {
    /// Whether to remind the user to change their password at `now`: the
    /// backend asked for it and the last reminder for this user is older
    /// than the prompt interval.
    pub fn should_prompt_password_change_at(&self, now: Timestamp) -> bool {
        let user_id = {
            let session = self.inner.session.borrow();
            if !session.needs_password_change {
                return false;
            }
            match &session.user {
                Some(user) => user.id.clone(),
                None => return false,
            }
        };
        let last_shown = self
            .inner
            .client
            .storage()
            .get(&password_prompt_key(&user_id))
            .and_then(|value| value.parse::<Timestamp>().ok());
        match last_shown {
            None => true,
            Some(last) => last
                .checked_add(self.inner.config.password_prompt_interval)
                .is_ok_and(|next| now >= next),
        }
    }

    pub fn mark_password_prompt_shown_at(&self, now: Timestamp) {
        if let Some(user) = self.current_user() {
            self.inner
                .client
                .storage()
                .set(&password_prompt_key(&user.id), &now.to_string());
        }
    }
}
