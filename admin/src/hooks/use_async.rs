use futures::FutureExt;
use futures::future::BoxFuture;
use payloads::{RetryPolicy, Retryable};
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

use super::lock;

type Operation<A, T, E> =
    Arc<dyn Fn(A) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;
type SuccessCallback<T> = Arc<dyn Fn(&T) + Send + Sync>;
type ErrorCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Observable state of an async call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
    pub success: bool,
}

impl<T> Default for CallState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            success: false,
        }
    }
}

pub struct AsyncOptions<T> {
    /// Execute once on the first `mount`.
    pub immediate: bool,
    /// Operation-level retries. Off by default; the HTTP client already
    /// retries transient failures.
    pub retry: RetryPolicy,
    pub on_success: Option<SuccessCallback<T>>,
    pub on_error: Option<ErrorCallback>,
}

impl<T> Default for AsyncOptions<T> {
    fn default() -> Self {
        Self {
            immediate: false,
            retry: RetryPolicy::none(),
            on_success: None,
            on_error: None,
        }
    }
}

impl<T> AsyncOptions<T> {
    pub fn immediate(mut self) -> Self {
        self.immediate = true;
        self
    }

    /// `retry_count` extra attempts, `retry_delay * attempt` apart.
    pub fn retry(mut self, retry_count: u32, retry_delay: Duration) -> Self {
        self.retry = RetryPolicy::linear(retry_count, retry_delay);
        self
    }

    pub fn on_success(
        mut self,
        f: impl Fn(&T) + Send + Sync + 'static,
    ) -> Self {
        self.on_success = Some(Arc::new(f));
        self
    }

    pub fn on_error(
        mut self,
        f: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }
}

struct Inner<A, T, E> {
    operation: Operation<A, T, E>,
    options: AsyncOptions<T>,
    state: watch::Sender<CallState<T>>,
    mounted: watch::Sender<bool>,
    /// Sequence number of the most recently issued call.
    seq: AtomicU64,
    immediate_fired: AtomicBool,
    last_args: Mutex<Option<A>>,
}

/// An async operation with loading/data/error state.
///
/// Each `execute` is tagged with a sequence number and only the most
/// recently issued call may apply its result; an older call that resolves
/// late is dropped. After `unmount` no state change or callback happens,
/// and pending retry waits end early.
///
/// ```ignore
/// let records = AsyncCall::new(
///     move |id: String| {
///         let service = service.clone();
///         async move { service.get(&id).await }
///     },
///     AsyncOptions::default().on_error(|e| eprintln!("{e}")),
/// );
/// records.execute("12".into()).await;
/// ```
pub struct AsyncCall<A, T, E> {
    inner: Arc<Inner<A, T, E>>,
}

impl<A, T, E> Clone for AsyncCall<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A, T, E> AsyncCall<A, T, E>
where
    A: Clone + Send + 'static,
    T: Clone + Send + Sync + 'static,
    E: Display + Retryable + Send + 'static,
{
    pub fn new<F, Fut>(operation: F, options: AsyncOptions<T>) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let operation: Operation<A, T, E> =
            Arc::new(move |args| operation(args).boxed());
        Self {
            inner: Arc::new(Inner {
                operation,
                options,
                state: watch::Sender::new(CallState::default()),
                mounted: watch::Sender::new(true),
                seq: AtomicU64::new(0),
                immediate_fired: AtomicBool::new(false),
                last_args: Mutex::new(None),
            }),
        }
    }

    /// Run the operation with `args`.
    ///
    /// Returns the outcome with the error rendered as a message, or `None`
    /// when the result was discarded because a newer call was issued, the
    /// state was reset, or the call was unmounted.
    pub async fn execute(&self, args: A) -> Option<Result<T, String>> {
        if !self.is_mounted() {
            return None;
        }
        let seq = self.inner.seq.fetch_add(1, Ordering::SeqCst) + 1;
        *lock(&self.inner.last_args) = Some(args.clone());
        self.inner.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
            state.success = false;
        });

        let result = self.run_with_retry(args).await?;
        let result = result.map_err(|e| e.to_string());

        let applied = self.inner.state.send_if_modified(|state| {
            if !self.is_current(seq) {
                return false;
            }
            state.loading = false;
            match &result {
                Ok(data) => {
                    state.data = Some(data.clone());
                    state.error = None;
                    state.success = true;
                }
                Err(message) => {
                    state.data = None;
                    state.error = Some(message.clone());
                    state.success = false;
                }
            }
            true
        });
        if !applied {
            tracing::debug!(seq, "Discarding result of superseded call");
            return None;
        }

        match &result {
            Ok(data) => {
                if let Some(on_success) = &self.inner.options.on_success {
                    on_success(data);
                }
            }
            Err(message) => {
                if let Some(on_error) = &self.inner.options.on_error {
                    on_error(message);
                }
            }
        }
        Some(result)
    }

    /// `None` when the call was unmounted during a retry wait.
    async fn run_with_retry(&self, args: A) -> Option<Result<T, E>> {
        let policy = self.inner.options.retry;
        let mut attempt = 1;
        loop {
            match (self.inner.operation)(args.clone()).await {
                Ok(data) => return Some(Ok(data)),
                Err(e) if policy.should_retry(attempt, &e) => {
                    let delay = policy.delay(attempt);
                    tracing::debug!(attempt, ?delay, "Retrying operation: {e}");
                    if !self.sleep_while_mounted(delay).await {
                        return None;
                    }
                    attempt += 1;
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }

    async fn sleep_while_mounted(&self, delay: Duration) -> bool {
        let mut mounted = self.inner.mounted.subscribe();
        if !*mounted.borrow_and_update() {
            return false;
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = mounted.wait_for(|mounted| !*mounted) => false,
        }
    }

    fn is_current(&self, seq: u64) -> bool {
        self.is_mounted() && self.inner.seq.load(Ordering::SeqCst) == seq
    }

    /// Re-run with the arguments of the last `execute`. `None` if there
    /// was no previous call.
    pub async fn retry(&self) -> Option<Result<T, String>> {
        let args = lock(&self.inner.last_args).clone();
        match args {
            Some(args) => self.execute(args).await,
            None => None,
        }
    }

    /// Back to the initial state. Calls still in flight are discarded.
    pub fn reset(&self) {
        self.inner.seq.fetch_add(1, Ordering::SeqCst);
        self.inner.state.send_replace(CallState::default());
    }

    pub fn unmount(&self) {
        self.inner.mounted.send_replace(false);
    }

    pub fn is_mounted(&self) -> bool {
        *self.inner.mounted.borrow()
    }

    /// Mark mounted. Returns true the first time for an `immediate` call,
    /// meaning the caller should execute now.
    pub fn begin_mount(&self) -> bool {
        self.inner.mounted.send_replace(true);
        self.inner.options.immediate
            && !self.inner.immediate_fired.swap(true, Ordering::SeqCst)
    }

    pub async fn mount_with(&self, args: A) -> Option<Result<T, String>> {
        if self.begin_mount() {
            self.execute(args).await
        } else {
            None
        }
    }

    pub async fn mount(&self) -> Option<Result<T, String>>
    where
        A: Default,
    {
        self.mount_with(A::default()).await
    }

    pub fn state(&self) -> CallState<T> {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CallState<T>> {
        self.inner.state.subscribe()
    }
}
