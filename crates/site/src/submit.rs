//! Asynchronous form submission.
//!
//! A [`SubmitGate`] admits one submission at a time, bounds it with a
//! timeout and abandons it when the owning view goes away. Effects that
//! should only touch a live view go through [`ViewLifetime::run_if_live`].

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use serde_json::{json, Value};
use tokio::sync::watch;

use wasui_core::mutation::MutationResult;

use crate::cache::KeyValueCache;
use crate::error::{SiteError, SiteResult};
use crate::forms::{ContactForm, ReviewForm};
use crate::state::SiteState;

/// Cache key the local transport queues submissions under.
pub const OUTBOX_KEY: &str = "wasui_outbox";

#[derive(Debug, Clone, thiserror::Error)]
pub enum SubmitError {
    #[error("a submission is already in flight")]
    InFlight,
    #[error("no response within {0:?}")]
    Timeout(Duration),
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("view closed before the submission finished")]
    Cancelled,
}

impl SubmitError {
    /// Transient failures the user may retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SubmitError::Timeout(_) | SubmitError::Transport(_))
    }
}

/// Liveness of the view that started a submission (a modal, a page).
#[derive(Debug, Clone)]
pub struct ViewLifetime {
    live: Arc<watch::Sender<bool>>,
}

impl Default for ViewLifetime {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewLifetime {
    pub fn new() -> Self {
        let (live, _) = watch::channel(true);
        Self {
            live: Arc::new(live),
        }
    }

    pub fn is_live(&self) -> bool {
        *self.live.borrow()
    }

    /// Mark the view closed. Idempotent.
    pub fn close(&self) {
        self.live.send_replace(false);
    }

    /// Resolves once the view is closed.
    pub async fn closed(&self) {
        let mut rx = self.live.subscribe();
        // `wait_for` only errs when the sender is gone, and we hold it.
        let _ = rx.wait_for(|live| !*live).await;
    }

    /// Run a deferred effect only while the view is still live.
    pub fn run_if_live<T>(&self, effect: impl FnOnce() -> T) -> Option<T> {
        if self.is_live() {
            Some(effect())
        } else {
            tracing::debug!("view closed, dropping deferred effect");
            None
        }
    }
}

/// Non-reentrant submission guard. Clones share the same gate.
#[derive(Debug, Clone, Default)]
pub struct SubmitGate {
    in_flight: Arc<AtomicBool>,
}

struct Release<'a>(&'a AtomicBool);

impl Drop for Release<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SubmitGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a submission is running; the form should be disabled.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run `request` unless another submission holds the gate.
    pub async fn submit<F, T>(
        &self,
        lifetime: &ViewLifetime,
        timeout: Duration,
        request: F,
    ) -> Result<T, SubmitError>
    where
        F: Future<Output = Result<T, SubmitError>>,
    {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            return Err(SubmitError::InFlight);
        }
        let _release = Release(&self.in_flight);

        if !lifetime.is_live() {
            return Err(SubmitError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = lifetime.closed() => Err(SubmitError::Cancelled),
            outcome = tokio::time::timeout(timeout, request) => {
                outcome.unwrap_or(Err(SubmitError::Timeout(timeout)))
            }
        }
    }
}

pub type SendFuture<'a> = Pin<Box<dyn Future<Output = Result<(), SubmitError>> + Send + 'a>>;

/// Where submissions are delivered.
pub trait Transport: Send + Sync {
    fn send(&self, channel: &'static str, payload: Value) -> SendFuture<'_>;
}

/// Queues submissions in the local cache for the editor to pick up.
pub struct OutboxTransport {
    cache: Arc<dyn KeyValueCache>,
    /// Held across the read and write of the queue so concurrent forms
    /// cannot overwrite each other's entries.
    queue_lock: Mutex<()>,
}

impl OutboxTransport {
    pub fn new(cache: Arc<dyn KeyValueCache>) -> Self {
        Self {
            cache,
            queue_lock: Mutex::new(()),
        }
    }

    fn push(&self, entry: Value) -> Result<(), SubmitError> {
        let _guard = self
            .queue_lock
            .lock()
            .map_err(|_| SubmitError::Transport("outbox lock poisoned".to_string()))?;
        let mut queue = match self
            .cache
            .get(OUTBOX_KEY)
            .map_err(|e| SubmitError::Transport(e.to_string()))?
        {
            Some(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Array(items)) => items,
                _ => {
                    tracing::warn!(key = OUTBOX_KEY, "outbox is malformed, starting a new one");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        queue.push(entry);
        self.cache
            .set(OUTBOX_KEY, &Value::Array(queue).to_string())
            .map_err(|e| SubmitError::Transport(e.to_string()))
    }
}

impl Transport for OutboxTransport {
    fn send(&self, channel: &'static str, payload: Value) -> SendFuture<'_> {
        Box::pin(async move {
            self.push(json!({
                "channel": channel,
                "submittedAt": Utc::now().to_rfc3339(),
                "payload": payload,
            }))
        })
    }
}

/// Validate, deliver and then publish a review.
///
/// The new review is appended to the store only if the view is still live
/// when delivery completes.
pub async fn submit_review<T>(
    state: &SiteState,
    gate: &SubmitGate,
    lifetime: &ViewLifetime,
    transport: &T,
    form: &ReviewForm,
) -> SiteResult<MutationResult>
where
    T: Transport + ?Sized,
{
    let record = form.to_record(Utc::now())?;
    let payload = serde_json::to_value(&record)
        .map_err(|e| SubmitError::Rejected(e.to_string()))?;

    gate.submit(
        lifetime,
        state.config().submit_timeout,
        transport.send("review", payload),
    )
    .await?;

    lifetime
        .run_if_live(|| state.append(record))
        .unwrap_or(Err(SiteError::Submit(SubmitError::Cancelled)))
}

/// Validate and deliver a contact inquiry.
pub async fn submit_contact<T>(
    state: &SiteState,
    gate: &SubmitGate,
    lifetime: &ViewLifetime,
    transport: &T,
    form: &ContactForm,
) -> SiteResult<()>
where
    T: Transport + ?Sized,
{
    form.validate()?;
    let payload = serde_json::to_value(form).map_err(|e| SubmitError::Rejected(e.to_string()))?;
    gate.submit(
        lifetime,
        state.config().submit_timeout,
        transport.send("contact", payload),
    )
    .await?;
    Ok(())
}
