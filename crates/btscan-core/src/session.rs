//! One bounded discovery operation.
//!
//! A session moves `Idle -> Scanning -> (Completed | Failed)` exactly once.
//! It opens the adapter, merges observations until the timeout elapses, the
//! backend ends the scan or the caller cancels, then releases the adapter on
//! every path.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::adapter::ScanAdapter;
use crate::error::{DiscoveryError, Result};
use crate::registry::{DeviceRegistry, MergeOutcome};
use crate::types::{DeviceRecord, DiscoveryOptions};

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Scanning,
    Completed,
    Failed,
}

/// Requests early termination of a running session.
///
/// Cancelling is not an error: the session returns what it collected so far.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Why the scan loop stopped.
enum ScanEnd {
    Elapsed,
    Cancelled,
    Exhausted,
}

pub struct DiscoverySession {
    options: DiscoveryOptions,
    registry: DeviceRegistry,
    state: SessionState,
    cancel: CancelToken,
}

impl DiscoverySession {
    /// Create an idle session. Fails with `InvalidArgument` for a zero timeout.
    pub fn new(options: DiscoveryOptions) -> Result<Self> {
        if options.timeout.is_zero() {
            return Err(DiscoveryError::InvalidArgument(
                "timeout must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            options,
            registry: DeviceRegistry::new(),
            state: SessionState::Idle,
            cancel: CancelToken::new(),
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn options(&self) -> &DiscoveryOptions {
        &self.options
    }

    /// Records collected so far, in discovery order.
    pub fn records(&self) -> &[DeviceRecord] {
        self.registry.records()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Share `token` with other sessions, so one cancel stops all of them.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run the scan on `adapter` and return the discovered devices.
    pub async fn run<A>(&mut self, adapter: &mut A) -> Result<Vec<DeviceRecord>>
    where
        A: ScanAdapter + ?Sized,
    {
        if self.state != SessionState::Idle {
            return Err(DiscoveryError::InvalidArgument(
                "discovery session already ran; create a new one".to_string(),
            ));
        }

        info!(
            mode = self.options.mode.display_name(),
            timeout_ms = self.options.timeout.as_millis() as u64,
            resolve_names = self.options.resolve_names,
            "starting discovery"
        );

        if let Err(e) = adapter.open().await {
            debug!(error = %e, "failed to open adapter");
            self.state = SessionState::Failed;
            return Err(e);
        }

        self.state = SessionState::Scanning;
        let outcome = self.scan(adapter).await;
        release(adapter).await;

        match outcome {
            Ok(end) => {
                self.state = SessionState::Completed;
                let reason = match end {
                    ScanEnd::Elapsed => "timeout elapsed",
                    ScanEnd::Cancelled => "cancelled",
                    ScanEnd::Exhausted => "scan ended by adapter",
                };
                info!(devices = self.registry.len(), reason, "discovery completed");
                Ok(self.registry.records().to_vec())
            }
            Err(e) => {
                debug!(error = %e, devices = self.registry.len(), "discovery failed");
                self.state = SessionState::Failed;
                Err(e)
            }
        }
    }

    async fn scan<A>(&mut self, adapter: &mut A) -> Result<ScanEnd>
    where
        A: ScanAdapter + ?Sized,
    {
        adapter.start_scan(self.options.resolve_names).await?;

        let deadline = tokio::time::sleep(self.options.timeout);
        tokio::pin!(deadline);
        let mut cancelled = self.cancel.subscribe();

        loop {
            tokio::select! {
                biased;

                _ = cancelled.wait_for(|c| *c) => return Ok(ScanEnd::Cancelled),
                _ = &mut deadline => return Ok(ScanEnd::Elapsed),
                next = adapter.next_observation() => match next? {
                    Some(observation) => {
                        let address = observation.address.clone();
                        match self.registry.merge(observation) {
                            MergeOutcome::Rejected => {
                                warn!(address = %address, "skipping observation with invalid address");
                            }
                            outcome => debug!(address = %address, ?outcome, "observation"),
                        }
                    }
                    None => return Ok(ScanEnd::Exhausted),
                },
            }
        }
    }
}

/// Stop the scan and close the adapter. Failures here never mask the scan
/// outcome.
async fn release<A>(adapter: &mut A)
where
    A: ScanAdapter + ?Sized,
{
    if let Err(e) = adapter.stop_scan().await {
        warn!(error = %e, "failed to stop scan");
    }
    adapter.close().await;
}

/// Run one discovery with a timeout in seconds.
///
/// Fails with `InvalidArgument` for a non-positive timeout without touching
/// the adapter.
pub async fn discover<A>(
    adapter: &mut A,
    timeout_secs: f64,
    resolve_names: bool,
) -> Result<Vec<DeviceRecord>>
where
    A: ScanAdapter + ?Sized,
{
    let timeout = Duration::try_from_secs_f64(timeout_secs)
        .ok()
        .filter(|t| !t.is_zero())
        .ok_or_else(|| {
            DiscoveryError::InvalidArgument(format!(
                "timeout must be a positive number of seconds, got {}",
                timeout_secs
            ))
        })?;

    let options = options_for(&*adapter, timeout, resolve_names);
    DiscoverySession::new(options)?.run(adapter).await
}

fn options_for<A>(adapter: &A, timeout: Duration, resolve_names: bool) -> DiscoveryOptions
where
    A: ScanAdapter + ?Sized,
{
    adapter
        .mode()
        .map(DiscoveryOptions::for_mode)
        .unwrap_or_default()
        .timeout(timeout)
        .resolve_names(resolve_names)
}
