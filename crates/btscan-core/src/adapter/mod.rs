//! Bluetooth adapter capability and its backends.
//!
//! A backend wraps one platform discovery procedure behind [`ScanAdapter`].
//! Classic inquiry and BLE scanning are two implementations of the same
//! capability, picked by [`ScanMode`] in [`open_adapter`].

#[cfg(all(feature = "classic", target_os = "linux"))]
pub mod classic;
#[cfg(feature = "ble")]
pub mod le;
pub mod scripted;

pub use scripted::{ScriptStep, ScriptedAdapter};

use futures::future::BoxFuture;

use crate::error::{DiscoveryError, Result};
use crate::types::{Observation, ScanMode};

/// Exclusive handle on a radio performing one discovery procedure.
///
/// A session drives the handle as `open -> start_scan -> next_observation*
/// -> stop_scan -> close`. Handles are serially reusable: the session borrows
/// it mutably for the whole call, so two sessions can never share one.
pub trait ScanAdapter: Send {
    /// Acquire the radio.
    fn open(&mut self) -> BoxFuture<'_, Result<()>>;

    /// Put the radio into scanning mode.
    fn start_scan(&mut self, resolve_names: bool) -> BoxFuture<'_, Result<()>>;

    /// Wait for the next raw result. `Ok(None)` means the platform ended the
    /// scan on its own.
    fn next_observation(&mut self) -> BoxFuture<'_, Result<Option<Observation>>>;

    fn stop_scan(&mut self) -> BoxFuture<'_, Result<()>>;

    /// Release the radio. Called after every successful `open`.
    fn close(&mut self) -> BoxFuture<'_, ()>;

    /// Discovery procedure this handle performs, when it is tied to one.
    fn mode(&self) -> Option<ScanMode> {
        None
    }
}

impl<A: ScanAdapter + ?Sized> ScanAdapter for Box<A> {
    fn open(&mut self) -> BoxFuture<'_, Result<()>> {
        (**self).open()
    }

    fn start_scan(&mut self, resolve_names: bool) -> BoxFuture<'_, Result<()>> {
        (**self).start_scan(resolve_names)
    }

    fn next_observation(&mut self) -> BoxFuture<'_, Result<Option<Observation>>> {
        (**self).next_observation()
    }

    fn stop_scan(&mut self) -> BoxFuture<'_, Result<()>> {
        (**self).stop_scan()
    }

    fn close(&mut self) -> BoxFuture<'_, ()> {
        (**self).close()
    }

    fn mode(&self) -> Option<ScanMode> {
        (**self).mode()
    }
}

/// Open the platform backend serving `mode`.
///
/// When the backend is not compiled in or the platform lacks it, the returned
/// adapter fails on `open` with `AdapterUnavailable`.
pub fn open_adapter(mode: ScanMode) -> Box<dyn ScanAdapter> {
    match mode {
        ScanMode::Classic => classic_backend(),
        ScanMode::LowEnergy => le_backend(),
    }
}

/// Whether this build carries a radio backend for `mode`.
pub fn backend_available(mode: ScanMode) -> bool {
    match mode {
        ScanMode::Classic => cfg!(all(feature = "classic", target_os = "linux")),
        ScanMode::LowEnergy => cfg!(feature = "ble"),
    }
}

#[cfg(all(feature = "classic", target_os = "linux"))]
fn classic_backend() -> Box<dyn ScanAdapter> {
    Box::new(classic::ClassicInquiry::new())
}

#[cfg(not(all(feature = "classic", target_os = "linux")))]
fn classic_backend() -> Box<dyn ScanAdapter> {
    let reason = if cfg!(target_os = "linux") {
        "classic inquiry support not compiled in (enable the `classic` feature)"
    } else {
        "classic inquiry is only supported through BlueZ on Linux"
    };
    Box::new(UnavailableAdapter::new(reason))
}

#[cfg(feature = "ble")]
fn le_backend() -> Box<dyn ScanAdapter> {
    Box::new(le::LeScanner::new())
}

#[cfg(not(feature = "ble"))]
fn le_backend() -> Box<dyn ScanAdapter> {
    Box::new(UnavailableAdapter::new(
        "BLE support not compiled in (enable the `ble` feature)",
    ))
}

/// Stand-in for a backend this build cannot provide.
#[derive(Debug, Clone)]
pub struct UnavailableAdapter {
    reason: String,
}

impl UnavailableAdapter {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn error(&self) -> DiscoveryError {
        DiscoveryError::AdapterUnavailable(self.reason.clone())
    }
}

impl ScanAdapter for UnavailableAdapter {
    fn open(&mut self) -> BoxFuture<'_, Result<()>> {
        let err = self.error();
        Box::pin(async move { Err(err) })
    }

    fn start_scan(&mut self, _resolve_names: bool) -> BoxFuture<'_, Result<()>> {
        let err = self.error();
        Box::pin(async move { Err(err) })
    }

    fn next_observation(&mut self) -> BoxFuture<'_, Result<Option<Observation>>> {
        let err = self.error();
        Box::pin(async move { Err(err) })
    }

    fn stop_scan(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async { Ok(()) })
    }

    fn close(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unavailable_adapter_fails_open() {
        let mut adapter = UnavailableAdapter::new("no radio");
        let err = adapter.open().await.unwrap_err();
        assert_eq!(err, DiscoveryError::AdapterUnavailable("no radio".to_string()));
    }

    #[cfg(not(feature = "ble"))]
    #[tokio::test]
    async fn test_le_backend_missing_reports_unavailable() {
        assert!(!backend_available(ScanMode::LowEnergy));
        let mut adapter = open_adapter(ScanMode::LowEnergy);
        let err = adapter.open().await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::AdapterUnavailable);
    }

    #[cfg(not(feature = "classic"))]
    #[tokio::test]
    async fn test_classic_backend_missing_reports_unavailable() {
        assert!(!backend_available(ScanMode::Classic));
        let mut adapter = open_adapter(ScanMode::Classic);
        let err = adapter.open().await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::AdapterUnavailable);
    }

    #[test]
    fn test_boxed_adapter_reports_mode() {
        let adapter: Box<dyn ScanAdapter> =
            Box::new(ScriptedAdapter::new(Vec::<ScriptStep>::new()).with_mode(ScanMode::Classic));
        assert_eq!(adapter.mode(), Some(ScanMode::Classic));
        assert_eq!(UnavailableAdapter::new("off").mode(), None);
    }
}
