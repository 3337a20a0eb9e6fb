//! BR/EDR inquiry through BlueZ.
//!
//! The adapter's power state is never changed; a powered-off adapter is
//! reported as unavailable.

use bluer::{AdapterEvent, DiscoveryFilter, DiscoveryTransport, Session};
use futures::future::BoxFuture;
use futures::stream::Stream;
use futures_util::StreamExt;
use std::pin::Pin;
use tracing::{debug, trace};

use super::ScanAdapter;
use crate::error::{DiscoveryError, Result};
use crate::types::{Observation, ScanMode};

type EventStream = Pin<Box<dyn Stream<Item = AdapterEvent> + Send>>;

/// Classic inquiry on the BlueZ default adapter.
///
/// BlueZ stops the inquiry when the event stream is dropped.
#[derive(Default)]
pub struct ClassicInquiry {
    session: Option<Session>,
    adapter: Option<bluer::Adapter>,
    events: Option<EventStream>,
    resolve_names: bool,
}

impl ClassicInquiry {
    pub fn new() -> Self {
        Self::default()
    }
}

fn classify(err: bluer::Error) -> DiscoveryError {
    use bluer::ErrorKind;

    match err.kind {
        ErrorKind::NotAuthorized | ErrorKind::NotPermitted => {
            DiscoveryError::PermissionDenied(err.message)
        }
        ErrorKind::NotReady | ErrorKind::NotAvailable | ErrorKind::NotFound => {
            DiscoveryError::AdapterUnavailable(err.to_string())
        }
        _ => DiscoveryError::Timeout(err.to_string()),
    }
}

fn require_powered(adapter: &str, powered: bool) -> Result<()> {
    if powered {
        Ok(())
    } else {
        Err(DiscoveryError::AdapterUnavailable(format!(
            "adapter {} is powered off",
            adapter
        )))
    }
}

impl ScanAdapter for ClassicInquiry {
    fn open(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            // No bluetoothd or system bus means no usable adapter
            let session = Session::new()
                .await
                .map_err(|e| DiscoveryError::AdapterUnavailable(e.to_string()))?;
            let adapter = session.default_adapter().await.map_err(|e| match classify(e) {
                DiscoveryError::Timeout(msg) => DiscoveryError::AdapterUnavailable(msg),
                other => other,
            })?;
            let powered = adapter.is_powered().await.map_err(classify)?;
            require_powered(adapter.name(), powered)?;

            debug!(adapter = adapter.name(), "opened BlueZ adapter");
            self.session = Some(session);
            self.adapter = Some(adapter);
            Ok(())
        })
    }

    fn start_scan(&mut self, resolve_names: bool) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let adapter = self.adapter.as_ref().ok_or_else(|| {
                DiscoveryError::AdapterUnavailable("adapter not open".to_string())
            })?;

            let filter = DiscoveryFilter {
                transport: DiscoveryTransport::BrEdr,
                ..Default::default()
            };
            adapter.set_discovery_filter(filter).await.map_err(classify)?;
            let events = adapter.discover_devices().await.map_err(classify)?;

            self.events = Some(Box::pin(events));
            self.resolve_names = resolve_names;
            Ok(())
        })
    }

    fn next_observation(&mut self) -> BoxFuture<'_, Result<Option<Observation>>> {
        Box::pin(async move {
            let (Some(adapter), Some(events)) = (self.adapter.as_ref(), self.events.as_mut())
            else {
                return Err(DiscoveryError::Timeout("inquiry not started".to_string()));
            };

            while let Some(event) = events.next().await {
                let address = match event {
                    AdapterEvent::DeviceAdded(address) => address,
                    other => {
                        trace!(event = ?other, "ignoring adapter event");
                        continue;
                    }
                };

                let device = adapter.device(address).map_err(classify)?;
                let name = if self.resolve_names {
                    // Name lookups fail for devices that left range; keep the address
                    device.name().await.ok().flatten()
                } else {
                    None
                };
                let rssi = device.rssi().await.ok().flatten();

                return Ok(Some(Observation {
                    address: address.to_string(),
                    name,
                    rssi,
                }));
            }

            Ok(None)
        })
    }

    fn stop_scan(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.events = None;
            Ok(())
        })
    }

    fn close(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.events = None;
            self.adapter = None;
            self.session = None;
        })
    }

    fn mode(&self) -> Option<ScanMode> {
        Some(ScanMode::Classic)
    }
}
