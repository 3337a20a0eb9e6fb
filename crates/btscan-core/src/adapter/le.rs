//! BLE advertisement scanning through btleplug.

use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager};
use futures::future::BoxFuture;
use futures::stream::Stream;
use futures_util::StreamExt;
use std::pin::Pin;
use tracing::{debug, trace};

use super::ScanAdapter;
use crate::error::{DiscoveryError, Result};
use crate::types::{Observation, ScanMode};

type EventStream = Pin<Box<dyn Stream<Item = CentralEvent> + Send>>;

/// Scans with the first adapter btleplug reports.
#[derive(Default)]
pub struct LeScanner {
    central: Option<Adapter>,
    events: Option<EventStream>,
    resolve_names: bool,
}

impl LeScanner {
    pub fn new() -> Self {
        Self::default()
    }
}

fn classify(err: btleplug::Error) -> DiscoveryError {
    match err {
        btleplug::Error::PermissionDenied => {
            DiscoveryError::PermissionDenied("not allowed to use the Bluetooth adapter".to_string())
        }
        btleplug::Error::NotSupported(msg) => DiscoveryError::AdapterUnavailable(msg),
        btleplug::Error::DeviceNotFound => {
            DiscoveryError::AdapterUnavailable("Bluetooth adapter not found".to_string())
        }
        other => DiscoveryError::Timeout(other.to_string()),
    }
}

/// Errors while acquiring the radio mean there is no usable adapter.
fn classify_open(err: btleplug::Error) -> DiscoveryError {
    match classify(err) {
        DiscoveryError::Timeout(msg) => DiscoveryError::AdapterUnavailable(msg),
        other => other,
    }
}

impl ScanAdapter for LeScanner {
    fn open(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let manager = Manager::new().await.map_err(classify_open)?;
            let adapters = manager.adapters().await.map_err(classify_open)?;
            let central = adapters.into_iter().next().ok_or_else(|| {
                DiscoveryError::AdapterUnavailable("no Bluetooth adapters found".to_string())
            })?;

            if let Ok(info) = central.adapter_info().await {
                debug!(adapter = %info, "opened BLE adapter");
            }
            self.central = Some(central);
            Ok(())
        })
    }

    fn start_scan(&mut self, resolve_names: bool) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let central = self.central.as_ref().ok_or_else(|| {
                DiscoveryError::AdapterUnavailable("adapter not open".to_string())
            })?;

            // Subscribe before scanning so no early advertisement is missed
            let events = central.events().await.map_err(classify)?;
            central
                .start_scan(ScanFilter::default())
                .await
                .map_err(classify)?;

            self.events = Some(events);
            self.resolve_names = resolve_names;
            Ok(())
        })
    }

    fn next_observation(&mut self) -> BoxFuture<'_, Result<Option<Observation>>> {
        Box::pin(async move {
            let (Some(central), Some(events)) = (self.central.as_ref(), self.events.as_mut())
            else {
                return Err(DiscoveryError::Timeout("scan not started".to_string()));
            };

            while let Some(event) = events.next().await {
                let id = match event {
                    CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => id,
                    other => {
                        trace!(event = ?other, "ignoring central event");
                        continue;
                    }
                };

                let peripheral = match central.peripheral(&id).await {
                    Ok(p) => p,
                    // Peripheral vanished between event and lookup
                    Err(btleplug::Error::DeviceNotFound) => continue,
                    Err(e) => return Err(classify(e)),
                };

                let Some(props) = peripheral.properties().await.map_err(classify)? else {
                    continue;
                };

                return Ok(Some(Observation {
                    address: props.address.to_string(),
                    name: if self.resolve_names {
                        props.local_name
                    } else {
                        None
                    },
                    rssi: props.rssi,
                }));
            }

            Ok(None)
        })
    }

    fn stop_scan(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.events = None;
            match self.central.as_ref() {
                Some(central) => central.stop_scan().await.map_err(classify),
                None => Ok(()),
            }
        })
    }

    fn close(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.events = None;
            self.central = None;
        })
    }

    fn mode(&self) -> Option<ScanMode> {
        Some(ScanMode::LowEnergy)
    }
}
