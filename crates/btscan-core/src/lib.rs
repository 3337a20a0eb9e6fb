//! Core library for Bluetooth device discovery.
//!
//! A [`DiscoverySession`] runs one bounded scan against a [`ScanAdapter`],
//! deduplicates what it sees by hardware address and hands back the devices
//! in the order they were first discovered.

pub mod adapter;
pub mod error;
pub mod registry;
pub mod replay;
pub mod session;
pub mod types;
pub mod worker;

pub use adapter::{backend_available, open_adapter, ScanAdapter, ScriptStep, ScriptedAdapter};
pub use error::{CoreError, DiscoveryError, ErrorKind, ReplayError};
pub use registry::{DeviceRegistry, MergeOutcome};
pub use replay::ReplayScript;
pub use session::{discover, CancelToken, DiscoverySession, SessionState};
pub use types::{DeviceRecord, DiscoveryOptions, Observation, ScanMode};
pub use worker::{spawn_discovery, spawn_session, DiscoveryHandle};
