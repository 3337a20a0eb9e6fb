//! Run a discovery session on a dedicated task.

use tokio::task::JoinHandle;

use crate::adapter::ScanAdapter;
use crate::error::{DiscoveryError, Result};
use crate::session::{CancelToken, DiscoverySession};
use crate::types::{DeviceRecord, DiscoveryOptions};

/// Handle on a session running in the background.
pub struct DiscoveryHandle {
    cancel: CancelToken,
    task: JoinHandle<Result<Vec<DeviceRecord>>>,
}

impl DiscoveryHandle {
    /// Ask the session to stop early. It still releases the adapter and
    /// reports the records seen so far.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the session to finish.
    pub async fn join(self) -> Result<Vec<DeviceRecord>> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(DiscoveryError::Timeout(format!(
                "discovery worker aborted: {}",
                e
            ))),
        }
    }
}

/// Spawn a session for `options` on its own task. The adapter moves into the
/// task and is released before the task finishes.
///
/// Invalid options fail here, before anything is spawned.
pub fn spawn_discovery<A>(adapter: A, options: DiscoveryOptions) -> Result<DiscoveryHandle>
where
    A: ScanAdapter + 'static,
{
    Ok(spawn_session(adapter, DiscoverySession::new(options)?))
}

/// Spawn an already configured session, e.g. one sharing a cancel token.
pub fn spawn_session<A>(mut adapter: A, mut session: DiscoverySession) -> DiscoveryHandle
where
    A: ScanAdapter + 'static,
{
    let cancel = session.cancel_token();
    let task = tokio::spawn(async move { session.run(&mut adapter).await });

    DiscoveryHandle { cancel, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{ScriptStep, ScriptedAdapter};
    use crate::error::ErrorKind;
    use crate::types::Observation;
    use std::time::Duration;

    fn observe(address: &str) -> ScriptStep {
        ScriptStep::Observe(Observation::new(address, None, None))
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_runs_to_timeout() {
        let adapter = ScriptedAdapter::new([observe("AA:AA:AA:AA:AA:01")]).hold_when_done();
        let handle = spawn_discovery(
            adapter,
            DiscoveryOptions::default().timeout(Duration::from_secs(3)),
        )
        .unwrap();

        let records = handle.join().await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_cancel() {
        let adapter = ScriptedAdapter::new([
            observe("AA:AA:AA:AA:AA:01"),
            ScriptStep::Wait { millis: 10_000 },
            observe("AA:AA:AA:AA:AA:02"),
        ]);
        let handle = spawn_discovery(
            adapter,
            DiscoveryOptions::default().timeout(Duration::from_secs(60)),
        )
        .unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.cancel();

        let records = handle.join().await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_sessions_are_independent() {
        let first = spawn_discovery(
            ScriptedAdapter::new([observe("AA:AA:AA:AA:AA:01"), observe("AA:AA:AA:AA:AA:02")]),
            DiscoveryOptions::default(),
        )
        .unwrap();
        let second = spawn_discovery(
            ScriptedAdapter::new([observe("BB:BB:BB:BB:BB:01")]),
            DiscoveryOptions::default(),
        )
        .unwrap();

        let (a, b) = tokio::join!(first.join(), second.join());
        assert_eq!(a.unwrap().len(), 2);
        assert_eq!(b.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_spawned_session_keeps_shared_token() {
        let token = CancelToken::new();
        let session = DiscoverySession::new(DiscoveryOptions::default())
            .unwrap()
            .with_cancel_token(token.clone());
        let handle = spawn_session(
            ScriptedAdapter::new([observe("AA:AA:AA:AA:AA:01")]).hold_when_done(),
            session,
        );

        handle.cancel();
        assert!(token.is_cancelled());
        assert!(handle.join().await.unwrap().len() <= 1);
    }

    #[tokio::test]
    async fn test_invalid_options_fail_before_spawn() {
        let err = spawn_discovery(
            ScriptedAdapter::new(Vec::<ScriptStep>::new()),
            DiscoveryOptions::default().timeout(Duration::ZERO),
        )
        .err()
        .unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn test_worker_surfaces_adapter_failure() {
        let handle = spawn_discovery(
            ScriptedAdapter::failing_open(DiscoveryError::AdapterUnavailable("off".to_string())),
            DiscoveryOptions::default(),
        )
        .unwrap();

        let err = handle.join().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AdapterUnavailable);
    }
}
