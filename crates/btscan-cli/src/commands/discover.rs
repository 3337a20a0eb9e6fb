//! Discover command implementation.

use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use std::time::Duration;
use tracing::{debug, info};

use btscan_core::adapter::{backend_available, open_adapter, ScanAdapter};
use btscan_core::replay::load_script;
use btscan_core::{
    spawn_session, CancelToken, DeviceRecord, DiscoveryError, DiscoveryOptions,
    DiscoverySession, ErrorKind, ScanMode,
};

use crate::cli::{DiscoverArgs, FormatArg, ModeArg};
use crate::error::CliError;
use crate::output::{get_formatter, ScanReport};

/// Settings shared by every scan of one invocation.
#[derive(Debug, Clone)]
struct ScanSettings {
    timeout_secs: Option<f64>,
    resolve_names: bool,
    show_progress: bool,
}

impl ScanSettings {
    fn options_for(&self, mode: ScanMode) -> DiscoveryOptions {
        let options = DiscoveryOptions::for_mode(mode).resolve_names(self.resolve_names);
        match self.timeout_secs {
            Some(secs) => options.timeout_secs(secs),
            None => options,
        }
    }
}

/// Run the discover command
pub async fn run_discover(args: DiscoverArgs, json: bool) -> Result<(), CliError> {
    let formatter = get_formatter(args.format, json);
    let show_progress = !json && args.format != FormatArg::Json;

    // One Ctrl+C ends the running scan and every scan still queued
    let cancel = CancelToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let reports = discover_reports(&args, show_progress, &cancel).await;
    interrupt.abort();

    println!("{}", formatter.format_scans(&reports?));

    Ok(())
}

/// Run the scans `args` ask for and apply the name filter.
async fn discover_reports(
    args: &DiscoverArgs,
    show_progress: bool,
    cancel: &CancelToken,
) -> Result<Vec<ScanReport>, CliError> {
    let name_filter = args
        .name
        .as_deref()
        .map(Regex::new)
        .transpose()
        .map_err(|e| CliError::InvalidArgument(format!("invalid --name pattern: {}", e)))?;

    let settings = ScanSettings {
        timeout_secs: args.timeout,
        resolve_names: !args.no_names,
        show_progress,
    };

    let reports = match &args.replay {
        Some(path) => {
            let script = load_script(path).await?;
            let mode = replay_mode(args.mode, script.mode)?;
            collect_scans(&[mode], &settings, cancel, |_| {
                Box::new(script.adapter()) as Box<dyn ScanAdapter>
            })
            .await?
        }
        None => collect_scans(&compiled_modes(args.mode)?, &settings, cancel, open_adapter).await?,
    };

    Ok(reports
        .into_iter()
        .map(|report| ScanReport {
            mode: report.mode,
            devices: filter_devices(report.devices, name_filter.as_ref()),
        })
        .collect())
}

/// The single mode a replay file is scanned as.
///
/// A recording is one scan: `all` takes the mode stored in the file, and an
/// explicit mode must agree with it.
fn replay_mode(requested: ModeArg, recorded: Option<ScanMode>) -> Result<ScanMode, CliError> {
    match (requested.scan_modes().as_slice(), recorded) {
        ([mode], None) => Ok(*mode),
        ([mode], Some(recorded)) if *mode == recorded => Ok(recorded),
        ([mode], Some(recorded)) => Err(CliError::InvalidArgument(format!(
            "replay file was recorded as a {} scan, not {}",
            recorded.display_name(),
            mode.display_name()
        ))),
        (_, Some(recorded)) => Ok(recorded),
        (_, None) => Err(CliError::InvalidArgument(
            "replay file does not record its scan mode; pass --mode classic or --mode le"
                .to_string(),
        )),
    }
}

/// Requested modes this build has a radio backend for.
fn compiled_modes(requested: ModeArg) -> Result<Vec<ScanMode>, CliError> {
    let (modes, missing): (Vec<ScanMode>, Vec<ScanMode>) = requested
        .scan_modes()
        .into_iter()
        .partition(|&mode| backend_available(mode));

    for mode in &missing {
        debug!(mode = mode.display_name(), "backend not compiled in");
    }

    if modes.is_empty() {
        return Err(DiscoveryError::AdapterUnavailable(
            "this btscan build has no Bluetooth backend for the requested mode; \
             rebuild with `--features ble` (or `--features classic` on Linux) \
             or pass --replay FILE"
                .to_string(),
        )
        .into());
    }

    Ok(modes)
}

/// Run one scan per mode, in order, until `cancel` fires.
///
/// With several modes, a mode whose adapter is unavailable is skipped; the
/// command only fails when no mode could scan at all.
async fn collect_scans<F>(
    modes: &[ScanMode],
    settings: &ScanSettings,
    cancel: &CancelToken,
    mut make_adapter: F,
) -> Result<Vec<ScanReport>, CliError>
where
    F: FnMut(ScanMode) -> Box<dyn ScanAdapter>,
{
    let mut reports = Vec::new();
    let mut unavailable: Option<DiscoveryError> = None;

    for &mode in modes {
        if cancel.is_cancelled() {
            debug!(mode = mode.display_name(), "interrupted, not starting scan");
            break;
        }

        let session = DiscoverySession::new(settings.options_for(mode))?
            .with_cancel_token(cancel.clone());
        let adapter = make_adapter(mode);
        match scan(adapter, session, settings.show_progress).await {
            Ok(devices) => reports.push(ScanReport { mode, devices }),
            Err(e) if modes.len() > 1 && e.kind() == ErrorKind::AdapterUnavailable => {
                info!(mode = mode.display_name(), error = %e, "skipping scan");
                unavailable = Some(e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    match (reports.is_empty(), unavailable) {
        (true, Some(e)) => Err(e.into()),
        _ => Ok(reports),
    }
}

/// Run a single session on a worker task.
async fn scan(
    adapter: Box<dyn ScanAdapter>,
    session: DiscoverySession,
    show_progress: bool,
) -> Result<Vec<DeviceRecord>, DiscoveryError> {
    let mode = session.options().mode;
    let timeout = session.options().timeout;
    let handle = spawn_session(adapter, session);

    let spinner = show_progress.then(|| scan_spinner(mode, timeout));
    let result = handle.join().await;

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    result
}

fn scan_spinner(mode: ScanMode, timeout: Duration) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(format!(
        "{} scan for {:.1}s (Ctrl+C to stop)",
        mode.display_name(),
        timeout.as_secs_f64()
    ));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Keep only named devices matching `filter`; no filter keeps everything.
fn filter_devices(devices: Vec<DeviceRecord>, filter: Option<&Regex>) -> Vec<DeviceRecord> {
    match filter {
        Some(re) => devices
            .into_iter()
            .filter(|d| d.name.as_deref().is_some_and(|n| re.is_match(n)))
            .collect(),
        None => devices,
    }
}
