use crate::{
    args::Args,
    errors::{ConfigError, ConfigResult, DaemonResult},
    monitor::ScanMonitor,
};
use shardscan_core::{info, signals::Shutdown, trace};
use shardscan_ledger_core::api::DynTrustedSource;
use shardscan_scanner::{JsonLinesSink, RecordSink, ScanCounters, ScanReport, Scanner};
use shardscan_simulator::ShardchainSimulator;
use std::{path::PathBuf, sync::Arc, time::Duration};

const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_OUTPUT_FILE: &str = "records.jsonl";

fn get_home_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    return dirs::data_local_dir().unwrap_or_default();
    #[cfg(not(target_os = "windows"))]
    return dirs::home_dir().unwrap_or_default();
}

/// Get the default application directory.
pub fn get_app_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    return get_home_dir().join("shardscan");
    #[cfg(not(target_os = "windows"))]
    return get_home_dir().join(".shardscan");
}

fn expand_home(path: &str) -> String {
    path.replace('~', &get_home_dir().to_string_lossy())
}

pub fn validate_args(args: &Args) -> ConfigResult<()> {
    if args.logdir.is_some() && args.no_log_files {
        return Err(ConfigError::MixedLogDirAndNoLogFiles);
    }
    if args.max_masters == Some(0) {
        return Err(ConfigError::ZeroMaxMasters);
    }
    if args.async_threads == 0 {
        return Err(ConfigError::ZeroAsyncThreads);
    }
    args.simulator_params().validate()?;
    Ok(())
}

/// Get the application directory from the supplied [`Args`].
pub fn get_app_dir_from_args(args: &Args) -> PathBuf {
    match args.appdir.as_deref().map(expand_home) {
        Some(app_dir) if !app_dir.is_empty() => PathBuf::from(app_dir),
        _ => get_app_dir(),
    }
}

/// Get the log directory from the supplied [`Args`].
pub fn get_log_dir(args: &Args) -> Option<String> {
    if args.no_log_files {
        return None;
    }
    // Logs directory is under the application directory, unless otherwise specified
    let log_dir = args.logdir.as_deref().map(expand_home).unwrap_or_default();
    let log_dir = if log_dir.is_empty() { get_app_dir_from_args(args).join(DEFAULT_LOG_DIR) } else { PathBuf::from(log_dir) };
    log_dir.to_str().map(String::from)
}

/// Get the path of the record file from the supplied [`Args`].
pub fn get_output_path(args: &Args) -> PathBuf {
    match args.output.as_deref().map(expand_home) {
        Some(output) if !output.is_empty() => PathBuf::from(output),
        _ => get_app_dir_from_args(args).join(DEFAULT_OUTPUT_FILE),
    }
}

/// Process-wide setup done once before scanning: panic hook and logger.
pub struct Runtime;

impl Runtime {
    pub fn from_args(args: &Args, shutdown: &Shutdown) -> DaemonResult<Self> {
        shardscan_core::panic::install_panic_hook(shutdown);

        let log_dir = get_log_dir(args);
        shardscan_core::log::init_logger(log_dir.as_deref(), &args.log_level)?;
        match log_dir {
            Some(dir) => info!("Logging to {dir}"),
            None => info!("Logging to the console only"),
        }

        Ok(Self)
    }
}

/// Builds the source, sink and scanner described by `args` and scans until `shutdown`
/// fires, the master block limit is reached or the scan fails.
pub async fn run_scanner(args: &Args, shutdown: Shutdown) -> DaemonResult<ScanReport> {
    let source: DynTrustedSource = Arc::new(ShardchainSimulator::new(args.simulator_params()).map_err(ConfigError::from)?);
    let output = get_output_path(args);
    let sink: Box<dyn RecordSink> = Box::new(JsonLinesSink::open(&output)?);
    info!("Writing records to {}", output.display());

    let counters = Arc::new(ScanCounters::default());
    let monitor = (args.monitor_interval_sec > 0).then(|| {
        let monitor = ScanMonitor::new(counters.clone(), Duration::from_secs(args.monitor_interval_sec));
        tokio::spawn(monitor.worker(shutdown.listener.clone()))
    });

    let mut scanner = Scanner::new(source, sink, args.scan_config()).with_counters(counters);
    let result = scanner.run(shutdown.listener.clone()).await;

    // Releases the monitor when the scan ended on its own
    shutdown.signal();
    if let Some(monitor) = monitor {
        if let Err(err) = monitor.await {
            trace!("monitor task left with error {err}");
        }
    }

    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shardscan_scanner::sink::read_records;
    use std::collections::HashSet;

    fn test_args(dir: &std::path::Path) -> Args {
        Args {
            appdir: Some(dir.to_string_lossy().into_owned()),
            sim_interval_ms: 0,
            sim_split_probability: 0.3,
            sim_merge_probability: 0.3,
            monitor_interval_sec: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_args() {
        assert_eq!(validate_args(&Args::default()), Ok(()));

        let args = Args { logdir: Some("/tmp/logs".into()), no_log_files: true, ..Default::default() };
        assert_eq!(validate_args(&args), Err(ConfigError::MixedLogDirAndNoLogFiles));

        let args = Args { max_masters: Some(0), ..Default::default() };
        assert_eq!(validate_args(&args), Err(ConfigError::ZeroMaxMasters));

        let args = Args { sim_merge_probability: 2.0, ..Default::default() };
        assert!(matches!(validate_args(&args), Err(ConfigError::Simulator(_))));
    }

    #[test]
    fn test_paths() {
        let args = Args { appdir: Some("/var/lib/shardscan".into()), ..Default::default() };
        assert_eq!(get_log_dir(&args).as_deref(), Some("/var/lib/shardscan/logs"));
        assert_eq!(get_output_path(&args), PathBuf::from("/var/lib/shardscan/records.jsonl"));

        let args = Args { logdir: Some("/var/log/shardscan".into()), output: Some("/data/out.jsonl".into()), ..args };
        assert_eq!(get_log_dir(&args).as_deref(), Some("/var/log/shardscan"));
        assert_eq!(get_output_path(&args), PathBuf::from("/data/out.jsonl"));

        let args = Args { no_log_files: true, logdir: None, ..args };
        assert_eq!(get_log_dir(&args), None);
    }

    #[tokio::test]
    async fn test_run_scanner_writes_records() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args { max_masters: Some(12), ..test_args(dir.path()) };

        let report = run_scanner(&args, Shutdown::new()).await.unwrap();

        assert_eq!(report.master_blocks, 12);
        let records = read_records(get_output_path(&args)).unwrap();
        assert_eq!(records.len() as u64, report.records);
        // The starting master block is recorded as well
        assert_eq!(records.iter().filter(|r| r.is_masterchain()).count(), 13);
        let unique: HashSet<_> = records.iter().map(|r| r.hash.clone()).collect();
        assert_eq!(unique.len(), records.len());
    }

    #[tokio::test]
    async fn test_run_scanner_stops_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args { sim_interval_ms: 50, monitor_interval_sec: 1, ..test_args(dir.path()) };
        let shutdown = Shutdown::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(120)).await;
            trigger.signal();
        });

        let report = tokio::time::timeout(Duration::from_secs(5), run_scanner(&args, shutdown)).await.unwrap().unwrap();

        assert!(report.master_blocks <= 3);
    }
}
