//! tamper - Gyroscope tamper monitor
//!
//! Brings up the gyro FIFO if needed, then streams samples from the device
//! until it ends, announcing every tamper event.

use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use gyro_tamper::config::{
    MonitorConfig, DEFAULT_AVG_SAMPLES, DEFAULT_DEVICE_PATH, DEFAULT_MAX_WINDOW,
    DEFAULT_SENSITIVITY,
};
use gyro_tamper::device::{bring_up, SysfsDevice, DEFAULT_SYSFS_ROOT};
use gyro_tamper::pipeline::{open_device, SessionEvent, TamperMonitor};
use gyro_tamper::types::{AlertConfig, MonitorSummary, DEFAULT_TONE_PATH};
use gyro_tamper::{CommandAlertSink, DeviceError, BUILD_DATE, GIT_COMMIT, TAMPER_VERSION};

/// tamper - Detect physical tampering from a 3-axis gyroscope FIFO
#[derive(Parser)]
#[command(name = "tamper")]
#[command(version = TAMPER_VERSION)]
#[command(about = "Detect sustained gyro tampering with adaptive baselines", long_about = None)]
struct Cli {
    /// Path to the iio device
    #[arg(long, default_value = DEFAULT_DEVICE_PATH)]
    path: PathBuf,

    /// Sensitivity of tamper detection (1-10)
    #[arg(long, default_value_t = DEFAULT_SENSITIVITY, allow_negative_numbers = true)]
    threshold: i32,

    /// Number of samples used in average calculation
    #[arg(long, default_value_t = DEFAULT_AVG_SAMPLES)]
    avg_samples: u64,

    /// Number of consecutive samples before tamper
    #[arg(long, default_value_t = DEFAULT_MAX_WINDOW)]
    max_window: u32,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,

    /// Play tone on tamper trigger
    #[arg(long)]
    play_tone: bool,

    /// Path to tamper alert tone
    #[arg(long, default_value = DEFAULT_TONE_PATH)]
    tone_path: String,

    /// Directory holding the gyro attribute files
    #[arg(long, default_value = DEFAULT_SYSFS_ROOT)]
    sysfs_root: PathBuf,

    /// Spawn the tone player without waiting for it to finish
    #[arg(long)]
    detach_tone: bool,

    /// Emit tamper events and the summary as NDJSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn into_config(self) -> MonitorConfig {
        let mut config = MonitorConfig::new(self.threshold, self.avg_samples, self.max_window)
            .with_device_path(self.path)
            .with_sysfs_root(self.sysfs_root)
            .with_alert(AlertConfig::new(self.tone_path, self.play_tone));
        config.detach_alert = self.detach_tone;
        config.json_output = self.json;
        config.verbose = self.verbose;
        config
    }
}

fn main() -> ExitCode {
    let config = Cli::parse().into_config();
    init_tracing(config.verbose);

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins; otherwise debug when verbose and warnings only when not
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_ansi(atty::is(atty::Stream::Stderr))
        .with_writer(io::stderr)
        .init();
}

fn run(config: &MonitorConfig) -> Result<(), TamperCliError> {
    if config.verbose {
        info!(
            version = TAMPER_VERSION,
            commit = GIT_COMMIT.unwrap_or("unknown"),
            build_date = BUILD_DATE.unwrap_or("unknown"),
            "Verbose logging enabled"
        );
        config.log_defaults();
    }

    let device = SysfsDevice::new(&config.sysfs_root);
    bring_up(&device).map_err(|e| {
        if e.is_write() {
            error!("Unable to preamble iio FIFO");
            TamperCliError::BringUp(e)
        } else {
            error!("Unable to determine FIFO operational, quitting");
            TamperCliError::FifoQuery(e)
        }
    })?;

    println!("Running tamper {}...", TAMPER_VERSION);
    println!(
        "\tDevice: {}, Sample Average: {}",
        config.device_path.display(),
        config.params.max_samples
    );
    println!(
        "\tMax Window: {}, Sensitivity: {}",
        config.params.max_window, config.sensitivity
    );

    // An unopenable stream ends the run like an exhausted one
    let stream = match open_device(&config.device_path) {
        Ok(stream) => stream,
        Err(e) => {
            error!("{e}");
            return Ok(());
        }
    };

    let mut sink = CommandAlertSink::default();
    if config.detach_alert {
        sink = sink.detached();
    }

    let mut monitor = TamperMonitor::new(config, sink);
    let json = config.json_output;
    let summary = monitor.run(stream, |e| report_event(e, json));

    report_summary(&summary, json)?;
    Ok(())
}

fn report_event(e: &SessionEvent<'_>, json: bool) {
    if !json {
        println!("{} axis **** TAMPER #: {} **** ", e.event.axis, e.event.ordinal);
        return;
    }

    match serde_json::to_string(e) {
        Ok(line) => {
            let mut stdout = io::stdout();
            if let Err(err) = writeln!(stdout, "{line}").and_then(|_| stdout.flush()) {
                warn!("Unable to write event: {err}");
            }
        }
        Err(err) => warn!("Unable to encode event: {err}"),
    }
}

fn report_summary(summary: &MonitorSummary, json: bool) -> Result<(), TamperCliError> {
    if json {
        println!("{}", serde_json::to_string(summary)?);
        return Ok(());
    }

    for axis in &summary.axes {
        info!(axis = %axis.axis, tamper = axis.tamper_count, "Axis tamper count");
    }
    println!(
        "Stopped after {} chunks ({} skipped), {} tamper events",
        summary.chunks_read, summary.chunks_skipped, summary.tamper_events
    );
    Ok(())
}

// Error types

#[derive(Debug)]
enum TamperCliError {
    FifoQuery(DeviceError),
    BringUp(DeviceError),
    Json(serde_json::Error),
}

impl From<serde_json::Error> for TamperCliError {
    fn from(e: serde_json::Error) -> Self {
        TamperCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<TamperCliError> for CliError {
    fn from(e: TamperCliError) -> Self {
        match e {
            TamperCliError::FifoQuery(e) => CliError {
                code: "FIFO_QUERY_FAILED".to_string(),
                message: e.to_string(),
                hint: Some(
                    "Check that the gyro driver is loaded and --sysfs-root is correct".to_string(),
                ),
            },
            TamperCliError::BringUp(e) => CliError {
                code: "FIFO_SETUP_FAILED".to_string(),
                message: e.to_string(),
                hint: Some("Check write permissions on the gyro attribute files".to_string()),
            },
            TamperCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_cli_defaults() {
        let config = Cli::parse_from(["tamper"]).into_config();
        assert_eq!(config, MonitorConfig::default());
    }

    #[test]
    fn test_cli_flags() {
        let config = Cli::parse_from([
            "tamper",
            "--path",
            "/dev/iio:device3",
            "--threshold",
            "5",
            "--avg-samples",
            "40",
            "--max-window",
            "4",
            "--play-tone",
            "--tone-path",
            "/tmp/beep.wav",
            "--detach-tone",
            "--json",
        ])
        .into_config();

        assert_eq!(config.device_path, PathBuf::from("/dev/iio:device3"));
        assert_eq!(config.params.threshold, 3276);
        assert_eq!(config.params.max_samples, 40);
        assert_eq!(config.params.max_window, 4);
        assert_eq!(config.alert, AlertConfig::new("/tmp/beep.wav", true));
        assert!(config.detach_alert);
        assert!(config.json_output);
        assert!(!config.verbose);
    }

    #[test]
    fn test_out_of_range_sensitivity_accepted() {
        let config = Cli::parse_from(["tamper", "--threshold", "-3"]).into_config();
        assert_eq!(config.params.threshold, 1);
    }

    fn monitor_config(sysfs_root: &std::path::Path) -> MonitorConfig {
        MonitorConfig::default()
            .with_sysfs_root(sysfs_root)
            .with_device_path(sysfs_root.join("iio:device-missing"))
    }

    #[test]
    fn test_missing_device_ends_run_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("gyro_fifo_enable"), "1\n").unwrap();

        assert!(run(&monitor_config(dir.path())).is_ok());
    }

    #[test]
    fn test_fifo_query_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();

        let err = run(&monitor_config(dir.path())).unwrap_err();
        assert!(matches!(err, TamperCliError::FifoQuery(_)));
        assert_eq!(CliError::from(err).code, "FIFO_QUERY_FAILED");
    }

    #[test]
    fn test_bring_up_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("gyro_fifo_enable"), "0\n").unwrap();
        // A directory where the axis attribute should be makes the write fail
        fs::create_dir(dir.path().join("gyro_x_enable")).unwrap();

        let err = run(&monitor_config(dir.path())).unwrap_err();
        assert!(matches!(err, TamperCliError::BringUp(_)));
        assert_eq!(CliError::from(err).code, "FIFO_SETUP_FAILED");
    }

    #[test]
    fn test_bring_up_then_missing_device() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("gyro_fifo_enable"), "0\n").unwrap();

        assert!(run(&monitor_config(dir.path())).is_ok());
        let enabled = fs::read_to_string(dir.path().join("gyro_fifo_enable")).unwrap();
        assert_eq!(enabled, "1");
    }

    #[test]
    fn test_cli_debug_assert() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
