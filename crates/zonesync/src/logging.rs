//! Tracing setup
//!
//! Everything goes to stdout. Runs that mutate a zone also append the
//! per-operation lines, as plain text, to `log/zonesync.log`.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing::Subscriber;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use zonesync_core::OPERATION_LOG_TARGET;

/// Directory holding the operation log
pub const LOG_DIR: &str = "log";

/// Operation log file name inside [`LOG_DIR`]
pub const LOG_FILE: &str = "zonesync.log";

/// Install the global subscriber
///
/// # Parameters
///
/// - `level`: Maximum level for every output
/// - `log_to_file`: Also append operations to `log/zonesync.log`, creating the directory
pub fn init(level: LevelFilter, log_to_file: bool) -> anyhow::Result<()> {
    let file_layer = if log_to_file {
        std::fs::create_dir_all(LOG_DIR)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(Path::new(LOG_DIR).join(LOG_FILE))?;
        Some(operation_layer(file))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(level)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()?;
    Ok(())
}

/// Plain text layer that only passes operation events
fn operation_layer<S>(file: File) -> impl tracing_subscriber::Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .with_filter(Targets::new().with_target(OPERATION_LOG_TARGET, LevelFilter::TRACE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::{info, warn};

    #[test]
    fn test_operation_log_skips_other_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOG_FILE);
        let file = File::create(&path).unwrap();

        let subscriber = tracing_subscriber::registry().with(operation_layer(file));
        tracing::subscriber::with_default(subscriber, || {
            info!("Syncing Zonefile to zonesync");
            info!(target: OPERATION_LOG_TARGET, dry_run = false, "Add www.example.com. 3600 A 192.0.2.1");
            warn!(target: OPERATION_LOG_TARGET, "Record already exists in memory: www.example.com. A");
            info!("Sync finished: 1 operation(s)");
        });

        let log = std::fs::read_to_string(&path).unwrap();
        assert!(log.contains("Add www.example.com. 3600 A 192.0.2.1"), "{}", log);
        assert!(log.contains("Record already exists"), "{}", log);
        assert!(!log.contains("Syncing"), "{}", log);
        assert!(!log.contains("Sync finished"), "{}", log);
        assert_eq!(log.lines().count(), 2);
    }
}
