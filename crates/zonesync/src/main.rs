// # zonesync - declarative DNS sync
//
// Syncs a zone file to a DNS provider, or generates a zone file from one.
//
// ## Configuration
//
// Provider credentials live in a JSON file keyed by name:
//
// ```json
// {
//   "zonesync": {
//     "provider": "cloudflare",
//     "zone_id": "023e105f4ecef8ad9ca31a8372d0c353",
//     "token": "..."
//   }
// }
// ```
//
// - `--config` / `ZONESYNC_CONFIG`: Credentials file (default `config/zonesync.json`)
// - `--log-level` / `ZONESYNC_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// zonesync --dry-run
// zonesync sync --source Zonefile --destination zonesync --force
// zonesync generate --source zonesync --destination Zonefile
// ```

use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use zonesync::{Cli, cli, logging};

/// Exit codes for the possible outcomes
///
/// - 0: Sync or generate finished
/// - 1: Refused by a safety check (missing manifest, integrity, conflict)
/// - 2: Anything else (config, I/O, provider failures)
#[derive(Debug, Clone, Copy)]
enum ZonesyncExitCode {
    /// Finished normally
    Success = 0,
    /// A safety check refused the sync
    ValidationFailed = 1,
    /// Configuration, I/O or provider error
    Failure = 2,
}

impl From<ZonesyncExitCode> for ExitCode {
    fn from(code: ZonesyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let args = Cli::parse();
    let command = args.command();

    if let Err(e) = logging::init(args.log_level.into(), !command.is_dry_run()) {
        eprintln!("Failed to initialize logging: {}", e);
        return ZonesyncExitCode::Failure.into();
    }

    // every store call is awaited in order; one thread is enough
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ZonesyncExitCode::Failure.into();
        }
    };

    let result = rt.block_on(cli::execute(&command, &args.config));

    let code = match result {
        Ok(()) => ZonesyncExitCode::Success,
        Err(e) if e.is_validation_failure() => {
            eprintln!("{}", e);
            ZonesyncExitCode::ValidationFailed
        }
        Err(e) => {
            error!("zonesync failed: {}", e);
            ZonesyncExitCode::Failure
        }
    };
    code.into()
}
