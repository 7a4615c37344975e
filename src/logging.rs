//! Process-wide logging bootstrap.
//!
//! Library code only talks to the `log` facade; the binary calls
//! [`init_logging`] once to route records to stderr through `flexi_logger`.

use anyhow::{anyhow, Context, Result};
use flexi_logger::{Logger, LoggerHandle};
use once_cell::sync::OnceCell;

const SUPPORTED_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

static LOGGER: OnceCell<LoggerHandle> = OnceCell::new();

/// Start the stderr logger at `level`. Later calls are no-ops.
///
/// # Errors
/// - Returns an error when `level` is not one of the supported level names.
/// - Returns an error when the logger backend cannot be started.
pub fn init_logging(level: &str) -> Result<()> {
    let level = normalize_level(level)?;

    LOGGER
        .get_or_try_init(|| {
            Logger::try_with_str(level)
                .context("Invalid log specification")?
                .log_to_stderr()
                .start()
                .context("Failed to start logger")
        })
        .map(|_| ())
}

/// Lower-cases and validates a level name.
pub fn normalize_level(level: &str) -> Result<&'static str> {
    let wanted = level.trim().to_ascii_lowercase();
    SUPPORTED_LEVELS
        .iter()
        .copied()
        .find(|l| *l == wanted)
        .ok_or_else(|| anyhow!("Unsupported log level '{}'", level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_level() {
        assert_eq!(normalize_level("INFO").unwrap(), "info");
        assert_eq!(normalize_level(" warn ").unwrap(), "warn");
        assert_eq!(normalize_level("off").unwrap(), "off");
        assert!(normalize_level("loud").is_err());
        assert!(normalize_level("").is_err());
    }
}
