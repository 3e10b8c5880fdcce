use anyhow::bail;
use clap::{Parser, ValueEnum};
use core::time::Duration;

/// Runtime configuration for the `qrgen-server` binary.
///
/// These settings control the listener, the per-connection timeouts, the
/// request body limit, and log output. All values are parsed from CLI
/// arguments or environment variables, with defaults suitable for running
/// behind a container orchestrator.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "qrgen-server",
    version,
    about = "An HTTP service that turns raw payloads into QR code PNGs"
)]
pub struct CliArgs {
    /// TCP port to listen on.
    ///
    /// Environment variable: `PORT`
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Maximum time, in seconds, to read a request body.
    ///
    /// Bounds how long a slow client can keep a request body stream open.
    ///
    /// Environment variable: `READ_TIMEOUT_SECS`
    #[arg(long, env = "READ_TIMEOUT_SECS", default_value_t = 10)]
    pub read_timeout_secs: u64,

    /// Maximum time, in seconds, to write a response body.
    ///
    /// Environment variable: `WRITE_TIMEOUT_SECS`
    #[arg(long, env = "WRITE_TIMEOUT_SECS", default_value_t = 10)]
    pub write_timeout_secs: u64,

    /// Maximum time, in seconds, to read a request's header section.
    ///
    /// Also bounds how long an idle HTTP/1 keep-alive connection may sit
    /// waiting for its next request.
    ///
    /// Environment variable: `READ_HEADER_TIMEOUT_SECS`
    #[arg(long, env = "READ_HEADER_TIMEOUT_SECS", default_value_t = 2)]
    pub read_header_timeout_secs: u64,

    /// Maximum time, in seconds, an idle HTTP/2 connection is kept alive.
    ///
    /// Environment variable: `IDLE_TIMEOUT_SECS`
    #[arg(long, env = "IDLE_TIMEOUT_SECS", default_value_t = 60)]
    pub idle_timeout_secs: u64,

    /// Maximum time, in seconds, to wait for in-flight requests to drain
    /// after a shutdown signal. Expiry is treated as a fatal shutdown
    /// failure and the process exits non-zero.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT_SECS`
    #[arg(long, env = "SHUTDOWN_TIMEOUT_SECS", default_value_t = 10)]
    pub shutdown_timeout_secs: u64,

    /// Maximum accepted request body size, in bytes.
    ///
    /// Enforced while the body is being read, before the payload is
    /// materialized in memory; larger bodies are rejected with 413.
    ///
    /// Environment variable: `MAX_BODY_SIZE`
    #[arg(long, env = "MAX_BODY_SIZE", default_value_t = 1_048_576)]
    pub max_body_size: usize,

    /// Log output format: `dev` for human-readable output with source
    /// locations, `prod` for JSON lines.
    ///
    /// Environment variable: `LOG_FORMAT`
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "prod")]
    pub log_format: LogFormat,

    /// Default log level filter. Accepts any `tracing` filter directive;
    /// the `RUST_LOG` environment variable overrides it when set.
    ///
    /// Environment variable: `LOG_LEVEL`
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Log output flavor.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Pretty, colored, human-readable output for local development.
    Dev,
    /// One JSON object per line, for log shippers.
    Prod,
}

/// Validated server configuration, immutable after startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub read_header_timeout: Duration,
    pub idle_timeout: Duration,
    pub shutdown_timeout: Duration,
    pub max_body_size: usize,
    pub log_format: LogFormat,
    pub log_level: String,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.max_body_size == 0 {
            bail!("MAX_BODY_SIZE must be greater than 0");
        }

        if args.shutdown_timeout_secs == 0 {
            bail!("SHUTDOWN_TIMEOUT_SECS must be greater than 0");
        }

        if args.read_timeout_secs == 0 || args.write_timeout_secs == 0 {
            bail!("READ_TIMEOUT_SECS and WRITE_TIMEOUT_SECS must be greater than 0");
        }

        Ok(Self {
            port: args.port,
            read_timeout: Duration::from_secs(args.read_timeout_secs),
            write_timeout: Duration::from_secs(args.write_timeout_secs),
            read_header_timeout: Duration::from_secs(args.read_header_timeout_secs),
            idle_timeout: Duration::from_secs(args.idle_timeout_secs),
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout_secs),
            max_body_size: args.max_body_size,
            log_format: args.log_format,
            log_level: args.log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> CliArgs {
        CliArgs::parse_from(["qrgen-server"])
    }

    #[test]
    fn defaults_validate() {
        let config = ServerConfig::try_from(args()).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.max_body_size, 1_048_576);
        assert_eq!(config.read_header_timeout, Duration::from_secs(2));
        assert_eq!(config.idle_timeout, Duration::from_secs(60));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Prod);
    }

    #[test]
    fn rejects_zero_body_limit() {
        let mut invalid = args();
        invalid.max_body_size = 0;
        assert!(ServerConfig::try_from(invalid).is_err());
    }

    #[test]
    fn rejects_zero_shutdown_timeout() {
        let mut invalid = args();
        invalid.shutdown_timeout_secs = 0;
        assert!(ServerConfig::try_from(invalid).is_err());
    }
}
