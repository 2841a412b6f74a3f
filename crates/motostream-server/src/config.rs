use anyhow::bail;
use clap::Parser;
use core::time::Duration;
use std::path::PathBuf;

/// Runtime configuration for the `motostream-server` binary.
///
/// These settings control the listening address, the simulated backend
/// latency and the buffering of the stream endpoint. All values are parsed
/// from CLI arguments or environment variables (a `.env` file is honored),
/// with defaults that reproduce the reference behavior.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "motostream-server",
    version,
    about = "An HTTP service serving motorcycles with simulated latency"
)]
pub struct CliArgs {
    /// Address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:8081"))]
    pub server_addr: String,

    /// Simulated latency, in milliseconds, applied before every fetch response
    /// and before every streamed item.
    ///
    /// Environment variable: `RESPONSE_DELAY_MS`
    #[arg(long, env = "RESPONSE_DELAY_MS", default_value_t = 2000)]
    pub delay_ms: u64,

    /// Capacity of the channel between a stream's emission task and the HTTP
    /// response body.
    ///
    /// Environment variable: `STREAM_BUFFER_SIZE`
    #[arg(long, env = "STREAM_BUFFER_SIZE", default_value_t = 1)]
    pub stream_buffer_size: usize,

    /// Seconds to wait for open streams to drain during shutdown.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT`
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 3)]
    pub shutdown_timeout: u64,

    /// JSON file holding an array of motorcycles to serve instead of the
    /// built-in reference dataset.
    ///
    /// Environment variable: `DATA_FILE`
    #[arg(long, env = "DATA_FILE")]
    pub data_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub delay: Duration,
    pub stream_buffer_size: usize,
    pub shutdown_timeout: Duration,
    pub data_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_addr: String::from("0.0.0.0:8081"),
            delay: Duration::from_millis(2000),
            stream_buffer_size: 1,
            shutdown_timeout: Duration::from_secs(3),
            data_file: None,
        }
    }
}

impl ServerConfig {
    /// Default configuration with a different simulated latency.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.stream_buffer_size == 0 {
            bail!("STREAM_BUFFER_SIZE must be greater than 0");
        }

        if let Some(path) = &args.data_file {
            if !path.is_file() {
                bail!("DATA_FILE ({}) is not a readable file", path.display());
            }
        }

        Ok(Self {
            server_addr: args.server_addr,
            delay: Duration::from_millis(args.delay_ms),
            stream_buffer_size: args.stream_buffer_size,
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout),
            data_file: args.data_file,
        })
    }
}
